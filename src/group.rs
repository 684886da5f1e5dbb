//! The process-group seam the demos are written against.

use crate::comm::Communicator;
use crate::error::Result;

/// The three things the demos need from a distributed-process group.
///
/// [`Communicator`] implements it over MPI. Tests implement it over threads.
pub trait ProcessGroup {
    /// Rank of the calling participant, in `0..size()`.
    fn rank(&self) -> i32;

    /// Number of participants, fixed for the run.
    fn size(&self) -> i32;

    /// Block until every participant has called `barrier`.
    fn barrier(&self) -> Result<()>;

    /// Snapshot of rank and size.
    fn context(&self) -> ProcessContext {
        ProcessContext {
            rank: self.rank(),
            group_size: self.size(),
        }
    }
}

impl ProcessGroup for Communicator {
    fn rank(&self) -> i32 {
        Communicator::rank(self)
    }

    fn size(&self) -> i32 {
        Communicator::size(self)
    }

    fn barrier(&self) -> Result<()> {
        Communicator::barrier(self)
    }
}

/// Where this participant sits in the group. Taken once after init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessContext {
    /// Rank of this participant.
    pub rank: i32,
    /// Total number of participants.
    pub group_size: i32,
}

impl ProcessContext {
    /// True for the rank-0 participant.
    pub fn is_root(&self) -> bool {
        self.rank == 0
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Thread-backed process group for exercising the demos without mpiexec.

    use super::ProcessGroup;
    use crate::error::Result;
    use std::io::{self, Write};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    /// One participant of an in-process group.
    pub struct ThreadGroup {
        rank: i32,
        size: i32,
        barrier: Arc<Barrier>,
    }

    impl ProcessGroup for ThreadGroup {
        fn rank(&self) -> i32 {
            self.rank
        }

        fn size(&self) -> i32 {
            self.size
        }

        fn barrier(&self) -> Result<()> {
            self.barrier.wait();
            Ok(())
        }
    }

    /// `size` participants sharing one barrier, in rank order.
    pub fn thread_groups(size: i32) -> Vec<ThreadGroup> {
        let barrier = Arc::new(Barrier::new(size as usize));
        (0..size)
            .map(|rank| ThreadGroup {
                rank,
                size,
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    /// A line written by some rank, in global arrival order.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Line {
        pub rank: i32,
        pub text: String,
    }

    /// Writer that records each write as one line tagged with the rank.
    pub struct SharedLog {
        rank: i32,
        lines: Arc<Mutex<Vec<Line>>>,
    }

    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let text = String::from_utf8_lossy(buf)
                .trim_end_matches('\n')
                .to_string();
            self.lines.lock().unwrap().push(Line {
                rank: self.rank,
                text,
            });
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `body` on `size` threads forming one group and return every line
    /// they wrote, in the order the writes happened.
    pub fn run_group<F>(size: i32, body: F) -> Vec<Line>
    where
        F: Fn(&ThreadGroup, &mut SharedLog) -> Result<()> + Send + Sync + 'static,
    {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let body = Arc::new(body);

        let handles: Vec<_> = thread_groups(size)
            .into_iter()
            .map(|group| {
                let mut log = SharedLog {
                    rank: group.rank,
                    lines: Arc::clone(&lines),
                };
                let body = Arc::clone(&body);
                thread::spawn(move || body(&group, &mut log))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let lines = lines.lock().unwrap();
        lines.clone()
    }
}
