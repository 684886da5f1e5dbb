//! Safe wrappers for the MPI communicator operations the demos use.

use crate::error::{Error, Result};
use crate::ffi;
use std::marker::PhantomData;

/// An MPI communicator.
///
/// Only `MPI_COMM_WORLD` is exposed; the demos never split or duplicate it.
///
/// # Example
///
/// ```no_run
/// use mpi_debug_demos::Mpi;
///
/// let mpi = Mpi::init_with_args(std::env::args()).unwrap();
/// let world = mpi.world();
///
/// println!("I am rank {} of {}", world.rank(), world.size());
/// ```
#[derive(Clone)]
pub struct Communicator {
    handle: i32,
    /// Marker to prevent Send/Sync (MPI communicators are not thread-safe)
    _marker: PhantomData<*mut ()>,
}

impl Communicator {
    /// Get a handle to MPI_COMM_WORLD.
    pub(crate) fn world() -> Self {
        Communicator {
            handle: unsafe { ffi::mpishim_comm_world() },
            _marker: PhantomData,
        }
    }

    /// Get the rank of the calling process in this communicator.
    pub fn rank(&self) -> i32 {
        let mut rank: i32 = 0;
        unsafe { ffi::mpishim_comm_rank(self.handle, &mut rank) };
        rank
    }

    /// Get the number of processes in this communicator.
    pub fn size(&self) -> i32 {
        let mut size: i32 = 0;
        unsafe { ffi::mpishim_comm_size(self.handle, &mut size) };
        size
    }

    /// Get the processor name for this process.
    pub fn processor_name(&self) -> Result<String> {
        let mut buf = [0u8; 1024];
        let mut len: i32 = 0;
        let ret = unsafe {
            ffi::mpishim_get_processor_name(buf.as_mut_ptr().cast(), buf.len() as i32, &mut len)
        };
        Error::check(ret)?;
        let s = std::str::from_utf8(&buf[..len.max(0) as usize])
            .map_err(|_| Error::Internal("Invalid UTF-8 in processor name".into()))?;
        Ok(s.to_string())
    }

    /// Barrier synchronization.
    ///
    /// All processes in the communicator must call this function. No process
    /// will return until all processes have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        let ret = unsafe { ffi::mpishim_barrier(self.handle) };
        Error::check(ret)
    }
}
