//! `simple-memory`: an MPI hello world with planted memory defects.
//!
//! After the greeting every rank calls [`buggy_routine`], which contains three
//! defects for a memory checker to find:
//!
//! 1. an invalid write one element past a 10-integer heap block (done twice),
//! 2. a conditional jump on an uninitialized integer,
//! 3. the 10-integer block is never freed.
//!
//! Under `mpiexec -n 2 valgrind --leak-check=full target/debug/simple-memory`
//! each rank should report the invalid write at both sites, one
//! "uninitialised value" branch and 40 bytes definitely lost.
//!
//! The defects are the point of this program. Do not fix them.

use std::alloc::{self, Layout};
use std::io::Write;
use std::mem::MaybeUninit;
use std::ptr;

use crate::console;
use crate::error::Result;
use crate::group::{ProcessContext, ProcessGroup};

/// Element count of the heap block `buggy_routine` allocates.
pub const BUFFER_LEN: usize = 10;

/// The per-rank greeting line.
pub fn greeting(ctx: &ProcessContext) -> String {
    format!(
        "Hello World from process {} of {}",
        ctx.rank, ctx.group_size
    )
}

/// Print the greeting for this participant, then run [`buggy_routine`].
pub fn run<G, W>(group: &G, out: &mut W) -> Result<()>
where
    G: ProcessGroup + ?Sized,
    W: Write + ?Sized,
{
    say_hello(group, out);
    tracing::debug!("entering buggy routine");
    buggy_routine()?;
    tracing::debug!("buggy routine returned");
    Ok(())
}

/// The greeting half of [`run`]. Output is best-effort.
pub fn say_hello<G, W>(group: &G, out: &mut W)
where
    G: ProcessGroup + ?Sized,
    W: Write + ?Sized,
{
    let ctx = group.context();
    console::emit(out, &greeting(&ctx));
}

/// Allocates, overruns and leaks a 10-integer buffer, and branches on an
/// uninitialized value along the way.
#[inline(never)]
#[allow(unused_assignments)]
pub fn buggy_routine() -> Result<()> {
    let layout = Layout::array::<i32>(BUFFER_LEN)?;
    // SAFETY: none. The block is written past its end and never released.
    unsafe {
        let x = alloc::alloc(layout).cast::<i32>();
        if x.is_null() {
            alloc::handle_alloc_error(layout);
        }

        // invalid write: index 10 of a 10-element block
        ptr::write_volatile(x.add(BUFFER_LEN), 0);

        let mut j: i32 = 0;
        let sum_slot = MaybeUninit::<i32>::uninit();
        let mut sum: i32 = ptr::read_volatile(sum_slot.as_ptr());
        // conditional jump on an uninitialized value
        if sum > 0 {
            j = 10;
        }
        j = 0;
        while j < 10 {
            sum = sum.wrapping_add(j);
            j += 1;
        }
        let _ = std::hint::black_box(sum);

        // invalid write again
        ptr::write_volatile(x.add(BUFFER_LEN), 0);
    }
    // x goes out of scope without alloc::dealloc: the block leaks
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::testing::run_group;

    #[test]
    fn greeting_wording() {
        let ctx = ProcessContext {
            rank: 2,
            group_size: 4,
        };
        assert_eq!(greeting(&ctx), "Hello World from process 2 of 4");
    }

    #[test]
    fn every_rank_says_hello_once() {
        let lines = run_group(4, |group, out| {
            say_hello(group, out);
            Ok(())
        });
        assert_eq!(lines.len(), 4);
        for rank in 0..4 {
            let expected = format!("Hello World from process {rank} of 4");
            let hits = lines
                .iter()
                .filter(|l| l.rank == rank && l.text == expected)
                .count();
            assert_eq!(hits, 1, "rank {rank}");
        }
    }

    #[test]
    fn buffer_is_forty_bytes() {
        let layout = Layout::array::<i32>(BUFFER_LEN).unwrap();
        assert_eq!(layout.size(), 40);
    }
}
