//! MPI hello world with planted memory defects, for memory checkers.
//!
//! Run with: mpiexec -n 2 valgrind --leak-check=full target/debug/simple-memory

use std::io;

use mpi_debug_demos::{leaky, telemetry, Mpi, Result};

fn main() -> Result<()> {
    telemetry::init();

    // MPI is finalized when `mpi` is dropped
    let mpi = Mpi::init_with_args(std::env::args())?;
    let world = mpi.world();
    tracing::debug!(
        rank = world.rank(),
        size = world.size(),
        host = %world.processor_name().unwrap_or_default(),
        "joined process group"
    );

    leaky::run(&world, &mut io::stdout())?;
    Ok(())
}
