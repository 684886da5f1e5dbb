//! Barrier and nested-call demo, for stepping through with a parallel debugger.
//!
//! Run with: mpiexec -n 4 target/debug/simple-mpi
//!
//! Set `MPI_DEMO_TICK_MS` to shorten rank 0's three sleeps.

use std::io;

use mpi_debug_demos::barrier_demo::{self, Phase};
use mpi_debug_demos::{telemetry, DemoConfig, Mpi, Result};

fn main() -> Result<()> {
    telemetry::init();
    let config = DemoConfig::from_env();

    let mpi = Mpi::init_with_args(std::env::args())?;
    let world = mpi.world();
    if world.rank() == 0 {
        match Mpi::version() {
            Ok(version) => tracing::debug!(%version, "MPI library"),
            Err(e) => tracing::warn!(error = %e, "could not query MPI library version"),
        }
    }

    let mut me = barrier_demo::run(&world, &config, &mut io::stdout())?;

    drop(mpi);
    me.advance(Phase::Finalized)?;
    tracing::debug!(rank = me.context().rank, "finalized");
    Ok(())
}
