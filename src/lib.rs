//! # mpi-debug-demos
//!
//! Two small MPI programs that parallel debuggers and memory checkers are
//! pointed at, plus the thin MPI binding layer they run on.
//!
//! - `simple-memory`: hello world that calls a routine with a heap overrun,
//!   an uninitialized read and a leak ([`leaky`]).
//! - `simple-mpi`: rank-0 sleep loop, two barriers and a nested call chain
//!   ([`barrier_demo`]).
//!
//! Both programs are written against the [`ProcessGroup`] trait so their
//! ordering rules can be unit tested on threads without an MPI launcher.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mpi_debug_demos::{barrier_demo, DemoConfig, Mpi};
//!
//! fn main() -> Result<(), mpi_debug_demos::Error> {
//!     let mpi = Mpi::init_with_args(std::env::args())?;
//!     let world = mpi.world();
//!     let config = DemoConfig::from_env();
//!     barrier_demo::run(&world, &config, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! Run with `mpiexec -n 4 target/debug/simple-mpi`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod barrier_demo;
mod comm;
mod config;
pub mod console;
mod error;
mod ffi;
mod group;
pub mod leaky;
pub mod telemetry;

pub use comm::Communicator;
pub use config::DemoConfig;
pub use error::{Error, Result};
pub use group::{ProcessContext, ProcessGroup};

use std::ffi::{c_char, CString};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag tracking whether MPI has been initialized
static MPI_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// MPI environment handle.
///
/// There can only be one instance of this type at a time. When dropped, it
/// finalizes MPI.
///
/// ```no_run
/// use mpi_debug_demos::Mpi;
///
/// let mpi = Mpi::init_with_args(std::env::args()).expect("Failed to initialize MPI");
/// let world = mpi.world();
/// println!("Running on {} processes", world.size());
/// // MPI is finalized when `mpi` goes out of scope
/// ```
pub struct Mpi {
    /// Argument strings handed to `MPI_Init`; the runtime may keep pointers
    /// into them until finalize.
    _args: Vec<CString>,
    /// Marker to make Mpi !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl Mpi {
    /// Initialize MPI, forwarding the command line to the runtime.
    ///
    /// The demos do not interpret any argument themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized, if an argument contains
    /// an interior NUL byte, or if initialization fails.
    pub fn init_with_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let args = args
            .into_iter()
            .map(CString::new)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Internal(format!("argument contains NUL byte: {e}")))?;

        if MPI_INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr().cast_mut()).collect();
        argv.push(std::ptr::null_mut());

        let ret = unsafe { ffi::mpishim_init(args.len() as i32, argv.as_mut_ptr()) };
        if ret != 0 {
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(Error::from_code(ret));
        }

        Ok(Mpi {
            _args: args,
            _marker: PhantomData,
        })
    }

    /// Get a handle to `MPI_COMM_WORLD`.
    pub fn world(&self) -> Communicator {
        Communicator::world()
    }

    /// Get the MPI library version string.
    pub fn version() -> Result<String> {
        let mut buf = vec![0u8; 8192];
        let mut len: i32 = 0;
        let ret = unsafe {
            ffi::mpishim_get_version(buf.as_mut_ptr().cast(), buf.len() as i32, &mut len)
        };
        Error::check(ret)?;

        buf.truncate(len.max(0) as usize);
        let s = String::from_utf8(buf)
            .map_err(|_| Error::Internal("Invalid UTF-8 in version string".into()))?;
        Ok(s.trim_end_matches(['\0', '\n']).to_string())
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        if MPI_INITIALIZED.load(Ordering::SeqCst) {
            let ret = unsafe { ffi::mpishim_finalize() };
            if ret != 0 {
                tracing::warn!(code = ret, "MPI_Finalize failed");
            }
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
        }
    }
}

// Mpi is not Send or Sync - MPI must be used from the thread that initialized it.
// This is enforced by PhantomData<*const ()> in the struct.
