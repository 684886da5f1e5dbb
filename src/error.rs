//! Error types for mpi-debug-demos

use std::alloc::LayoutError;

use thiserror::Error;

use crate::ffi;

/// Result type for demo and MPI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for demo and MPI operations
#[derive(Error, Debug)]
pub enum Error {
    /// MPI has already been initialized
    #[error("MPI has already been initialized")]
    AlreadyInitialized,

    /// MPI call failed with an error code
    #[error("MPI error (code {code}): {message}")]
    Mpi {
        /// Raw MPI error code
        code: i32,
        /// Text from `MPI_Error_string`, empty if the runtime gave none
        message: String,
    },

    /// A buffer layout could not be computed
    #[error("invalid buffer layout: {0}")]
    Layout(#[from] LayoutError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an error from a non-zero MPI return code.
    pub fn from_code(code: i32) -> Self {
        Error::Mpi {
            code,
            message: error_string(code),
        }
    }

    /// Check an MPI return code, returning Ok(()) for success.
    pub fn check(code: i32) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Error::from_code(code))
        }
    }
}

fn error_string(code: i32) -> String {
    let mut buf = [0u8; 1024];
    let mut len: i32 = 0;
    let ret = unsafe {
        ffi::mpishim_error_string(code, buf.as_mut_ptr().cast(), buf.len() as i32, &mut len)
    };
    if ret != 0 {
        return String::new();
    }
    let len = (len.max(0) as usize).min(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}
