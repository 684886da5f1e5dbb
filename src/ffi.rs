//! Raw FFI bindings to the C shim in `csrc/mpishim.c`.
//!
//! These are low-level unsafe functions. Use the safe wrappers in the parent module.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int};

// Type aliases matching the C header
pub type int32_t = i32;

extern "C" {
    // ============================================================
    // Initialization and Finalization
    // ============================================================

    pub fn mpishim_init(argc: c_int, argv: *mut *mut c_char) -> c_int;
    pub fn mpishim_finalize() -> c_int;

    // ============================================================
    // Communicator Operations
    // ============================================================

    pub fn mpishim_comm_world() -> int32_t;
    pub fn mpishim_comm_rank(comm: int32_t, rank: *mut int32_t) -> c_int;
    pub fn mpishim_comm_size(comm: int32_t, size: *mut int32_t) -> c_int;
    pub fn mpishim_barrier(comm: int32_t) -> c_int;

    // ============================================================
    // Utility Functions
    // ============================================================

    pub fn mpishim_get_version(version: *mut c_char, capacity: int32_t, len: *mut int32_t)
        -> c_int;
    pub fn mpishim_get_processor_name(
        name: *mut c_char,
        capacity: int32_t,
        len: *mut int32_t,
    ) -> c_int;
    pub fn mpishim_error_string(
        code: c_int,
        message: *mut c_char,
        capacity: int32_t,
        len: *mut int32_t,
    ) -> c_int;
}
