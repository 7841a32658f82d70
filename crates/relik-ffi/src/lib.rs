//! # relik FFI
//!
//! C-compatible bindings for relik solver sessions.
//!
//! ## Conventions
//!
//! 1.  **Opaque handles**: a session is a `RelikSession*` created by
//!     [`relik_session_new`] and released by [`relik_session_free`]. The host
//!     never touches its fields.
//! 2.  **Caller-owned results**: every solve writes a fresh [`RelikBuffer`]
//!     that stays valid until the caller passes it to [`relik_buffer_free`],
//!     regardless of later calls on the session.
//! 3.  **Status codes**: recoverable failures (bad buffers, solver failure,
//!     bad configuration) come back as a [`RelikStatus`]. Passing `NULL`
//!     where a handle or non-empty array is required aborts the process.
//! 4.  **One caller at a time**: a session must not be used from two threads
//!     concurrently. Distinct sessions are independent.

#![allow(unsafe_code)]

pub mod buffer;
pub mod session;
pub mod status;

pub use buffer::RelikBuffer;
pub use session::RelikSession;
pub use status::RelikStatus;

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `warn`). Calling it again is a no-op.
#[no_mangle]
pub extern "C" fn relik_init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Fails only if a global subscriber is already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
