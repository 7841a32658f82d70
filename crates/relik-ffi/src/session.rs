//! Session lifecycle and solve calls.

use std::ffi::{c_char, CStr};
use std::path::Path;
use std::ptr;

use relik_core::SessionError;
use relik_ik::RelaxedIkSession;
use tracing::error;

use crate::buffer::RelikBuffer;
use crate::status::RelikStatus;

/// Opaque session handle.
pub struct RelikSession {
    inner: RelaxedIkSession,
}

/// Creates a session and writes its handle to `*out`.
///
/// A `NULL` `settings_path` selects the built-in arm. On failure `*out` is
/// set to `NULL` and the cause is logged.
///
/// # Panics
///
/// This function will panic if `out` is null.
///
/// # Safety
///
/// `settings_path` must be `NULL` or a valid NUL-terminated string, and
/// `out` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn relik_session_new(
    settings_path: *const c_char,
    out: *mut *mut RelikSession,
) -> RelikStatus {
    assert!(
        !out.is_null(),
        "called `relik_session_new` with `out` as null pointer"
    );
    *out = ptr::null_mut();

    let path = if settings_path.is_null() {
        None
    } else {
        match CStr::from_ptr(settings_path).to_str() {
            Ok(s) => Some(Path::new(s)),
            Err(_) => return RelikStatus::InvalidUtf8,
        }
    };

    match relik_ik::create(path) {
        Ok(inner) => {
            *out = Box::into_raw(Box::new(RelikSession { inner }));
            RelikStatus::Ok
        }
        Err(err) => {
            error!(error = %err, "failed to create session");
            RelikStatus::from(&err)
        }
    }
}

/// Destroys a session. `NULL` is a no-op.
///
/// # Safety
///
/// `session` must be `NULL` or a handle from [`relik_session_new`] that has
/// not been freed.
#[no_mangle]
pub unsafe extern "C" fn relik_session_free(session: *mut RelikSession) {
    if session.is_null() {
        return;
    }
    let session = *Box::from_raw(session);
    session.inner.destroy();
}

/// Number of joints in a configuration.
///
/// # Panics
///
/// This function will panic if `session` is null.
///
/// # Safety
///
/// `session` must be a live handle from [`relik_session_new`].
#[no_mangle]
pub unsafe extern "C" fn relik_dof(session: *const RelikSession) -> usize {
    session_ref(session, "relik_dof").inner.dof()
}

/// Number of end-effectors each solve call must describe.
///
/// # Panics
///
/// This function will panic if `session` is null.
///
/// # Safety
///
/// `session` must be a live handle from [`relik_session_new`].
#[no_mangle]
pub unsafe extern "C" fn relik_num_end_effectors(session: *const RelikSession) -> usize {
    session_ref(session, "relik_num_end_effectors")
        .inner
        .num_end_effectors()
}

/// Solves for absolute goals: `3N` positions, `4N` quaternions
/// (`x, y, z, w`) and `6N` tolerances.
///
/// On success the joint configuration is written to `*out`, which the caller
/// owns. On failure `*out` is an empty buffer and the session is unchanged.
///
/// # Panics
///
/// This function will panic if `session` or `out` is null, or if an array
/// pointer is null with a non-zero length.
///
/// # Safety
///
/// Each array pointer must be valid for reads of its length, `session` must
/// be a live handle used by no other thread, and `out` must be valid for
/// writes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn relik_solve_position(
    session: *mut RelikSession,
    positions: *const f64,
    positions_len: usize,
    orientations: *const f64,
    orientations_len: usize,
    tolerances: *const f64,
    tolerances_len: usize,
    out: *mut RelikBuffer,
) -> RelikStatus {
    const NAME: &str = "relik_solve_position";
    let session = session_mut(session, NAME);
    let result = session.inner.solve_position(
        array(positions, positions_len, NAME, "positions"),
        array(orientations, orientations_len, NAME, "orientations"),
        array(tolerances, tolerances_len, NAME, "tolerances"),
    );
    write_result(result, out, NAME)
}

/// Solves for goals moved by one step: `3N` linear increments, `3N`
/// scaled-axis rotation increments and `6N` tolerances.
///
/// # Panics
///
/// This function will panic if `session` or `out` is null, or if an array
/// pointer is null with a non-zero length.
///
/// # Safety
///
/// Same requirements as [`relik_solve_position`].
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn relik_solve_velocity(
    session: *mut RelikSession,
    linear: *const f64,
    linear_len: usize,
    angular: *const f64,
    angular_len: usize,
    tolerances: *const f64,
    tolerances_len: usize,
    out: *mut RelikBuffer,
) -> RelikStatus {
    const NAME: &str = "relik_solve_velocity";
    let session = session_mut(session, NAME);
    let result = session.inner.solve_velocity(
        array(linear, linear_len, NAME, "linear"),
        array(angular, angular_len, NAME, "angular"),
        array(tolerances, tolerances_len, NAME, "tolerances"),
    );
    write_result(result, out, NAME)
}

/// Forces the joint state to `joint_state` (`D` values) and clears the
/// motion history.
///
/// # Panics
///
/// This function will panic if `session` is null, or if `joint_state` is
/// null with a non-zero length.
///
/// # Safety
///
/// `joint_state` must be valid for reads of `len` values and `session` must
/// be a live handle used by no other thread.
#[no_mangle]
pub unsafe extern "C" fn relik_reset(
    session: *mut RelikSession,
    joint_state: *const f64,
    len: usize,
) -> RelikStatus {
    const NAME: &str = "relik_reset";
    let session = session_mut(session, NAME);
    match session.inner.reset(array(joint_state, len, NAME, "joint_state")) {
        Ok(()) => RelikStatus::Ok,
        Err(err) => RelikStatus::from(&err),
    }
}

unsafe fn session_ref<'a>(session: *const RelikSession, name: &str) -> &'a RelikSession {
    assert!(
        !session.is_null(),
        "called `{name}` with `session` as null pointer"
    );
    &*session
}

unsafe fn session_mut<'a>(session: *mut RelikSession, name: &str) -> &'a mut RelikSession {
    assert!(
        !session.is_null(),
        "called `{name}` with `session` as null pointer"
    );
    &mut *session
}

unsafe fn array<'a>(data: *const f64, len: usize, name: &str, arg: &str) -> &'a [f64] {
    if len == 0 {
        return &[];
    }
    assert!(
        !data.is_null(),
        "called `{name}` with `{arg}` as null pointer and length {len}"
    );
    std::slice::from_raw_parts(data, len)
}

unsafe fn write_result(
    result: Result<Vec<f64>, SessionError>,
    out: *mut RelikBuffer,
    name: &str,
) -> RelikStatus {
    assert!(!out.is_null(), "called `{name}` with `out` as null pointer");
    match result {
        Ok(solution) => {
            out.write(RelikBuffer::from(solution));
            RelikStatus::Ok
        }
        Err(err) => {
            out.write(RelikBuffer::empty());
            RelikStatus::from(&err)
        }
    }
}
