//! Caller-owned `f64` arrays.

use std::ptr;

/// A heap array of `f64` handed to the caller.
///
/// `data` is `NULL` exactly when `len == 0`. Release with
/// [`relik_buffer_free`].
#[repr(C)]
#[derive(Debug)]
pub struct RelikBuffer {
    pub data: *mut f64,
    pub len: usize,
}

impl RelikBuffer {
    pub const fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    /// View the contents.
    ///
    /// # Safety
    ///
    /// `self` must have been produced by [`RelikBuffer::from`] and not freed.
    pub unsafe fn as_slice(&self) -> &[f64] {
        if self.data.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.data, self.len)
    }
}

impl From<Vec<f64>> for RelikBuffer {
    fn from(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        let len = values.len();
        let data = Box::into_raw(values.into_boxed_slice()).cast::<f64>();
        Self { data, len }
    }
}

/// Frees a buffer returned by a solve call. Freeing an empty buffer is a
/// no-op.
///
/// # Safety
///
/// `buffer` must have been written by relik and not freed before.
#[no_mangle]
pub unsafe extern "C" fn relik_buffer_free(buffer: RelikBuffer) {
    if buffer.data.is_null() {
        return;
    }
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
        buffer.data,
        buffer.len,
    )));
}
