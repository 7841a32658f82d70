//! Status codes returned across the C boundary.

use std::ffi::{c_char, CStr};

use relik_core::{ConfigError, SessionError};

/// Outcome of a fallible call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelikStatus {
    Ok = 0,
    /// Buffer lengths, strides or values broke the session contract.
    ContractViolation = 1,
    /// The optimizer could not produce a configuration.
    SolverFailure = 2,
    /// The settings could not be loaded or describe an invalid robot.
    ConfigurationFailure = 3,
    /// The settings path is not valid UTF-8.
    InvalidUtf8 = 4,
}

impl RelikStatus {
    pub fn message(self) -> &'static CStr {
        match self {
            Self::Ok => c"ok",
            Self::ContractViolation => c"buffers violate the session contract",
            Self::SolverFailure => c"solver failed to find a configuration",
            Self::ConfigurationFailure => c"configuration could not be loaded",
            Self::InvalidUtf8 => c"settings path is not valid UTF-8",
        }
    }
}

impl From<&SessionError> for RelikStatus {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Config(_) => Self::ConfigurationFailure,
            SessionError::Contract(_) => Self::ContractViolation,
            SessionError::Solver(_) => Self::SolverFailure,
        }
    }
}

impl From<&ConfigError> for RelikStatus {
    fn from(_: &ConfigError) -> Self {
        Self::ConfigurationFailure
    }
}

/// Static, NUL-terminated description of `status`. Never free it.
#[no_mangle]
pub extern "C" fn relik_status_message(status: RelikStatus) -> *const c_char {
    status.message().as_ptr()
}
