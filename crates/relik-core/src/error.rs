use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a solver session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

/// The session could not be constructed from its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Robot model error: {0}")]
    Robot(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

/// Which flat buffer a [`ContractError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Positions,
    Orientations,
    Tolerances,
    LinearVelocities,
    AngularVelocities,
    JointState,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Positions => "positions",
            Self::Orientations => "orientations",
            Self::Tolerances => "tolerances",
            Self::LinearVelocities => "linear velocities",
            Self::AngularVelocities => "angular velocities",
            Self::JointState => "joint state",
        };
        f.write_str(name)
    }
}

/// A caller sent buffers that break the session contract.
///
/// Copy + no allocation: raised on every malformed call in the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("{buffer} length {len} is not a multiple of stride {stride}")]
    Stride {
        buffer: BufferKind,
        stride: usize,
        len: usize,
    },

    #[error("{first} describe {first_count} end-effectors but {second} describe {second_count}")]
    EndEffectorMismatch {
        first: BufferKind,
        first_count: usize,
        second: BufferKind,
        second_count: usize,
    },

    #[error("robot has {expected} end-effectors, buffers describe {got}")]
    EndEffectorCount { expected: usize, got: usize },

    #[error("joint state must have {expected} values, got {got}")]
    JointStateLength { expected: usize, got: usize },

    #[error("{buffer} contain a non-finite value at index {index}")]
    NonFinite { buffer: BufferKind, index: usize },

    #[error("orientation of end-effector {end_effector} has zero norm")]
    DegenerateQuaternion { end_effector: usize },

    #[error("tolerance of end-effector {end_effector} axis {axis} is negative")]
    NegativeTolerance { end_effector: usize, axis: usize },
}

/// The optimizer failed or produced an unusable configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("no valid solution: joint {joint} is not finite")]
    NonFinite { joint: usize },

    #[error("optimizer returned {got} joint values, robot has {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("optimizer failed: {0}")]
    Failed(String),
}
