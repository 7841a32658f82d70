//! Error types for URDF loading.

use std::path::PathBuf;

/// Errors that can occur while turning URDF text into a [`RobotModel`](crate::RobotModel).
#[derive(Debug, thiserror::Error)]
pub enum UrdfError {
    /// Failed to read the URDF file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse URDF XML content.
    #[error("URDF parse error: {0}")]
    Parse(String),

    /// A referenced link was not found in the model.
    #[error("missing link: {0}")]
    MissingLink(String),

    /// A referenced joint was not found in the model.
    #[error("missing joint: {0}")]
    MissingJoint(String),

    /// Joint type the kinematic model cannot represent.
    #[error("unsupported joint type: {0}")]
    UnsupportedJointType(String),

    /// The tip link cannot be reached by walking down from the base link.
    #[error("no kinematic path from {base} to {tip}")]
    NoPath { base: String, tip: String },

    /// The URDF has no root link (no link that is never a child).
    #[error("no root link found")]
    NoRootLink,
}
