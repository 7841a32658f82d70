//! relik-ik: relaxed inverse kinematics for relik sessions.
//!
//! Provides [`RelaxedIk`], an [`Optimizer`](relik_core::Optimizer) that
//! treats every end-effector goal as a soft, per-axis term alongside joint
//! limits, motion smoothness and manipulability, and [`create`] to open a
//! session from a settings file or the built-in arm.
//!
//! ```no_run
//! let mut session = relik_ik::create(None)?;
//! session.reset(&[0.0; 6])?;
//! let q = session.solve_position(&[0.5, 0.0, 0.3], &[0.0, 0.0, 0.0, 1.0], &[0.0; 6])?;
//! assert_eq!(q.len(), 6);
//! # Ok::<(), relik_core::SessionError>(())
//! ```

pub mod chain;
pub mod config;
pub mod objective;
pub mod relaxed;
pub mod robot;
pub mod solver;

use std::path::Path;

use relik_core::{ConfigError, Session};

pub use chain::KinematicChain;
pub use config::{Settings, SolverSettings, Weights, DEFAULT_ARM_URDF};
pub use relaxed::RelaxedIk;
pub use robot::Robot;

/// A session driven by the relaxed IK optimizer.
pub type RelaxedIkSession = Session<RelaxedIk>;

/// Open a session from a settings file, or the built-in arm when `None`.
pub fn create(settings: Option<&Path>) -> Result<RelaxedIkSession, ConfigError> {
    let settings = match settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    create_with(&settings)
}

/// Open a session from settings already in memory.
pub fn create_with(settings: &Settings) -> Result<RelaxedIkSession, ConfigError> {
    Session::new(RelaxedIk::from_settings(settings)?)
}
