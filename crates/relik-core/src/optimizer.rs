//! The external solving engine, seen from the session.

use crate::error::SolverError;
use crate::history::JointHistory;
use crate::types::{EeGoal, Pose};

/// A configured robot + optimizer that a [`Session`](crate::Session) drives.
///
/// Implementations own the kinematic model and the optimization algorithm.
/// The session owns the joint state and the goals, validates every buffer
/// before calling in, and only commits a result the optimizer returned `Ok`.
pub trait Optimizer {
    /// Number of joint values in a configuration.
    fn dof(&self) -> usize;

    /// Number of end-effectors goals are given for.
    fn num_end_effectors(&self) -> usize;

    /// Configuration a fresh session starts from.
    fn initial_state(&self) -> Vec<f64>;

    /// End-effector poses at configuration `q`, one per end-effector.
    fn forward_kinematics(&self, q: &[f64]) -> Vec<Pose>;

    /// Find a configuration that moves each end-effector toward its goal,
    /// starting from `history.current()`.
    ///
    /// `goals.len() == self.num_end_effectors()` is guaranteed by the caller.
    fn optimize(&mut self, history: &JointHistory, goals: &[EeGoal]) -> Result<Vec<f64>, SolverError>;

    /// Drop any internal warm-start state. Called when the session is reset.
    fn reset(&mut self, _joint_state: &[f64]) {}

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn dof(&self) -> usize {
        (**self).dof()
    }

    fn num_end_effectors(&self) -> usize {
        (**self).num_end_effectors()
    }

    fn initial_state(&self) -> Vec<f64> {
        (**self).initial_state()
    }

    fn forward_kinematics(&self, q: &[f64]) -> Vec<Pose> {
        (**self).forward_kinematics(q)
    }

    fn optimize(&mut self, history: &JointHistory, goals: &[EeGoal]) -> Result<Vec<f64>, SolverError> {
        (**self).optimize(history, goals)
    }

    fn reset(&mut self, joint_state: &[f64]) {
        (**self).reset(joint_state);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
