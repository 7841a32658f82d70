//! The solver session.
//!
//! A [`Session`] is Live from construction until it is dropped; dropping (or
//! [`Session::destroy`]) is the only way to end it, so use-after-destroy and
//! double-destroy cannot be written. All mutation goes through `&mut self`,
//! which confines a session to one caller at a time.

use tracing::{debug, info, warn};

use crate::buffer;
use crate::error::{ConfigError, ContractError, SessionError, SolverError};
use crate::history::JointHistory;
use crate::optimizer::Optimizer;
use crate::types::{EeGoal, Pose};

/// One configured robot + solver instance.
#[derive(Debug)]
pub struct Session<O: Optimizer> {
    optimizer: O,
    history: JointHistory,
    goals: Vec<EeGoal>,
}

impl<O: Optimizer> Session<O> {
    /// Start a session at the optimizer's initial configuration, with every
    /// end-effector goal anchored at its pose there.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Incompatible`] if the optimizer's initial
    /// state or forward kinematics disagree with its declared dimensions.
    pub fn new(optimizer: O) -> Result<Self, ConfigError> {
        let initial = optimizer.initial_state();
        if initial.len() != optimizer.dof() {
            return Err(ConfigError::Incompatible(format!(
                "initial state has {} values but the robot has {} joints",
                initial.len(),
                optimizer.dof()
            )));
        }
        let poses = optimizer.forward_kinematics(&initial);
        if poses.len() != optimizer.num_end_effectors() {
            return Err(ConfigError::Incompatible(format!(
                "forward kinematics returned {} poses for {} end-effectors",
                poses.len(),
                optimizer.num_end_effectors()
            )));
        }

        info!(
            optimizer = optimizer.name(),
            dof = optimizer.dof(),
            end_effectors = optimizer.num_end_effectors(),
            "solver session created"
        );

        Ok(Self {
            optimizer,
            history: JointHistory::new(initial),
            goals: poses.into_iter().map(EeGoal::at).collect(),
        })
    }

    /// Solve for absolute end-effector poses.
    ///
    /// `positions` holds `3N` values, `orientations` `4N` (`x, y, z, w`),
    /// `tolerances` `6N`. On success the session's joint state becomes the
    /// returned configuration.
    pub fn solve_position(
        &mut self,
        positions: &[f64],
        orientations: &[f64],
        tolerances: &[f64],
    ) -> Result<Vec<f64>, SessionError> {
        let goals = buffer::decode_pose_goals(
            positions,
            orientations,
            tolerances,
            self.num_end_effectors(),
        )
        .map_err(|e| rejected("solve_position", e))?;
        self.solve(goals)
    }

    /// Solve for goals moved by one velocity step from the current goals.
    ///
    /// `linear_velocities` holds `3N` position increments, `angular_velocities`
    /// `3N` scaled-axis rotation increments, `tolerances` `6N`. No timestep is
    /// applied: the increments are used as given.
    pub fn solve_velocity(
        &mut self,
        linear_velocities: &[f64],
        angular_velocities: &[f64],
        tolerances: &[f64],
    ) -> Result<Vec<f64>, SessionError> {
        let steps = buffer::decode_velocity_steps(
            linear_velocities,
            angular_velocities,
            tolerances,
            self.num_end_effectors(),
        )
        .map_err(|e| rejected("solve_velocity", e))?;
        let goals = self
            .goals
            .iter()
            .zip(&steps)
            .map(|(goal, step)| step.apply(goal))
            .collect();
        self.solve(goals)
    }

    /// Force the joint state to `joint_state`, discarding all warm-start
    /// history. Goals are re-anchored at the resulting end-effector poses.
    pub fn reset(&mut self, joint_state: &[f64]) -> Result<(), SessionError> {
        buffer::validate_joint_state(joint_state, self.dof())
            .map_err(|e| rejected("reset", e))?;

        self.history.reset(joint_state);
        self.goals = self
            .optimizer
            .forward_kinematics(joint_state)
            .into_iter()
            .map(EeGoal::at)
            .collect();
        self.optimizer.reset(joint_state);
        debug!(?joint_state, "session reset");
        Ok(())
    }

    /// End the session. Equivalent to dropping it.
    pub fn destroy(self) {
        info!(optimizer = self.optimizer.name(), "solver session destroyed");
    }

    /// Current joint configuration (the warm start for the next solve).
    pub fn joint_state(&self) -> &[f64] {
        self.history.current()
    }

    pub fn history(&self) -> &JointHistory {
        &self.history
    }

    /// Goals the last successful solve (or reset) committed.
    pub fn goals(&self) -> &[EeGoal] {
        &self.goals
    }

    /// Goal positions, flat `[x0, y0, z0, x1, ...]`.
    pub fn goal_positions(&self) -> Vec<f64> {
        buffer::flatten_positions(&self.goals)
    }

    /// End-effector poses at the current joint state.
    pub fn end_effector_poses(&self) -> Vec<Pose> {
        self.optimizer.forward_kinematics(self.history.current())
    }

    pub fn dof(&self) -> usize {
        self.optimizer.dof()
    }

    pub fn num_end_effectors(&self) -> usize {
        self.optimizer.num_end_effectors()
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Run the optimizer and commit its answer. Nothing changes on error.
    fn solve(&mut self, goals: Vec<EeGoal>) -> Result<Vec<f64>, SessionError> {
        let solution = self
            .optimizer
            .optimize(&self.history, &goals)
            .map_err(solver_failed)?;

        if solution.len() != self.dof() {
            return Err(solver_failed(SolverError::DimensionMismatch {
                expected: self.dof(),
                got: solution.len(),
            }));
        }
        if let Some(joint) = solution.iter().position(|v| !v.is_finite()) {
            return Err(solver_failed(SolverError::NonFinite { joint }));
        }

        self.history.update(solution.clone());
        self.goals = goals;
        Ok(solution)
    }
}

fn rejected(operation: &str, err: ContractError) -> SessionError {
    warn!(operation, error = %err, "request rejected");
    err.into()
}

fn solver_failed(err: SolverError) -> SessionError {
    warn!(error = %err, "solve failed");
    err.into()
}
