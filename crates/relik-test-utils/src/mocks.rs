//! Fake optimizers.

use std::collections::VecDeque;

use nalgebra::{UnitQuaternion, Vector3};
use relik_core::{EeGoal, JointHistory, Optimizer, Pose, SolverError};

// ---------------------------------------------------------------------------
// PointOptimizer
// ---------------------------------------------------------------------------

/// A robot made of free-floating points.
///
/// Each end-effector owns three joints that *are* its position, so forward
/// kinematics is the identity and solving jumps straight to the goals.
/// Orientations are ignored. Records what it was asked.
#[derive(Debug, Clone)]
pub struct PointOptimizer {
    end_effectors: usize,
    calls: usize,
    last_goals: Vec<EeGoal>,
    last_start: Vec<f64>,
    resets: usize,
}

impl PointOptimizer {
    pub const fn new(end_effectors: usize) -> Self {
        Self {
            end_effectors,
            calls: 0,
            last_goals: Vec::new(),
            last_start: Vec::new(),
            resets: 0,
        }
    }

    /// Number of `optimize` calls so far.
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Number of `reset` calls so far.
    pub const fn resets(&self) -> usize {
        self.resets
    }

    /// Goals passed to the most recent `optimize` call.
    pub fn last_goals(&self) -> &[EeGoal] {
        &self.last_goals
    }

    /// Warm start passed to the most recent `optimize` call.
    pub fn last_start(&self) -> &[f64] {
        &self.last_start
    }
}

impl Optimizer for PointOptimizer {
    fn dof(&self) -> usize {
        3 * self.end_effectors
    }

    fn num_end_effectors(&self) -> usize {
        self.end_effectors
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![0.0; self.dof()]
    }

    fn forward_kinematics(&self, q: &[f64]) -> Vec<Pose> {
        q.chunks_exact(3)
            .map(|p| Pose::new(Vector3::new(p[0], p[1], p[2]), UnitQuaternion::identity()))
            .collect()
    }

    fn optimize(&mut self, history: &JointHistory, goals: &[EeGoal]) -> Result<Vec<f64>, SolverError> {
        self.calls += 1;
        self.last_goals = goals.to_vec();
        self.last_start = history.current().to_vec();
        Ok(goals
            .iter()
            .flat_map(|g| g.pose.position.iter().copied())
            .collect())
    }

    fn reset(&mut self, _joint_state: &[f64]) {
        self.resets += 1;
    }

    fn name(&self) -> &str {
        "PointOptimizer"
    }
}

// ---------------------------------------------------------------------------
// ScriptedOptimizer
// ---------------------------------------------------------------------------

/// Returns pre-recorded answers in order, then fails.
#[derive(Debug, Clone)]
pub struct ScriptedOptimizer {
    dof: usize,
    end_effectors: usize,
    responses: VecDeque<Result<Vec<f64>, SolverError>>,
}

impl ScriptedOptimizer {
    pub fn new(dof: usize, end_effectors: usize) -> Self {
        Self {
            dof,
            end_effectors,
            responses: VecDeque::new(),
        }
    }

    /// Queue an answer.
    #[must_use]
    pub fn then(mut self, response: Result<Vec<f64>, SolverError>) -> Self {
        self.responses.push_back(response);
        self
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Optimizer for ScriptedOptimizer {
    fn dof(&self) -> usize {
        self.dof
    }

    fn num_end_effectors(&self) -> usize {
        self.end_effectors
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![0.0; self.dof]
    }

    fn forward_kinematics(&self, _q: &[f64]) -> Vec<Pose> {
        vec![Pose::identity(); self.end_effectors]
    }

    fn optimize(&mut self, _history: &JointHistory, _goals: &[EeGoal]) -> Result<Vec<f64>, SolverError> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(SolverError::Failed("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "ScriptedOptimizer"
    }
}

// ---------------------------------------------------------------------------
// FailingOptimizer
// ---------------------------------------------------------------------------

/// An optimizer that never finds a solution.
#[derive(Debug, Clone, Copy)]
pub struct FailingOptimizer {
    pub dof: usize,
}

impl Optimizer for FailingOptimizer {
    fn dof(&self) -> usize {
        self.dof
    }

    fn num_end_effectors(&self) -> usize {
        1
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![0.0; self.dof]
    }

    fn forward_kinematics(&self, _q: &[f64]) -> Vec<Pose> {
        vec![Pose::identity()]
    }

    fn optimize(&mut self, _history: &JointHistory, _goals: &[EeGoal]) -> Result<Vec<f64>, SolverError> {
        Err(SolverError::Failed("infeasible".into()))
    }

    fn name(&self) -> &str {
        "FailingOptimizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_optimizer_fk_is_identity() {
        let opt = PointOptimizer::new(2);
        let poses = opt.forward_kinematics(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[1].position, Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn scripted_optimizer_replays_then_fails() {
        let mut opt = ScriptedOptimizer::new(2, 1).then(Ok(vec![1.0, 2.0]));
        let history = JointHistory::new(vec![0.0; 2]);
        assert_eq!(opt.optimize(&history, &[]).unwrap(), vec![1.0, 2.0]);
        assert_eq!(opt.remaining(), 0);
        assert!(opt.optimize(&history, &[]).is_err());
    }
}
