//! The default [`Optimizer`]: relaxed IK over a URDF robot.

use relik_core::{ConfigError, EeGoal, JointHistory, Optimizer, Pose, SolverError};
use tracing::{debug, info};

use crate::config::{Settings, Weights};
use crate::objective::Objective;
use crate::robot::Robot;
use crate::solver::ProjectedGradient;

/// Relaxed IK solver bound to one robot.
#[derive(Debug, Clone)]
pub struct RelaxedIk {
    robot: Robot,
    solver: ProjectedGradient,
    weights: Weights,
    starting_config: Vec<f64>,
}

impl RelaxedIk {
    /// Build from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let model = settings.load_model()?;
        let robot = Robot::from_model(
            &model,
            &settings.base_links,
            &settings.ee_links,
            settings.joint_ordering.as_deref(),
        )?;

        let starting_config = match &settings.starting_config {
            Some(start) if start.len() != robot.dof() => {
                return Err(ConfigError::InvalidValue {
                    field: "starting_config".into(),
                    message: format!(
                        "robot has {} joints, starting_config has {} values",
                        robot.dof(),
                        start.len()
                    ),
                });
            }
            Some(start) => start.clone(),
            None => vec![0.0; robot.dof()],
        };

        info!(
            robot = %model.name,
            dof = robot.dof(),
            chains = robot.num_chains(),
            joints = ?robot.joint_names(),
            "robot loaded"
        );

        Ok(Self {
            robot,
            solver: ProjectedGradient::new(settings.solver.clone()),
            weights: settings.weights.clone(),
            starting_config,
        })
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }
}

impl Optimizer for RelaxedIk {
    fn dof(&self) -> usize {
        self.robot.dof()
    }

    fn num_end_effectors(&self) -> usize {
        self.robot.num_chains()
    }

    fn initial_state(&self) -> Vec<f64> {
        self.starting_config.clone()
    }

    fn forward_kinematics(&self, q: &[f64]) -> Vec<Pose> {
        self.robot.end_effector_poses(q)
    }

    fn optimize(&mut self, history: &JointHistory, goals: &[EeGoal]) -> Result<Vec<f64>, SolverError> {
        if history.dof() != self.robot.dof() {
            return Err(SolverError::DimensionMismatch {
                expected: self.robot.dof(),
                got: history.dof(),
            });
        }

        let objective = Objective::new(&self.robot, history, goals, &self.weights);
        let minimum = self.solver.minimize(
            |q| objective.value(q),
            history.current(),
            self.robot.lower_limits(),
            self.robot.upper_limits(),
        );

        debug!(
            iterations = minimum.iterations,
            converged = minimum.converged,
            value = minimum.value,
            "objective minimized"
        );

        if !minimum.value.is_finite() {
            return Err(SolverError::Failed(format!(
                "objective is not finite ({}) after {} iterations",
                minimum.value, minimum.iterations
            )));
        }
        match minimum.x.iter().position(|v| !v.is_finite()) {
            Some(joint) => Err(SolverError::NonFinite { joint }),
            None => Ok(minimum.x),
        }
    }

    fn name(&self) -> &str {
        "relaxed-ik"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arm_has_six_joints_and_one_end_effector() {
        let ik = RelaxedIk::from_settings(&Settings::default()).unwrap();
        assert_eq!(ik.dof(), 6);
        assert_eq!(ik.num_end_effectors(), 1);
        assert_eq!(ik.initial_state(), vec![0.0; 6]);
    }

    #[test]
    fn default_arm_points_straight_up_at_zero() {
        let ik = RelaxedIk::from_settings(&Settings::default()).unwrap();
        let pose = ik.forward_kinematics(&[0.0; 6])[0];
        // 0.05 + 0.2 + 0.3 + 0.1 + 0.2 + 0.06
        assert!((pose.position.z - 0.91).abs() < 1e-9);
        assert!(pose.position.x.abs() < 1e-12);
        assert!(pose.orientation.angle() < 1e-12);
    }

    #[test]
    fn starting_config_length_is_checked() {
        let settings = Settings {
            starting_config: Some(vec![0.0; 5]),
            ..Settings::default()
        };
        let err = RelaxedIk::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "starting_config"));
    }

    #[test]
    fn unknown_end_effector_is_rejected() {
        let settings = Settings {
            ee_links: vec!["gripper".into()],
            ..Settings::default()
        };
        assert!(matches!(
            RelaxedIk::from_settings(&settings),
            Err(ConfigError::Robot(_))
        ));
    }

    #[test]
    fn history_of_wrong_size_is_a_dimension_mismatch() {
        let mut ik = RelaxedIk::from_settings(&Settings::default()).unwrap();
        let history = JointHistory::new(vec![0.0; 4]);
        let err = ik.optimize(&history, &[EeGoal::default()]).unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { expected: 6, got: 4 }));
    }

    const WHEEL: &str = r#"
        <robot name="wheel">
            <link name="base"/>
            <link name="rim"/>
            <joint name="spin" type="continuous">
                <parent link="base"/><child link="rim"/>
                <origin xyz="0.1 0 0"/><axis xyz="0 0 1"/>
            </joint>
        </robot>
    "#;

    #[test]
    fn non_finite_objective_is_a_failure() {
        let settings = Settings {
            urdf: Some(WHEEL.into()),
            ee_links: vec!["rim".into()],
            ..Settings::default()
        };
        let mut ik = RelaxedIk::from_settings(&settings).unwrap();
        let history = JointHistory::new(vec![0.0]);
        // Squared error overflows
        let goal = EeGoal::at(Pose::new(
            nalgebra::Vector3::new(1e200, 0.0, 0.0),
            nalgebra::UnitQuaternion::identity(),
        ));
        let err = ik.optimize(&history, &[goal]).unwrap_err();
        assert!(matches!(err, SolverError::Failed(_)));
    }

    #[test]
    fn holding_the_current_pose_barely_moves() {
        let mut ik = RelaxedIk::from_settings(&Settings::default()).unwrap();
        let q = [0.3, 0.4, 0.6, 0.2, -0.5, 0.1];
        let goal = EeGoal::at(ik.forward_kinematics(&q)[0]);
        let history = JointHistory::new(q.to_vec());
        let x = ik.optimize(&history, &[goal]).unwrap();
        for (a, b) in x.iter().zip(&q) {
            assert!((a - b).abs() < 0.05, "{x:?} drifted from {q:?}");
        }
    }
}
