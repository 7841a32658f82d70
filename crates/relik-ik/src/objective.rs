//! Relaxed IK objective.
//!
//! Every goal is a soft term. Position and rotation errors are scored per
//! axis with a "groove" when the tolerance band is tight and a flat-bottomed
//! "swamp groove" when the band is wide, so any pose inside the band is
//! equally good. Smoothness terms penalize joint velocity, acceleration and
//! jerk against the session's history, and a manipulability term keeps the
//! arm away from singularities.

use nalgebra::Vector3;
use relik_core::{EeGoal, JointHistory, Pose};

use crate::config::Weights;
use crate::robot::Robot;

/// Bands at or below this are treated as "match exactly".
const TIGHT_BAND: f64 = 1e-2;
/// Rotation bands at or above this leave the axis free.
const FREE_ROTATION_BAND: f64 = 3.141_592_6;

// ---------------------------------------------------------------------------
// Loss shapes
// ---------------------------------------------------------------------------

/// Gaussian well at `t` on top of a polynomial bowl.
pub fn groove_loss(x: f64, t: f64, d: i32, c: f64, f: f64, g: i32) -> f64 {
    -(-(x - t).powi(d) / (2.0 * c.powi(2))).exp() + f * (x - t).powi(g)
}

/// Groove at `g` inside a flat basin `[lower, upper]` with steep walls.
#[allow(clippy::too_many_arguments)]
pub fn swamp_groove_loss(
    x: f64,
    g: f64,
    lower: f64,
    upper: f64,
    c: f64,
    f1: f64,
    f2: f64,
    f3: f64,
    p: i32,
) -> f64 {
    let normalized = (2.0 * x - lower - upper) / (upper - lower);
    let b = wall_width(p);
    -f1 * (-(x - g).powi(2) / (2.0 * c.powi(2))).exp()
        + f2 * (x - g).powi(2)
        + f3 * (1.0 - (-(normalized / b).powi(p)).exp())
}

/// Flat basin `[lower, upper]` with steep walls, no groove.
pub fn swamp_loss(x: f64, lower: f64, upper: f64, f1: f64, f2: f64, p: i32) -> f64 {
    let normalized = (2.0 * x - lower - upper) / (upper - lower);
    let b = wall_width(p);
    (f1 + f2 * normalized.powi(2)) * (1.0 - (-(normalized / b).powi(p)).exp()) - 1.0
}

/// Scale that puts the wall at 5% height on the band edge.
fn wall_width(p: i32) -> f64 {
    (-1.0 / 0.05_f64.ln()).powf(1.0 / f64::from(p))
}

fn exact_match(error: f64) -> f64 {
    groove_loss(error, 0.0, 2, 0.1, 10.0, 2)
}

fn banded_match(error: f64, band: f64) -> f64 {
    swamp_groove_loss(error, 0.0, -band, band, 2.0 * band, 1.0, 0.01, 100.0, 20)
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

/// Objective for one solve: robot, warm-start history and goals are fixed,
/// the joint vector varies.
pub struct Objective<'a> {
    robot: &'a Robot,
    history: &'a JointHistory,
    goals: &'a [EeGoal],
    weights: &'a Weights,
}

impl<'a> Objective<'a> {
    pub fn new(
        robot: &'a Robot,
        history: &'a JointHistory,
        goals: &'a [EeGoal],
        weights: &'a Weights,
    ) -> Self {
        Self {
            robot,
            history,
            goals,
            weights,
        }
    }

    /// Weighted sum of every term at `q`.
    pub fn value(&self, q: &[f64]) -> f64 {
        let poses = self.robot.end_effector_poses(q);
        let w = self.weights;

        w.position * self.position_term(&poses)
            + w.rotation * self.rotation_term(&poses)
            + w.joint_limits * self.joint_limit_term(q)
            + w.velocity * self.velocity_term(q)
            + w.acceleration * self.acceleration_term(q)
            + w.jerk * self.jerk_term(q)
            + w.manipulability * self.manipulability_term(q)
    }

    /// Per-axis position error, measured in each goal's frame.
    pub fn position_term(&self, poses: &[Pose]) -> f64 {
        let mut total = 0.0;
        for (pose, goal) in poses.iter().zip(self.goals) {
            let error: Vector3<f64> =
                goal.pose.orientation.inverse() * (pose.position - goal.pose.position);
            for axis in 0..3 {
                let band = goal.tolerance.translation(axis);
                total += if band <= TIGHT_BAND {
                    exact_match(error[axis])
                } else {
                    banded_match(error[axis], band)
                };
            }
        }
        total
    }

    /// Per-axis rotation error: scaled axis of `goal⁻¹ · ee`.
    pub fn rotation_term(&self, poses: &[Pose]) -> f64 {
        let mut total = 0.0;
        for (pose, goal) in poses.iter().zip(self.goals) {
            let error = (goal.pose.orientation.inverse() * pose.orientation).scaled_axis();
            for axis in 0..3 {
                let angle = error[axis].abs();
                let band = goal.tolerance.rotation(axis);
                total += if band <= TIGHT_BAND {
                    exact_match(angle)
                } else if band >= FREE_ROTATION_BAND {
                    swamp_loss(angle, -band, band, 100.0, 0.1, 20)
                } else {
                    banded_match(angle, band)
                };
            }
        }
        total
    }

    /// Soft walls at each bounded joint's limits.
    pub fn joint_limit_term(&self, q: &[f64]) -> f64 {
        let lower = self.robot.lower_limits();
        let upper = self.robot.upper_limits();
        (0..q.len())
            .filter(|&i| self.robot.is_bounded(i))
            .map(|i| swamp_loss(q[i], lower[i], upper[i], 10.0, 10.0, 20))
            .sum()
    }

    pub fn velocity_term(&self, q: &[f64]) -> f64 {
        let current = self.history.current();
        exact_match(norm(q.iter().zip(current).map(|(x, c)| x - c)))
    }

    pub fn acceleration_term(&self, q: &[f64]) -> f64 {
        let h = self.history;
        exact_match(norm(
            (0..q.len()).map(|i| (q[i] - h.current()[i]) - (h.current()[i] - h.prev()[i])),
        ))
    }

    pub fn jerk_term(&self, q: &[f64]) -> f64 {
        let h = self.history;
        exact_match(norm((0..q.len()).map(|i| {
            let v1 = q[i] - h.current()[i];
            let v2 = h.current()[i] - h.prev()[i];
            let v3 = h.prev()[i] - h.prev2()[i];
            (v1 - v2) - (v2 - v3)
        })))
    }

    pub fn manipulability_term(&self, q: &[f64]) -> f64 {
        groove_loss(self.robot.manipulability(q), 1.0, 2, 0.5, 0.1, 2)
    }
}

fn norm(components: impl Iterator<Item = f64>) -> f64 {
    components.map(|c| c * c).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use relik_core::Tolerance;
    use relik_urdf::parse_string;

    #[test]
    fn groove_minimum_is_at_target() {
        assert_relative_eq!(groove_loss(0.3, 0.3, 2, 0.1, 10.0, 2), -1.0);
        assert!(groove_loss(0.31, 0.3, 2, 0.1, 10.0, 2) > -1.0);
        assert!(groove_loss(0.29, 0.3, 2, 0.1, 10.0, 2) > -1.0);
    }

    #[test]
    fn swamp_is_flat_inside_and_steep_outside() {
        let inside = swamp_loss(0.0, -1.0, 1.0, 10.0, 10.0, 20);
        let near_edge = swamp_loss(0.5, -1.0, 1.0, 10.0, 10.0, 20);
        let outside = swamp_loss(1.2, -1.0, 1.0, 10.0, 10.0, 20);
        assert_relative_eq!(inside, -1.0);
        assert!((near_edge - inside).abs() < 1e-3);
        assert!(outside > 10.0);
    }

    #[test]
    fn swamp_groove_basin_is_nearly_flat() {
        let band = 0.1;
        let center = swamp_groove_loss(0.0, 0.0, -band, band, 2.0 * band, 1.0, 0.01, 100.0, 20);
        let half = swamp_groove_loss(0.05, 0.0, -band, band, 2.0 * band, 1.0, 0.01, 100.0, 20);
        let wall = swamp_groove_loss(0.15, 0.0, -band, band, 2.0 * band, 1.0, 0.01, 100.0, 20);
        assert!(half - center < 0.1);
        assert!(wall - center > 50.0);
    }

    const SLIDER: &str = r#"
        <robot name="slider">
            <link name="base"/>
            <link name="carriage"/>
            <joint name="rail" type="prismatic">
                <parent link="base"/><child link="carriage"/>
                <axis xyz="1 0 0"/>
                <limit lower="-1.0" upper="1.0" effort="10" velocity="1"/>
            </joint>
        </robot>
    "#;

    fn slider() -> Robot {
        let model = parse_string(SLIDER).unwrap();
        Robot::from_model(&model, &["base".into()], &["carriage".into()], None).unwrap()
    }

    #[test]
    fn position_term_is_lowest_at_goal() {
        let robot = slider();
        let history = JointHistory::new(vec![0.0]);
        let goals = [EeGoal::at(Pose::new(Vector3::new(0.4, 0.0, 0.0), UnitQuaternion::identity()))];
        let weights = Weights::default();
        let objective = Objective::new(&robot, &history, &goals, &weights);

        let at_goal = objective.position_term(&robot.end_effector_poses(&[0.4]));
        let off_goal = objective.position_term(&robot.end_effector_poses(&[0.3]));
        // Three exact-match axes, all at their minimum
        assert_relative_eq!(at_goal, -3.0, epsilon = 1e-12);
        assert!(off_goal > at_goal);
    }

    #[test]
    fn wide_band_makes_positions_inside_equivalent() {
        let robot = slider();
        let history = JointHistory::new(vec![0.0]);
        let goals = [EeGoal::new(
            Pose::new(Vector3::new(0.4, 0.0, 0.0), UnitQuaternion::identity()),
            Tolerance([0.2, 0.0, 0.0, 0.0, 0.0, 0.0]),
        )];
        let weights = Weights::default();
        let objective = Objective::new(&robot, &history, &goals, &weights);

        let center = objective.position_term(&robot.end_effector_poses(&[0.4]));
        let inside = objective.position_term(&robot.end_effector_poses(&[0.45]));
        let outside = objective.position_term(&robot.end_effector_poses(&[0.7]));
        assert!((inside - center).abs() < 0.1);
        assert!(outside - center > 50.0);
    }

    #[test]
    fn smoothness_terms_vanish_when_holding_still() {
        let robot = slider();
        let history = JointHistory::new(vec![0.2]);
        let goals = [EeGoal::default()];
        let weights = Weights::default();
        let objective = Objective::new(&robot, &history, &goals, &weights);

        assert_relative_eq!(objective.velocity_term(&[0.2]), -1.0);
        assert_relative_eq!(objective.acceleration_term(&[0.2]), -1.0);
        assert_relative_eq!(objective.jerk_term(&[0.2]), -1.0);
        assert!(objective.velocity_term(&[0.3]) > -1.0);
    }

    #[test]
    fn acceleration_prefers_constant_velocity() {
        let robot = slider();
        let mut history = JointHistory::new(vec![0.0]);
        history.update(vec![0.1]);
        let goals = [EeGoal::default()];
        let weights = Weights::default();
        let objective = Objective::new(&robot, &history, &goals, &weights);

        assert_relative_eq!(objective.acceleration_term(&[0.2]), -1.0, epsilon = 1e-12);
        assert!(objective.acceleration_term(&[0.1]) > -1.0);
    }

    #[test]
    fn joint_limit_term_rises_at_the_wall() {
        let robot = slider();
        let history = JointHistory::new(vec![0.0]);
        let goals = [EeGoal::default()];
        let weights = Weights::default();
        let objective = Objective::new(&robot, &history, &goals, &weights);

        assert!(objective.joint_limit_term(&[0.99]) > objective.joint_limit_term(&[0.0]) + 1.0);
    }
}
