//! Flat-buffer marshalling.
//!
//! Every structured quantity crosses the session boundary as a flat `f64`
//! slice. The end-effector count N is derived from `len / stride` only, and
//! all buffers of one request must agree on it before anything is decoded.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::{BufferKind, ContractError};
use crate::types::{EeGoal, Pose, Tolerance};

/// Values per end-effector position goal: `x, y, z`.
pub const POSITION_STRIDE: usize = 3;
/// Values per end-effector orientation goal: `x, y, z, w`.
pub const ORIENTATION_STRIDE: usize = 4;
/// Values per end-effector tolerance band: `x, y, z, rx, ry, rz`.
pub const TOLERANCE_STRIDE: usize = 6;
/// Values per end-effector linear velocity step: `x, y, z`.
pub const LINEAR_VELOCITY_STRIDE: usize = 3;
/// Values per end-effector angular velocity step: scaled axis `x, y, z`.
pub const ANGULAR_VELOCITY_STRIDE: usize = 3;

const MIN_QUATERNION_NORM: f64 = 1e-9;

/// One decoded `solve_velocity` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityStep {
    /// Position increment in meters.
    pub linear: Vector3<f64>,
    /// Rotation increment as axis * angle (radians).
    pub angular: Vector3<f64>,
    pub tolerance: Tolerance,
}

impl VelocityStep {
    /// Apply this step to `goal`: translate, then pre-multiply the rotation.
    pub fn apply(&self, goal: &EeGoal) -> EeGoal {
        let rotation = UnitQuaternion::from_scaled_axis(self.angular);
        EeGoal::new(
            Pose::new(
                goal.pose.position + self.linear,
                rotation * goal.pose.orientation,
            ),
            self.tolerance,
        )
    }
}

/// Decode a `solve_position` request into one goal per end-effector.
pub fn decode_pose_goals(
    positions: &[f64],
    orientations: &[f64],
    tolerances: &[f64],
    expected: usize,
) -> Result<Vec<EeGoal>, ContractError> {
    let n = end_effector_count(
        [
            (BufferKind::Positions, positions, POSITION_STRIDE),
            (BufferKind::Orientations, orientations, ORIENTATION_STRIDE),
            (BufferKind::Tolerances, tolerances, TOLERANCE_STRIDE),
        ],
        expected,
    )?;
    let tolerances = decode_tolerances(tolerances)?;

    (0..n)
        .map(|i| {
            let p = &positions[POSITION_STRIDE * i..POSITION_STRIDE * (i + 1)];
            let q = &orientations[ORIENTATION_STRIDE * i..ORIENTATION_STRIDE * (i + 1)];
            let quat = Quaternion::new(q[3], q[0], q[1], q[2]);
            let norm = quat.norm();
            if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
                return Err(ContractError::DegenerateQuaternion { end_effector: i });
            }
            let pose = Pose::new(
                Vector3::new(p[0], p[1], p[2]),
                UnitQuaternion::from_quaternion(quat),
            );
            Ok(EeGoal::new(pose, tolerances[i]))
        })
        .collect()
}

/// Decode a `solve_velocity` request into one step per end-effector.
pub fn decode_velocity_steps(
    linear: &[f64],
    angular: &[f64],
    tolerances: &[f64],
    expected: usize,
) -> Result<Vec<VelocityStep>, ContractError> {
    let n = end_effector_count(
        [
            (BufferKind::LinearVelocities, linear, LINEAR_VELOCITY_STRIDE),
            (BufferKind::AngularVelocities, angular, ANGULAR_VELOCITY_STRIDE),
            (BufferKind::Tolerances, tolerances, TOLERANCE_STRIDE),
        ],
        expected,
    )?;
    let tolerances = decode_tolerances(tolerances)?;

    Ok((0..n)
        .map(|i| {
            let l = &linear[LINEAR_VELOCITY_STRIDE * i..];
            let a = &angular[ANGULAR_VELOCITY_STRIDE * i..];
            VelocityStep {
                linear: Vector3::new(l[0], l[1], l[2]),
                angular: Vector3::new(a[0], a[1], a[2]),
                tolerance: tolerances[i],
            }
        })
        .collect())
}

/// Check a `reset` joint state against the robot's DOF.
pub fn validate_joint_state(joint_state: &[f64], dof: usize) -> Result<(), ContractError> {
    if joint_state.len() != dof {
        return Err(ContractError::JointStateLength {
            expected: dof,
            got: joint_state.len(),
        });
    }
    check_finite(BufferKind::JointState, joint_state)
}

/// Flatten goal positions to `[x0, y0, z0, x1, ...]`.
pub fn flatten_positions(goals: &[EeGoal]) -> Vec<f64> {
    goals
        .iter()
        .flat_map(|g| g.pose.position.iter().copied())
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Derive N from three buffers, requiring whole strides, agreement, the
/// robot's end-effector count, and finite values, in that order.
fn end_effector_count(
    buffers: [(BufferKind, &[f64], usize); 3],
    expected: usize,
) -> Result<usize, ContractError> {
    let mut counts = [0usize; 3];
    for (slot, &(buffer, values, stride)) in counts.iter_mut().zip(buffers.iter()) {
        if values.len() % stride != 0 {
            return Err(ContractError::Stride {
                buffer,
                stride,
                len: values.len(),
            });
        }
        *slot = values.len() / stride;
    }

    for (i, &count) in counts.iter().enumerate().skip(1) {
        if count != counts[0] {
            return Err(ContractError::EndEffectorMismatch {
                first: buffers[0].0,
                first_count: counts[0],
                second: buffers[i].0,
                second_count: count,
            });
        }
    }

    let n = counts[0];
    if n == 0 || n != expected {
        return Err(ContractError::EndEffectorCount { expected, got: n });
    }

    for &(buffer, values, _) in &buffers {
        check_finite(buffer, values)?;
    }
    Ok(n)
}

fn check_finite(buffer: BufferKind, values: &[f64]) -> Result<(), ContractError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ContractError::NonFinite { buffer, index }),
        None => Ok(()),
    }
}

fn decode_tolerances(values: &[f64]) -> Result<Vec<Tolerance>, ContractError> {
    values
        .chunks_exact(TOLERANCE_STRIDE)
        .enumerate()
        .map(|(end_effector, chunk)| {
            if let Some(axis) = chunk.iter().position(|&v| v < 0.0) {
                return Err(ContractError::NegativeTolerance { end_effector, axis });
            }
            let mut band = [0.0; TOLERANCE_STRIDE];
            band.copy_from_slice(chunk);
            Ok(Tolerance(band))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
