//! Goal types shared by the session and its optimizer.

use nalgebra::{UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Position + orientation of an end-effector in the robot base frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub const fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// Orientation in `[x, y, z, w]` order.
    pub fn orientation_xyzw(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// Allowed deviation per pose axis: `[x, y, z, rx, ry, rz]`.
///
/// Translational bands are in meters, rotational bands in radians of the
/// scaled-axis error. A zero band means "match exactly".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tolerance(pub [f64; 6]);

impl Tolerance {
    pub const ZERO: Self = Self([0.0; 6]);

    /// Band for translational axis `axis` (0..3).
    pub fn translation(&self, axis: usize) -> f64 {
        self.0[axis]
    }

    /// Band for rotational axis `axis` (0..3).
    pub fn rotation(&self, axis: usize) -> f64 {
        self.0[axis + 3]
    }
}

// ---------------------------------------------------------------------------
// EeGoal
// ---------------------------------------------------------------------------

/// Target pose and tolerance band for one end-effector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EeGoal {
    pub pose: Pose,
    pub tolerance: Tolerance,
}

impl EeGoal {
    pub const fn new(pose: Pose, tolerance: Tolerance) -> Self {
        Self { pose, tolerance }
    }

    /// A zero-tolerance goal at `pose`.
    pub const fn at(pose: Pose) -> Self {
        Self::new(pose, Tolerance::ZERO)
    }
}
