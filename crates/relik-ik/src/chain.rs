//! Serial kinematic chain between two links of a [`RobotModel`].
//!
//! A [`KinematicChain`] is the ordered list of actuated joints from a base
//! link to an end-effector link, with the static origins and axes needed for
//! forward kinematics and the geometric Jacobian.

use nalgebra::{DMatrix, Isometry3, Translation3, UnitQuaternion, UnitVector3, Vector3};

use relik_urdf::{JointType, Origin, RobotModel, UrdfError};

/// A single actuated joint in the chain.
#[derive(Debug, Clone)]
pub struct ChainJoint {
    /// Name of this joint (from URDF).
    pub name: String,
    /// Static transform from the previous joint frame, with any fixed joints
    /// in between folded in.
    pub origin: Isometry3<f64>,
    /// Joint axis in the joint's local frame.
    pub axis: UnitVector3<f64>,
    /// Whether this is a prismatic joint (false = revolute or continuous).
    pub is_prismatic: bool,
    /// Lower position limit, `-inf` when unbounded.
    pub lower_limit: f64,
    /// Upper position limit, `+inf` when unbounded.
    pub upper_limit: f64,
}

/// An ordered kinematic chain from a base link to an end-effector link.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    base_link: String,
    ee_link: String,
    joints: Vec<ChainJoint>,
    /// Transform from the last joint frame to the end-effector frame.
    ee_offset: Isometry3<f64>,
}

impl KinematicChain {
    /// Trace the chain from `base_link` down to `ee_link`.
    ///
    /// Fixed joints are folded into the next actuated joint's origin, or into
    /// the end-effector offset when they trail the last actuated joint.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError`] if either link is missing, `ee_link` does not
    /// hang below `base_link`, or the path crosses a floating or planar joint.
    pub fn from_model(model: &RobotModel, base_link: &str, ee_link: &str) -> Result<Self, UrdfError> {
        let path = model.joint_path(base_link, ee_link)?;

        let mut joints = Vec::new();
        let mut accumulated_fixed = Isometry3::identity();

        for joint in path {
            if !joint.joint_type.is_serial() {
                return Err(UrdfError::UnsupportedJointType(format!(
                    "{} ({:?})",
                    joint.name, joint.joint_type
                )));
            }
            let joint_origin = origin_to_isometry(&joint.origin);

            if joint.joint_type.is_actuated() {
                let origin = accumulated_fixed * joint_origin;
                accumulated_fixed = Isometry3::identity();

                let (lower, upper) = match joint.joint_type {
                    JointType::Continuous => (f64::NEG_INFINITY, f64::INFINITY),
                    _ => (
                        joint.limits.lower.unwrap_or(f64::NEG_INFINITY),
                        joint.limits.upper.unwrap_or(f64::INFINITY),
                    ),
                };

                joints.push(ChainJoint {
                    name: joint.name.clone(),
                    origin,
                    axis: UnitVector3::new_normalize(Vector3::from(joint.axis)),
                    is_prismatic: joint.joint_type == JointType::Prismatic,
                    lower_limit: lower,
                    upper_limit: upper,
                });
            } else {
                accumulated_fixed *= joint_origin;
            }
        }

        Ok(Self {
            base_link: base_link.into(),
            ee_link: ee_link.into(),
            joints,
            ee_offset: accumulated_fixed,
        })
    }

    /// Number of actuated degrees of freedom.
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn base_link(&self) -> &str {
        &self.base_link
    }

    pub fn ee_link(&self) -> &str {
        &self.ee_link
    }

    /// Joint names in chain order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// End-effector pose in the base link frame.
    ///
    /// # Panics
    ///
    /// Panics if `q.len() != self.dof()`.
    pub fn forward_kinematics(&self, q: &[f64]) -> Isometry3<f64> {
        assert_eq!(q.len(), self.dof(), "q.len() must equal chain DOF");

        let mut transform = Isometry3::identity();
        for (joint, &value) in self.joints.iter().zip(q) {
            transform *= joint.origin;
            transform *= joint_transform(&joint.axis, joint.is_prismatic, value);
        }
        transform * self.ee_offset
    }

    /// Joint origins and axes in the base frame, plus the end-effector position.
    pub fn joint_frames(&self, q: &[f64]) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>, Vector3<f64>) {
        assert_eq!(q.len(), self.dof(), "q.len() must equal chain DOF");

        let mut transform = Isometry3::identity();
        let mut origins = Vec::with_capacity(self.dof());
        let mut axes = Vec::with_capacity(self.dof());

        for (joint, &value) in self.joints.iter().zip(q) {
            transform *= joint.origin;
            // Frame before the joint's own motion
            origins.push(transform.translation.vector);
            axes.push(transform.rotation * joint.axis.into_inner());
            transform *= joint_transform(&joint.axis, joint.is_prismatic, value);
        }

        let ee_pos = (transform * self.ee_offset).translation.vector;
        (origins, axes, ee_pos)
    }

    /// 6 x n geometric Jacobian: linear rows, then angular rows.
    pub fn jacobian(&self, q: &[f64]) -> DMatrix<f64> {
        let (origins, axes, ee_pos) = self.joint_frames(q);
        let mut jacobian = DMatrix::zeros(6, self.dof());

        for (i, joint) in self.joints.iter().enumerate() {
            let z = axes[i];
            if joint.is_prismatic {
                jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&z);
            } else {
                let linear = z.cross(&(ee_pos - origins[i]));
                jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
                jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&z);
            }
        }
        jacobian
    }

    /// Yoshikawa manipulability `sqrt(det(J Jᵀ))`.
    ///
    /// Chains with fewer than six joints use `Jᵀ J`, whose determinant does
    /// not vanish identically.
    pub fn manipulability(&self, q: &[f64]) -> f64 {
        let j = self.jacobian(q);
        let gram = if self.dof() < 6 {
            j.transpose() * &j
        } else {
            &j * j.transpose()
        };
        // Rounding can push a singular determinant just below zero
        gram.determinant().max(0.0).sqrt()
    }
}

/// URDF origin (xyz + fixed-axis roll, pitch, yaw) as an isometry.
pub(crate) fn origin_to_isometry(origin: &Origin) -> Isometry3<f64> {
    let [x, y, z] = origin.xyz;
    let [roll, pitch, yaw] = origin.rpy;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

fn joint_transform(axis: &UnitVector3<f64>, is_prismatic: bool, value: f64) -> Isometry3<f64> {
    if is_prismatic {
        Isometry3::from_parts(
            Translation3::from(axis.into_inner() * value),
            UnitQuaternion::identity(),
        )
    } else {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(axis, value),
        )
    }
}
