//! In-memory robot model.
//!
//! Only the kinematic skeleton of a URDF survives parsing: which link hangs
//! off which joint, where each joint sits, how it moves and how far.

use std::collections::HashMap;

use crate::error::UrdfError;

// ---------------------------------------------------------------------------
// JointType
// ---------------------------------------------------------------------------

/// URDF joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Rotation about a single axis, with position limits.
    Revolute,
    /// Unlimited rotation about a single axis.
    Continuous,
    /// Translation along an axis, with position limits.
    Prismatic,
    /// No relative motion between parent and child.
    Fixed,
    /// Unconstrained 6-DOF joint.
    Floating,
    /// Planar motion.
    Planar,
}

impl JointType {
    /// Whether this joint contributes a joint variable to IK.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }

    /// Whether a kinematic chain can be built through this joint.
    pub const fn is_serial(self) -> bool {
        !matches!(self, Self::Floating | Self::Planar)
    }
}

// ---------------------------------------------------------------------------
// JointLimits
// ---------------------------------------------------------------------------

/// Position and velocity limits of a joint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointLimits {
    /// Lower position limit (rad or m). `None` means unbounded.
    pub lower: Option<f64>,
    /// Upper position limit (rad or m). `None` means unbounded.
    pub upper: Option<f64>,
    /// Maximum velocity (rad/s or m/s).
    pub velocity: f64,
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// A pose given as position + roll-pitch-yaw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Origin {
    /// Translation `[x, y, z]` in meters.
    pub xyz: [f64; 3],
    /// Rotation `[roll, pitch, yaw]` in radians.
    pub rpy: [f64; 3],
}

// ---------------------------------------------------------------------------
// LinkData / JointData
// ---------------------------------------------------------------------------

/// A URDF link. Links carry no kinematic data of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub name: String,
}

impl LinkData {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// In-memory representation of a URDF joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointData {
    /// Joint name.
    pub name: String,
    /// Joint type.
    pub joint_type: JointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Joint origin relative to the parent link.
    pub origin: Origin,
    /// Joint axis in the joint frame (default `[1, 0, 0]` per URDF).
    pub axis: [f64; 3],
    /// Motion limits.
    pub limits: JointLimits,
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Complete kinematic tree of a robot.
#[derive(Debug, Clone)]
pub struct RobotModel {
    /// Robot name.
    pub name: String,
    /// All links, keyed by name.
    pub links: HashMap<String, LinkData>,
    /// All joints, keyed by name.
    pub joints: HashMap<String, JointData>,
    /// Name of the root link (the one never referenced as a child).
    pub root_link: String,
}

impl RobotModel {
    /// Get a link by name.
    pub fn link(&self, name: &str) -> Result<&LinkData, UrdfError> {
        self.links
            .get(name)
            .ok_or_else(|| UrdfError::MissingLink(name.into()))
    }

    /// Get a joint by name.
    pub fn joint(&self, name: &str) -> Result<&JointData, UrdfError> {
        self.joints
            .get(name)
            .ok_or_else(|| UrdfError::MissingJoint(name.into()))
    }

    /// Iterate over actuated joints (revolute, continuous, prismatic).
    pub fn actuated_joints(&self) -> impl Iterator<Item = &JointData> {
        self.joints.values().filter(|j| j.joint_type.is_actuated())
    }

    /// Number of actuated degrees of freedom in the whole tree.
    pub fn dof(&self) -> usize {
        self.actuated_joints().count()
    }

    /// Names of actuated joints, sorted alphabetically.
    pub fn actuated_joint_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actuated_joints().map(|j| j.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// The joint whose child is `link`, if any.
    pub fn parent_joint(&self, link: &str) -> Option<&JointData> {
        self.joints.values().find(|j| j.child == link)
    }

    /// Ordered joints from `base` down to `tip`.
    ///
    /// In a tree every link has at most one parent joint, so the path is
    /// found by walking up from the tip until the base is reached.
    pub fn joint_path(&self, base: &str, tip: &str) -> Result<Vec<&JointData>, UrdfError> {
        self.link(base)?;
        self.link(tip)?;

        let mut path = Vec::new();
        let mut current = tip;
        while current != base {
            let Some(joint) = self.parent_joint(current) else {
                return Err(UrdfError::NoPath {
                    base: base.into(),
                    tip: tip.into(),
                });
            };
            path.push(joint);
            current = joint.parent.as_str();
        }
        path.reverse();
        Ok(path)
    }
}
