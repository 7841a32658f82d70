//! URDF XML parsing using `urdf-rs`.
//!
//! Converts `urdf_rs` types into the crate's [`RobotModel`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::UrdfError;
use crate::types::{JointData, JointLimits, JointType, LinkData, Origin, RobotModel};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a URDF file from disk into a [`RobotModel`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<RobotModel, UrdfError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| UrdfError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_string(&content)
}

/// Parse a URDF XML string into a [`RobotModel`].
pub fn parse_string(xml: &str) -> Result<RobotModel, UrdfError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| UrdfError::Parse(e.to_string()))?;
    convert_robot(&robot)
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn convert_robot(robot: &urdf_rs::Robot) -> Result<RobotModel, UrdfError> {
    let links: HashMap<String, LinkData> = robot
        .links
        .iter()
        .map(|l| (l.name.clone(), LinkData::new(l.name.clone())))
        .collect();

    let joints: HashMap<String, JointData> = robot
        .joints
        .iter()
        .map(|j| convert_joint(j).map(|jd| (jd.name.clone(), jd)))
        .collect::<Result<_, _>>()?;

    // Root link = the first declared link that is never a child of any joint.
    let child_links: HashSet<&str> = joints.values().map(|j| j.child.as_str()).collect();
    let root_link = robot
        .links
        .iter()
        .map(|l| l.name.as_str())
        .find(|name| !child_links.contains(name))
        .ok_or(UrdfError::NoRootLink)?
        .to_string();

    Ok(RobotModel {
        name: robot.name.clone(),
        links,
        joints,
        root_link,
    })
}

fn convert_joint(joint: &urdf_rs::Joint) -> Result<JointData, UrdfError> {
    Ok(JointData {
        name: joint.name.clone(),
        joint_type: convert_joint_type(&joint.joint_type)?,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: convert_pose(&joint.origin),
        axis: vec3(&joint.axis.xyz),
        limits: convert_limits(&joint.limit),
    })
}

fn convert_joint_type(jt: &urdf_rs::JointType) -> Result<JointType, UrdfError> {
    match jt {
        urdf_rs::JointType::Revolute => Ok(JointType::Revolute),
        urdf_rs::JointType::Continuous => Ok(JointType::Continuous),
        urdf_rs::JointType::Prismatic => Ok(JointType::Prismatic),
        urdf_rs::JointType::Fixed => Ok(JointType::Fixed),
        urdf_rs::JointType::Floating => Ok(JointType::Floating),
        urdf_rs::JointType::Planar => Ok(JointType::Planar),
        urdf_rs::JointType::Spherical => Err(UrdfError::UnsupportedJointType("spherical".into())),
    }
}

fn convert_limits(limit: &urdf_rs::JointLimit) -> JointLimits {
    // urdf-rs defaults lower/upper to 0.0 when the <limit> tag is absent;
    // an empty range is read as "no position limits".
    let has_limits = (limit.lower - limit.upper).abs() > f64::EPSILON;
    JointLimits {
        lower: has_limits.then_some(limit.lower),
        upper: has_limits.then_some(limit.upper),
        velocity: limit.velocity,
    }
}

fn convert_pose(pose: &urdf_rs::Pose) -> Origin {
    Origin {
        xyz: vec3(&pose.xyz),
        rpy: vec3(&pose.rpy),
    }
}

const fn vec3(v: &[f64; 3]) -> [f64; 3] {
    [v[0], v[1], v[2]]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
