//! URDF loading for relik.
//!
//! Reduces a URDF document to the parts inverse kinematics needs: the link
//! tree, joint origins and axes, and position limits. Geometry, inertia and
//! materials are ignored.

pub mod error;
pub mod parser;
pub mod types;

pub use error::UrdfError;
pub use parser::{parse_file, parse_string};
pub use types::{JointData, JointLimits, JointType, LinkData, Origin, RobotModel};
