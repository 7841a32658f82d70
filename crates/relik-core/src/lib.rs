//! relik-core: the solver session contract.
//!
//! A [`Session`] owns one configured solver instance. Callers push
//! end-effector goals as flat `f64` buffers, get back a caller-owned joint
//! configuration, and may reset the internal joint state. The optimizer
//! itself is an injected [`Optimizer`]; this crate contains no kinematics.
//!
//! ```text
//! flat buffers ──► buffer::decode_* ──► EeGoal ──► Optimizer ──► Vec<f64>
//!                    (stride checks)              (JointHistory)
//! ```

pub mod buffer;
pub mod error;
pub mod history;
pub mod optimizer;
pub mod session;
pub mod types;

pub use buffer::{
    ANGULAR_VELOCITY_STRIDE, LINEAR_VELOCITY_STRIDE, ORIENTATION_STRIDE, POSITION_STRIDE,
    TOLERANCE_STRIDE,
};
pub use error::{BufferKind, ConfigError, ContractError, SessionError, SolverError};
pub use history::JointHistory;
pub use optimizer::Optimizer;
pub use session::Session;
pub use types::{EeGoal, Pose, Tolerance};
