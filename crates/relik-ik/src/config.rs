//! Solver settings documents.
//!
//! A settings file names the robot (a URDF path relative to the file, or the
//! URDF inline), which links form each chain, and optionally the starting
//! configuration, joint ordering, solver budget and objective weights.
//!
//! ```toml
//! urdf_path = "arm.urdf"
//! base_links = ["base"]
//! ee_links = ["end_effector"]
//! starting_config = [0.0, 0.3, 0.6, 0.0, -0.9, 0.0]
//!
//! [solver]
//! max_iterations = 150
//!
//! [weights]
//! rotation = 5.0
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use relik_core::ConfigError;
use relik_urdf::RobotModel;
use serde::{Deserialize, Serialize};

/// URDF of the built-in six-joint arm.
pub const DEFAULT_ARM_URDF: &str = include_str!("../assets/default_arm.urdf");

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_iterations() -> u32 {
    100
}
const fn default_tolerance() -> f64 {
    5e-4
}
const fn default_finite_difference_step() -> f64 {
    1e-6
}
const fn default_position_weight() -> f64 {
    50.0
}
const fn default_rotation_weight() -> f64 {
    10.0
}
const fn default_joint_limits_weight() -> f64 {
    0.1
}
const fn default_velocity_weight() -> f64 {
    0.7
}
const fn default_acceleration_weight() -> f64 {
    0.5
}
const fn default_jerk_weight() -> f64 {
    0.3
}
const fn default_manipulability_weight() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// SolverSettings
// ---------------------------------------------------------------------------

/// Budget and numerics of the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Iterations per solve (default: 100).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop when the projected gradient's largest component drops below
    /// this (default: 5e-4).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Central-difference step for gradients (default: 1e-6).
    #[serde(default = "default_finite_difference_step")]
    pub finite_difference_step: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            finite_difference_step: default_finite_difference_step(),
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(invalid("solver.max_iterations", "must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid("solver.tolerance", "must be positive"));
        }
        if !(self.finite_difference_step.is_finite() && self.finite_difference_step > 0.0) {
            return Err(invalid("solver.finite_difference_step", "must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Objective term weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_position_weight")]
    pub position: f64,
    #[serde(default = "default_rotation_weight")]
    pub rotation: f64,
    #[serde(default = "default_joint_limits_weight")]
    pub joint_limits: f64,
    #[serde(default = "default_velocity_weight")]
    pub velocity: f64,
    #[serde(default = "default_acceleration_weight")]
    pub acceleration: f64,
    #[serde(default = "default_jerk_weight")]
    pub jerk: f64,
    #[serde(default = "default_manipulability_weight")]
    pub manipulability: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            position: default_position_weight(),
            rotation: default_rotation_weight(),
            joint_limits: default_joint_limits_weight(),
            velocity: default_velocity_weight(),
            acceleration: default_acceleration_weight(),
            jerk: default_jerk_weight(),
            manipulability: default_manipulability_weight(),
        }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("weights.position", self.position),
            ("weights.rotation", self.rotation),
            ("weights.joint_limits", self.joint_limits),
            ("weights.velocity", self.velocity),
            ("weights.acceleration", self.acceleration),
            ("weights.jerk", self.jerk),
            ("weights.manipulability", self.manipulability),
        ];
        for (field, value) in named {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// A complete solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// URDF file, relative to the settings file's directory.
    #[serde(default)]
    pub urdf_path: Option<PathBuf>,

    /// URDF document inline.
    #[serde(default)]
    pub urdf: Option<String>,

    /// Base link of each chain.
    #[serde(default)]
    pub base_links: Vec<String>,

    /// End-effector link of each chain, paired with `base_links`.
    #[serde(default)]
    pub ee_links: Vec<String>,

    /// Initial joint configuration (default: zeros).
    #[serde(default)]
    pub starting_config: Option<Vec<f64>>,

    /// Order of joints in the joint vector (default: first appearance).
    #[serde(default)]
    pub joint_ordering: Option<Vec<String>>,

    #[serde(default)]
    pub solver: SolverSettings,

    #[serde(default)]
    pub weights: Weights,

    /// Directory `urdf_path` is resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for Settings {
    /// The built-in six-joint arm, starting straight up.
    fn default() -> Self {
        Self {
            urdf_path: None,
            urdf: Some(DEFAULT_ARM_URDF.to_string()),
            base_links: vec!["base".into()],
            ee_links: vec!["end_effector".into()],
            starting_config: None,
            joint_ordering: None,
            solver: SolverSettings::default(),
            weights: Weights::default(),
            base_dir: None,
        }
    }
}

impl Settings {
    /// Structural checks that need no robot model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.urdf_path, &self.urdf) {
            (None, None) => return Err(ConfigError::MissingField("urdf_path or urdf".into())),
            (Some(_), Some(_)) => {
                return Err(invalid("urdf", "give either urdf_path or urdf, not both"));
            }
            _ => {}
        }
        if self.base_links.is_empty() {
            return Err(ConfigError::MissingField("base_links".into()));
        }
        if self.ee_links.is_empty() {
            return Err(ConfigError::MissingField("ee_links".into()));
        }
        if self.base_links.len() != self.ee_links.len() {
            return Err(invalid(
                "ee_links",
                &format!(
                    "{} end-effector links for {} base links",
                    self.ee_links.len(),
                    self.base_links.len()
                ),
            ));
        }
        if let Some(start) = &self.starting_config {
            if start.iter().any(|v| !v.is_finite()) {
                return Err(invalid("starting_config", "values must be finite"));
            }
        }
        self.solver.validate()?;
        self.weights.validate()
    }

    /// Load and validate a settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut settings: Self = content.parse()?;
        settings.base_dir = path.parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// Parse the robot description this configuration names.
    pub fn load_model(&self) -> Result<RobotModel, ConfigError> {
        let parsed = match (&self.urdf, &self.urdf_path) {
            (Some(xml), _) => relik_urdf::parse_string(xml),
            (None, Some(path)) => {
                let resolved = match &self.base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                relik_urdf::parse_file(resolved)
            }
            (None, None) => return Err(ConfigError::MissingField("urdf_path or urdf".into())),
        };
        parsed.map_err(|e| ConfigError::Robot(e.to_string()))
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    /// Parse and validate a settings document. `urdf_path` resolves against
    /// the working directory.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}
