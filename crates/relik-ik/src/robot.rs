//! A robot made of one or more kinematic chains over a shared joint vector.
//!
//! Chains may share joints (a torso driving two arms). Each chain keeps an
//! index map into the global joint vector, so a configuration is always a
//! single flat `&[f64]` of length [`Robot::dof`].

use std::collections::HashMap;

use relik_core::{ConfigError, Pose};
use relik_urdf::RobotModel;

use crate::chain::KinematicChain;

#[derive(Debug, Clone)]
pub struct Robot {
    chains: Vec<KinematicChain>,
    /// For each chain, the global index of each of its joints.
    chain_indices: Vec<Vec<usize>>,
    joint_names: Vec<String>,
    lower_limits: Vec<f64>,
    upper_limits: Vec<f64>,
}

impl Robot {
    /// Build one chain per `(base_links[i], ee_links[i])` pair.
    ///
    /// Without `joint_ordering`, global joints are numbered in order of first
    /// appearance walking the chains in order.
    pub fn from_model(
        model: &RobotModel,
        base_links: &[String],
        ee_links: &[String],
        joint_ordering: Option<&[String]>,
    ) -> Result<Self, ConfigError> {
        if base_links.is_empty() || base_links.len() != ee_links.len() {
            return Err(ConfigError::InvalidValue {
                field: "base_links".into(),
                message: format!(
                    "need one base link per end-effector link, got {} base links and {} end-effector links",
                    base_links.len(),
                    ee_links.len()
                ),
            });
        }

        let chains = base_links
            .iter()
            .zip(ee_links)
            .map(|(base, ee)| {
                KinematicChain::from_model(model, base, ee)
                    .map_err(|e| ConfigError::Robot(format!("chain {base} -> {ee}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let joint_names: Vec<String> = match joint_ordering {
            Some(order) => order.to_vec(),
            None => {
                let mut names: Vec<String> = Vec::new();
                for joint in chains.iter().flat_map(KinematicChain::joints) {
                    if !names.contains(&joint.name) {
                        names.push(joint.name.clone());
                    }
                }
                names
            }
        };

        let index_of: HashMap<&str, usize> = joint_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        if index_of.len() != joint_names.len() {
            return Err(ConfigError::InvalidValue {
                field: "joint_ordering".into(),
                message: "joint names must be unique".into(),
            });
        }

        let mut lower_limits = vec![f64::NEG_INFINITY; joint_names.len()];
        let mut upper_limits = vec![f64::INFINITY; joint_names.len()];
        let mut covered = vec![false; joint_names.len()];
        let mut chain_indices = Vec::with_capacity(chains.len());

        for chain in &chains {
            let mut indices = Vec::with_capacity(chain.dof());
            for joint in chain.joints() {
                let &i = index_of.get(joint.name.as_str()).ok_or_else(|| ConfigError::InvalidValue {
                    field: "joint_ordering".into(),
                    message: format!("joint {} is missing", joint.name),
                })?;
                if joint.lower_limit > joint.upper_limit {
                    return Err(ConfigError::Robot(format!(
                        "joint {} has lower limit {} above upper limit {}",
                        joint.name, joint.lower_limit, joint.upper_limit
                    )));
                }
                lower_limits[i] = joint.lower_limit;
                upper_limits[i] = joint.upper_limit;
                covered[i] = true;
                indices.push(i);
            }
            chain_indices.push(indices);
        }

        if let Some(i) = covered.iter().position(|c| !c) {
            return Err(ConfigError::InvalidValue {
                field: "joint_ordering".into(),
                message: format!("joint {} is not on any chain", joint_names[i]),
            });
        }

        Ok(Self {
            chains,
            chain_indices,
            joint_names,
            lower_limits,
            upper_limits,
        })
    }

    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[KinematicChain] {
        &self.chains
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn lower_limits(&self) -> &[f64] {
        &self.lower_limits
    }

    pub fn upper_limits(&self) -> &[f64] {
        &self.upper_limits
    }

    /// Whether joint `i` has finite limits on both sides.
    pub fn is_bounded(&self, i: usize) -> bool {
        self.lower_limits[i].is_finite() && self.upper_limits[i].is_finite()
    }

    /// End-effector pose of every chain at configuration `q`.
    pub fn end_effector_poses(&self, q: &[f64]) -> Vec<Pose> {
        self.chains
            .iter()
            .zip(&self.chain_indices)
            .map(|(chain, indices)| {
                let iso = chain.forward_kinematics(&gather(q, indices));
                Pose::new(iso.translation.vector, iso.rotation)
            })
            .collect()
    }

    /// Sum of per-chain manipulabilities at `q`.
    pub fn manipulability(&self, q: &[f64]) -> f64 {
        self.chains
            .iter()
            .zip(&self.chain_indices)
            .map(|(chain, indices)| chain.manipulability(&gather(q, indices)))
            .sum()
    }
}

fn gather(q: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| q[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use relik_urdf::parse_string;

    /// Torso yaw shared by a left and a right arm.
    const TWO_ARMS: &str = r#"
        <robot name="two_arms">
            <link name="base"/>
            <link name="torso"/>
            <link name="left_upper"/>
            <link name="left_hand"/>
            <link name="right_upper"/>
            <link name="right_hand"/>
            <joint name="torso_yaw" type="revolute">
                <parent link="base"/><child link="torso"/>
                <origin xyz="0 0 0.5"/><axis xyz="0 0 1"/>
                <limit lower="-1.0" upper="1.0" effort="10" velocity="1"/>
            </joint>
            <joint name="left_shoulder" type="revolute">
                <parent link="torso"/><child link="left_upper"/>
                <origin xyz="0 0.2 0"/><axis xyz="0 1 0"/>
                <limit lower="-2.0" upper="2.0" effort="10" velocity="1"/>
            </joint>
            <joint name="left_wrist" type="fixed">
                <parent link="left_upper"/><child link="left_hand"/>
                <origin xyz="0.3 0 0"/>
            </joint>
            <joint name="right_shoulder" type="continuous">
                <parent link="torso"/><child link="right_upper"/>
                <origin xyz="0 -0.2 0"/><axis xyz="0 1 0"/>
            </joint>
            <joint name="right_wrist" type="fixed">
                <parent link="right_upper"/><child link="right_hand"/>
                <origin xyz="0.3 0 0"/>
            </joint>
        </robot>
    "#;

    fn links(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn two_arms(ordering: Option<&[String]>) -> Result<Robot, ConfigError> {
        let model = parse_string(TWO_ARMS).unwrap();
        Robot::from_model(
            &model,
            &links(&["base", "base"]),
            &links(&["left_hand", "right_hand"]),
            ordering,
        )
    }

    #[test]
    fn shared_joints_are_deduplicated() {
        let robot = two_arms(None).unwrap();
        assert_eq!(robot.num_chains(), 2);
        assert_eq!(robot.dof(), 3);
        assert_eq!(
            robot.joint_names(),
            &links(&["torso_yaw", "left_shoulder", "right_shoulder"])
        );
        assert!(robot.is_bounded(0));
        assert!(!robot.is_bounded(2));
    }

    #[test]
    fn explicit_ordering_permutes_joint_vector() {
        let order = links(&["right_shoulder", "left_shoulder", "torso_yaw"]);
        let robot = two_arms(Some(&order)).unwrap();
        // Torso yaw now last
        let poses = robot.end_effector_poses(&[0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        assert_relative_eq!(poses[0].position.x, -0.2, epsilon = 1e-12);
        assert_relative_eq!(poses[0].position.y, 0.3, epsilon = 1e-12);
        assert_relative_eq!(poses[1].position.x, 0.2, epsilon = 1e-12);
        assert_relative_eq!(poses[1].position.y, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn ordering_missing_a_chain_joint_is_rejected() {
        let order = links(&["torso_yaw", "left_shoulder"]);
        let err = two_arms(Some(&order)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn ordering_with_extra_joint_is_rejected() {
        let order = links(&["torso_yaw", "left_shoulder", "right_shoulder", "ghost"]);
        assert!(two_arms(Some(&order)).is_err());
    }

    #[test]
    fn mismatched_link_lists_are_rejected() {
        let model = parse_string(TWO_ARMS).unwrap();
        let err = Robot::from_model(&model, &links(&["base"]), &links(&["left_hand", "right_hand"]), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn unknown_link_is_a_robot_error() {
        let model = parse_string(TWO_ARMS).unwrap();
        let err = Robot::from_model(&model, &links(&["base"]), &links(&["tail"]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Robot(_)));
    }
}
