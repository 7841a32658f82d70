//! End-to-end tests against the built-in arm.

use relik_core::{ContractError, Optimizer, SessionError, SolverError};
use relik_ik::{create, create_with, RelaxedIkSession, Settings};

const GOAL: [f64; 3] = [0.5, 0.0, 0.3];
const IDENTITY: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

fn default_session() -> RelaxedIkSession {
    create(None).unwrap()
}

fn distance_to_goal(session: &RelaxedIkSession) -> f64 {
    let pose = session.end_effector_poses()[0];
    (pose.position - nalgebra::Vector3::from(GOAL)).norm()
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |m, (x, y)| m.max((x - y).abs()))
}

fn within_limits(session: &RelaxedIkSession, q: &[f64]) -> bool {
    let robot = session.optimizer().robot();
    q.iter()
        .zip(robot.lower_limits().iter().zip(robot.upper_limits()))
        .all(|(v, (lo, hi))| (lo..=hi).contains(&v))
}

#[test]
fn default_session_solves_reachable_goal() {
    let mut session = default_session();
    session.reset(&[0.0; 6]).unwrap();
    let start = distance_to_goal(&session);

    let q = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();

    assert_eq!(q.len(), session.dof());
    assert!(q.iter().all(|v| v.is_finite()));
    assert!(within_limits(&session, &q));
    assert!(distance_to_goal(&session) < start);
}

#[test]
fn warm_started_solves_settle() {
    let mut session = default_session();
    session.reset(&[0.0; 6]).unwrap();

    let zero = vec![0.0; 6];
    let first = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();
    let second = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();
    assert!(max_abs_diff(&second, &first) < max_abs_diff(&first, &zero));

    let mut previous = second;
    let mut last_step = f64::INFINITY;
    for _ in 0..40 {
        let q = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();
        last_step = max_abs_diff(&q, &previous);
        previous = q;
    }
    assert!(last_step < 2e-2, "still moving by {last_step}");
    assert!(distance_to_goal(&session) < 0.1);
}

#[test]
fn reset_makes_solves_reproducible() {
    let mut session = default_session();
    let start = [0.1, 0.2, 0.3, 0.0, -0.2, 0.0];

    session.reset(&start).unwrap();
    let a = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();
    session.solve_position(&[0.4, 0.1, 0.4], &IDENTITY, &[0.0; 6]).unwrap();

    session.reset(&start).unwrap();
    let b = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();

    assert_eq!(a, b);
}

#[test]
fn reset_anchors_goals_at_forward_kinematics() {
    let mut session = default_session();
    let q = [0.3, 0.4, 0.6, 0.2, -0.5, 0.1];
    session.reset(&q).unwrap();

    let expected = session.optimizer().forward_kinematics(&q)[0];
    let goals = session.goal_positions();
    for axis in 0..3 {
        assert!((goals[axis] - expected.position[axis]).abs() < 1e-12);
    }

    // A zero velocity step asks to hold the pose
    let x = session.solve_velocity(&[0.0; 3], &[0.0; 3], &[0.0; 6]).unwrap();
    assert!(max_abs_diff(&x, &q) < 0.05);
}

#[test]
fn solving_at_the_reset_pose_stays_within_tolerance() {
    let mut session = default_session();
    let q = [0.3, 0.4, 0.6, 0.2, -0.5, 0.1];
    session.reset(&q).unwrap();

    let goal = session.end_effector_poses()[0];
    let tolerance = [0.05, 0.05, 0.05, 0.1, 0.1, 0.1];
    let x = session
        .solve_position(goal.position.as_slice(), &goal.orientation_xyzw(), &tolerance)
        .unwrap();
    assert!(within_limits(&session, &x));

    let reached = session.end_effector_poses()[0];
    let position_error = goal.orientation.inverse() * (reached.position - goal.position);
    let rotation_error = (goal.orientation.inverse() * reached.orientation).scaled_axis();
    for axis in 0..3 {
        assert!(position_error[axis].abs() <= tolerance[axis], "{position_error:?}");
        assert!(rotation_error[axis].abs() <= tolerance[axis + 3], "{rotation_error:?}");
    }
}

#[test]
fn velocity_steps_move_the_goal() {
    let mut session = default_session();
    session.reset(&[0.0, 0.5, 0.8, 0.0, -0.6, 0.0]).unwrap();
    let before = session.goal_positions();

    for _ in 0..5 {
        session.solve_velocity(&[0.0, 0.01, 0.0], &[0.0; 3], &[0.0; 6]).unwrap();
    }

    let after = session.goal_positions();
    assert!((after[1] - before[1] - 0.05).abs() < 1e-12);
    assert!((after[0] - before[0]).abs() < 1e-12);
}

#[test]
fn mismatched_buffers_are_rejected_without_side_effects() {
    let mut session = default_session();
    session.reset(&[0.0; 6]).unwrap();

    let err = session.solve_position(&GOAL, &[0.0; 8], &[0.0; 6]).unwrap_err();
    assert!(matches!(err, SessionError::Contract(ContractError::EndEffectorMismatch { .. })));
    assert_eq!(session.joint_state(), &[0.0; 6]);

    let err = session.reset(&[0.0; 7]).unwrap_err();
    assert!(matches!(err, SessionError::Contract(ContractError::JointStateLength { .. })));
}

#[test]
fn two_sessions_are_independent() {
    let mut a = default_session();
    let b = default_session();
    a.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap();
    assert_eq!(b.joint_state(), &[0.0; 6]);
    a.destroy();
    assert_eq!(b.dof(), 6);
}

#[test]
fn settings_file_with_bad_starting_config_fails_to_create() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        format!(
            "urdf = '''{}'''\nbase_links = [\"base\"]\nee_links = [\"end_effector\"]\nstarting_config = [0.0, 0.0]\n",
            relik_ik::DEFAULT_ARM_URDF
        ),
    )
    .unwrap();
    assert!(create(Some(&path)).is_err());
}

#[test]
fn settings_file_starting_config_is_initial_state() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("arm.urdf"), relik_ik::DEFAULT_ARM_URDF).unwrap();
    let path = dir.path().join("arm.toml");
    std::fs::write(
        &path,
        "urdf_path = \"arm.urdf\"\nbase_links = [\"base\"]\nee_links = [\"end_effector\"]\nstarting_config = [0.0, 0.3, 0.6, 0.0, -0.9, 0.0]\n",
    )
    .unwrap();

    let session = create(Some(&path)).unwrap();
    assert_eq!(session.joint_state(), &[0.0, 0.3, 0.6, 0.0, -0.9, 0.0]);
}

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
  <joint name="right_shoulder" type="revolute">
    <parent link="torso"/><child link="right_upper"/>
    <origin xyz="0 -0.2 0"/><axis xyz="0 1 0"/>
    <limit lower="-2.0" upper="2.0" effort="10" velocity="1"/>
  </joint>
  <joint name="right_wrist" type="fixed">
    <parent link="right_upper"/><child link="right_hand"/>
    <origin xyz="0.3 0 0"/>
  </joint>
</robot>
"#;

#[test]
fn two_chain_robot_takes_two_goals() {
    let settings = Settings {
        urdf: Some(TWO_ARMS.into()),
        base_links: vec!["base".into(), "base".into()],
        ee_links: vec!["left_hand".into(), "right_hand".into()],
        ..Settings::default()
    };
    let mut session = create_with(&settings).unwrap();
    assert_eq!(session.num_end_effectors(), 2);
    assert_eq!(session.dof(), 3);

    let err = session.solve_position(&GOAL, &IDENTITY, &[0.0; 6]).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Contract(ContractError::EndEffectorCount { expected: 2, got: 1 })
    ));

    let positions = session.goal_positions();
    let q = session
        .solve_position(&positions, &[IDENTITY, IDENTITY].concat(), &[0.0; 12])
        .unwrap();
    assert_eq!(q.len(), 3);
}

const WHEEL: &str = r#"
<robot name="wheel">
  <link name="base"/>
  <link name="rim"/>
  <joint name="spin" type="continuous">
    <parent link="base"/><child link="rim"/>
    <origin xyz="0.1 0 0"/><axis xyz="0 0 1"/>
  </joint>
</robot>
"#;

#[test]
fn overflowing_objective_fails_without_committing() {
    let settings = Settings {
        urdf: Some(WHEEL.into()),
        ee_links: vec!["rim".into()],
        ..Settings::default()
    };
    let mut session = create_with(&settings).unwrap();
    session.reset(&[0.2]).unwrap();
    let goals_before = session.goal_positions();

    let err = session.solve_position(&[1e200, 0.0, 0.0], &IDENTITY, &[0.0; 6]).unwrap_err();

    assert!(matches!(err, SessionError::Solver(SolverError::Failed(_))));
    assert_eq!(session.joint_state(), &[0.2]);
    assert_eq!(session.history().prev(), &[0.2]);
    assert_eq!(session.goal_positions(), goals_before);
}
