//! relik command-line driver.
//!
//! Three modes:
//! - `info`: describe the robot a settings file (or the built-in arm) loads
//! - `solve`: one absolute-pose solve, printing the joint configuration
//! - `sweep`: repeated velocity steps along +y, printing every solution

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use relik_core::{ANGULAR_VELOCITY_STRIDE, POSITION_STRIDE, TOLERANCE_STRIDE};
use relik_ik::RelaxedIkSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Relaxed inverse kinematics from the command line.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file. Omit to use the built-in six-joint arm.
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print joints, limits and end-effector poses.
    Info,

    /// Solve for absolute end-effector goals.
    Solve {
        /// Goal positions, x,y,z per end-effector.
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        position: Vec<f64>,

        /// Goal orientations, x,y,z,w per end-effector (default: identity).
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        orientation: Vec<f64>,

        /// Tolerance bands, six per end-effector (default: zeros).
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        tolerance: Vec<f64>,

        /// Reset to this joint configuration before solving.
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        reset: Vec<f64>,
    },

    /// Move every goal along +y in fixed velocity steps.
    Sweep {
        /// Number of steps.
        #[arg(short = 'n', long, default_value_t = 10)]
        steps: u32,

        /// Distance per step in meters.
        #[arg(long, default_value_t = 0.01, allow_negative_numbers = true)]
        dy: f64,
    },
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn open(settings: Option<&Path>) -> Result<RelaxedIkSession> {
    let session = relik_ik::create(settings).with_context(|| match settings {
        Some(path) => format!("failed to create session from {}", path.display()),
        None => "failed to create default session".to_string(),
    })?;
    Ok(session)
}

fn run_info(session: &RelaxedIkSession) {
    let robot = session.optimizer().robot();
    println!("dof:           {}", session.dof());
    println!("end-effectors: {}", session.num_end_effectors());
    println!();
    println!("joints:");
    for (i, name) in robot.joint_names().iter().enumerate() {
        println!(
            "  {i:>2} {name:<24} [{:>8.4}, {:>8.4}]",
            robot.lower_limits()[i],
            robot.upper_limits()[i]
        );
    }
    println!();
    println!("end-effector poses:");
    for (chain, pose) in robot.chains().iter().zip(session.end_effector_poses()) {
        let p = pose.position;
        let [qx, qy, qz, qw] = pose.orientation_xyzw();
        println!(
            "  {} -> {}: pos=({:.4}, {:.4}, {:.4}) quat=({qx:.4}, {qy:.4}, {qz:.4}, {qw:.4})",
            chain.base_link(),
            chain.ee_link(),
            p.x,
            p.y,
            p.z
        );
    }
}

fn run_solve(
    session: &mut RelaxedIkSession,
    position: &[f64],
    orientation: &[f64],
    tolerance: &[f64],
    reset: &[f64],
) -> Result<()> {
    if !reset.is_empty() {
        session.reset(reset).context("reset rejected")?;
    }
    if position.len() % POSITION_STRIDE != 0 {
        bail!("--position needs x,y,z per end-effector, got {} values", position.len());
    }
    let n = position.len() / POSITION_STRIDE;

    let orientation = if orientation.is_empty() {
        [0.0, 0.0, 0.0, 1.0].repeat(n)
    } else {
        orientation.to_vec()
    };
    let tolerance = if tolerance.is_empty() {
        vec![0.0; TOLERANCE_STRIDE * n]
    } else {
        tolerance.to_vec()
    };

    let q = session
        .solve_position(position, &orientation, &tolerance)
        .context("solve failed")?;
    print_solution(None, &q);
    Ok(())
}

fn run_sweep(session: &mut RelaxedIkSession, steps: u32, dy: f64) -> Result<()> {
    let n = session.num_end_effectors();
    let linear: Vec<f64> = [0.0, dy, 0.0].repeat(n);
    let angular = vec![0.0; ANGULAR_VELOCITY_STRIDE * n];
    let tolerance = vec![0.0; TOLERANCE_STRIDE * n];

    info!(steps, dy, "sweeping goals along +y");
    for step in 1..=steps {
        let q = session
            .solve_velocity(&linear, &angular, &tolerance)
            .with_context(|| format!("step {step} failed"))?;
        print_solution(Some(step), &q);
    }
    Ok(())
}

fn print_solution(step: Option<u32>, q: &[f64]) {
    let values: Vec<String> = q.iter().map(|v| format!("{v:.6}")).collect();
    match step {
        Some(step) => println!("{step:>4}: [{}]", values.join(", ")),
        None => println!("[{}]", values.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = open(cli.settings.as_deref())?;

    match cli.command {
        Commands::Info => run_info(&session),
        Commands::Solve {
            position,
            orientation,
            tolerance,
            reset,
        } => run_solve(&mut session, &position, &orientation, &tolerance, &reset)?,
        Commands::Sweep { steps, dy } => run_sweep(&mut session, steps, dy)?,
    }

    session.destroy();
    Ok(())
}
