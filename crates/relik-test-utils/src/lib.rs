//! Shared test fixtures for relik crates.
//!
//! Fake [`Optimizer`](relik_core::Optimizer) implementations that let a
//! [`Session`](relik_core::Session) be tested without a kinematic model.

pub mod mocks;

pub use mocks::{FailingOptimizer, PointOptimizer, ScriptedOptimizer};
