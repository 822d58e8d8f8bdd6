//! The generation pipeline: parallel stage fan-out, sequential chain
//! building and the orchestrator that strings the stages together.
//!
//! Concurrency semantics live here and nowhere else. `ballast-core` knows
//! how one entity is built; this crate decides how many are built at once,
//! in what order, and what happens when one of them fails.

pub mod chain;
pub mod error;
pub mod progress;
pub mod seeder;
pub mod stage;

pub use error::{Error, Result, RunError};
pub use seeder::{RunPlan, RunReport, Seeder, Stage};
