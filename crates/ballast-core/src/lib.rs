//! Core types for the ballast seeder: entity records, blueprints, the
//! generators that feed them and the store abstraction they are written
//! through.
//!
//! Everything else in the workspace builds on this crate. It stays free of
//! database and runtime dependencies so that store backends and the pipeline
//! can evolve without touching the model.

pub mod blueprint;
pub mod entity;
pub mod error;
pub mod factory;
pub mod rotation;
pub mod rules;
pub mod sequence;
pub mod store;

pub use error::{Error, Result, StoreError, ValidationError};

#[cfg(test)]
mod tests;
