//! mocktest-core: Timed test-session engine, scoring, and course model.
//!
//! This crate defines the data model, the session state machine, the
//! scoring policy, and the collaborator traits the rest of mocktest
//! builds on.

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod reporter;
pub mod store;
pub mod traits;
