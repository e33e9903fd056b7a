//! Admission application wizard: step sequencing, draft checkpoints with a local backup,
//! submission, and the server-side intake that hosts the same HTTP contract.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
