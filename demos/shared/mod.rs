//! Helpers shared by the demos

pub mod tracing;
