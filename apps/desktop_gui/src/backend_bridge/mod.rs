//! Backend worker: owns the tokio runtime, the HTTP client and file reads.

pub mod commands;
pub mod runtime;
