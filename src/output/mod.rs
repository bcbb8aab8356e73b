//! Output module
//!
//! - [`binary`]: the fixed-layout per-class statistics file written by the consumer
//! - [`text`]: configuration banner and results table on stdout
//! - [`json`]: optional machine-readable report

pub mod binary;
pub mod json;
pub mod text;
