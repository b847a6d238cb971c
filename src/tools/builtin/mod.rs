//! Built-in tools for dataset lookups and report generation.

pub mod dataset;
pub mod report;
