//! ZSnail L2 gas pricing engine.
//!
//! Library crate exposing the pricing engine and its collaborators for
//! the driver binary, the monitoring dashboard and integration tests.

pub mod config;
pub mod types;
pub mod pricing;
pub mod feed;
pub mod report;
pub mod dashboard;
