// ABOUTME: Library module for postgres-elt
// ABOUTME: Exports the transfer pipeline and its stages for use in the binary and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod migration;
pub mod pipeline;
pub mod readiness;
pub mod runner;
pub mod utils;

pub use error::{CommandFailure, EltError};
pub use pipeline::{Pipeline, TransferReport};
