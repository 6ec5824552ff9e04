//! hcipower core library
//!
//! Gated power-down and power-up of hyper-converged storage clusters:
//! - Health and connectivity prechecks
//! - Detection of a management plane hosted inside the cluster
//! - Submission of the power action and polling of its task

pub mod client;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod power;
pub mod precheck;
pub mod service;

pub use hcipower_common::{Error, Result};
pub use orchestrator::{Orchestrator, OrchestratorSettings, PowerReport, PrecheckReport};
