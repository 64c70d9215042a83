//! Cucumber wire protocol test client
//!
//! Runs Gherkin feature files against step definitions hosted in another
//! process, speaking the line-oriented cucumber wire protocol over TCP.

pub mod cli;
pub mod common;
pub mod observers;
pub mod outline;
pub mod runner;
pub mod wire;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::{RunControl, Runner, ScenarioKind};
pub use wire::{Endpoint, WireTarget};
