//! Error types for the wire test client
//!
//! Errors fall into two broad families. Run-fatal errors (connection,
//! configuration, reporting) bubble up to the binary and abort the run.
//! Step-level errors (no match, failed invocation) are caught by the
//! execution engine, turned into observer failure events, and never
//! escape the scenario loop.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    // === Connection Errors ===
    /// Could not reach the step server. Fatal for the whole run, no
    /// retries.
    #[error("Failed to connect to step server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The server hung up while a response was still owed
    #[error("Step server closed the connection unexpectedly")]
    ConnectionClosed,

    // === Wire Protocol Errors ===
    /// The server sent something that is not a `[status, payload]` line
    #[error("Malformed wire response: {0}")]
    MalformedResponse(String),

    /// The server answered a request with a fail status
    #[error("Wire command {command:?} failed: {message}")]
    RequestFailed {
        command: &'static str,
        message: String,
    },

    /// An earlier protocol error latched the endpoint shut
    #[error("Wire endpoint poisoned by earlier failure: {0}")]
    Poisoned(String),

    // === Step Errors ===
    /// The server reported no step definition for the given text
    #[error("No step definition matches {0:?}")]
    NoStepMatch(String),

    /// A step implementation ran and failed
    #[error("Step failed: {message}{}", exception_suffix(.exception))]
    StepFailed {
        message: String,
        exception: Option<String>,
    },

    // === Feature Errors ===
    /// A feature input could not be parsed
    #[error("Cannot parse feature {path}: {message}")]
    FeatureParse { path: String, message: String },

    /// A positional feature pattern is not a valid glob
    #[error("Invalid feature pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    // === Configuration Errors ===
    /// A `*.wire` descriptor exists but cannot be used
    #[error("Invalid wire descriptor {}: {message}", .path.display())]
    WireDescriptor { path: PathBuf, message: String },

    /// An `--output` name has no registered observer
    #[error("Unknown observer {0:?}. Known observers: dots, junit, html")]
    UnknownObserver(String),

    /// The `--server` child process could not be started
    #[error("Failed to launch step server {path:?}: {source}")]
    ServerLaunch {
        path: String,
        #[source]
        source: io::Error,
    },

    // === Observer Errors ===
    /// An observer could not be set up at startup
    #[error("Observer {name} failed to initialize: {message}")]
    ObserverInit {
        name: &'static str,
        message: String,
    },

    /// A report artifact could not be produced at shutdown
    #[error("Failed to write report {}: {message}", .path.display())]
    ReportWrite { path: PathBuf, message: String },

    // === IO and Serialization ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn request_failed(command: &'static str, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            command,
            message: message.into(),
        }
    }

    pub fn step_failed(message: impl Into<String>, exception: Option<String>) -> Self {
        Self::StepFailed {
            message: message.into(),
            exception,
        }
    }

    pub fn feature_parse(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::FeatureParse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn wire_descriptor(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::WireDescriptor {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn report_write(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::ReportWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn exception_suffix(exception: &Option<String>) -> String {
    match exception {
        Some(text) => format!("\nRemote exception: {text}"),
        None => String::new(),
    }
}
