//! Wire descriptor files
//!
//! A step server advertises its listening address through a small
//! descriptor dropped next to the step definitions, conventionally
//! `features/step_definitions/cucumber.wire`:
//!
//! ```text
//! host: localhost
//! port: 9666
//! ```
//!
//! The format is a flat whitespace-token stream: a `host:` or `port:`
//! token consumes the following token as its value, anything else is
//! ignored. Tokens left out keep their defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8666;

/// Address a step server listens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTarget {
    pub host: String,
    pub port: u16,
}

impl Default for WireTarget {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for WireTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl WireTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Read and parse a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| Error::wire_descriptor(path, error))?;
        Self::parse(&text, path)
    }

    /// Parse descriptor text
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut target = Self::default();
        let mut tokens = text.split_whitespace();

        while let Some(token) = tokens.next() {
            match token {
                "host:" => {
                    let value = tokens.next().ok_or_else(|| {
                        Error::wire_descriptor(path, "host: token has no value")
                    })?;
                    target.host = value.to_string();
                }
                "port:" => {
                    let value = tokens.next().ok_or_else(|| {
                        Error::wire_descriptor(path, "port: token has no value")
                    })?;
                    target.port = value.parse().map_err(|_| {
                        Error::wire_descriptor(path, format!("port {value:?} is not a number"))
                    })?;
                }
                _ => {}
            }
        }

        Ok(target)
    }
}

/// Find the first `*.wire` descriptor in the given directory
pub fn discover(dir: &Path) -> Option<PathBuf> {
    let pattern = dir.join("*.wire");
    let entries = glob::glob(&pattern.to_string_lossy()).ok()?;

    for path in entries.flatten() {
        debug!("found wire descriptor {}", path.display());
        return Some(path);
    }
    None
}
