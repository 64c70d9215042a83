//! Wire protocol message types
//!
//! Requests are JSON arrays whose first element is the command name and
//! whose optional second element carries the parameters:
//!
//! - `["step_matches", {"name_to_match": <text>}]`
//! - `["invoke", {"id": <id>, "args": [<arg>*, [<row>*]]}]`
//! - `["begin_scenario"]`
//! - `["end_scenario"]`
//!
//! Responses are `["success", <payload>]` or
//! `["fail", {"message": <text>, "exception": <text>?}]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, Result};

/// A request sent to the step server
#[derive(Debug, Clone)]
pub enum WireRequest<'a> {
    StepMatches { text: &'a str },
    Invoke { id: &'a str, args: Vec<Value> },
    BeginScenario,
    EndScenario,
}

#[derive(Serialize)]
struct StepMatchesParams<'a> {
    name_to_match: &'a str,
}

#[derive(Serialize)]
struct InvokeParams<'a> {
    id: &'a str,
    args: &'a [Value],
}

impl WireRequest<'_> {
    /// The wire command name
    pub fn command(&self) -> &'static str {
        match self {
            Self::StepMatches { .. } => "step_matches",
            Self::Invoke { .. } => "invoke",
            Self::BeginScenario => "begin_scenario",
            Self::EndScenario => "end_scenario",
        }
    }

    /// Serialize to the single-line JSON array form
    pub fn to_json(&self) -> Result<String> {
        let line = match self {
            Self::StepMatches { text } => serde_json::to_string(&(
                "step_matches",
                StepMatchesParams { name_to_match: text },
            ))?,
            Self::Invoke { id, args } => {
                serde_json::to_string(&("invoke", InvokeParams { id, args }))?
            }
            Self::BeginScenario => serde_json::to_string(&("begin_scenario",))?,
            Self::EndScenario => serde_json::to_string(&("end_scenario",))?,
        };
        Ok(line)
    }
}

/// A candidate step binding reported by `step_matches`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepMatch {
    pub id: String,
    #[serde(default)]
    pub args: Vec<MatchArg>,
}

/// A captured argument inside a step binding
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchArg {
    pub val: String,
    #[serde(default)]
    pub pos: Option<u64>,
}

/// Build the `args` array for an invoke request
///
/// Captured values go first, as JSON strings. A data table is appended as
/// one nested array of rows; with no captured values the table is still
/// wrapped as the sole argument.
pub fn invoke_args(binding: &StepMatch, table: Option<&[Vec<String>]>) -> Vec<Value> {
    let mut args: Vec<Value> = binding
        .args
        .iter()
        .map(|arg| Value::String(arg.val.clone()))
        .collect();

    if let Some(rows) = table {
        let rows = rows
            .iter()
            .map(|row| Value::Array(row.iter().cloned().map(Value::String).collect()))
            .collect();
        args.push(Value::Array(rows));
    }

    args
}

/// The `[status, payload]` response envelope
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: String,
    pub payload: Value,
}

impl WireResponse {
    /// Parse one response line
    ///
    /// A bare `[status]` is tolerated; the payload defaults to null.
    pub fn parse(line: &str) -> Result<Self> {
        let values: Vec<Value> = serde_json::from_str(line)
            .map_err(|_| Error::MalformedResponse(line.to_string()))?;

        let mut values = values.into_iter();
        let status = match values.next() {
            Some(Value::String(status)) => status,
            _ => return Err(Error::MalformedResponse(line.to_string())),
        };
        let payload = values.next().unwrap_or(Value::Null);

        Ok(Self { status, payload })
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Human-readable message from a fail payload
    pub fn failure_message(&self) -> String {
        self.payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| self.payload.to_string())
    }

    /// Message plus optional remote exception from a fail payload
    pub fn failure(&self) -> (String, Option<String>) {
        let exception = self
            .payload
            .get("exception")
            .and_then(Value::as_str)
            .map(str::to_owned);
        (self.failure_message(), exception)
    }
}
