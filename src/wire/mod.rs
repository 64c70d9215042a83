//! Wire protocol client
//!
//! The protocol is line oriented: every message is a single-line JSON
//! array terminated by CRLF, exchanged over one TCP connection in strict
//! request/response lockstep. [`Endpoint`] drives the conversation,
//! [`descriptor`] locates the server, [`codec`] and [`types`] cover the
//! bytes and the message shapes.

pub mod codec;
pub mod descriptor;
pub mod endpoint;
pub mod types;

pub use descriptor::WireTarget;
pub use endpoint::Endpoint;
pub use types::{MatchArg, StepMatch};
