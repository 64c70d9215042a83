//! Connection to a running step server
//!
//! The endpoint owns the TCP connection and enforces the synchronous
//! request/response discipline: one request on the wire at a time, each
//! answered before the next is sent.
//!
//! Protocol-level trouble (a dropped connection, an unparseable response,
//! a failed scenario boundary) poisons the endpoint: the first such error
//! is latched and every later call fails immediately with it, without
//! touching the socket again. Step-level failures reported by the server
//! (no match found, a failed invocation) are ordinary errors and leave the
//! endpoint usable.

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::common::{Error, Result};

use super::codec;
use super::descriptor::WireTarget;
use super::types::{invoke_args, StepMatch, WireRequest, WireResponse};

/// A connected wire protocol endpoint
pub struct Endpoint {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    poisoned: Option<String>,
}

impl Endpoint {
    /// Connect to a step server
    pub async fn connect(target: &WireTarget) -> Result<Self> {
        let addr = target.to_string();
        let stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;
        debug!("connected to step server at {}", addr);

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            poisoned: None,
        })
    }

    /// Whether a protocol-level error has shut this endpoint down
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Ask the server which step definitions match the given text
    ///
    /// An empty candidate list is reported as [`Error::NoStepMatch`]; a
    /// fail status as [`Error::RequestFailed`]. Neither poisons the
    /// endpoint.
    pub async fn step_matches(&mut self, text: &str) -> Result<Vec<StepMatch>> {
        let response = self.exchange(&WireRequest::StepMatches { text }).await?;
        if !response.is_success() {
            return Err(Error::request_failed(
                "step_matches",
                response.failure_message(),
            ));
        }

        let matches: Vec<StepMatch> = match serde_json::from_value(response.payload) {
            Ok(matches) => matches,
            Err(_) => {
                let error = Error::MalformedResponse(format!(
                    "step_matches payload is not a match list for {text:?}"
                ));
                self.poison(&error);
                return Err(error);
            }
        };

        if matches.is_empty() {
            return Err(Error::NoStepMatch(text.to_string()));
        }
        Ok(matches)
    }

    /// Invoke a matched step definition, appending a data table if present
    ///
    /// A fail status is reported as [`Error::StepFailed`] and leaves the
    /// endpoint usable.
    pub async fn invoke(
        &mut self,
        binding: &StepMatch,
        table: Option<&[Vec<String>]>,
    ) -> Result<()> {
        let args = invoke_args(binding, table);
        let response = self
            .exchange(&WireRequest::Invoke { id: &binding.id, args })
            .await?;
        if !response.is_success() {
            let (message, exception) = response.failure();
            return Err(Error::StepFailed { message, exception });
        }
        Ok(())
    }

    /// Open a scenario on the server
    ///
    /// A fail status here poisons the endpoint: the server declined to set
    /// up state, so nothing further can be trusted.
    pub async fn begin_scenario(&mut self) -> Result<()> {
        self.scenario_boundary(WireRequest::BeginScenario).await
    }

    /// Close the current scenario on the server
    pub async fn end_scenario(&mut self) -> Result<()> {
        self.scenario_boundary(WireRequest::EndScenario).await
    }

    async fn scenario_boundary(&mut self, request: WireRequest<'_>) -> Result<()> {
        let command = request.command();
        let response = self.exchange(&request).await?;
        if !response.is_success() {
            let error = Error::request_failed(command, response.failure_message());
            self.poison(&error);
            return Err(error);
        }
        Ok(())
    }

    /// Run one request/response round trip, latching any protocol error
    async fn exchange(&mut self, request: &WireRequest<'_>) -> Result<WireResponse> {
        if let Some(message) = &self.poisoned {
            return Err(Error::Poisoned(message.clone()));
        }

        match self.try_exchange(request).await {
            Ok(response) => Ok(response),
            Err(error) => {
                self.poison(&error);
                Err(error)
            }
        }
    }

    async fn try_exchange(&mut self, request: &WireRequest<'_>) -> Result<WireResponse> {
        let line = request.to_json()?;
        debug!("wire >>> {}", line);
        codec::write_line(&mut self.writer, &line).await?;

        let reply = codec::read_line(&mut self.reader).await?;
        debug!("wire <<< {}", reply);
        WireResponse::parse(&reply)
    }

    /// Latch the first protocol-level error; later ones are discarded
    fn poison(&mut self, error: &Error) {
        if self.poisoned.is_none() {
            self.poisoned = Some(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn target_of(addr: SocketAddr) -> WireTarget {
        WireTarget::new(addr.ip().to_string(), addr.port())
    }

    /// Accept one connection and answer each request line with the next
    /// canned reply
    async fn canned_server(replies: Vec<&'static str>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            for reply in replies {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                write_half.write_all(reply.as_bytes()).await.unwrap();
                write_half.write_all(b"\r\n").await.unwrap();
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_step_matches_returns_candidates() {
        let addr =
            canned_server(vec![r#"["success",[{"id":"1","args":[{"val":"5","pos":10}]}]]"#]).await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let matches = endpoint.step_matches("I have 5 cukes").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "1");
        assert_eq!(matches[0].args[0].val, "5");
        assert!(!endpoint.is_poisoned());
    }

    #[tokio::test]
    async fn test_empty_match_list_is_an_error_but_not_poison() {
        let addr = canned_server(vec![r#"["success",[]]"#, r#"["success",[{"id":"2"}]]"#]).await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let error = endpoint.step_matches("an unknown step").await.unwrap_err();
        assert!(matches!(error, Error::NoStepMatch(_)));
        assert!(!endpoint.is_poisoned());

        // The connection is still good for the next step.
        let matches = endpoint.step_matches("a known step").await.unwrap();
        assert_eq!(matches[0].id, "2");
    }

    #[tokio::test]
    async fn test_invoke_failure_does_not_poison() {
        let addr = canned_server(vec![
            r#"["fail",{"message":"expected 6 got 5","exception":"AssertionError"}]"#,
            r#"["success"]"#,
        ])
        .await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let binding = StepMatch { id: "1".to_string(), args: vec![] };
        let error = endpoint.invoke(&binding, None).await.unwrap_err();
        match error {
            Error::StepFailed { message, exception } => {
                assert_eq!(message, "expected 6 got 5");
                assert_eq!(exception.as_deref(), Some("AssertionError"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!endpoint.is_poisoned());

        endpoint.end_scenario().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_response_poisons() {
        let addr = canned_server(vec!["this is not json"]).await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let error = endpoint.step_matches("anything").await.unwrap_err();
        assert!(matches!(error, Error::MalformedResponse(_)));
        assert!(endpoint.is_poisoned());

        // Later calls fail up front without another round trip.
        let error = endpoint.begin_scenario().await.unwrap_err();
        assert!(matches!(error, Error::Poisoned(_)));
    }

    #[tokio::test]
    async fn test_closed_connection_poisons() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and immediately hang up.
            let _ = listener.accept().await.unwrap();
        });

        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();
        let error = endpoint.step_matches("anything").await.unwrap_err();
        assert!(matches!(error, Error::ConnectionClosed));
        assert!(endpoint.is_poisoned());

        let error = endpoint.step_matches("anything else").await.unwrap_err();
        assert!(matches!(error, Error::Poisoned(_)));
    }

    #[tokio::test]
    async fn test_begin_scenario_failure_poisons() {
        let addr = canned_server(vec![r#"["fail",{"message":"fixture database down"}]"#]).await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let error = endpoint.begin_scenario().await.unwrap_err();
        assert!(matches!(error, Error::RequestFailed { .. }));
        assert!(endpoint.is_poisoned());
    }

    #[tokio::test]
    async fn test_first_poison_wins() {
        let addr = canned_server(vec!["garbled"]).await;
        let mut endpoint = Endpoint::connect(&target_of(addr)).await.unwrap();

        let first = endpoint.step_matches("one").await.unwrap_err().to_string();
        let second = endpoint.step_matches("two").await.unwrap_err();
        match second {
            Error::Poisoned(message) => assert_eq!(message, first),
            other => panic!("unexpected error: {other}"),
        }
    }
}
