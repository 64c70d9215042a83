//! Mock wire protocol server for integration testing
//!
//! Implements the server side of the wire protocol with deterministic,
//! text-driven behavior so tests need no real step definitions. Binds
//! 127.0.0.1 on the requested port (0 picks an ephemeral one), prints
//! `PORT=<n>` on stdout, serves a single connection, then exits.
//!
//! Match rules:
//! - step text containing `unmatched` yields an empty match list
//! - step text containing `matcherror` yields a match failure
//! - invoking a step whose text contains `fail` yields an invocation
//!   failure with message and exception
//! - everything else succeeds; digit runs are reported as captured args

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use serde_json::{json, Value};

fn main() {
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let listener = TcpListener::bind(("127.0.0.1", port)).expect("bind mock wire server");
    let port = listener.local_addr().expect("local addr").port();
    println!("PORT={port}");
    std::io::stdout().flush().ok();

    let (stream, _) = listener.accept().expect("accept connection");
    serve(stream);
}

fn serve(stream: TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut writer = stream;
    let mut state = MockState::default();

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let request: Value = match serde_json::from_str(line.trim_end()) {
            Ok(value) => value,
            Err(_) => continue,
        };

        let response = state.process_request(&request);
        let body = serde_json::to_string(&response).expect("serialize response");
        writer.write_all(body.as_bytes()).ok();
        writer.write_all(b"\r\n").ok();
        writer.flush().ok();
    }
}

#[derive(Default)]
struct MockState {
    bindings: HashMap<String, String>,
    next_id: u32,
}

impl MockState {
    fn process_request(&mut self, request: &Value) -> Value {
        let command = request.get(0).and_then(Value::as_str).unwrap_or("");
        let params = request.get(1).cloned().unwrap_or(Value::Null);

        match command {
            "step_matches" => {
                let text = params
                    .get("name_to_match")
                    .and_then(Value::as_str)
                    .unwrap_or("");

                if text.contains("unmatched") {
                    json!(["success", []])
                } else if text.contains("matcherror") {
                    json!(["fail", {"message": "step matcher raised an error"}])
                } else {
                    self.next_id += 1;
                    let id = self.next_id.to_string();
                    self.bindings.insert(id.clone(), text.to_string());
                    json!(["success", [{"id": id, "args": capture_digits(text)}]])
                }
            }
            "invoke" => {
                let id = params.get("id").and_then(Value::as_str).unwrap_or("");
                let text = self.bindings.get(id).cloned().unwrap_or_default();

                if text.contains("fail") {
                    json!(["fail", {
                        "message": format!("forced failure: {text}"),
                        "exception": "MockStepError"
                    }])
                } else {
                    json!(["success"])
                }
            }
            "begin_scenario" | "end_scenario" => json!(["success"]),
            other => json!(["fail", {"message": format!("unknown command: {other}")}]),
        }
    }
}

/// Report each maximal digit run as a captured argument, the way a regex
/// matcher with `(\d+)` groups would
fn capture_digits(text: &str) -> Vec<Value> {
    let mut args = Vec::new();
    let mut run_start = None;

    for (index, byte) in text.bytes().enumerate() {
        match (byte.is_ascii_digit(), run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                args.push(json!({"val": &text[start..index], "pos": start}));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        args.push(json!({"val": &text[start..], "pos": start}));
    }
    args
}
