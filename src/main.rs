//! Cucumber wire protocol test client
//!
//! Executes Gherkin acceptance scenarios against step definitions hosted
//! out of process, over the line-oriented wire protocol.

use clap::Parser;

use cuke_wire::cli::{self, Cli};
use cuke_wire::common::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let cli = Cli::parse();
    match cli::run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
