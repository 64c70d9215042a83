//! Console progress observer
//!
//! The classic dots format: scenario names as headers, one `.` per
//! passing step, a red `F` for the failing one, and the failure message
//! once the scenario closes.

use std::io::Write;

use colored::Colorize;
use gherkin::{Scenario, Step};

use crate::common::{Error, Result};

use super::Observer;

#[derive(Default)]
pub struct DotsObserver {
    failed: bool,
    message: String,
}

impl DotsObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for DotsObserver {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_scenario(&mut self, scenario: &Scenario) {
        println!("Scenario: {}", scenario.name);
        self.failed = false;
    }

    fn end_scenario(&mut self, _scenario: &Scenario) {
        println!();
        if self.failed {
            println!("{} {}", "Scenario failed:".red().bold(), self.message);
        }
    }

    fn before_step(&mut self, _step: &Step) {}

    fn success(&mut self, _step: &Step) {
        print!(".");
        let _ = std::io::stdout().flush();
    }

    fn failure(&mut self, _step: &Step, error: &Error) {
        print!("{}", "F".red());
        let _ = std::io::stdout().flush();
        self.failed = true;
        self.message = error.to_string();
    }

    fn example(&mut self, header: &[String], row: &[String]) {
        let pairs: Vec<String> = header
            .iter()
            .zip(row)
            .map(|(key, value)| format!("{key} = {value}"))
            .collect();
        println!("\nScenario Example: {}", pairs.join(" "));
    }
}
