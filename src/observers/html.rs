//! HTML report observer
//!
//! Renders `output.html` in the working directory at shutdown from a
//! built-in template over the same suite tree the JUnit report uses.
//! Case names carry a per-scenario counter so rows read in execution
//! order.

use std::fs;
use std::path::PathBuf;

use gherkin::{Scenario, Step};
use minijinja::Environment;

use crate::common::{Error, Result};

use super::suite::SuiteRecorder;
use super::Observer;

pub const REPORT_PATH: &str = "output.html";

const TEMPLATE: &str = include_str!("report.html");

pub struct HtmlObserver {
    recorder: SuiteRecorder,
    env: Environment<'static>,
    path: PathBuf,
}

impl HtmlObserver {
    pub fn new() -> Self {
        Self::with_path(REPORT_PATH)
    }

    /// Write the report somewhere other than the working directory
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            recorder: SuiteRecorder::with_numbered_cases(),
            env: Environment::new(),
            path: path.into(),
        }
    }
}

impl Observer for HtmlObserver {
    fn init(&mut self) -> Result<()> {
        self.env
            .add_template("report.html", TEMPLATE)
            .map_err(|error| Error::ObserverInit {
                name: "html",
                message: error.to_string(),
            })?;
        fs::File::create(&self.path).map_err(|error| Error::ObserverInit {
            name: "html",
            message: error.to_string(),
        })?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        let tree = self.recorder.finish();
        let html = self
            .env
            .get_template("report.html")
            .and_then(|template| template.render(tree))
            .map_err(|error| Error::report_write(self.path.as_path(), error))?;
        fs::write(&self.path, html)
            .map_err(|error| Error::report_write(self.path.as_path(), error))?;
        Ok(())
    }

    fn begin_scenario(&mut self, scenario: &Scenario) {
        self.recorder.begin_scenario(&scenario.name);
    }

    fn end_scenario(&mut self, _scenario: &Scenario) {
        self.recorder.end_scenario();
    }

    fn before_step(&mut self, _step: &Step) {
        self.recorder.before_step();
    }

    fn success(&mut self, step: &Step) {
        self.recorder.success(&step.value);
    }

    fn failure(&mut self, step: &Step, error: &Error) {
        self.recorder.failure(&step.value, &error.to_string());
    }

    fn example(&mut self, _header: &[String], _row: &[String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(recorder: &mut SuiteRecorder) -> String {
        let mut env = Environment::new();
        env.add_template("report.html", TEMPLATE).unwrap();
        env.get_template("report.html")
            .unwrap()
            .render(recorder.finish())
            .unwrap()
    }

    #[test]
    fn test_template_renders_suites_and_totals() {
        let mut recorder = SuiteRecorder::with_numbered_cases();
        recorder.begin_scenario("Adding numbers");
        recorder.success("I add 1 and 2");
        recorder.failure("the result is 4", "expected 4 got 3");
        recorder.end_scenario();

        let html = render(&mut recorder);
        assert!(html.contains("Adding numbers"));
        assert!(html.contains("0001: I add 1 and 2"));
        assert!(html.contains("expected 4 got 3"));
        assert!(html.contains("2 steps, 1 failed"));
    }

    #[test]
    fn test_template_escapes_markup_in_names() {
        let mut recorder = SuiteRecorder::new();
        recorder.begin_scenario("<script>alert(1)</script>");
        recorder.success("a step");
        recorder.end_scenario();

        let html = render(&mut recorder);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_observer_writes_report_at_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.html");

        let feature = gherkin::Feature::parse(
            "Feature: f\n  Scenario: Rendering\n    Given a step\n",
            gherkin::GherkinEnv::default(),
        )
        .unwrap();
        let scenario = &feature.scenarios[0];

        let mut observer = HtmlObserver::with_path(path.clone());
        observer.init().unwrap();
        observer.begin_scenario(scenario);
        observer.before_step(&scenario.steps[0]);
        observer.success(&scenario.steps[0]);
        observer.end_scenario(scenario);
        observer.shutdown().unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Rendering"));
        assert!(html.contains("0001: a step"));
    }
}
