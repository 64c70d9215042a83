//! JUnit XML report observer
//!
//! Writes `TEST-all.xml` in the working directory at shutdown: one
//! `<testsuite>` per executed scenario, one `<testcase>` per step, a
//! `<failure>` child carrying the failure message where a step failed.

use std::fs;
use std::path::PathBuf;

use gherkin::{Scenario, Step};
use serde::Serialize;

use crate::common::{Error, Result};

use super::suite::{CaseRecord, SuiteRecord, SuiteRecorder, SuiteTree};
use super::Observer;

pub const REPORT_PATH: &str = "TEST-all.xml";

pub struct JunitObserver {
    recorder: SuiteRecorder,
    path: PathBuf,
}

impl JunitObserver {
    pub fn new() -> Self {
        Self::with_path(REPORT_PATH)
    }

    /// Write the report somewhere other than the working directory
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            recorder: SuiteRecorder::new(),
            path: path.into(),
        }
    }
}

impl Observer for JunitObserver {
    /// Creates the report file up front so an unwritable location fails
    /// the run before any scenario executes
    fn init(&mut self) -> Result<()> {
        fs::File::create(&self.path).map_err(|error| Error::ObserverInit {
            name: "junit",
            message: error.to_string(),
        })?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        let document = XmlSuites::from(self.recorder.finish());
        let xml = quick_xml::se::to_string(&document)
            .map_err(|error| Error::report_write(self.path.as_path(), error))?;
        fs::write(&self.path, xml).map_err(|error| Error::report_write(self.path.as_path(), error))?;
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

// Serialization mirror of the suite tree, shaped for the JUnit schema.

#[derive(Serialize)]
#[serde(rename = "testsuites")]
struct XmlSuites {
    #[serde(rename = "@tests")]
    tests: usize,
    #[serde(rename = "@failures")]
    failures: usize,
    #[serde(rename = "@errors")]
    errors: usize,
    #[serde(rename = "testsuite")]
    suites: Vec<XmlSuite>,
}

#[derive(Serialize)]
struct XmlSuite {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@tests")]
    tests: usize,
    #[serde(rename = "@failures")]
    failures: usize,
    #[serde(rename = "@errors")]
    errors: usize,
    #[serde(rename = "@skipped")]
    skipped: usize,
    #[serde(rename = "testcase")]
    cases: Vec<XmlCase>,
}

#[derive(Serialize)]
struct XmlCase {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@time")]
    time: f64,
    #[serde(rename = "failure", skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl From<&SuiteTree> for XmlSuites {
    fn from(tree: &SuiteTree) -> Self {
        Self {
            tests: tree.tests,
            failures: tree.failures,
            errors: 0,
            suites: tree.suites.iter().map(XmlSuite::from).collect(),
        }
    }
}

impl From<&SuiteRecord> for XmlSuite {
    fn from(suite: &SuiteRecord) -> Self {
        Self {
            name: suite.name.clone(),
            tests: suite.tests,
            failures: suite.failures,
            errors: 0,
            skipped: 0,
            cases: suite.cases.iter().map(XmlCase::from).collect(),
        }
    }
}

impl From<&CaseRecord> for XmlCase {
    fn from(case: &CaseRecord) -> Self {
        Self {
            name: case.name.clone(),
            time: case.time,
            failure: case.failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> SuiteRecorder {
        let mut recorder = SuiteRecorder::new();
        recorder.begin_scenario("Adding");
        recorder.success("I add 1 and 2");
        recorder.failure("the result is 4", "expected <4> got <3>");
        recorder.end_scenario();
        recorder
    }

    #[test]
    fn test_report_shape() {
        let mut recorder = sample_tree();
        let xml = quick_xml::se::to_string(&XmlSuites::from(recorder.finish())).unwrap();

        assert!(xml.starts_with("<testsuites tests=\"2\" failures=\"1\" errors=\"0\">"));
        assert!(xml.contains("<testsuite name=\"Adding\" tests=\"2\" failures=\"1\""));
        assert!(xml.contains("<testcase name=\"I add 1 and 2\""));
        assert!(xml.ends_with("</testsuites>"));
    }

    #[test]
    fn test_failure_is_a_child_element_with_escaped_text() {
        let mut recorder = sample_tree();
        let xml = quick_xml::se::to_string(&XmlSuites::from(recorder.finish())).unwrap();

        assert!(xml.contains("<failure>expected &lt;4&gt; got &lt;3&gt;</failure>"));
    }

    #[test]
    fn test_passing_case_has_no_failure_child() {
        let mut recorder = SuiteRecorder::new();
        recorder.begin_scenario("Clean");
        recorder.success("a step");
        recorder.end_scenario();

        let xml = quick_xml::se::to_string(&XmlSuites::from(recorder.finish())).unwrap();
        assert!(!xml.contains("<failure>"));
    }

    #[test]
    fn test_observer_writes_report_at_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST-all.xml");

        let feature = gherkin::Feature::parse(
            "Feature: f\n  Scenario: Adding\n    Given a step\n",
            gherkin::GherkinEnv::default(),
        )
        .unwrap();
        let scenario = &feature.scenarios[0];

        let mut observer = JunitObserver::with_path(path.clone());
        observer.init().unwrap();
        observer.begin_scenario(scenario);
        observer.before_step(&scenario.steps[0]);
        observer.success(&scenario.steps[0]);
        observer.end_scenario(scenario);
        observer.shutdown().unwrap();

        let xml = fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<testsuite name=\"Adding\""));
        assert!(xml.contains("<testcase name=\"a step\""));
    }
}
