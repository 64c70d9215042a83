//! Suite aggregation for the report observers
//!
//! Both report formats see the run the same way: one suite per executed
//! scenario (outline rows count separately), one case per executed step,
//! wall-clock time per case. [`SuiteRecorder`] builds that tree from
//! lifecycle events; the observers serialize it at shutdown.

use std::time::Instant;

use serde::Serialize;

/// One executed step
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub name: String,
    pub time: f64,
    pub failure: Option<String>,
}

/// One executed scenario
#[derive(Debug, Clone, Serialize)]
pub struct SuiteRecord {
    pub name: String,
    pub tests: usize,
    pub failures: usize,
    pub cases: Vec<CaseRecord>,
}

/// Whole-run aggregate
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteTree {
    pub tests: usize,
    pub failures: usize,
    pub suites: Vec<SuiteRecord>,
}

/// Accumulates the suite tree as lifecycle events arrive
#[derive(Default)]
pub struct SuiteRecorder {
    tree: SuiteTree,
    current: Option<SuiteRecord>,
    step_started: Option<Instant>,
    numbered: bool,
}

impl SuiteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix case names with a per-scenario counter, `0001: ` style
    pub fn with_numbered_cases() -> Self {
        Self {
            numbered: true,
            ..Self::default()
        }
    }

    pub fn begin_scenario(&mut self, name: &str) {
        self.current = Some(SuiteRecord {
            name: name.to_string(),
            tests: 0,
            failures: 0,
            cases: Vec::new(),
        });
    }

    pub fn end_scenario(&mut self) {
        if let Some(suite) = self.current.take() {
            self.tree.suites.push(suite);
        }
    }

    pub fn before_step(&mut self) {
        self.step_started = Some(Instant::now());
    }

    pub fn success(&mut self, step_name: &str) {
        self.push_case(step_name, None);
    }

    pub fn failure(&mut self, step_name: &str, message: &str) {
        self.push_case(step_name, Some(message.to_string()));
    }

    fn push_case(&mut self, step_name: &str, failure: Option<String>) {
        let time = self
            .step_started
            .take()
            .map_or(0.0, |started| started.elapsed().as_secs_f64());

        if let Some(suite) = self.current.as_mut() {
            let name = if self.numbered {
                format!("{:04}: {}", suite.cases.len() + 1, step_name)
            } else {
                step_name.to_string()
            };
            suite.cases.push(CaseRecord { name, time, failure });
        }
    }

    /// Fill in the per-suite and whole-run counters and hand out the tree
    pub fn finish(&mut self) -> &SuiteTree {
        for suite in &mut self.tree.suites {
            suite.tests = suite.cases.len();
            suite.failures = suite
                .cases
                .iter()
                .filter(|case| case.failure.is_some())
                .count();
        }
        self.tree.tests = self.tree.suites.iter().map(|suite| suite.tests).sum();
        self.tree.failures = self.tree.suites.iter().map(|suite| suite.failures).sum();
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_builds_one_suite_per_scenario() {
        let mut recorder = SuiteRecorder::new();

        recorder.begin_scenario("Adding");
        recorder.before_step();
        recorder.success("I add 1 and 2");
        recorder.before_step();
        recorder.failure("the result is 4", "expected 4 got 3");
        recorder.end_scenario();

        recorder.begin_scenario("Subtracting");
        recorder.before_step();
        recorder.success("I subtract 2 from 3");
        recorder.end_scenario();

        let tree = recorder.finish();
        assert_eq!(tree.tests, 3);
        assert_eq!(tree.failures, 1);
        assert_eq!(tree.suites.len(), 2);
        assert_eq!(tree.suites[0].name, "Adding");
        assert_eq!(tree.suites[0].failures, 1);
        assert_eq!(
            tree.suites[0].cases[1].failure.as_deref(),
            Some("expected 4 got 3")
        );
        assert_eq!(tree.suites[1].failures, 0);
    }

    #[test]
    fn test_numbered_recorder_counts_within_scenario() {
        let mut recorder = SuiteRecorder::with_numbered_cases();

        recorder.begin_scenario("first");
        recorder.success("one");
        recorder.success("two");
        recorder.end_scenario();
        recorder.begin_scenario("second");
        recorder.success("one again");
        recorder.end_scenario();

        let tree = recorder.finish();
        assert_eq!(tree.suites[0].cases[0].name, "0001: one");
        assert_eq!(tree.suites[0].cases[1].name, "0002: two");
        assert_eq!(tree.suites[1].cases[0].name, "0001: one again");
    }

    #[test]
    fn test_steps_outside_a_scenario_are_dropped() {
        let mut recorder = SuiteRecorder::new();
        recorder.success("orphan");
        recorder.end_scenario();

        let tree = recorder.finish();
        assert_eq!(tree.tests, 0);
        assert!(tree.suites.is_empty());
    }
}
