//! Result observers
//!
//! Observers receive scenario and step lifecycle events as the run
//! progresses and turn them into console output or report artifacts.
//! They are chosen by name at startup (`--output dots,junit`), called in
//! configuration order, and flushed once at shutdown.

pub mod dots;
pub mod html;
pub mod junit;
pub mod suite;

use gherkin::{Scenario, Step};

use crate::common::{Error, Result};

/// A sink for scenario and step lifecycle events
///
/// Events arrive in a fixed order per scenario: `begin_scenario`, then
/// `example` for outline rows, then `before_step` and `success` or
/// `failure` per step, then `end_scenario`. A failed step is always the
/// last step event of its scenario.
pub trait Observer {
    /// Called once before any scenario runs
    fn init(&mut self) -> Result<()>;
    /// Called once after the last scenario, flushing any artifact
    fn shutdown(&mut self) -> Result<()>;

    fn begin_scenario(&mut self, scenario: &Scenario);
    fn end_scenario(&mut self, scenario: &Scenario);
    fn before_step(&mut self, step: &Step);
    fn success(&mut self, step: &Step);
    fn failure(&mut self, step: &Step, error: &Error);
    /// The example row driving the current outline scenario
    fn example(&mut self, header: &[String], row: &[String]);
}

/// Build the observer registered under the given output name
pub fn create(name: &str) -> Result<Box<dyn Observer>> {
    match name {
        "dots" => Ok(Box::new(dots::DotsObserver::new())),
        "junit" => Ok(Box::new(junit::JunitObserver::new())),
        "html" => Ok(Box::new(html::HtmlObserver::new())),
        other => Err(Error::UnknownObserver(other.to_string())),
    }
}

/// Ordered fanout over the configured observers
///
/// Every event is delivered to each observer in configuration order.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverSet {
    /// Build a set from comma-separated configuration names
    ///
    /// An unknown name fails the whole set; nothing runs with a partial
    /// observer list.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut observers = Vec::new();
        for name in names {
            observers.push(create(name.trim())?);
        }
        Ok(Self { observers })
    }

    pub fn push(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Initialize every observer, stopping at the first failure
    pub fn init(&mut self) -> Result<()> {
        for observer in &mut self.observers {
            observer.init()?;
        }
        Ok(())
    }

    /// Shut every observer down
    ///
    /// Each observer gets its chance to flush even when an earlier one
    /// fails; the first error is the one reported.
    pub fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;
        for observer in &mut self.observers {
            if let Err(error) = observer.shutdown() {
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn begin_scenario(&mut self, scenario: &Scenario) {
        for observer in &mut self.observers {
            observer.begin_scenario(scenario);
        }
    }

    pub fn end_scenario(&mut self, scenario: &Scenario) {
        for observer in &mut self.observers {
            observer.end_scenario(scenario);
        }
    }

    pub fn before_step(&mut self, step: &Step) {
        for observer in &mut self.observers {
            observer.before_step(step);
        }
    }

    pub fn success(&mut self, step: &Step) {
        for observer in &mut self.observers {
            observer.success(step);
        }
    }

    pub fn failure(&mut self, step: &Step, error: &Error) {
        for observer in &mut self.observers {
            observer.failure(step, error);
        }
    }

    pub fn example(&mut self, header: &[String], row: &[String]) {
        for observer in &mut self.observers {
            observer.example(header, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    struct TagObserver {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Observer for TagObserver {
        fn init(&mut self) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:init", self.tag));
            Ok(())
        }
        fn shutdown(&mut self) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:shutdown", self.tag));
            Ok(())
        }
        fn begin_scenario(&mut self, _scenario: &Scenario) {
            self.log.borrow_mut().push(format!("{}:begin", self.tag));
        }
        fn end_scenario(&mut self, _scenario: &Scenario) {}
        fn before_step(&mut self, _step: &Step) {}
        fn success(&mut self, _step: &Step) {}
        fn failure(&mut self, _step: &Step, _error: &Error) {}
        fn example(&mut self, _header: &[String], _row: &[String]) {}
    }

    fn scenario() -> Scenario {
        let text = "Feature: f\n  Scenario: s\n    Given a step\n";
        gherkin::Feature::parse(text, gherkin::GherkinEnv::default())
            .unwrap()
            .scenarios
            .remove(0)
    }

    #[test]
    fn test_create_rejects_unknown_name() {
        assert!(matches!(
            create("teletype"),
            Err(Error::UnknownObserver(name)) if name == "teletype"
        ));
    }

    #[test]
    fn test_from_names_rejects_unknown_name_in_list() {
        assert!(ObserverSet::from_names("dots,teletype".split(',')).is_err());
    }

    #[test]
    fn test_events_fan_out_in_configuration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ObserverSet::default();
        set.push(Box::new(TagObserver { tag: "a", log: Rc::clone(&log) }));
        set.push(Box::new(TagObserver { tag: "b", log: Rc::clone(&log) }));

        set.init().unwrap();
        set.begin_scenario(&scenario());
        set.shutdown().unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["a:init", "b:init", "a:begin", "b:begin", "a:shutdown", "b:shutdown"]
        );
    }
}
