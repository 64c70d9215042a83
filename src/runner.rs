//! Execution engine
//!
//! Walks parsed features scenario by scenario, drives the wire endpoint
//! through each one, and fans lifecycle events out to the observers.
//!
//! Failure handling is layered. A failed step ends its scenario early but
//! the run moves on to the next scenario definition; only `fail_fast`
//! promotes a scenario failure into halting the whole run. Whatever
//! happens mid-scenario, the `end_scenario` pair (endpoint, then
//! observers) is always emitted for a scenario that was begun.

use gherkin::{Feature, Scenario, Step};
use tracing::debug;

use crate::common::{Error, Result};
use crate::observers::ObserverSet;
use crate::outline;
use crate::wire::Endpoint;

/// Whether the run may continue with the next feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunControl {
    Continue,
    Halt,
}

/// How a scenario definition executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// A straight list of steps, run once
    Plain,
    /// Step templates, run once per Examples table body row
    Outline,
}

impl ScenarioKind {
    pub fn of(scenario: &Scenario) -> Self {
        if scenario.examples.is_empty() {
            Self::Plain
        } else {
            Self::Outline
        }
    }
}

/// Drives scenarios against one endpoint and one observer set
pub struct Runner {
    endpoint: Endpoint,
    observers: ObserverSet,
    fail_fast: bool,
    all_passed: bool,
}

impl Runner {
    pub fn new(endpoint: Endpoint, observers: ObserverSet, fail_fast: bool) -> Self {
        Self {
            endpoint,
            observers,
            fail_fast,
            all_passed: true,
        }
    }

    /// Initialize the observers; nothing may run if any of them fails
    pub fn init(&mut self) -> Result<()> {
        self.observers.init()
    }

    /// Flush the observers and their artifacts
    pub fn shutdown(&mut self) -> Result<()> {
        self.observers.shutdown()
    }

    /// Whether every executed scenario has passed so far
    pub fn all_passed(&self) -> bool {
        self.all_passed
    }

    /// Run every scenario definition in the feature
    pub async fn run_feature(&mut self, feature: &Feature) -> RunControl {
        for scenario in &feature.scenarios {
            let ok = match ScenarioKind::of(scenario) {
                ScenarioKind::Plain => self.run_scenario(scenario).await,
                ScenarioKind::Outline => self.run_outline(scenario).await,
            };

            if !ok {
                self.all_passed = false;
                if self.fail_fast {
                    debug!("halting run after failed scenario {:?}", scenario.name);
                    return RunControl::Halt;
                }
            }
        }
        RunControl::Continue
    }

    async fn run_scenario(&mut self, scenario: &Scenario) -> bool {
        self.observers.begin_scenario(scenario);
        self.open_endpoint_scenario().await;

        let ok = self.run_steps(&scenario.steps).await;

        self.close_scenario(scenario).await;
        ok
    }

    async fn run_outline(&mut self, scenario: &Scenario) -> bool {
        let mut all_ok = true;

        for examples in &scenario.examples {
            let Some(table) = examples.table.as_ref() else {
                continue;
            };
            let Some((header, body)) = table.rows.split_first() else {
                continue;
            };

            for row in body {
                self.observers.begin_scenario(scenario);
                self.observers.example(header, row);
                self.open_endpoint_scenario().await;

                let steps = outline::materialize_steps(&scenario.steps, header, row);
                let ok = self.run_steps(&steps).await;

                self.close_scenario(scenario).await;

                if !ok {
                    all_ok = false;
                    if self.fail_fast {
                        return false;
                    }
                }
            }
        }
        all_ok
    }

    /// Run steps in order, stopping at the first failure
    ///
    /// Steps after a failed one are skipped entirely and emit no events.
    async fn run_steps(&mut self, steps: &[Step]) -> bool {
        for step in steps {
            match self.run_step(step).await {
                Ok(()) => self.observers.success(step),
                Err(error) => {
                    self.observers.failure(step, &error);
                    return false;
                }
            }
        }
        true
    }

    async fn run_step(&mut self, step: &Step) -> Result<()> {
        self.observers.before_step(step);

        let matches = self.endpoint.step_matches(&step.value).await?;
        let binding = matches
            .first()
            .ok_or_else(|| Error::NoStepMatch(step.value.clone()))?;

        let rows = step.table.as_ref().map(|table| table.rows.as_slice());
        self.endpoint.invoke(binding, rows).await
    }

    /// Endpoint-side scenario open. A refusal is only logged here; the
    /// poisoned endpoint surfaces it through the first step's failure.
    async fn open_endpoint_scenario(&mut self) {
        if let Err(error) = self.endpoint.begin_scenario().await {
            debug!("begin_scenario: {}", error);
        }
    }

    async fn close_scenario(&mut self, scenario: &Scenario) {
        if let Err(error) = self.endpoint.end_scenario().await {
            debug!("end_scenario: {}", error);
        }
        self.observers.end_scenario(scenario);
    }
}
