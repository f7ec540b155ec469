// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of a single [`Scenario`].
//!
//! [`Scenario`]: gherkin::Scenario

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt as _;
use tracing::Instrument as _;

use crate::{
    error::StepError,
    hook::{HookType, Hooks},
    outline,
    panic::payload_message,
    record::{Running, ScenarioRecord, StepRecord, StepResult, Verdict},
    step::{location::step_location, Collection, Definition},
    tag::{self, Ext as _},
    world::World,
};

/// [`Step`] scheduled for execution.
///
/// [`Step`]: gherkin::Step
struct Planned<W> {
    step: Arc<gherkin::Step>,

    /// Resolution done ahead of time, for expanded outline [`Step`]s.
    ///
    /// [`Step`]: gherkin::Step
    resolution: Option<Result<Definition<W>, StepError>>,
}

impl<W> Planned<W> {
    fn literal(step: &gherkin::Step) -> Self {
        Self { step: Arc::new(step.clone()), resolution: None }
    }
}

/// Runs [`Scenario`]s one at a time, each against a fresh [`World`].
///
/// [`Scenario`]: gherkin::Scenario
#[derive(Debug)]
pub struct ScenarioRunner<'s, W> {
    collection: &'s Collection<W>,
    hooks: &'s Hooks<W>,
    filter: &'s tag::Filter,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for ScenarioRunner<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for ScenarioRunner<'_, W> {}

impl<'s, W: World> ScenarioRunner<'s, W> {
    /// Creates a new [`ScenarioRunner`].
    #[must_use]
    pub const fn new(
        collection: &'s Collection<W>,
        hooks: &'s Hooks<W>,
        filter: &'s tag::Filter,
    ) -> Self {
        Self { collection, hooks, filter }
    }

    /// Executes the given [`Scenario`] of the [`Feature`] (and [`Rule`]).
    ///
    /// Never fails: every error ends up in the returned [`ScenarioRecord`].
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    pub async fn run(
        self,
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: Arc<gherkin::Scenario>,
    ) -> ScenarioRecord {
        let span = tracing::info_span!(
            "scenario",
            feature = %feature.name,
            scenario = %scenario.name,
        );
        self.execute(feature, rule, scenario).instrument(span).await
    }

    async fn execute(
        self,
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: Arc<gherkin::Scenario>,
    ) -> ScenarioRecord {
        let mut record = ScenarioRecord {
            feature: feature.name.clone(),
            rule: rule.map(|r| r.name.clone()),
            scenario: Arc::clone(&scenario),
            steps: Vec::new(),
            hook_errors: Vec::new(),
            verdict: Verdict::Failed,
        };

        let init = async { W::new().await };
        let mut world = match AssertUnwindSafe(init).catch_unwind().await {
            Ok(Ok(world)) => world,
            Ok(Err(e)) => {
                record.hook_errors.push(StepError::World(e.to_string()));
                return record;
            }
            Err(payload) => {
                let message = payload_message(&*payload);
                record.hook_errors.push(StepError::World(message));
                return record;
            }
        };

        record.hook_errors =
            self.hooks.run(HookType::BeforeScenario, &mut world).await;
        if record.hook_errors.is_empty() {
            for planned in self.plan(feature, rule, &scenario) {
                let step = self.run_step(&mut world, feature, planned).await;
                let passed = step.result == StepResult::Passed;
                record.steps.push(step);
                if !passed {
                    break;
                }
            }
        }

        record.hook_errors.extend(
            self.hooks.run(HookType::AfterScenario, &mut world).await,
        );

        let passed = record.hook_errors.is_empty()
            && record.steps.iter().all(|s| s.result == StepResult::Passed);
        record.verdict = if passed { Verdict::Passed } else { Verdict::Failed };
        tracing::debug!(verdict = %record.verdict, "scenario finished");
        record
    }

    /// Lists [`Step`]s to execute: [`Feature`] background, [`Rule`]
    /// background, then the [`Scenario`] ones, expanded if it's an outline.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    fn plan(
        self,
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: &gherkin::Scenario,
    ) -> Vec<Planned<W>> {
        let backgrounds = feature
            .background
            .iter()
            .chain(rule.and_then(|r| r.background.as_ref()))
            .flat_map(|bg| &bg.steps)
            .map(Planned::literal);

        if scenario.examples.is_empty() {
            return backgrounds
                .chain(scenario.steps.iter().map(Planned::literal))
                .collect();
        }

        let examples = scenario
            .examples
            .iter()
            .filter(|ex| !self.filter.excludes(&ex.normalized_tags()));
        let expanded =
            outline::expand(self.collection, feature, &scenario.steps, examples);
        backgrounds
            .chain(expanded.into_steps().into_iter().map(|s| Planned {
                step: s.step,
                resolution: Some(s.resolution),
            }))
            .collect()
    }

    async fn run_step(
        self,
        world: &mut W,
        feature: &gherkin::Feature,
        planned: Planned<W>,
    ) -> StepRecord {
        let Planned { step, resolution } = planned;
        let running = Running::start(Arc::clone(&step));
        tracing::debug!(step = %step.value, "step started");

        let before = self.hooks.run(HookType::BeforeStep, world).await;
        let outcome = match before.into_iter().next() {
            Some(e) => Err(e),
            None => self.invoke(world, feature, &step, resolution).await,
        };

        let after = self.hooks.run(HookType::AfterStep, world).await;
        running.finish(outcome.and_then(|()| {
            after.into_iter().next().map_or(Ok(()), Err)
        }))
    }

    async fn invoke(
        self,
        world: &mut W,
        feature: &gherkin::Feature,
        step: &gherkin::Step,
        resolution: Option<Result<Definition<W>, StepError>>,
    ) -> Result<(), StepError> {
        let definition = match resolution {
            Some(resolved) => resolved?,
            None => self.collection.find(&step.value).cloned().ok_or_else(
                || {
                    let location = step_location(feature, step);
                    tracing::warn!(
                        step = %step.value,
                        %location,
                        "step doesn't match any definition",
                    );
                    StepError::not_found(step, location)
                },
            )?,
        };

        let call = async {
            definition
                .invoke(world, &step.value)?
                .await
                .map_err(StepError::failed)
        };
        AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(StepError::Panic(payload_message(&*payload)))
            })
    }
}
