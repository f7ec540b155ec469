// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of whole [`Feature`]s.
//!
//! [`Feature`]: gherkin::Feature

use std::sync::Arc;

use futures::{stream, StreamExt as _};

use crate::{
    hook::Hooks,
    record::ScenarioRecord,
    step::Collection,
    tag::{self, Ext as _},
    world::World,
};

use super::ScenarioRunner;

/// Single [`Scenario`] to be either executed or reported as skipped.
///
/// [`Scenario`]: gherkin::Scenario
enum Job {
    Run {
        feature: Arc<gherkin::Feature>,
        rule: Option<Arc<gherkin::Rule>>,
        scenario: Arc<gherkin::Scenario>,
    },
    Skip(ScenarioRecord),
}

/// Runs [`Feature`]s, filtering their [`Scenario`]s by tags.
///
/// [`Feature`]: gherkin::Feature
/// [`Scenario`]: gherkin::Scenario
#[derive(Debug)]
pub struct SuiteRunner<'s, W> {
    scenarios: ScenarioRunner<'s, W>,
    filter: &'s tag::Filter,

    /// Maximum number of concurrently executed [`Scenario`]s, if running
    /// them concurrently at all.
    ///
    /// [`Scenario`]: gherkin::Scenario
    concurrency: Option<usize>,
}

impl<'s, W: World> SuiteRunner<'s, W> {
    /// Creates a new [`SuiteRunner`].
    ///
    /// [`Scenario`]s are executed sequentially, unless the `concurrency` is
    /// specified.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub const fn new(
        collection: &'s Collection<W>,
        hooks: &'s Hooks<W>,
        filter: &'s tag::Filter,
        concurrency: Option<usize>,
    ) -> Self {
        Self {
            scenarios: ScenarioRunner::new(collection, hooks, filter),
            filter,
            concurrency,
        }
    }

    /// Runs every [`Scenario`] of the given [`Feature`]s.
    ///
    /// Returned [`ScenarioRecord`]s follow the document order, even when
    /// [`Scenario`]s run concurrently.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Scenario`]: gherkin::Scenario
    pub async fn run<I>(&self, features: I) -> Vec<ScenarioRecord>
    where
        I: IntoIterator<Item = gherkin::Feature>,
    {
        let jobs = features
            .into_iter()
            .flat_map(|f| self.jobs(Arc::new(f)))
            .collect::<Vec<_>>();
        tracing::debug!(scenarios = jobs.len(), "running features");

        let runs = stream::iter(jobs).map(|job| self.execute(job));
        match self.concurrency {
            Some(max) => runs.buffered(max.max(1)).collect().await,
            None => runs.then(|run| run).collect().await,
        }
    }

    async fn execute(&self, job: Job) -> ScenarioRecord {
        match job {
            Job::Run { feature, rule, scenario } => {
                self.scenarios.run(&feature, rule.as_deref(), scenario).await
            }
            Job::Skip(record) => record,
        }
    }

    /// Splits the given [`Feature`] into [`Job`]s, with [`Rule`] ones going
    /// after the [`Feature`]'s own [`Scenario`]s.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    fn jobs(&self, feature: Arc<gherkin::Feature>) -> Vec<Job> {
        let feature_tags = feature.normalized_tags();
        let own = feature.scenarios.iter().map(|sc| (None, sc));
        let ruled = feature.rules.iter().flat_map(|r| {
            let rule = Arc::new(r.clone());
            r.scenarios.iter().map(move |sc| (Some(Arc::clone(&rule)), sc))
        });

        if self.filter.excludes(&feature_tags) {
            tracing::debug!(feature = %feature.name, "feature is skipped");
            return own
                .chain(ruled)
                .map(|(rule, sc)| {
                    let scenario = Arc::new(sc.clone());
                    Job::Skip(skipped(&feature, rule.as_deref(), scenario))
                })
                .collect();
        }

        own.chain(ruled)
            .map(|(rule, sc)| {
                let tags = feature_tags
                    .iter()
                    .cloned()
                    .chain(rule.iter().flat_map(|r| r.normalized_tags()))
                    .chain(sc.normalized_tags())
                    .collect::<Vec<_>>();
                let scenario = Arc::new(sc.clone());

                if self.filter.allows(&tags) {
                    Job::Run { feature: Arc::clone(&feature), rule, scenario }
                } else {
                    tracing::debug!(scenario = %sc.name, "scenario is skipped");
                    Job::Skip(skipped(&feature, rule.as_deref(), scenario))
                }
            })
            .collect()
    }
}

fn skipped(
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: Arc<gherkin::Scenario>,
) -> ScenarioRecord {
    let steps = feature
        .background
        .iter()
        .chain(rule.and_then(|r| r.background.as_ref()))
        .flat_map(|bg| &bg.steps)
        .chain(&scenario.steps)
        .map(|s| Arc::new(s.clone()))
        .collect::<Vec<_>>();
    ScenarioRecord::skipped(
        feature.name.clone(),
        rule.map(|r| r.name.clone()),
        scenario,
        steps,
    )
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::{executor::block_on, future::LocalBoxFuture, FutureExt as _};

    use crate::{
        parameter::Templates,
        record::{StepResult, Verdict},
        step::StepOutput,
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Counter(i64);

    impl World for Counter {
        type Error = Infallible;

        async fn new() -> Result<Self, Infallible> {
            Ok(Self::default())
        }
    }

    fn add<'a>(w: &'a mut Counter, (n,): (i64,)) -> LocalBoxFuture<'a, StepOutput> {
        async move {
            w.0 += n;
            Ok(())
        }
        .boxed_local()
    }

    const FEATURE: &str = "\
@shop
Feature: Tagged
  Background:
    Given I add 1

  Scenario: plain
    Given I add 2

  @slow
  Scenario: slow one
    Given I add 3

  @billing
  Rule: Billing
    Background:
      Given I add 10

    Scenario: ruled
      Given I add 4
";

    fn run(include: &[&str], exclude: &[&str]) -> Vec<ScenarioRecord> {
        let mut steps = Collection::new();
        _ = steps.step(&Templates::default(), "I add {int}", add).unwrap();
        let hooks = Hooks::default();
        let filter = tag::Filter::new(include, exclude);
        let feature =
            gherkin::Feature::parse(FEATURE, gherkin::GherkinEnv::default())
                .unwrap();

        block_on(
            SuiteRunner::<Counter>::new(&steps, &hooks, &filter, None)
                .run([feature]),
        )
    }

    fn verdicts(records: &[ScenarioRecord]) -> Vec<(&str, Verdict)> {
        records
            .iter()
            .map(|r| (r.scenario.name.as_str(), r.verdict))
            .collect()
    }

    #[test]
    fn runs_feature_and_rule_scenarios() {
        let records = run(&[], &[]);

        assert_eq!(
            verdicts(&records),
            [
                ("plain", Verdict::Passed),
                ("slow one", Verdict::Passed),
                ("ruled", Verdict::Passed),
            ],
        );
        let ruled = &records[2];
        assert_eq!(ruled.rule.as_deref(), Some("Billing"));
        let texts =
            ruled.steps.iter().map(|s| s.step.value.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["I add 1", "I add 10", "I add 4"]);
    }

    #[test]
    fn excluded_scenarios_are_skipped() {
        let records = run(&[], &["@slow"]);

        assert_eq!(
            verdicts(&records),
            [
                ("plain", Verdict::Passed),
                ("slow one", Verdict::Skipped),
                ("ruled", Verdict::Passed),
            ],
        );
        let skipped = &records[1];
        assert_eq!(skipped.steps.len(), 2);
        assert!(skipped.steps.iter().all(|s| s.result == StepResult::Skipped));
    }

    #[test]
    fn rule_tags_are_inherited() {
        let records = run(&["@billing"], &[]);

        assert_eq!(
            verdicts(&records),
            [
                ("plain", Verdict::Skipped),
                ("slow one", Verdict::Skipped),
                ("ruled", Verdict::Passed),
            ],
        );
    }

    #[test]
    fn excluded_feature_skips_everything() {
        let records = run(&["@slow"], &["@shop"]);

        assert!(records.iter().all(|r| r.verdict == Verdict::Skipped));
        assert_eq!(records.len(), 3);
        let ruled = &records[2];
        assert_eq!(ruled.rule.as_deref(), Some("Billing"));
        let texts =
            ruled.steps.iter().map(|s| s.step.value.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["I add 1", "I add 10", "I add 4"]);
        assert!(ruled.steps.iter().all(|s| s.result == StepResult::Skipped));
    }

    #[test]
    fn concurrent_run_keeps_order() {
        let mut steps = Collection::new();
        _ = steps.step(&Templates::default(), "I add {int}", add).unwrap();
        let (hooks, filter) = (Hooks::default(), tag::Filter::default());
        let feature =
            gherkin::Feature::parse(FEATURE, gherkin::GherkinEnv::default())
                .unwrap();

        let records = block_on(
            SuiteRunner::<Counter>::new(&steps, &hooks, &filter, Some(2))
                .run([feature.clone(), feature]),
        );

        assert_eq!(records.len(), 6);
        let names = records
            .iter()
            .map(|r| r.scenario.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["plain", "slow one", "ruled", "plain", "slow one", "ruled"],
        );
    }
}
