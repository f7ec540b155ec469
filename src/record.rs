// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outcomes of executed [`Step`]s and [`Scenario`]s, and their [`Report`].
//!
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use derive_more::with_trait::Display;

use crate::{error::StepError, parser::ParseError};

/// Result of a single [`Step`].
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum StepResult {
    /// [`Step`] executed successfully.
    ///
    /// [`Step`]: gherkin::Step
    #[display("passed")]
    Passed,

    /// [`Step`] couldn't be resolved, its arguments couldn't be coerced, or
    /// its function returned an error or panicked.
    ///
    /// [`Step`]: gherkin::Step
    #[display("failed")]
    Failed,

    /// [`Step`] was filtered out by tags.
    ///
    /// [`Step`]: gherkin::Step
    #[display("skipped")]
    Skipped,
}

/// Immutable record of a single executed (or skipped) [`Step`].
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug)]
pub struct StepRecord {
    /// Executed [`Step`], with outline placeholders already substituted.
    ///
    /// [`Step`]: gherkin::Step
    pub step: Arc<gherkin::Step>,

    /// [`StepResult`] of the execution.
    pub result: StepResult,

    /// Wall-clock time the execution started at.
    pub started_at: SystemTime,

    /// Wall-clock time the execution finished at.
    ///
    /// Never earlier than [`StepRecord::started_at`].
    pub finished_at: SystemTime,

    /// Cause of a [`StepResult::Failed`].
    pub error: Option<StepError>,
}

impl StepRecord {
    /// Creates a [`StepResult::Skipped`] record of the given [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn skipped(step: Arc<gherkin::Step>) -> Self {
        let now = SystemTime::now();
        Self {
            step,
            result: StepResult::Skipped,
            started_at: now,
            finished_at: now,
            error: None,
        }
    }

    /// Returns how long the [`Step`] took.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at
            .duration_since(self.started_at)
            .unwrap_or_default()
    }
}

/// [`Step`] in the middle of its execution.
///
/// [`Step`]: gherkin::Step
#[derive(Debug)]
pub(crate) struct Running {
    step: Arc<gherkin::Step>,
    started_at: SystemTime,
    instant: Instant,
}

impl Running {
    /// Marks the given [`Step`] as started now.
    ///
    /// [`Step`]: gherkin::Step
    pub(crate) fn start(step: Arc<gherkin::Step>) -> Self {
        Self { step, started_at: SystemTime::now(), instant: Instant::now() }
    }

    /// Finishes the execution, producing its only [`StepRecord`].
    ///
    /// The end time is measured with a monotonic clock, so it can't precede
    /// the start time even if the wall clock goes backwards.
    pub(crate) fn finish(self, outcome: Result<(), StepError>) -> StepRecord {
        let elapsed = self.instant.elapsed();
        let (result, error) = match outcome {
            Ok(()) => (StepResult::Passed, None),
            Err(e) => (StepResult::Failed, Some(e)),
        };
        tracing::debug!(
            step = %self.step.value,
            %result,
            elapsed = %humantime::format_duration(elapsed),
            "step finished",
        );
        StepRecord {
            step: self.step,
            result,
            started_at: self.started_at,
            finished_at: self.started_at + elapsed,
            error,
        }
    }
}

/// Overall outcome of a [`Scenario`].
///
/// [`Scenario`]: gherkin::Scenario
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Verdict {
    /// Every executed [`Step`] passed and no hook failed.
    ///
    /// [`Step`]: gherkin::Step
    #[display("passed")]
    Passed,

    /// Some [`Step`] or hook failed, or the [`World`] couldn't be created.
    ///
    /// [`Step`]: gherkin::Step
    /// [`World`]: crate::World
    #[display("failed")]
    Failed,

    /// [`Scenario`] was filtered out by tags.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[display("skipped")]
    Skipped,
}

/// Record of a single [`Scenario`] (or one expanded outline run).
///
/// [`Scenario`]: gherkin::Scenario
#[derive(Clone, Debug)]
pub struct ScenarioRecord {
    /// Name of the [`Feature`] the [`Scenario`] belongs to.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Scenario`]: gherkin::Scenario
    pub feature: String,

    /// Name of the [`Rule`] the [`Scenario`] belongs to, if any.
    ///
    /// [`Rule`]: gherkin::Rule
    /// [`Scenario`]: gherkin::Scenario
    pub rule: Option<String>,

    /// Executed [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub scenario: Arc<gherkin::Scenario>,

    /// [`StepRecord`]s in execution order, background ones included.
    pub steps: Vec<StepRecord>,

    /// Errors of panicked [`Scenario`] hooks, and of the [`World`] creation.
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`World`]: crate::World
    pub hook_errors: Vec<StepError>,

    /// Overall [`Verdict`].
    pub verdict: Verdict,
}

impl ScenarioRecord {
    /// Creates a [`Verdict::Skipped`] record with every [`Step`] skipped.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn skipped(
        feature: String,
        rule: Option<String>,
        scenario: Arc<gherkin::Scenario>,
        steps: impl IntoIterator<Item = Arc<gherkin::Step>>,
    ) -> Self {
        Self {
            feature,
            rule,
            scenario,
            steps: steps.into_iter().map(StepRecord::skipped).collect(),
            hook_errors: Vec::new(),
            verdict: Verdict::Skipped,
        }
    }

    /// Returns the [`StepRecord`]s with the given [`StepResult`].
    pub fn steps_with(
        &self,
        result: StepResult,
    ) -> impl Iterator<Item = &StepRecord> + '_ {
        self.steps.iter().filter(move |s| s.result == result)
    }
}

/// Execution statistics of [`Step`]s (or [`Scenario`]s).
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of passed [`Step`]s (or [`Scenario`]s).
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    pub passed: usize,

    /// Number of skipped [`Step`]s (or [`Scenario`]s).
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    pub skipped: usize,

    /// Number of failed [`Step`]s (or [`Scenario`]s).
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    pub failed: usize,
}

impl Stats {
    /// Returns total number of [`Step`]s (or [`Scenario`]s), these [`Stats`]
    /// have been collected for.
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.skipped + self.failed
    }
}

/// Aggregated outcome of a whole run.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// [`ScenarioRecord`]s in [`Feature`] order.
    ///
    /// [`Feature`]: gherkin::Feature
    pub scenarios: Vec<ScenarioRecord>,

    /// Errors of loading [`Feature`] files.
    ///
    /// [`Feature`]: gherkin::Feature
    pub parse_errors: Vec<ParseError>,
}

impl Report {
    /// Returns [`Stats`] of all recorded [`Step`]s.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn step_stats(&self) -> Stats {
        self.scenarios.iter().flat_map(|sc| &sc.steps).fold(
            Stats::default(),
            |mut stats, step| {
                match step.result {
                    StepResult::Passed => stats.passed += 1,
                    StepResult::Failed => stats.failed += 1,
                    StepResult::Skipped => stats.skipped += 1,
                }
                stats
            },
        )
    }

    /// Returns [`Stats`] of all recorded [`Scenario`]s.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub fn scenario_stats(&self) -> Stats {
        self.scenarios.iter().fold(Stats::default(), |mut stats, sc| {
            match sc.verdict {
                Verdict::Passed => stats.passed += 1,
                Verdict::Failed => stats.failed += 1,
                Verdict::Skipped => stats.skipped += 1,
            }
            stats
        })
    }

    /// Returns the number of failed [`Step`]s.
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.step_stats().failed
    }

    /// Returns the number of [`Feature`] loading errors.
    ///
    /// [`Feature`]: gherkin::Feature
    #[must_use]
    pub fn parsing_errors(&self) -> usize {
        self.parse_errors.len()
    }

    /// Returns the number of hook (and [`World`] creation) errors.
    ///
    /// [`World`]: crate::World
    #[must_use]
    pub fn hook_errors(&self) -> usize {
        self.scenarios.iter().map(|sc| sc.hook_errors.len()).sum()
    }

    /// Indicates whether there were failures during the run.
    #[must_use]
    pub fn execution_has_failed(&self) -> bool {
        self.parsing_errors() > 0
            || self
                .scenarios
                .iter()
                .any(|sc| sc.verdict == Verdict::Failed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (failed_steps, parsing_errors, hook_errors) =
            (self.failed_steps(), self.parsing_errors(), self.hook_errors());
        write!(
            f,
            "{failed_steps} step{} failed, {parsing_errors} parsing error{}, \
             {hook_errors} hook error{}",
            plural(failed_steps),
            plural(parsing_errors),
            plural(hook_errors),
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(value: &str) -> Arc<gherkin::Step> {
        let feature = gherkin::Feature::parse(
            format!("Feature: f\n  Scenario: s\n    Given {value}\n"),
            gherkin::GherkinEnv::default(),
        )
        .unwrap();
        Arc::new(feature.scenarios[0].steps[0].clone())
    }

    fn scenario(steps: Vec<StepRecord>, verdict: Verdict) -> ScenarioRecord {
        let feature = gherkin::Feature::parse(
            "Feature: f\n  Scenario: s\n    Given x\n",
            gherkin::GherkinEnv::default(),
        )
        .unwrap();
        ScenarioRecord {
            feature: feature.name.clone(),
            rule: None,
            scenario: Arc::new(feature.scenarios[0].clone()),
            steps,
            hook_errors: Vec::new(),
            verdict,
        }
    }

    #[test]
    fn finished_is_never_before_started() {
        let record = Running::start(step("x")).finish(Ok(()));

        assert_eq!(record.result, StepResult::Passed);
        assert!(record.finished_at >= record.started_at);
        assert!(record.error.is_none());
    }

    #[test]
    fn failure_keeps_error() {
        let record =
            Running::start(step("x")).finish(Err(StepError::Panic("boom".into())));

        assert_eq!(record.result, StepResult::Failed);
        assert!(matches!(record.error, Some(StepError::Panic(ref m)) if m == "boom"));
    }

    #[test]
    fn counts_and_summarizes() {
        let failed =
            Running::start(step("x")).finish(Err(StepError::Panic("x".into())));
        let mut report = Report {
            scenarios: vec![
                scenario(
                    vec![Running::start(step("a")).finish(Ok(())), failed],
                    Verdict::Failed,
                ),
                scenario(vec![StepRecord::skipped(step("b"))], Verdict::Skipped),
            ],
            parse_errors: Vec::new(),
        };
        report.scenarios[0]
            .hook_errors
            .push(StepError::World("no database".into()));

        assert_eq!(
            report.step_stats(),
            Stats { passed: 1, skipped: 1, failed: 1 },
        );
        assert_eq!(
            report.scenario_stats(),
            Stats { passed: 0, skipped: 1, failed: 1 },
        );
        assert!(report.execution_has_failed());
        assert_eq!(
            report.to_string(),
            "1 step failed, 0 parsing errors, 1 hook error",
        );
    }

    #[test]
    fn skipped_only_is_not_a_failure() {
        let report = Report {
            scenarios: vec![scenario(
                vec![StepRecord::skipped(step("b"))],
                Verdict::Skipped,
            )],
            parse_errors: Vec::new(),
        };

        assert!(!report.execution_has_failed());
    }
}
