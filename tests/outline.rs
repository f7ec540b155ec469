use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
};

use cucumber_engine::{
    gherkin, ScenarioRecord, StepError, StepResult, Suite, SuiteBuilder,
    Verdict, World,
};
use futures::FutureExt as _;
use regex::Regex;

#[derive(Debug, Default)]
struct Pantry {
    cucumbers: i64,
    letters: Vec<String>,
}

impl World for Pantry {
    type Error = Infallible;

    async fn new() -> Result<Self, Infallible> {
        Ok(Self::default())
    }
}

fn builder(log: Arc<Mutex<Vec<String>>>) -> SuiteBuilder<Pantry> {
    let mut builder = Suite::<Pantry>::builder();
    _ = builder
        .step("an empty basket", |w, ()| {
            async move {
                w.cucumbers = 0;
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .step("I have {int} cucumbers", |w, (n,): (i64,)| {
            async move {
                w.cucumbers = n;
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .step("I eat {int} cucumbers", |w, (n,): (i64,)| {
            async move {
                w.cucumbers -= n;
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .step("I should have {int} cucumbers", |w, (n,): (i64,)| {
            async move {
                anyhow::ensure!(w.cucumbers == n, "{} != {n}", w.cucumbers);
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .step("a letter to {word}", |w, (name,): (String,)| {
            async move {
                w.letters.push(name);
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .regex_step(Regex::new("^the shipment$").unwrap(), |w, ()| {
            async move {
                anyhow::ensure!(!w.letters.is_empty(), "nothing to ship");
                Ok(())
            }
            .boxed_local()
        })
        .unwrap()
        .after_step(move |_| {
            let log = Arc::clone(&log);
            async move { log.lock().unwrap().push("after step".into()) }
                .boxed_local()
        });
    builder
}

fn feature(path: &str) -> gherkin::Feature {
    gherkin::Feature::parse_path(path, gherkin::GherkinEnv::default()).unwrap()
}

fn texts(record: &ScenarioRecord) -> Vec<&str> {
    record.steps.iter().map(|s| s.step.value.as_str()).collect()
}

#[tokio::test]
async fn expands_rows_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let suite = builder(Arc::clone(&log)).build();

    let report = suite
        .run_features([feature("tests/features/outline.feature")])
        .await;

    assert!(!report.execution_has_failed(), "{report}");
    let [record] = report.scenarios.as_slice() else {
        panic!("expected 1 scenario, got {}", report.scenarios.len());
    };
    assert_eq!(
        texts(record),
        [
            "an empty basket",
            "I have 12 cucumbers",
            "I eat 5 cucumbers",
            "I should have 7 cucumbers",
            "I have 20 cucumbers",
            "I eat 4 cucumbers",
            "I should have 16 cucumbers",
            "I have 1 cucumbers",
            "I eat 1 cucumbers",
            "I should have 0 cucumbers",
        ],
    );
    assert_eq!(record.verdict, Verdict::Passed);
    assert_eq!(log.lock().unwrap().len(), 10);
}

#[tokio::test]
async fn excluded_examples_are_dropped() {
    let mut builder = builder(Arc::default());
    _ = builder.ignored_tags(["@slow"]);
    let suite = builder.build();

    let report = suite
        .run_features([feature("tests/features/outline.feature")])
        .await;

    let record = &report.scenarios[0];
    assert_eq!(record.steps.len(), 7);
    assert_eq!(record.steps[1].step.value, "I have 12 cucumbers");
    assert_eq!(record.steps[6].step.value, "I should have 16 cucumbers");
    assert_eq!(record.verdict, Verdict::Passed);
}

#[tokio::test]
async fn substitutes_docstrings_and_tables() {
    let suite = builder(Arc::default()).build();

    let report = suite
        .run_features([feature("tests/features/letters.feature")])
        .await;

    assert!(!report.execution_has_failed(), "{report}");
    let record = &report.scenarios[0];
    assert_eq!(
        texts(record),
        ["a letter to Alice", "the shipment", "a letter to Bob", "the shipment"],
    );
    assert!(record.steps.iter().all(|s| s.result == StepResult::Passed));

    let letter = &record.steps[0].step;
    assert_eq!(
        letter.docstring.as_deref().map(str::trim),
        Some("Dear Alice, here are 3 cucumbers."),
    );
    let shipment = record.steps[3].step.table.as_ref().unwrap();
    assert_eq!(shipment.rows[1], ["Bob", "1.5"]);
}

#[tokio::test]
async fn unmatched_outline_step_fails() {
    let feature = gherkin::Feature::parse(
        "Feature: Unknown\n  \
           Scenario Outline: mystery\n    \
             Given I juggle <n> cucumbers\n    \
             Then I should have <n> cucumbers\n\n    \
             Examples:\n      \
               | n |\n      \
               | 2 |\n",
        gherkin::GherkinEnv::default(),
    )
    .unwrap();
    let suite = builder(Arc::default()).build();

    let report = suite.run_features([feature]).await;

    let record = &report.scenarios[0];
    assert_eq!(record.verdict, Verdict::Failed);
    assert_eq!(record.steps.len(), 1);
    assert_eq!(record.steps[0].result, StepResult::Failed);
    assert!(matches!(
        record.steps[0].error,
        Some(StepError::NotFound { ref step, .. })
            if step == "I juggle 2 cucumbers",
    ));
}
