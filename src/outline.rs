// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Expansion of [Scenario Outline][1] steps against their [Examples][2].
//!
//! This outline:
//! ```gherkin
//! Scenario Outline: eating
//!   Given there are <start> cucumbers
//!   When I eat <eat> cucumbers
//!
//!   Examples:
//!     | start | eat |
//!     |    12 |   5 |
//!     |    20 |   4 |
//! ```
//!
//! is executed as the following steps, in this exact order:
//! ```gherkin
//! Given there are 12 cucumbers
//! When I eat 5 cucumbers
//! Given there are 20 cucumbers
//! When I eat 4 cucumbers
//! ```
//!
//! Every expanded step is resolved before any of them runs. Besides that, a
//! concrete pattern like `there are (-?\d+) cucumbers` is synthesized out of
//! the outline text and bound to the step function the expanded step resolves
//! to. Synthesized [`Definition`]s live in a scenario-local overlay and never
//! leak into the shared [`Collection`].
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
//! [2]: https://cucumber.io/docs/gherkin/reference#examples

use std::{fmt, sync::Arc};

use lazy_regex::regex;
use regex::{Captures, Regex};

use crate::{
    error::StepError,
    step::{best_match, location::step_location, Collection, Definition},
};

/// Single expanded outline [`Step`] along with its resolution.
///
/// [`Step`]: gherkin::Step
pub struct ExpandedStep<W> {
    /// [`Step`] with every known placeholder substituted, in its text,
    /// docstring and table.
    ///
    /// [`Step`]: gherkin::Step
    pub step: Arc<gherkin::Step>,

    /// [`Definition`] the [`step`] resolved to at expansion time.
    ///
    /// [`step`]: Self::step
    pub resolution: Result<Definition<W>, StepError>,
}

// Implemented manually to omit redundant `W: Debug` trait bound.
impl<W> fmt::Debug for ExpandedStep<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpandedStep")
            .field("step", &self.step.value)
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// Output of [`expand()`].
pub struct Expansion<W> {
    overlay: Collection<W>,
    steps: Vec<ExpandedStep<W>>,
}

// Implemented manually to omit redundant `W: Debug` trait bound.
impl<W> fmt::Debug for Expansion<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expansion")
            .field("overlay", &self.overlay)
            .field("steps", &self.steps)
            .finish()
    }
}

impl<W> Expansion<W> {
    /// Returns [`Definition`]s synthesized during the expansion.
    #[must_use]
    pub const fn overlay(&self) -> &Collection<W> {
        &self.overlay
    }

    /// Returns [`ExpandedStep`]s in execution order.
    #[must_use]
    pub fn steps(&self) -> &[ExpandedStep<W>] {
        &self.steps
    }

    /// Takes [`ExpandedStep`]s out, in execution order.
    #[must_use]
    pub fn into_steps(self) -> Vec<ExpandedStep<W>> {
        self.steps
    }
}

/// Expands outline `steps` of the given [`Feature`] against the `examples`.
///
/// Output is row-major: grouped by [`Examples`] table, then by row, then in
/// the original step order. [`Examples`] without a table or without body rows
/// contribute nothing.
///
/// [`Examples`]: gherkin::Examples
/// [`Feature`]: gherkin::Feature
pub fn expand<'e, W: 'static>(
    collection: &Collection<W>,
    feature: &gherkin::Feature,
    steps: &[gherkin::Step],
    examples: impl IntoIterator<Item = &'e gherkin::Examples>,
) -> Expansion<W> {
    let mut overlay = Collection::new();
    let mut expanded = Vec::new();

    let tables = examples.into_iter().filter_map(|ex| {
        ex.table.as_ref().and_then(|t| t.rows.split_first())
    });
    for (header, body) in tables {
        for values in body {
            let row = header
                .iter()
                .map(String::as_str)
                .zip(values.iter().map(String::as_str))
                .collect::<Vec<_>>();

            for outline in steps {
                let step = substitute_step(outline, &row);

                let callable = resolve(collection, &overlay, &step.value)
                    .or_else(|| resolve(collection, &overlay, &outline.value));
                if let Some(def) = callable {
                    let pattern = concrete_pattern(&outline.value, &row);
                    match Regex::new(&pattern) {
                        Ok(re) => overlay.push(def.rebind(re)),
                        Err(e) => tracing::warn!(
                            %pattern,
                            error = %e,
                            "synthesized outline pattern doesn't compile",
                        ),
                    }
                }

                let resolution = resolve(collection, &overlay, &step.value)
                    .ok_or_else(|| {
                        let location = step_location(feature, &step);
                        tracing::warn!(
                            step = %step.value,
                            %location,
                            "expanded outline step doesn't match any definition",
                        );
                        StepError::not_found(&step, location)
                    });
                expanded.push(ExpandedStep { step: Arc::new(step), resolution });
            }
        }
    }

    Expansion { overlay, steps: expanded }
}

fn resolve<W>(
    collection: &Collection<W>,
    overlay: &Collection<W>,
    text: &str,
) -> Option<Definition<W>> {
    best_match(collection.iter().chain(overlay.iter()), text).cloned()
}

/// Looks up the value of the `name`d placeholder in the `row`.
fn lookup<'r>(row: &[(&str, &'r str)], name: &str) -> Option<&'r str> {
    row.iter().find(|(header, _)| *header == name).map(|(_, value)| *value)
}

/// Substitutes every known `<placeholder>` of the `text` with its `row` value.
///
/// Unknown placeholders are kept as is.
fn substitute(text: &str, row: &[(&str, &str)]) -> String {
    regex!(r"<([^<>]+)>")
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(row, &caps[1]).map_or_else(|| caps[0].to_owned(), Into::into)
        })
        .into_owned()
}

fn substitute_step(step: &gherkin::Step, row: &[(&str, &str)]) -> gherkin::Step {
    let mut step = step.clone();
    step.value = substitute(&step.value, row);
    if let Some(docstring) = step.docstring.as_mut() {
        *docstring = substitute(docstring, row);
    }
    for cell in step.table.iter_mut().flat_map(|t| &mut t.rows).flatten() {
        *cell = substitute(cell, row);
    }
    step
}

/// Builds a [`Regex`] source out of the outline `text`, replacing every known
/// placeholder with a capturing group fitting its `row` value.
///
/// Everything else is matched literally.
fn concrete_pattern(text: &str, row: &[(&str, &str)]) -> String {
    let mut pattern = String::with_capacity(text.len());
    let mut last = 0;
    for caps in regex!(r"<([^<>]+)>").captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        pattern.push_str(&regex::escape(&text[last..whole.start()]));
        match lookup(row, &caps[1]) {
            Some(value) => pattern.push_str(fragment(value)),
            None => pattern.push_str(&regex::escape(whole.as_str())),
        }
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&text[last..]));
    pattern
}

/// Picks a capturing group for the given example `value`.
fn fragment(value: &str) -> &'static str {
    if regex!(r"^-?\d+$").is_match(value) {
        r"(-?\d+)"
    } else if regex!(r"^[+-]?(?:\d*\.)?\d+$").is_match(value) {
        r"([+-]?(?:\d*\.)?\d+)"
    } else {
        "(.*)"
    }
}
