// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step collection management and matching functionality.
//!
//! [`Collection`] keeps every registered [`Definition`] in registration order
//! and resolves [`gherkin::Step`] texts with [`best_match()`].

use std::sync::Arc;

use derive_more::with_trait::Debug;
use futures::future::LocalBoxFuture;
use regex::Regex;

use crate::{error::ConfigError, parameter::Templates};

use super::{
    args::{ArgKind, StepArgs},
    definition::{self, Callable, Definition, StepOutput},
    location::Location,
};

/// Collection of step [`Definition`]s.
///
/// Filled during the build phase of a [`Suite`] and read-only afterwards.
///
/// [`Suite`]: crate::Suite
#[derive(Debug)]
pub struct Collection<World> {
    /// Registered [`Definition`]s, in registration order.
    #[debug("{} definitions", definitions.len())]
    definitions: Vec<Definition<World>>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Collection<World> {
    fn clone(&self) -> Self {
        Self { definitions: self.definitions.clone() }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Collection<World> {
    fn default() -> Self {
        Self { definitions: Vec::new() }
    }
}

impl<World: 'static> Collection<World> {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step function for the given `pattern`.
    ///
    /// The `pattern` is expanded with the given [`Templates`] first, and every
    /// expanded variant becomes a separate [`Definition`] sharing the step
    /// function.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPattern`] if any variant doesn't compile.
    /// - [`ConfigError::Arity`] if any variant captures a number of groups
    ///   other than the step function accepts.
    ///
    /// Nothing is registered on error.
    #[track_caller]
    pub fn step<A, F>(
        &mut self,
        templates: &Templates,
        pattern: &str,
        f: F,
    ) -> Result<&mut Self, ConfigError>
    where
        A: StepArgs,
        F: for<'a> Fn(&'a mut World, A) -> LocalBoxFuture<'a, StepOutput>
            + Send
            + Sync
            + 'static,
    {
        let location = Location::caller();
        let regexes = templates
            .expand(pattern)
            .into_iter()
            .map(|variant| {
                Regex::new(&variant).map_err(|source| {
                    ConfigError::InvalidPattern { pattern: variant, source }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.insert(regexes, definition::callable(f), A::kinds(), location)
    }

    /// Registers a step function for the given precompiled `regex`, as is.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Arity`] if the `regex` captures a number of groups other
    /// than the step function accepts.
    #[track_caller]
    pub fn regex_step<A, F>(
        &mut self,
        regex: Regex,
        f: F,
    ) -> Result<&mut Self, ConfigError>
    where
        A: StepArgs,
        F: for<'a> Fn(&'a mut World, A) -> LocalBoxFuture<'a, StepOutput>
            + Send
            + Sync
            + 'static,
    {
        let location = Location::caller();
        self.insert(vec![regex], definition::callable(f), A::kinds(), location)
    }

    fn insert(
        &mut self,
        regexes: Vec<Regex>,
        callable: Callable<World>,
        kinds: Vec<ArgKind>,
        location: Location,
    ) -> Result<&mut Self, ConfigError> {
        if let Some(re) = regexes
            .iter()
            .find(|re| re.captures_len() - 1 != kinds.len())
        {
            return Err(ConfigError::Arity {
                pattern: re.as_str().to_owned(),
                expected: kinds.len(),
                groups: re.captures_len() - 1,
            });
        }

        let kinds: Arc<[_]> = kinds.into();
        self.definitions.extend(regexes.into_iter().map(|re| {
            tracing::trace!(pattern = re.as_str(), %location, "step registered");
            Definition::new(
                re,
                Arc::clone(&callable),
                Arc::clone(&kinds),
                Some(location),
            )
        }));
        Ok(self)
    }
}

impl<World> Collection<World> {
    /// Returns the number of registered [`Definition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indicates whether no [`Definition`]s are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over the registered [`Definition`]s in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Definition<World>> + '_ {
        self.definitions.iter()
    }

    /// Appends an already built [`Definition`].
    pub fn push(&mut self, definition: Definition<World>) {
        self.definitions.push(definition);
    }

    /// Returns the [`Definition`] best matching the given step `text`, if any.
    ///
    /// See [`best_match()`] for the resolution rules.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&Definition<World>> {
        best_match(self.iter(), text)
    }
}

/// Resolves the given step `text` against the `definitions`.
///
/// A [`Definition`] matches if its pattern matches anywhere in the `text`.
/// The matching [`Definition`] producing the greatest number of
/// non-overlapping matches wins, and on equal counts the earliest one does.
pub fn best_match<'d, World: 'd>(
    definitions: impl IntoIterator<Item = &'d Definition<World>>,
    text: &str,
) -> Option<&'d Definition<World>> {
    let mut best: Option<(&'d Definition<World>, usize)> = None;
    for def in definitions {
        let count = def.match_count(text);
        if count == 0 {
            continue;
        }
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((def, count));
        }
    }

    if let Some((def, count)) = best {
        tracing::trace!(
            text,
            pattern = def.pattern().as_str(),
            count,
            "step resolved"
        );
    }
    best.map(|(def, _)| def)
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;

    use super::*;

    #[derive(Default)]
    struct World(Vec<String>);

    fn push<'a>(
        w: &'a mut World,
        (arg,): (String,),
    ) -> LocalBoxFuture<'a, StepOutput> {
        async move {
            w.0.push(arg);
            Ok(())
        }
        .boxed_local()
    }

    fn patterns(steps: &Collection<World>) -> Vec<String> {
        steps.iter().map(|d| d.pattern().as_str().to_owned()).collect()
    }

    #[test]
    fn expands_templates_into_definitions() {
        let mut steps = Collection::new();
        _ = steps
            .step(&Templates::default(), "the label is {text}", push)
            .unwrap();

        assert_eq!(
            patterns(&steps),
            [r#"the label is "([\w\-\s]+)""#, r"the label is '([\w\-\s]+)'"],
        );
    }

    #[test]
    fn resolves_single_match_regardless_of_order() {
        let cucumbers = r"^I have (\d+) cucumbers$";
        let apples = r"^I eat (\d+) apples$";

        for order in [[cucumbers, apples], [apples, cucumbers]] {
            let mut steps = Collection::new();
            for p in order {
                _ = steps.regex_step(Regex::new(p).unwrap(), push).unwrap();
            }

            let def = steps.find("I have 42 cucumbers").unwrap();
            assert_eq!(def.pattern().as_str(), cucumbers);

            let mut world = World::default();
            futures::executor::block_on(
                def.invoke(&mut world, "I have 42 cucumbers").unwrap(),
            )
            .unwrap();
            assert_eq!(world.0, ["42"]);
        }
    }

    #[test]
    fn greater_match_count_wins() {
        let mut steps = Collection::new();
        _ = steps
            .regex_step(Regex::new(r"(\w+) apples").unwrap(), push)
            .unwrap()
            .regex_step(Regex::new(r"(\d)").unwrap(), push)
            .unwrap();

        let def = steps.find("I eat 3 apples and 4 pears").unwrap();

        assert_eq!(def.pattern().as_str(), r"(\d)");
    }

    #[test]
    fn equal_match_count_prefers_first_registered() {
        let templates = Templates::default();
        let mut steps = Collection::new();
        _ = steps
            .step(&templates, "I have {word} cucumbers", push)
            .unwrap()
            .step(&templates, "I have {int} cucumbers", push)
            .unwrap();

        let def = steps.find("I have 42 cucumbers").unwrap();

        assert_eq!(def.pattern().as_str(), r"I have (\w+) cucumbers");
    }

    #[test]
    fn no_match_is_none() {
        let mut steps = Collection::new();
        _ = steps
            .regex_step(Regex::new(r"(\w+) apples").unwrap(), push)
            .unwrap();

        assert!(steps.find("I eat 3 pears").is_none());
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let mut steps = Collection::new();
        let err = steps
            .step(&Templates::default(), "I have ({int} cucumbers", push)
            .err()
            .unwrap();

        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(steps.is_empty());
    }

    #[test]
    fn arity_mismatch_is_config_error() {
        let mut steps = Collection::new();
        let err = steps
            .step(&Templates::default(), "I add {int} to {int}", push)
            .err()
            .unwrap();

        assert!(matches!(
            err,
            ConfigError::Arity { expected: 1, groups: 2, .. },
        ));
        assert!(steps.is_empty());
    }

    #[test]
    fn records_registration_location() {
        let mut steps = Collection::new();
        _ = steps.regex_step(Regex::new(r"(\w+)").unwrap(), push).unwrap();

        let loc = steps.iter().next().unwrap().location().unwrap();
        assert!(loc.path.ends_with("collection.rs"));
    }
}
