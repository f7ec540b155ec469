// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Suite`] and its [`SuiteBuilder`].

use std::{fmt, path::PathBuf, sync::Arc};

use futures::future::LocalBoxFuture;
use regex::Regex;
use smart_default::SmartDefault;

use crate::{
    error::ConfigError,
    hook::{HookType, Hooks},
    parameter::Templates,
    parser,
    record::Report,
    runner::SuiteRunner,
    step::{Collection, StepArgs, StepOutput},
    tag,
    world::World,
};

/// Configuration of a [`Suite`].
#[derive(Clone, Debug, SmartDefault)]
pub struct SuiteOptions {
    /// `.feature` files, directories or glob patterns loaded by
    /// [`Suite::run()`].
    pub features: Vec<PathBuf>,

    /// `@`-prefixed tags, at least one of which a [`Scenario`] has to carry
    /// to run. Empty means every [`Scenario`] runs.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub tags: Vec<String>,

    /// `@`-prefixed tags excluding any [`Scenario`] (or [`Examples`] table)
    /// carrying them. Wins over [`SuiteOptions::tags`].
    ///
    /// [`Examples`]: gherkin::Examples
    /// [`Scenario`]: gherkin::Scenario
    pub ignored_tags: Vec<String>,

    /// Whether independent [`Scenario`]s run concurrently.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub parallel: bool,

    /// Maximum number of concurrently running [`Scenario`]s, when
    /// [`SuiteOptions::parallel`] is on.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[default(64)]
    pub max_concurrent_scenarios: usize,
}

/// Mutable registry of parameter templates, step definitions and hooks,
/// frozen into a [`Suite`] by [`SuiteBuilder::build()`].
pub struct SuiteBuilder<W> {
    templates: Templates,
    collection: Collection<W>,
    hooks: Hooks<W>,
    options: SuiteOptions,
}

// Implemented manually to omit redundant `W: Debug` trait bound.
impl<W> fmt::Debug for SuiteBuilder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteBuilder")
            .field("templates", &self.templates)
            .field("collection", &self.collection.len())
            .field("hooks", &self.hooks)
            .field("options", &self.options)
            .finish()
    }
}

// Implemented manually to omit redundant `W: Default` trait bound, imposed by
// `#[derive(Default)]`.
impl<W> Default for SuiteBuilder<W> {
    fn default() -> Self {
        Self {
            templates: Templates::default(),
            collection: Collection::default(),
            hooks: Hooks::default(),
            options: SuiteOptions::default(),
        }
    }
}

impl<W: World> SuiteBuilder<W> {
    /// Creates a new [`SuiteBuilder`] with the built-in parameter templates
    /// and default [`SuiteOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers additional regex `fragments` for the parameter template
    /// `token`, affecting steps registered afterwards.
    ///
    /// # Errors
    ///
    /// See [`Templates::register()`].
    pub fn parameter_template<I, S>(
        &mut self,
        token: impl Into<String>,
        fragments: I,
    ) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        _ = self.templates.register(token, fragments)?;
        Ok(self)
    }

    /// Registers a step function for the given `pattern`, expanding its
    /// parameter templates.
    ///
    /// # Errors
    ///
    /// See [`Collection::step()`].
    #[track_caller]
    pub fn step<A, F>(
        &mut self,
        pattern: &str,
        f: F,
    ) -> Result<&mut Self, ConfigError>
    where
        A: StepArgs,
        F: for<'a> Fn(&'a mut W, A) -> LocalBoxFuture<'a, StepOutput>
            + Send
            + Sync
            + 'static,
    {
        _ = self.collection.step(&self.templates, pattern, f)?;
        Ok(self)
    }

    /// Registers a step function for the given precompiled `regex`, without
    /// any template expansion.
    ///
    /// # Errors
    ///
    /// See [`Collection::regex_step()`].
    #[track_caller]
    pub fn regex_step<A, F>(
        &mut self,
        regex: Regex,
        f: F,
    ) -> Result<&mut Self, ConfigError>
    where
        A: StepArgs,
        F: for<'a> Fn(&'a mut W, A) -> LocalBoxFuture<'a, StepOutput>
            + Send
            + Sync
            + 'static,
    {
        _ = self.collection.regex_step(regex, f)?;
        Ok(self)
    }

    fn hook<H>(&mut self, ty: HookType, hook: H) -> &mut Self
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.push(ty, hook);
        self
    }

    /// Appends a hook running before every [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn before_scenario<H>(&mut self, hook: H) -> &mut Self
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.hook(HookType::BeforeScenario, hook)
    }

    /// Appends a hook running after every [`Scenario`], whatever its outcome.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn after_scenario<H>(&mut self, hook: H) -> &mut Self
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.hook(HookType::AfterScenario, hook)
    }

    /// Appends a hook running before every [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    pub fn before_step<H>(&mut self, hook: H) -> &mut Self
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.hook(HookType::BeforeStep, hook)
    }

    /// Appends a hook running after every executed [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    pub fn after_step<H>(&mut self, hook: H) -> &mut Self
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.hook(HookType::AfterStep, hook)
    }

    /// Replaces the [`SuiteOptions`] altogether.
    pub fn options(&mut self, options: SuiteOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Adds `.feature` files, directories or glob patterns to load.
    pub fn features<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.options.features.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Adds tags [`Scenario`]s have to carry to run.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds tags excluding [`Scenario`]s from the run.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn ignored_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.ignored_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Turns concurrent execution of [`Scenario`]s on or off.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn parallel(&mut self, parallel: bool) -> &mut Self {
        self.options.parallel = parallel;
        self
    }

    /// Limits the number of concurrently running [`Scenario`]s.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub fn max_concurrent_scenarios(&mut self, max: usize) -> &mut Self {
        self.options.max_concurrent_scenarios = max;
        self
    }

    /// Freezes this [`SuiteBuilder`] into a [`Suite`].
    #[must_use]
    pub fn build(self) -> Suite<W> {
        let Self { collection, hooks, options, .. } = self;
        let filter = tag::Filter::new(&options.tags, &options.ignored_tags);
        tracing::debug!(
            definitions = collection.len(),
            hooks = ?hooks,
            "suite built",
        );
        Suite {
            collection: Arc::new(collection),
            hooks: Arc::new(hooks),
            filter,
            options,
        }
    }
}

/// Frozen set of step definitions and hooks, executing [`Feature`]s.
///
/// Cloning is cheap: definitions and hooks are shared.
///
/// [`Feature`]: gherkin::Feature
pub struct Suite<W> {
    collection: Arc<Collection<W>>,
    hooks: Arc<Hooks<W>>,
    filter: tag::Filter,
    options: SuiteOptions,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for Suite<W> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            hooks: Arc::clone(&self.hooks),
            filter: self.filter.clone(),
            options: self.options.clone(),
        }
    }
}

// Implemented manually to omit redundant `W: Debug` trait bound.
impl<W> fmt::Debug for Suite<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("collection", &self.collection.len())
            .field("hooks", &self.hooks)
            .field("filter", &self.filter)
            .field("options", &self.options)
            .finish()
    }
}

impl<W: World> Suite<W> {
    /// Creates a new [`SuiteBuilder`].
    #[must_use]
    pub fn builder() -> SuiteBuilder<W> {
        SuiteBuilder::new()
    }

    /// Returns the [`SuiteOptions`] this [`Suite`] was built with.
    #[must_use]
    pub const fn options(&self) -> &SuiteOptions {
        &self.options
    }

    /// Returns the registered step definitions.
    #[must_use]
    pub fn collection(&self) -> &Collection<W> {
        &self.collection
    }

    /// Loads [`SuiteOptions::features`] and runs them.
    ///
    /// Loading failures don't stop the run, and are reported in
    /// [`Report::parse_errors`].
    pub async fn run(&self) -> Report {
        let (features, parse_errors) =
            parser::Basic.parse(&self.options.features);
        let mut report = self.run_features(features).await;
        report.parse_errors = parse_errors;
        report
    }

    /// Runs the given already parsed [`Feature`]s.
    ///
    /// [`Feature`]: gherkin::Feature
    pub async fn run_features<I>(&self, features: I) -> Report
    where
        I: IntoIterator<Item = gherkin::Feature>,
    {
        let concurrency = self
            .options
            .parallel
            .then_some(self.options.max_concurrent_scenarios);
        let runner = SuiteRunner::new(
            &*self.collection,
            &*self.hooks,
            &self.filter,
            concurrency,
        );
        let scenarios = runner.run(features).await;
        Report { scenarios, parse_errors: Vec::new() }
    }

    /// Runs [`SuiteOptions::features`] and panics if anything failed.
    ///
    /// # Panics
    ///
    /// If any [`Feature`] failed to load, any [`Step`] failed, any hook
    /// panicked or any [`World`] failed to initialize.
    ///
    /// [`Feature`]: gherkin::Feature
    /// [`Step`]: gherkin::Step
    pub async fn run_and_exit(&self) {
        let report = self.run().await;
        if report.execution_has_failed() {
            panic!("{report}");
        }
    }
}
