// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle hooks around [`Scenario`]s and [`Step`]s.
//!
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

use derive_more::with_trait::Display;
use futures::{future::LocalBoxFuture, FutureExt as _};

use crate::{error::StepError, panic::payload_message};

/// Side-effecting function of the execution context, run around
/// [`Scenario`]s or [`Step`]s.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
pub type Hook<W> =
    Arc<dyn for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()> + Send + Sync>;

/// Point of the lifecycle a [`Hook`] is bound to.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum HookType {
    /// Before all [`Step`]s of a [`Scenario`], including [`Background`] ones.
    ///
    /// [`Background`]: gherkin::Background
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    #[display("Before scenario")]
    BeforeScenario,

    /// After all [`Step`]s of a [`Scenario`], even failed ones.
    ///
    /// [`Scenario`]: gherkin::Scenario
    /// [`Step`]: gherkin::Step
    #[display("After scenario")]
    AfterScenario,

    /// Before every [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display("Before step")]
    BeforeStep,

    /// After every executed [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[display("After step")]
    AfterStep,
}

/// Ordered lists of [`Hook`]s of every [`HookType`].
pub struct Hooks<W> {
    before_scenario: Vec<Hook<W>>,
    after_scenario: Vec<Hook<W>>,
    before_step: Vec<Hook<W>>,
    after_step: Vec<Hook<W>>,
}

// Implemented manually to omit redundant `W: Default` trait bound, imposed by
// `#[derive(Default)]`.
impl<W> Default for Hooks<W> {
    fn default() -> Self {
        Self {
            before_scenario: Vec::new(),
            after_scenario: Vec::new(),
            before_step: Vec::new(),
            after_step: Vec::new(),
        }
    }
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for Hooks<W> {
    fn clone(&self) -> Self {
        Self {
            before_scenario: self.before_scenario.clone(),
            after_scenario: self.after_scenario.clone(),
            before_step: self.before_step.clone(),
            after_step: self.after_step.clone(),
        }
    }
}

impl<W> fmt::Debug for Hooks<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_scenario", &self.before_scenario.len())
            .field("after_scenario", &self.after_scenario.len())
            .field("before_step", &self.before_step.len())
            .field("after_step", &self.after_step.len())
            .finish()
    }
}

impl<W> Hooks<W> {
    /// Appends a [`Hook`] of the given [`HookType`].
    pub fn push<H>(&mut self, ty: HookType, hook: H)
    where
        H: for<'a> Fn(&'a mut W) -> LocalBoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.list_mut(ty).push(Arc::new(hook));
    }

    /// Returns [`Hook`]s of the given [`HookType`] in registration order.
    #[must_use]
    pub fn list(&self, ty: HookType) -> &[Hook<W>] {
        match ty {
            HookType::BeforeScenario => &self.before_scenario,
            HookType::AfterScenario => &self.after_scenario,
            HookType::BeforeStep => &self.before_step,
            HookType::AfterStep => &self.after_step,
        }
    }

    fn list_mut(&mut self, ty: HookType) -> &mut Vec<Hook<W>> {
        match ty {
            HookType::BeforeScenario => &mut self.before_scenario,
            HookType::AfterScenario => &mut self.after_scenario,
            HookType::BeforeStep => &mut self.before_step,
            HookType::AfterStep => &mut self.after_step,
        }
    }

    /// Runs every [`Hook`] of the given [`HookType`] in registration order.
    ///
    /// A panicking [`Hook`] doesn't prevent the following ones from running.
    /// Returns [`StepError::Hook`]s of every panicked [`Hook`].
    pub async fn run(&self, ty: HookType, world: &mut W) -> Vec<StepError> {
        let mut errors = Vec::new();
        for hook in self.list(ty) {
            let call = async { hook(&mut *world).await };
            if let Err(payload) = AssertUnwindSafe(call).catch_unwind().await {
                let message = payload_message(&*payload);
                tracing::warn!(hook = %ty, %message, "hook panicked");
                errors.push(StepError::Hook(ty, message));
            }
        }
        errors
    }
}
