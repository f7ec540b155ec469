// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of the engine.
//!
//! - [`ConfigError`]s are raised while a [`SuiteBuilder`] is being filled and
//!   abort the suite construction.
//! - [`StepError`]s are attached to the narrowest [`StepRecord`] (or
//!   [`ScenarioRecord`] for hooks) and never abort the whole run.
//!
//! [`ScenarioRecord`]: crate::ScenarioRecord
//! [`StepRecord`]: crate::StepRecord
//! [`SuiteBuilder`]: crate::SuiteBuilder

use std::sync::Arc;

use derive_more::with_trait::{Display, Error};

use crate::{hook::HookType, step::ArgKind};

/// Error of registering a parameter template or a step definition.
#[derive(Clone, Debug, Display, Error)]
pub enum ConfigError {
    /// Parameter template token is empty, so it would match every pattern.
    #[display("Parameter template token must not be empty")]
    EmptyToken,

    /// Regex fragment of a parameter template doesn't compile.
    #[display(
        "Regular expression `{fragment}` of parameter template `{token}` \
         doesn't compile: {source}"
    )]
    InvalidFragment {
        /// Token the fragment was registered for.
        token: String,

        /// Offending fragment.
        fragment: String,

        /// Compilation error.
        source: regex::Error,
    },

    /// Step pattern (or one of its template expansions) doesn't compile.
    #[display("Step pattern `{pattern}` doesn't compile: {source}")]
    InvalidPattern {
        /// Offending pattern, after template expansion.
        pattern: String,

        /// Compilation error.
        source: regex::Error,
    },

    /// Number of capturing groups differs from the step function arguments.
    #[display(
        "Step pattern `{pattern}` captures {groups} groups, but the step \
         function accepts {expected} arguments after the context"
    )]
    Arity {
        /// Offending pattern, after template expansion.
        #[error(not(source))]
        pattern: String,

        /// Number of arguments the step function declares.
        expected: usize,

        /// Number of capturing groups in the pattern.
        groups: usize,
    },
}

/// Error of executing a single [`Step`] or a hook.
///
/// [`Step`]: gherkin::Step
#[derive(Clone, Debug, Display, Error)]
pub enum StepError {
    /// No step definition matches the [`Step`] text.
    ///
    /// [`Step`]: gherkin::Step
    #[display("No step definition found for `{keyword}{step}` at {location}")]
    NotFound {
        /// Keyword of the unmatched [`Step`].
        ///
        /// [`Step`]: gherkin::Step
        #[error(not(source))]
        keyword: String,

        /// Literal text of the unmatched [`Step`].
        ///
        /// [`Step`]: gherkin::Step
        step: String,

        /// `path:line:column` of the [`Step`] in its `.feature` file.
        ///
        /// [`Step`]: gherkin::Step
        location: String,
    },

    /// Number of captured groups doesn't match the declared arguments.
    #[display(
        "Step function for `{pattern}` accepts {expected} arguments, but \
         {received} were captured"
    )]
    Arity {
        /// Pattern of the matched definition.
        #[error(not(source))]
        pattern: String,

        /// Declared arity, including the leading context.
        expected: usize,

        /// Captured groups count, including the leading context.
        received: usize,
    },

    /// Captured value cannot be converted into the declared argument kind.
    #[display("Cannot convert argument {position} `{value}` into {kind}: {reason}")]
    Coercion {
        /// Zero-based position of the argument after the context.
        position: usize,

        /// Captured value, lossily decoded.
        #[error(not(source))]
        value: String,

        /// Declared kind of the argument.
        kind: ArgKind,

        /// Parser message.
        reason: String,
    },

    /// Step function returned an error.
    #[display("Step failed: {_0:#}")]
    Failed(#[error(not(source))] Arc<anyhow::Error>),

    /// Step function panicked.
    #[display("Step panicked: {_0}")]
    Panic(#[error(not(source))] String),

    /// Lifecycle hook panicked.
    #[display("{_0} hook panicked: {_1}")]
    Hook(HookType, #[error(not(source))] String),

    /// Execution context couldn't be created.
    #[display("Failed to initialize World: {_0}")]
    World(#[error(not(source))] String),
}

impl StepError {
    /// Creates a new [`StepError::NotFound`] for the given [`Step`].
    ///
    /// [`Step`]: gherkin::Step
    #[must_use]
    pub fn not_found(step: &gherkin::Step, location: impl Into<String>) -> Self {
        Self::NotFound {
            keyword: step.keyword.clone(),
            step: step.value.clone(),
            location: location.into(),
        }
    }

    /// Wraps an error returned by a step function.
    #[must_use]
    pub fn failed(err: anyhow::Error) -> Self {
        Self::Failed(Arc::new(err))
    }

    /// Indicates whether this error is an abnormal termination (a panic) of
    /// a step function or a hook.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Panic(_) | Self::Hook(..))
    }
}
