// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compiled step definitions.

use std::{fmt, sync::Arc};

use futures::future::LocalBoxFuture;
use regex::Regex;

use crate::error::StepError;

use super::{
    args::{self, ArgKind, StepArgs, Value},
    location::Location,
};

/// Output of a step function.
///
/// An [`Err`] marks the step as failed, keeping the error as its cause.
pub type StepOutput = anyhow::Result<()>;

/// Type-erased step function, accepting [`coerce()`]d [`Value`]s.
///
/// [`coerce()`]: args::coerce
pub(crate) type Callable<W> = Arc<
    dyn for<'a> Fn(
            &'a mut W,
            Vec<Value>,
            &str,
        ) -> Result<LocalBoxFuture<'a, StepOutput>, StepError>
        + Send
        + Sync,
>;

/// Erases the argument tuple `A` of the given typed step function.
pub(crate) fn callable<W, A, F>(f: F) -> Callable<W>
where
    W: 'static,
    A: StepArgs,
    F: for<'a> Fn(&'a mut W, A) -> LocalBoxFuture<'a, StepOutput>
        + Send
        + Sync
        + 'static,
{
    erase(move |world, values, pattern| {
        let args = A::from_values(pattern, values)?;
        Ok(f(world, args))
    })
}

fn erase<W, G>(g: G) -> Callable<W>
where
    G: for<'a> Fn(
            &'a mut W,
            Vec<Value>,
            &str,
        ) -> Result<LocalBoxFuture<'a, StepOutput>, StepError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(g)
}

/// Compiled [`Regex`] bound to a step function.
///
/// Never mutated once created. Cloning is cheap: the step function is shared.
pub struct Definition<W> {
    /// [`Regex`] the [`gherkin::Step`] text is matched against.
    pattern: Regex,

    /// Step function.
    callable: Callable<W>,

    /// [`ArgKind`]s of the step function arguments following the context.
    kinds: Arc<[ArgKind]>,

    /// [`Location`] the definition was registered at.
    location: Option<Location>,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for Definition<W> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            callable: Arc::clone(&self.callable),
            kinds: Arc::clone(&self.kinds),
            location: self.location,
        }
    }
}

// Implemented manually to omit redundant `W: Debug` trait bound.
impl<W> fmt::Debug for Definition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("pattern", &self.pattern.as_str())
            .field("callable", &format_args!("{:p}", self.callable))
            .field("kinds", &self.kinds)
            .field("location", &self.location)
            .finish()
    }
}

impl<W> Definition<W> {
    pub(crate) fn new(
        pattern: Regex,
        callable: Callable<W>,
        kinds: Arc<[ArgKind]>,
        location: Option<Location>,
    ) -> Self {
        Self { pattern, callable, kinds, location }
    }

    /// Creates a new [`Definition`] sharing the step function of this one,
    /// but matching another `pattern`.
    #[must_use]
    pub fn rebind(&self, pattern: Regex) -> Self {
        Self {
            pattern,
            callable: Arc::clone(&self.callable),
            kinds: Arc::clone(&self.kinds),
            location: self.location,
        }
    }

    /// Returns the compiled [`Regex`] of this [`Definition`].
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Returns the [`ArgKind`]s the step function accepts after the context.
    #[must_use]
    pub fn kinds(&self) -> &[ArgKind] {
        &self.kinds
    }

    /// Returns the [`Location`] this [`Definition`] was registered at, if
    /// known.
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        self.location
    }

    /// Indicates whether this [`Definition`] shares its step function with
    /// the `other` one.
    #[must_use]
    pub fn same_callable(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }

    /// Number of non-overlapping matches of the [`pattern`] in the `text`.
    ///
    /// [`pattern`]: Self::pattern
    #[must_use]
    pub fn match_count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }

    /// Returns every capturing group of the [`pattern`] in the `text`.
    ///
    /// Groups not participating in the match are returned empty.
    ///
    /// [`pattern`]: Self::pattern
    #[must_use]
    pub fn captures<'t>(&self, text: &'t str) -> Vec<&'t [u8]> {
        let groups = self.pattern.captures_len() - 1;
        self.pattern.captures(text).map_or_else(
            || vec![&b""[..]; groups],
            |caps| {
                caps.iter()
                    .skip(1)
                    .map(|m| m.map_or(&b""[..], |m| m.as_str().as_bytes()))
                    .collect()
            },
        )
    }

    /// Captures arguments out of the `text`, coerces them and calls the step
    /// function with them.
    ///
    /// # Errors
    ///
    /// If the captured arguments don't fit the step function. See
    /// [`coerce()`] for details.
    ///
    /// [`coerce()`]: args::coerce
    pub fn invoke<'w>(
        &self,
        world: &'w mut W,
        text: &str,
    ) -> Result<LocalBoxFuture<'w, StepOutput>, StepError> {
        let captured = self.captures(text);
        let values =
            args::coerce(self.pattern.as_str(), &captured, &self.kinds)?;
        (self.callable)(world, values, self.pattern.as_str())
    }
}
