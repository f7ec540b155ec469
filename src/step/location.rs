// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Location tracking for step definitions.

use derive_more::with_trait::{Debug, Display};

/// Location of the call registering a step definition.
///
/// Captured with [`#[track_caller]`][1], so it points into the user's code
/// rather than into this crate.
///
/// [1]: https://doc.rust-lang.org/reference/attributes/codegen.html#the-track_caller-attribute
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file the definition was registered in.
    pub path: &'static str,

    /// Line of the registration call.
    pub line: u32,

    /// Column of the registration call.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] with the given path, line, and column.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Returns the [`Location`] of the caller of the function this is called
    /// from, as long as every function in between is `#[track_caller]`.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self::new(loc.file(), loc.line(), loc.column())
    }
}

/// Renders `path:line:column` of a [`gherkin::Step`] inside its feature file.
#[must_use]
pub fn step_location(
    feature: &gherkin::Feature,
    step: &gherkin::Step,
) -> String {
    let path = feature
        .path
        .as_deref()
        .map_or_else(|| "<unknown>".into(), |p| p.display().to_string());
    format!("{path}:{}:{}", step.position.line, step.position.col)
}
