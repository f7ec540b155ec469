// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Definition of a [`World`].

use std::{fmt::Display, future::Future};

/// Represents a shared user-defined state for a [Cucumber] run.
/// It lives on per-[scenario][0] basis.
///
/// Every [`Step`] and hook of a [scenario][0] receives the same `&mut World`,
/// while no two [scenarios][0] ever share one.
///
/// [0]: https://cucumber.io/docs/gherkin/reference#descriptions
/// [Cucumber]: https://cucumber.io
/// [`Step`]: gherkin::Step
pub trait World: Sized + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Display;

    /// Creates a new [`World`] instance.
    ///
    /// Failing to do so fails the [scenario][0] before any of its steps.
    ///
    /// [0]: https://cucumber.io/docs/gherkin/reference#descriptions
    fn new() -> impl Future<Output = Result<Self, Self::Error>>;
}
