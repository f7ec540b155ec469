// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for executing [`Step`]s.
//!
//! - [`ScenarioRunner`] drives a single [`Scenario`] through its hooks and
//!   [`Step`]s.
//! - [`SuiteRunner`] drives whole [`Feature`]s, filtering [`Scenario`]s by
//!   tags and optionally running them concurrently.
//!
//! [`Feature`]: gherkin::Feature
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

pub mod scenario;
pub mod suite;

#[doc(inline)]
pub use self::{scenario::ScenarioRunner, suite::SuiteRunner};
