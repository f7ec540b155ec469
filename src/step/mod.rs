// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions, their [`Collection`] and step text resolution.
//!
//! - [`args`]: coercion of captured groups into typed arguments
//! - [`collection`]: registration and best-match resolution
//! - [`definition`]: compiled [`Regex`] bound to a step function
//! - [`location`]: where a [`Definition`] was registered
//!
//! [`Regex`]: regex::Regex

pub mod args;
pub mod collection;
pub mod definition;
pub mod location;

pub use self::{
    args::{coerce, ArgKind, FromValue, StepArgs, Value},
    collection::{best_match, Collection},
    definition::{Definition, StepOutput},
    location::Location,
};
