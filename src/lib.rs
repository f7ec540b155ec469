// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step-matching and scenario-execution engine for [Gherkin] features.
//!
//! The engine consumes already parsed [`gherkin::Feature`]s, resolves every
//! textual [`Step`] to a registered step definition, coerces captured text
//! into typed arguments, invokes the definition and reports the outcome of
//! every [`Step`] and [`Scenario`].
//!
//! ```rust
//! # use std::convert::Infallible;
//! use cucumber_engine::{Suite, World};
//! use futures::FutureExt as _;
//!
//! #[derive(Debug, Default)]
//! struct Basket(i64);
//!
//! impl World for Basket {
//!     type Error = Infallible;
//!
//!     async fn new() -> Result<Self, Infallible> {
//!         Ok(Self::default())
//!     }
//! }
//!
//! # fn main() -> Result<(), cucumber_engine::ConfigError> {
//! let mut builder = Suite::<Basket>::builder();
//! builder.step("I have {int} cucumbers", |w, (n,): (i64,)| {
//!     async move {
//!         w.0 = n;
//!         Ok(())
//!     }
//!     .boxed_local()
//! })?;
//! let suite = builder.build();
//! # drop(suite);
//! # Ok(())
//! # }
//! ```
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference
//! [`Scenario`]: gherkin::Scenario
//! [`Step`]: gherkin::Step

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unused_qualifications
)]

pub mod error;
pub mod hook;
pub mod outline;
pub mod parameter;
pub mod parser;
pub mod record;
pub mod runner;
pub mod step;
pub mod suite;
pub mod tag;
pub mod world;

mod panic;

#[doc(no_inline)]
pub use gherkin;

#[doc(inline)]
pub use self::{
    error::{ConfigError, StepError},
    hook::Hooks,
    parameter::Templates,
    parser::ParseError,
    record::{Report, ScenarioRecord, StepRecord, StepResult, Verdict},
    step::{ArgKind, Collection, Definition, StepOutput, Value},
    suite::{Suite, SuiteBuilder, SuiteOptions},
    world::World,
};
