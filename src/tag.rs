// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag-based filtering of [`Scenario`]s.
//!
//! [`Scenario`]: gherkin::Scenario

use std::collections::HashSet;

use sealed::sealed;

/// Returns the `@`-prefixed form of the given `tag`.
///
/// [`gherkin`] stores tags without their `@` sigil.
#[must_use]
pub fn normalize(tag: &str) -> String {
    if tag.starts_with('@') {
        tag.to_owned()
    } else {
        format!("@{tag}")
    }
}

/// Extension of [`gherkin`] items carrying tags.
#[sealed]
pub trait Ext {
    /// Returns the own tags of this item in their `@`-prefixed form.
    #[must_use]
    fn normalized_tags(&self) -> Vec<String>;
}

#[sealed]
impl Ext for gherkin::Feature {
    fn normalized_tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize(t)).collect()
    }
}

#[sealed]
impl Ext for gherkin::Rule {
    fn normalized_tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize(t)).collect()
    }
}

#[sealed]
impl Ext for gherkin::Scenario {
    fn normalized_tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize(t)).collect()
    }
}

#[sealed]
impl Ext for gherkin::Examples {
    fn normalized_tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize(t)).collect()
    }
}

/// Inclusion and exclusion sets of tags.
///
/// Exclusion always wins over inclusion. An empty inclusion set includes
/// everything not excluded.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    include: HashSet<String>,
    exclude: HashSet<String>,
}

impl Filter {
    /// Creates a new [`Filter`] out of the configured tags.
    ///
    /// Tags lacking the leading `@` are ignored.
    #[must_use]
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            include: Self::collect(include, "tags"),
            exclude: Self::collect(exclude, "ignored_tags"),
        }
    }

    fn collect<I, S>(tags: I, option: &str) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|tag| {
                let tag = tag.as_ref();
                if tag.starts_with('@') {
                    Some(tag.to_owned())
                } else {
                    tracing::warn!(tag, option, "tag without `@` is ignored");
                    None
                }
            })
            .collect()
    }

    /// Indicates whether any of the given `tags` is excluded.
    #[must_use]
    pub fn excludes<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.exclude.contains(t.as_ref()))
    }

    /// Indicates whether an item carrying the given `tags` should run.
    #[must_use]
    pub fn allows<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        if self.excludes(tags) {
            return false;
        }
        self.include.is_empty()
            || tags.iter().any(|t| self.include.contains(t.as_ref()))
    }
}
