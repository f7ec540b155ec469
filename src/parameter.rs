// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parameter templates: reusable placeholder tokens of step patterns.
//!
//! A step pattern like `I have {int} cucumbers` is expanded into one regular
//! expression per [`Regex`] fragment registered for the `{int}` token before
//! being compiled.
//!
//! [`Regex`]: regex::Regex

use std::fmt;

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;
use regex::Regex;

use crate::error::ConfigError;

/// Registry of parameter template tokens and their [`Regex`] fragments.
///
/// Tokens keep their registration order, which defines the order of
/// [`Templates::expand()`] variants.
///
/// [`Regex`]: regex::Regex
#[derive(Clone)]
pub struct Templates {
    /// Fragments of every token, in registration order.
    templates: LinkedHashMap<String, Vec<String>>,
}

impl fmt::Debug for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.templates.iter()).finish()
    }
}

/// Built-in tokens registered by [`Templates::default()`].
const BUILTIN: &[(&str, &[&str])] = &[
    ("{int}", &[r"(-?\d+)"]),
    ("{float}", &[r"([-+]?\d*\.?\d*)"]),
    ("{word}", &[r"(\w+)"]),
    ("{text}", &[r#""([\w\-\s]+)""#, r"'([\w\-\s]+)'"]),
];

impl Default for Templates {
    /// Creates [`Templates`] with the built-in `{int}`, `{float}`, `{word}`
    /// and `{text}` tokens.
    fn default() -> Self {
        let mut templates = Self::empty();
        for (token, fragments) in BUILTIN {
            _ = templates.templates.insert(
                (*token).to_owned(),
                fragments.iter().map(|&f| f.to_owned()).collect(),
            );
        }
        templates
    }
}

impl Templates {
    /// Creates [`Templates`] without any token registered.
    #[must_use]
    pub fn empty() -> Self {
        Self { templates: LinkedHashMap::new() }
    }

    /// Registers `fragments` for the given `token`, appending them to the
    /// already registered ones, if any.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyToken`] if the `token` is empty.
    /// - [`ConfigError::InvalidFragment`] if any fragment doesn't compile on
    ///   its own. Nothing is registered then.
    pub fn register<I, S>(
        &mut self,
        token: impl Into<String>,
        fragments: I,
    ) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let fragments = fragments
            .into_iter()
            .map(|fragment| {
                let fragment = fragment.into();
                match Regex::new(&fragment) {
                    Ok(_) => Ok(fragment),
                    Err(source) => Err(ConfigError::InvalidFragment {
                        token: token.clone(),
                        fragment,
                        source,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(existing) = self.templates.get_mut(&token) {
            existing.extend(fragments);
        } else {
            _ = self.templates.insert(token, fragments);
        }
        Ok(self)
    }

    /// Returns the fragments registered for the given `token`, if any.
    #[must_use]
    pub fn fragments(&self, token: &str) -> Option<&[String]> {
        self.templates.get(token).map(Vec::as_slice)
    }

    /// Expands every registered token found in the `pattern`.
    ///
    /// Each occurrence of a token is replaced with one of its fragments,
    /// producing one variant per fragment. Patterns with several distinct
    /// tokens produce the cross-product of their fragments, ordered by token
    /// registration order and then by fragment order.
    ///
    /// A `pattern` without registered tokens is returned as the only variant.
    #[must_use]
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        self.templates
            .iter()
            .filter(|(token, _)| pattern.contains(token.as_str()))
            .fold(vec![pattern.to_owned()], |variants, (token, fragments)| {
                variants
                    .iter()
                    .cartesian_product(fragments)
                    .map(|(variant, fragment)| variant.replace(token, fragment))
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_without_tokens_is_kept() {
        assert_eq!(
            Templates::default().expand(r"^I have (\d+) cucumbers$"),
            [r"^I have (\d+) cucumbers$"],
        );
    }

    #[test]
    fn one_variant_per_fragment() {
        let variants = Templates::default().expand("the label is {text}");

        assert_eq!(
            variants,
            [r#"the label is "([\w\-\s]+)""#, r"the label is '([\w\-\s]+)'"],
        );
        for v in &variants {
            assert!(Regex::new(v).is_ok(), "`{v}` doesn't compile");
        }
    }

    #[test]
    fn every_occurrence_is_substituted() {
        assert_eq!(
            Templates::default().expand("I add {int} to {int}"),
            [r"I add (-?\d+) to (-?\d+)"],
        );
    }

    #[test]
    fn distinct_tokens_expand_as_cross_product() {
        let variants = Templates::default().expand("{int} items labeled {text}");

        assert_eq!(
            variants,
            [
                r#"(-?\d+) items labeled "([\w\-\s]+)""#,
                r"(-?\d+) items labeled '([\w\-\s]+)'",
            ],
        );
    }

    #[test]
    fn registration_appends_fragments() {
        let mut templates = Templates::empty();
        _ = templates
            .register("{color}", ["(red)"])
            .unwrap()
            .register("{color}", ["(green)", "(blue)"])
            .unwrap();

        assert_eq!(
            templates.fragments("{color}").unwrap(),
            ["(red)", "(green)", "(blue)"],
        );
        assert_eq!(
            templates.expand("a {color} apple"),
            ["a (red) apple", "a (green) apple", "a (blue) apple"],
        );
    }

    #[test]
    fn invalid_fragment_is_rejected() {
        let mut templates = Templates::empty();

        let err = templates.register("{bad}", ["(ok)", "(unclosed"]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidFragment { ref token, ref fragment, .. }
                if token == "{bad}" && fragment == "(unclosed",
        ));
        assert!(templates.fragments("{bad}").is_none());
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = Templates::empty().register("", ["(x)"]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyToken));
    }
}
