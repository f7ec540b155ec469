// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for loading [Gherkin] files.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use derive_more::with_trait::{Display, Error};

/// Error of loading [`Feature`]s.
///
/// [`Feature`]: gherkin::Feature
#[derive(Clone, Debug, Display, Error)]
pub enum ParseError {
    /// Glob pattern is invalid.
    #[display("Invalid glob `{pattern}`: {source}")]
    Glob {
        /// Offending pattern.
        #[error(not(source))]
        pattern: String,

        /// Walking error.
        source: Arc<globwalk::GlobError>,
    },

    /// Entry of a directory (or glob) walk is unreadable, like a dangling
    /// symlink or a directory without permissions.
    #[display("Failed to walk `{pattern}`: {source}")]
    Walk {
        /// Walked directory or pattern.
        #[error(not(source))]
        pattern: String,

        /// Walking error.
        source: Arc<globwalk::WalkError>,
    },

    /// Failed to read or parse a [`Feature`] file.
    ///
    /// [`Feature`]: gherkin::Feature
    #[display("Failed to parse feature: {_0}")]
    File(Arc<gherkin::ParseFileError>),
}

/// Default loader of [`Feature`]s from the file system.
///
/// Every input is one of:
/// - a `.feature` file;
/// - a directory, walked recursively for `*.feature` files (case
///   insensitive);
/// - a glob pattern, like `tests/features/**/*.feature`.
///
/// [`Feature`]: gherkin::Feature
#[derive(Clone, Copy, Debug, Default)]
pub struct Basic;

impl Basic {
    /// Loads every [`Feature`] reachable from the given `inputs`.
    ///
    /// Loaded [`Feature`]s are sorted by their path. Failures don't stop the
    /// loading and are returned along.
    ///
    /// [`Feature`]: gherkin::Feature
    pub fn parse<I, P>(
        self,
        inputs: I,
    ) -> (Vec<gherkin::Feature>, Vec<ParseError>)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut features = Vec::new();
        let mut errors = Vec::new();

        for input in inputs {
            let input = input.as_ref();
            for path in Self::files(input, &mut errors) {
                let env = gherkin::GherkinEnv::default();
                match gherkin::Feature::parse_path(&path, env) {
                    Ok(feature) => features.push(feature),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to parse feature",
                        );
                        errors.push(ParseError::File(Arc::new(e)));
                    }
                }
            }
        }

        features.sort_by(|a, b| a.path.cmp(&b.path));
        (features, errors)
    }

    /// Resolves the given `input` into the `.feature` files it denotes.
    ///
    /// Walking failures are pushed into `errors`.
    fn files(input: &Path, errors: &mut Vec<ParseError>) -> Vec<PathBuf> {
        let (base, pattern) = if input.is_dir() {
            (input.to_path_buf(), "*.feature".to_owned())
        } else if let Some((base, pattern)) = split_glob(input) {
            (base, pattern)
        } else {
            return vec![input.to_path_buf()];
        };

        let walker = match globwalk::GlobWalkerBuilder::new(&base, &pattern)
            .case_insensitive(true)
            .follow_links(true)
            .build()
        {
            Ok(walker) => walker,
            Err(e) => {
                errors.push(ParseError::Glob {
                    pattern: input.display().to_string(),
                    source: Arc::new(e),
                });
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        input = %input.display(),
                        error = %e,
                        "failed to walk features",
                    );
                    errors.push(ParseError::Walk {
                        pattern: input.display().to_string(),
                        source: Arc::new(e),
                    });
                }
            }
        }
        files.sort();
        files
    }
}

/// Splits the given `path` into a base directory and a glob pattern relative
/// to it, if the `path` contains any glob metacharacters.
fn split_glob(path: &Path) -> Option<(PathBuf, String)> {
    let parts = path.components().collect::<Vec<_>>();
    let at = parts.iter().position(|c| {
        c.as_os_str().to_string_lossy().contains(['*', '?', '[', '{'])
    })?;

    let mut base = parts[..at].iter().collect::<PathBuf>();
    if base.as_os_str().is_empty() {
        base.push(".");
    }
    let pattern = parts[at..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some((base, pattern))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const FEATURE: &str = "Feature: Basket\n  Scenario: one\n    Given x\n";

    #[test]
    fn splits_glob_patterns() {
        assert_eq!(
            split_glob(Path::new("tests/features/**/*.feature")),
            Some((PathBuf::from("tests/features"), "**/*.feature".into())),
        );
        assert_eq!(
            split_glob(Path::new("*.feature")),
            Some((PathBuf::from("."), "*.feature".into())),
        );
        assert_eq!(split_glob(Path::new("tests/a.feature")), None);
    }

    #[test]
    fn walks_directories_recursively_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.feature"), FEATURE).unwrap();
        fs::write(dir.path().join("a.FEATURE"), FEATURE).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a feature").unwrap();

        let (features, errors) = Basic.parse([dir.path()]);

        assert!(errors.is_empty(), "{errors:?}");
        let names = features
            .iter()
            .map(|f| f.path.as_ref().unwrap().file_name().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.FEATURE", "b.feature"]);
    }

    #[test]
    fn reports_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.feature"), FEATURE).unwrap();
        fs::write(dir.path().join("bad.feature"), "Not gherkin at all").unwrap();

        let (features, errors) = Basic.parse([dir.path()]);

        assert_eq!(features.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::File(_)));
    }

    #[cfg(unix)]
    #[test]
    fn reports_walk_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.feature"), FEATURE).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone"),
            dir.path().join("dangling.feature"),
        )
        .unwrap();

        let (features, errors) = Basic.parse([dir.path()]);

        assert_eq!(features.len(), 1);
        assert!(
            matches!(errors.as_slice(), [ParseError::Walk { .. }]),
            "{errors:?}",
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let (features, errors) =
            Basic.parse([dir.path().join("missing.feature")]);

        assert!(features.is_empty());
        assert!(matches!(errors.as_slice(), [ParseError::File(_)]));
    }
}
