// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Coercion of captured [`Regex`] groups into typed step function arguments.
//!
//! Step functions don't receive raw strings: every argument after the
//! execution context has one of the closed set of [`ArgKind`]s, captured at
//! registration time by the [`StepArgs`] implementation of the argument tuple.
//! At invocation time [`coerce()`] converts the captured bytes into [`Value`]s
//! and [`StepArgs::from_values()`] moves them into the tuple.
//!
//! [`Regex`]: regex::Regex

use std::str;

use derive_more::with_trait::Display;

use crate::error::StepError;

/// Kind of a step function argument.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ArgKind {
    /// [`String`], passed through as is.
    #[display("string")]
    Str,

    /// [`i64`].
    #[display("integer")]
    Int,

    /// [`f32`].
    #[display("32-bit float")]
    F32,

    /// [`f64`].
    #[display("64-bit float")]
    F64,

    /// Raw captured bytes, left unconverted.
    #[display("bytes")]
    Bytes,
}

/// Dynamically typed argument value, produced by [`coerce()`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// [`ArgKind::Str`] value.
    Str(String),

    /// [`ArgKind::Int`] value.
    Int(i64),

    /// [`ArgKind::F32`] value.
    F32(f32),

    /// [`ArgKind::F64`] value.
    F64(f64),

    /// [`ArgKind::Bytes`] value.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the [`ArgKind`] of this [`Value`].
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::Str(_) => ArgKind::Str,
            Self::Int(_) => ArgKind::Int,
            Self::F32(_) => ArgKind::F32,
            Self::F64(_) => ArgKind::F64,
            Self::Bytes(_) => ArgKind::Bytes,
        }
    }
}

/// Converts `captured` groups into [`Value`]s of the given `kinds`.
///
/// # Errors
///
/// - [`StepError::Arity`] if the number of `captured` groups differs from the
///   number of `kinds`. Checked before any conversion happens.
/// - [`StepError::Coercion`] if a group cannot be parsed into its numeric
///   kind.
pub fn coerce(
    pattern: &str,
    captured: &[&[u8]],
    kinds: &[ArgKind],
) -> Result<Vec<Value>, StepError> {
    // The leading `+ 1` is the execution context every step function accepts.
    if captured.len() + 1 != kinds.len() + 1 {
        return Err(StepError::Arity {
            pattern: pattern.to_owned(),
            expected: kinds.len() + 1,
            received: captured.len() + 1,
        });
    }

    captured
        .iter()
        .zip(kinds)
        .enumerate()
        .map(|(position, (raw, kind))| coerce_one(position, raw, *kind))
        .collect()
}

fn coerce_one(
    position: usize,
    raw: &[u8],
    kind: ArgKind,
) -> Result<Value, StepError> {
    let err = |reason: String| StepError::Coercion {
        position,
        value: String::from_utf8_lossy(raw).into_owned(),
        kind,
        reason,
    };
    let text = || str::from_utf8(raw).map_err(|e| err(e.to_string()));

    Ok(match kind {
        ArgKind::Str => Value::Str(text()?.to_owned()),
        ArgKind::Int => Value::Int(
            text()?.trim().parse::<i64>().map_err(|e| err(e.to_string()))?,
        ),
        ArgKind::F32 => Value::F32(
            text()?.trim().parse::<f32>().map_err(|e| err(e.to_string()))?,
        ),
        ArgKind::F64 => Value::F64(
            text()?.trim().parse::<f64>().map_err(|e| err(e.to_string()))?,
        ),
        ArgKind::Bytes => Value::Bytes(raw.to_vec()),
    })
}

/// Type usable as a step function argument.
pub trait FromValue: Sized {
    /// [`ArgKind`] captured groups are coerced into for this type.
    const KIND: ArgKind;

    /// Extracts `Self` out of a [`Value`] of [`Self::KIND`].
    ///
    /// Returns [`None`] if the [`Value`] is of another kind.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl FromValue for $ty {
            const KIND: ArgKind = ArgKind::$kind;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_from_value! {
    String => Str,
    i64 => Int,
    f32 => F32,
    f64 => F64,
    Vec<u8> => Bytes,
}

/// Tuple of [`FromValue`] arguments a step function accepts after its
/// execution context.
pub trait StepArgs: Sized + 'static {
    /// Returns [`ArgKind`]s of the tuple elements, in order.
    fn kinds() -> Vec<ArgKind>;

    /// Builds the tuple out of [`coerce()`]d `values`.
    ///
    /// # Errors
    ///
    /// If the `values` don't correspond to [`StepArgs::kinds()`].
    fn from_values(pattern: &str, values: Vec<Value>) -> Result<Self, StepError>;
}

macro_rules! impl_step_args {
    ($($arg:ident),*) => {
        impl<$($arg: FromValue + 'static),*> StepArgs for ($($arg,)*) {
            fn kinds() -> Vec<ArgKind> {
                vec![$($arg::KIND),*]
            }

            #[allow(unused_mut, unused_variables, non_snake_case)]
            fn from_values(
                pattern: &str,
                values: Vec<Value>,
            ) -> Result<Self, StepError> {
                let received = values.len();
                let expected = Self::kinds().len();
                let arity = || StepError::Arity {
                    pattern: pattern.to_owned(),
                    expected: expected + 1,
                    received: received + 1,
                };
                if received != expected {
                    return Err(arity());
                }

                let mut values = values.into_iter().enumerate();
                $(
                    let (position, value) = values.next().ok_or_else(arity)?;
                    let $arg = match $arg::from_value(value.clone()) {
                        Some(v) => v,
                        None => return Err(StepError::Coercion {
                            position,
                            value: format!("{value:?}"),
                            kind: $arg::KIND,
                            reason: format!("got {}", value.kind()),
                        }),
                    };
                )*
                Ok(($($arg,)*))
            }
        }
    };
}

impl_step_args!();
impl_step_args!(A);
impl_step_args!(A, B);
impl_step_args!(A, B, C);
impl_step_args!(A, B, C, D);
impl_step_args!(A, B, C, D, E);
impl_step_args!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_every_kind() {
        let values = coerce(
            "pattern",
            &[
                &b"text"[..],
                &b"42"[..],
                &b"1.5"[..],
                &b"-2.25"[..],
                &b"\xff\x00"[..],
            ],
            &[
                ArgKind::Str,
                ArgKind::Int,
                ArgKind::F32,
                ArgKind::F64,
                ArgKind::Bytes,
            ],
        )
        .unwrap();

        assert_eq!(
            values,
            [
                Value::Str("text".into()),
                Value::Int(42),
                Value::F32(1.5),
                Value::F64(-2.25),
                Value::Bytes(vec![0xff, 0x00]),
            ],
        );
    }

    #[test]
    fn arity_is_checked_before_coercion() {
        let err = coerce("I eat (.*) apples", &[&b"not a number"[..]], &[
            ArgKind::Int,
            ArgKind::Int,
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            StepError::Arity { expected: 3, received: 2, .. },
        ));
    }

    #[test]
    fn unparsable_number_is_coercion_error() {
        let err = coerce("p", &[&b"many"[..]], &[ArgKind::Int]).unwrap_err();

        assert!(matches!(
            err,
            StepError::Coercion { position: 0, kind: ArgKind::Int, ref value, .. }
                if value == "many",
        ));
    }

    #[test]
    fn empty_group_is_empty_string() {
        let values = coerce("p", &[&b""[..]], &[ArgKind::Str]).unwrap();
        assert_eq!(values, [Value::Str(String::new())]);
    }

    #[test]
    fn tuples_report_kinds_in_order() {
        assert_eq!(<()>::kinds(), []);
        assert_eq!(
            <(i64, String, f64)>::kinds(),
            [ArgKind::Int, ArgKind::Str, ArgKind::F64],
        );
    }

    #[test]
    fn tuples_are_built_from_values() {
        let (n, name) = <(i64, String)>::from_values(
            "p",
            vec![Value::Int(3), Value::Str("apples".into())],
        )
        .unwrap();

        assert_eq!(n, 3);
        assert_eq!(name, "apples");
    }

    #[test]
    fn mismatched_value_kind_is_rejected() {
        let err = <(i64,)>::from_values("p", vec![Value::Str("3".into())])
            .unwrap_err();
        assert!(matches!(err, StepError::Coercion { kind: ArgKind::Int, .. }));
    }
}
