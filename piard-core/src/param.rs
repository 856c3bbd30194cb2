//! Parameter broadcasting.
//!
//! Every per-servo setting can be given once for all servos, once per servo,
//! or as a default plus a few `(index, value)` overrides. [`expand`] turns any
//! of those shapes into one value per servo.
//!
//! | Shape | Example (n = 3) | Result |
//! |-------|-----------------|--------|
//! | scalar | `5.0` | `[5, 5, 5]` |
//! | dense | `[1, 2, 4]` | `[1, 2, 4]` |
//! | sparse | `[5, [1, 9]]` | `[5, 9, 5]` |
//! | remap | `[[0, 2]]` over `[1, 2, 3]` | `[3, 2, 3]` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A per-servo parameter in one of the broadcastable shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec<T> {
    /// Same value for every servo
    Scalar(T),
    /// Exactly one value per servo
    Dense(Vec<T>),
    /// Default for every servo, then `(index, value)` overrides
    Sparse { default: T, overrides: Vec<(usize, T)> },
    /// `(dst, src)` copies applied in order over existing values
    Remap(Vec<(usize, usize)>),
}

impl<T: Copy + fmt::Debug> ParamSpec<T> {
    pub fn sparse(default: T, overrides: impl IntoIterator<Item = (usize, T)>) -> Self {
        ParamSpec::Sparse {
            default,
            overrides: overrides.into_iter().collect(),
        }
    }

    pub fn expand(&self, n: usize, existing: Option<&[T]>) -> Result<Vec<T>, ConfigError> {
        expand(n, self, existing)
    }
}

impl From<f64> for ParamSpec<f64> {
    fn from(value: f64) -> Self {
        ParamSpec::Scalar(value)
    }
}

impl From<Vec<f64>> for ParamSpec<f64> {
    fn from(values: Vec<f64>) -> Self {
        ParamSpec::Dense(values)
    }
}

impl From<bool> for ParamSpec<bool> {
    fn from(value: bool) -> Self {
        ParamSpec::Scalar(value)
    }
}

impl From<Vec<bool>> for ParamSpec<bool> {
    fn from(values: Vec<bool>) -> Self {
        ParamSpec::Dense(values)
    }
}

fn check_index(index: usize, n: usize, what: &str) -> Result<usize, ConfigError> {
    if index < n {
        Ok(index)
    } else {
        Err(ConfigError::InvalidShape(format!(
            "{} index {} out of range for {} servos",
            what, index, n
        )))
    }
}

/// Expands `spec` into exactly `n` values.
///
/// `existing` is only consulted by [`ParamSpec::Remap`], which copies values
/// within it. Pure; never touches servo state.
pub fn expand<T: Copy + fmt::Debug>(
    n: usize,
    spec: &ParamSpec<T>,
    existing: Option<&[T]>,
) -> Result<Vec<T>, ConfigError> {
    match spec {
        ParamSpec::Scalar(value) => Ok(vec![*value; n]),
        ParamSpec::Dense(values) => {
            if values.len() != n {
                return Err(ConfigError::InvalidShape(format!(
                    "expected {} values, got {:?}",
                    n, values
                )));
            }
            Ok(values.clone())
        }
        ParamSpec::Sparse { default, overrides } => {
            let mut out = vec![*default; n];
            for (index, value) in overrides {
                out[check_index(*index, n, "override")?] = *value;
            }
            Ok(out)
        }
        ParamSpec::Remap(pairs) => {
            let existing = existing.ok_or_else(|| {
                ConfigError::InvalidShape("index pairs need existing values to copy from".into())
            })?;
            if existing.len() != n {
                return Err(ConfigError::InvalidShape(format!(
                    "existing values have length {}, expected {}",
                    existing.len(),
                    n
                )));
            }
            let mut out = existing.to_vec();
            for (dst, src) in pairs {
                let dst = check_index(*dst, n, "destination")?;
                let src = check_index(*src, n, "source")?;
                out[dst] = out[src];
            }
            Ok(out)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LOOSELY TYPED INPUT (manifests, JSON)
// ═══════════════════════════════════════════════════════════════════════════

/// A single number or boolean as written in a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamScalar {
    Bool(bool),
    Number(f64),
}

/// One element of a list-shaped parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamItem {
    Scalar(ParamScalar),
    /// Expected to be an `[index, value]` or `[dst, src]` pair
    Tuple(Vec<ParamScalar>),
}

/// Parameter as read from a configuration file, before its shape is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamInput {
    Scalar(ParamScalar),
    List(Vec<ParamItem>),
}

impl From<f64> for ParamInput {
    fn from(value: f64) -> Self {
        ParamInput::Scalar(ParamScalar::Number(value))
    }
}

impl From<bool> for ParamInput {
    fn from(value: bool) -> Self {
        ParamInput::Scalar(ParamScalar::Bool(value))
    }
}

/// Element types a [`ParamInput`] can be classified into.
pub trait ParamElement: Copy + fmt::Debug {
    fn from_scalar(scalar: ParamScalar) -> Result<Self, ConfigError>;
}

impl ParamElement for f64 {
    fn from_scalar(scalar: ParamScalar) -> Result<Self, ConfigError> {
        match scalar {
            ParamScalar::Number(v) if v.is_finite() => Ok(v),
            ParamScalar::Number(v) => Err(ConfigError::InvalidValue(format!(
                "{} is not a finite number",
                v
            ))),
            // bools deserialize cleanly, so they have to be refused explicitly
            ParamScalar::Bool(b) => Err(ConfigError::InvalidValue(format!(
                "boolean {} where a number is required",
                b
            ))),
        }
    }
}

impl ParamElement for bool {
    fn from_scalar(scalar: ParamScalar) -> Result<Self, ConfigError> {
        match scalar {
            ParamScalar::Bool(b) => Ok(b),
            ParamScalar::Number(v) if v == 0.0 => Ok(false),
            ParamScalar::Number(v) if v == 1.0 => Ok(true),
            ParamScalar::Number(v) => Err(ConfigError::InvalidValue(format!(
                "{} where a boolean (or 0/1) is required",
                v
            ))),
        }
    }
}

fn index_of(scalar: ParamScalar) -> Result<usize, ConfigError> {
    match scalar {
        ParamScalar::Number(v) if v >= 0.0 && v.fract() == 0.0 && v <= usize::MAX as f64 => {
            Ok(v as usize)
        }
        other => Err(ConfigError::InvalidValue(format!(
            "{:?} is not a servo index",
            other
        ))),
    }
}

fn pair(items: &[ParamScalar]) -> Result<(ParamScalar, ParamScalar), ConfigError> {
    match items {
        [first, second] => Ok((*first, *second)),
        other => Err(ConfigError::InvalidShape(format!(
            "expected an [index, value] pair, got {:?}",
            other
        ))),
    }
}

impl ParamInput {
    /// Classifies the raw input into a typed [`ParamSpec`].
    ///
    /// Several scalars → dense; one scalar, optionally followed by pairs →
    /// sparse; only pairs → remap. Dense length is checked later by
    /// [`expand`], once `n` is known.
    pub fn to_spec<T: ParamElement>(&self) -> Result<ParamSpec<T>, ConfigError> {
        let items = match self {
            ParamInput::Scalar(scalar) => return Ok(ParamSpec::Scalar(T::from_scalar(*scalar)?)),
            ParamInput::List(items) => items,
        };

        let scalars: Option<Vec<ParamScalar>> = items
            .iter()
            .map(|item| match item {
                ParamItem::Scalar(s) => Some(*s),
                ParamItem::Tuple(_) => None,
            })
            .collect();
        if let Some(scalars) = scalars.filter(|scalars| scalars.len() != 1) {
            return scalars
                .into_iter()
                .map(T::from_scalar)
                .collect::<Result<Vec<_>, _>>()
                .map(ParamSpec::Dense);
        }

        match items.split_first() {
            Some((ParamItem::Scalar(default), rest)) => {
                let default = T::from_scalar(*default)?;
                let mut overrides = Vec::with_capacity(rest.len());
                for item in rest {
                    let ParamItem::Tuple(tuple) = item else {
                        return Err(ConfigError::InvalidShape(format!(
                            "expected only [index, value] pairs after the default, got {:?}",
                            item
                        )));
                    };
                    let (index, value) = pair(tuple)?;
                    overrides.push((index_of(index)?, T::from_scalar(value)?));
                }
                Ok(ParamSpec::Sparse { default, overrides })
            }
            _ => {
                let mut pairs = Vec::with_capacity(items.len());
                for item in items {
                    let ParamItem::Tuple(tuple) = item else {
                        return Err(ConfigError::InvalidShape(format!(
                            "cannot mix index pairs with scalar {:?}",
                            item
                        )));
                    };
                    let (dst, src) = pair(tuple)?;
                    pairs.push((index_of(dst)?, index_of(src)?));
                }
                Ok(ParamSpec::Remap(pairs))
            }
        }
    }
}
