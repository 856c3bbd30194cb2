//! Clamp-on-write sequences.
//!
//! [`BoundedSequence`] stores one `f64` per servo next to that servo's
//! `[min, max]` window. Writes never fail for being out of range; they
//! saturate at the nearest bound.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ServoError, ServoResult};
use crate::param::ParamSpec;

/// Inclusive `[min, max]` window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Saturates `value` into the window
    pub fn clamp(&self, value: f64) -> f64 {
        if value >= self.max {
            self.max
        } else if value <= self.min {
            self.min
        } else {
            value
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Window moved down by `delta`
    pub fn shifted(&self, delta: f64) -> Bounds {
        Bounds::new(self.min - delta, self.max - delta)
    }
}

fn numeric(value: f64) -> Result<f64, ConfigError> {
    if value.is_nan() {
        Err(ConfigError::InvalidValue("NaN cannot be stored".into()))
    } else {
        Ok(value)
    }
}

/// Sequence whose element writes clamp to a per-index window.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSequence {
    values: Vec<f64>,
    bounds: Vec<Bounds>,
}

impl BoundedSequence {
    /// Builds the sequence, clamping every initial value.
    pub fn new(values: Vec<f64>, bounds: Vec<Bounds>) -> ServoResult<Self> {
        ServoError::check_len(bounds.len(), values.len())?;
        let mut seq = Self {
            values: vec![0.0; bounds.len()],
            bounds,
        };
        seq.set_all(&values)?;
        Ok(seq)
    }

    /// Pairs equal-length values and bounds, clamping each value.
    pub(crate) fn from_parts(values: Vec<f64>, bounds: Vec<Bounds>) -> Self {
        let values = values
            .into_iter()
            .zip(&bounds)
            .map(|(value, bounds)| bounds.clamp(value))
            .collect();
        Self { values, bounds }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn bounds(&self, index: usize) -> Option<Bounds> {
        self.bounds.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    fn check_index(&self, index: usize) -> ServoResult<usize> {
        if index < self.len() {
            Ok(index)
        } else {
            Err(ServoError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Stores `clamp(value, min_i, max_i)` at `index`.
    pub fn set(&mut self, index: usize, value: f64) -> ServoResult<()> {
        let index = self.check_index(index)?;
        let value = numeric(value)?;
        self.values[index] = self.bounds[index].clamp(value);
        Ok(())
    }

    /// Element-wise [`set`](Self::set). Validates everything before writing,
    /// so a bad index or value leaves the sequence untouched.
    pub fn set_range(&mut self, indices: &[usize], values: &[f64]) -> ServoResult<()> {
        ServoError::check_len(indices.len(), values.len())?;
        for (&index, &value) in indices.iter().zip(values) {
            self.check_index(index)?;
            numeric(value)?;
        }
        for (&index, &value) in indices.iter().zip(values) {
            self.values[index] = self.bounds[index].clamp(value);
        }
        Ok(())
    }

    /// Replaces every element, clamping each independently.
    pub fn set_all(&mut self, values: &[f64]) -> ServoResult<()> {
        ServoError::check_len(self.len(), values.len())?;
        for &value in values {
            numeric(value)?;
        }
        for ((slot, bounds), &value) in self.values.iter_mut().zip(&self.bounds).zip(values) {
            *slot = bounds.clamp(value);
        }
        Ok(())
    }

    /// Broadcasts `spec` over the current values, then [`set_all`](Self::set_all).
    /// A dense list of the wrong length is a `LengthMismatch` here.
    pub fn apply(&mut self, spec: &ParamSpec<f64>) -> ServoResult<()> {
        if let ParamSpec::Dense(values) = spec {
            ServoError::check_len(self.len(), values.len())?;
        }
        let expanded = spec.expand(self.len(), Some(&self.values))?;
        self.set_all(&expanded)
    }
}

impl Index<usize> for BoundedSequence {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}
