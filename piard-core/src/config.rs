//! Array configuration.
//!
//! [`ServoArrayConfig`] is the typed form used from code. [`ServoSection`]
//! is what a manifest deserializes into; every field is optional and may
//! take any broadcastable shape, and [`ServoSection::to_config`] turns it
//! into the typed form.

use serde::{Deserialize, Serialize};

use crate::array::ServoArray;
use crate::error::ConfigError;
use crate::param::{ParamElement, ParamInput, ParamSpec};
use crate::types::AngleFormat;
use crate::unit::ServoConfig;

/// Per-field parameter specs for a whole array.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoArrayConfig {
    pub min_angle: ParamSpec<f64>,
    pub max_angle: ParamSpec<f64>,
    pub initial_angle: ParamSpec<f64>,
    pub servo_range: ParamSpec<f64>,
    pub center_angle_offset: ParamSpec<f64>,
    pub flip: ParamSpec<bool>,
    pub step_size: ParamSpec<f64>,
    pub min_pulse_width: ParamSpec<f64>,
    pub max_pulse_width: ParamSpec<f64>,
    /// Shared by every servo
    pub angle_format: AngleFormat,
}

impl Default for ServoArrayConfig {
    fn default() -> Self {
        let unit = ServoConfig::default();
        Self {
            min_angle: unit.min_angle.into(),
            max_angle: unit.max_angle.into(),
            initial_angle: unit.initial_angle.into(),
            servo_range: unit.servo_range.into(),
            center_angle_offset: unit.center_angle_offset.into(),
            flip: unit.flip.into(),
            step_size: unit.step_size.into(),
            min_pulse_width: unit.min_pulse_width.into(),
            max_pulse_width: unit.max_pulse_width.into(),
            angle_format: unit.angle_format,
        }
    }
}

fn field<T: Copy + std::fmt::Debug>(
    name: &str,
    n: usize,
    spec: &ParamSpec<T>,
) -> Result<Vec<T>, ConfigError> {
    spec.expand(n, None).map_err(|e| match e {
        ConfigError::InvalidShape(msg) => ConfigError::InvalidShape(format!("{}: {}", name, msg)),
        other => other,
    })
}

impl ServoArrayConfig {
    /// Broadcasts every field to `n` per-servo configurations.
    ///
    /// All fields are expanded before anything is returned, so a bad shape
    /// in any of them fails the whole resolution.
    pub fn resolve(&self, n: usize) -> Result<Vec<ServoConfig>, ConfigError> {
        let min_angle = field("min_angle", n, &self.min_angle)?;
        let max_angle = field("max_angle", n, &self.max_angle)?;
        let initial_angle = field("initial_angle", n, &self.initial_angle)?;
        let servo_range = field("servo_range", n, &self.servo_range)?;
        let center_angle_offset = field("center_angle_offset", n, &self.center_angle_offset)?;
        let flip = field("flip", n, &self.flip)?;
        let step_size = field("step_size", n, &self.step_size)?;
        let min_pulse_width = field("min_pulse_width", n, &self.min_pulse_width)?;
        let max_pulse_width = field("max_pulse_width", n, &self.max_pulse_width)?;

        Ok((0..n)
            .map(|i| ServoConfig {
                min_angle: min_angle[i],
                max_angle: max_angle[i],
                initial_angle: initial_angle[i],
                servo_range: servo_range[i],
                center_angle_offset: center_angle_offset[i],
                flip: flip[i],
                step_size: step_size[i],
                min_pulse_width: min_pulse_width[i],
                max_pulse_width: max_pulse_width[i],
                angle_format: self.angle_format,
            })
            .collect())
    }
}

fn default_count() -> usize {
    1
}

/// `[servos]` manifest section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoSection {
    /// Number of servos in the array
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub min_angle: Option<ParamInput>,
    #[serde(default)]
    pub max_angle: Option<ParamInput>,
    #[serde(default)]
    pub initial_angle: Option<ParamInput>,
    #[serde(default)]
    pub servo_range: Option<ParamInput>,
    #[serde(default)]
    pub center_angle_offset: Option<ParamInput>,
    #[serde(default)]
    pub flip: Option<ParamInput>,
    #[serde(default)]
    pub step_size: Option<ParamInput>,
    #[serde(default)]
    pub min_pulse_width: Option<ParamInput>,
    #[serde(default)]
    pub max_pulse_width: Option<ParamInput>,
    #[serde(default)]
    pub angle_format: Option<AngleFormat>,
}

impl Default for ServoSection {
    fn default() -> Self {
        Self {
            count: default_count(),
            min_angle: None,
            max_angle: None,
            initial_angle: None,
            servo_range: None,
            center_angle_offset: None,
            flip: None,
            step_size: None,
            min_pulse_width: None,
            max_pulse_width: None,
            angle_format: None,
        }
    }
}

fn typed<T: ParamElement>(
    name: &str,
    input: &Option<ParamInput>,
    fallback: ParamSpec<T>,
) -> Result<ParamSpec<T>, ConfigError> {
    match input {
        None => Ok(fallback),
        Some(input) => input.to_spec().map_err(|e| match e {
            ConfigError::InvalidShape(msg) => ConfigError::InvalidShape(format!("{}: {}", name, msg)),
            ConfigError::InvalidValue(msg) => ConfigError::InvalidValue(format!("{}: {}", name, msg)),
            other => other,
        }),
    }
}

impl ServoSection {
    /// Classifies each present field; absent fields keep their defaults.
    pub fn to_config(&self) -> Result<ServoArrayConfig, ConfigError> {
        let defaults = ServoArrayConfig::default();
        Ok(ServoArrayConfig {
            min_angle: typed("min_angle", &self.min_angle, defaults.min_angle)?,
            max_angle: typed("max_angle", &self.max_angle, defaults.max_angle)?,
            initial_angle: typed("initial_angle", &self.initial_angle, defaults.initial_angle)?,
            servo_range: typed("servo_range", &self.servo_range, defaults.servo_range)?,
            center_angle_offset: typed(
                "center_angle_offset",
                &self.center_angle_offset,
                defaults.center_angle_offset,
            )?,
            flip: typed("flip", &self.flip, defaults.flip)?,
            step_size: typed("step_size", &self.step_size, defaults.step_size)?,
            min_pulse_width: typed("min_pulse_width", &self.min_pulse_width, defaults.min_pulse_width)?,
            max_pulse_width: typed("max_pulse_width", &self.max_pulse_width, defaults.max_pulse_width)?,
            angle_format: self.angle_format.unwrap_or(defaults.angle_format),
        })
    }

    /// Builds the array described by this section.
    pub fn build(&self) -> Result<ServoArray, ConfigError> {
        ServoArray::new(self.count, &self.to_config()?)
    }
}
