//! Shared enums: angle formats, position domains and projectable fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a servo's native angle span is laid out around its center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleFormat {
    /// `[-range/2, +range/2]`, centered at 0
    #[default]
    MinusToPlus,
    /// `[0, range]`, centered at `range/2`
    ZeroToRange,
}

impl AngleFormat {
    /// Native angle span for a servo of the given range
    pub fn native_span(self, servo_range: f64) -> (f64, f64) {
        match self {
            AngleFormat::MinusToPlus => (-servo_range / 2.0, servo_range / 2.0),
            AngleFormat::ZeroToRange => (0.0, servo_range),
        }
    }

    /// Center angle for a servo of the given range
    pub fn center(self, servo_range: f64) -> f64 {
        match self {
            AngleFormat::MinusToPlus => 0.0,
            AngleFormat::ZeroToRange => servo_range / 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AngleFormat::MinusToPlus => "minus_to_plus",
            AngleFormat::ZeroToRange => "zero_to_range",
        }
    }
}

impl fmt::Display for AngleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AngleFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minus_to_plus" => Ok(AngleFormat::MinusToPlus),
            "zero_to_range" => Ok(AngleFormat::ZeroToRange),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown angle format '{}'",
                other
            ))),
        }
    }
}

/// The three interchangeable position representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionDomain {
    /// Degrees
    Angle,
    /// Microseconds
    PulseWidth,
    /// Normalized `[-1, 1]`
    Value,
}

/// Per-servo field readable through [`ServoArray::show`](crate::ServoArray::show).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServoField {
    Index,
    MinAngle,
    MaxAngle,
    InitialAngle,
    CenterAngle,
    CenterAngleOffset,
    ServoRange,
    ServoMin,
    ServoMax,
    StepSize,
    MinPulseWidth,
    MaxPulseWidth,
    /// 1.0 when flipped, 0.0 otherwise
    Flip,
    Angle,
    PulseWidth,
    Value,
    /// 1.0 when the driver has consumed the latest position
    Written,
}

impl ServoField {
    pub const ALL: [ServoField; 17] = [
        ServoField::Index,
        ServoField::MinAngle,
        ServoField::MaxAngle,
        ServoField::InitialAngle,
        ServoField::CenterAngle,
        ServoField::CenterAngleOffset,
        ServoField::ServoRange,
        ServoField::ServoMin,
        ServoField::ServoMax,
        ServoField::StepSize,
        ServoField::MinPulseWidth,
        ServoField::MaxPulseWidth,
        ServoField::Flip,
        ServoField::Angle,
        ServoField::PulseWidth,
        ServoField::Value,
        ServoField::Written,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ServoField::Index => "index",
            ServoField::MinAngle => "min_angle",
            ServoField::MaxAngle => "max_angle",
            ServoField::InitialAngle => "initial_angle",
            ServoField::CenterAngle => "center_angle",
            ServoField::CenterAngleOffset => "center_angle_offset",
            ServoField::ServoRange => "servo_range",
            ServoField::ServoMin => "servo_min",
            ServoField::ServoMax => "servo_max",
            ServoField::StepSize => "step_size",
            ServoField::MinPulseWidth => "min_pulse_width",
            ServoField::MaxPulseWidth => "max_pulse_width",
            ServoField::Flip => "flip",
            ServoField::Angle => "angle",
            ServoField::PulseWidth => "pulse_width",
            ServoField::Value => "value",
            ServoField::Written => "written",
        }
    }
}

impl fmt::Display for ServoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServoField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServoField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| ConfigError::InvalidValue(format!("unknown servo field '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_span_minus_to_plus() {
        assert_eq!(AngleFormat::MinusToPlus.native_span(180.0), (-90.0, 90.0));
        assert_eq!(AngleFormat::MinusToPlus.center(180.0), 0.0);
    }

    #[test]
    fn test_native_span_zero_to_range() {
        assert_eq!(AngleFormat::ZeroToRange.native_span(270.0), (0.0, 270.0));
        assert_eq!(AngleFormat::ZeroToRange.center(270.0), 135.0);
    }

    #[test]
    fn test_angle_format_parse() {
        assert_eq!("zero_to_range".parse::<AngleFormat>(), Ok(AngleFormat::ZeroToRange));
        assert!("sideways".parse::<AngleFormat>().is_err());
        assert_eq!(AngleFormat::default().to_string(), "minus_to_plus");
    }

    #[test]
    fn test_angle_format_serde() {
        let format: AngleFormat = serde_json::from_str("\"zero_to_range\"").unwrap();
        assert_eq!(format, AngleFormat::ZeroToRange);
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in ServoField::ALL {
            assert_eq!(field.name().parse::<ServoField>(), Ok(field));
        }
    }

    #[test]
    fn test_unknown_field() {
        assert!(matches!(
            "torque".parse::<ServoField>(),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
