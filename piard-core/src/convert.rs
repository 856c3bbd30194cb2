//! Affine conversion between the angle, pulse width and value domains.
//!
//! Every conversion is the same linear map: take the fractional position of
//! `x` inside the source range and place it in the target range. Flipping
//! swaps the target endpoints, so the stored ranges never change sign.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Normalized value range shared by every servo
pub const VALUE_RANGE: (f64, f64) = (-1.0, 1.0);

/// Angle span assumed by [`degree_to_pulse_width`] when the caller has none
pub const DEFAULT_ANGLE_SPAN: (f64, f64) = (0.0, 180.0);

/// Non-degenerate numeric range usable as a conversion source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    start: f64,
    end: f64,
}

impl Span {
    /// The `[-1, 1]` value span
    pub const VALUE: Span = Span {
        start: VALUE_RANGE.0,
        end: VALUE_RANGE.1,
    };

    pub fn new(start: f64, end: f64) -> Result<Self, ConfigError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "range ({}, {}) is not finite",
                start, end
            )));
        }
        if start == end {
            return Err(ConfigError::DegenerateRange(format!(
                "({}, {}) has zero width",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    /// Fractional position of `x` (0 at `start`, 1 at `end`)
    pub fn fraction(&self, x: f64) -> f64 {
        (x - self.start) / self.width()
    }

    /// Same span moved down by `delta`; width is unchanged.
    pub fn shifted(&self, delta: f64) -> Span {
        Span {
            start: self.start - delta,
            end: self.end - delta,
        }
    }
}

fn place(t: f64, to: (f64, f64), flip: bool) -> f64 {
    let (lo, hi) = if flip { (to.1, to.0) } else { to };
    lo + t * (hi - lo)
}

/// Maps `x` from one validated span to another.
pub fn convert(x: f64, from: Span, to: Span, flip: bool) -> f64 {
    place(from.fraction(x), to.as_tuple(), flip)
}

/// Checked form of [`convert`] for raw range pairs.
///
/// Only the source range must have non-zero width; a degenerate target
/// simply collapses every input onto one point.
pub fn try_convert(x: f64, from: (f64, f64), to: (f64, f64), flip: bool) -> Result<f64, ConfigError> {
    let from = Span::new(from.0, from.1)?;
    Ok(place(from.fraction(x), to, flip))
}

/// Converts an angle to a pulse width without a servo unit.
///
/// The angle is measured from zero, as driver-side spans usually are:
/// `pulse.0 + angle / (span.1 - span.0) * (pulse.1 - pulse.0)`.
pub fn degree_to_pulse_width(
    angle: f64,
    pulse_range: (f64, f64),
    angle_span: (f64, f64),
) -> Result<f64, ConfigError> {
    let span = Span::new(angle_span.0, angle_span.1)?;
    Ok(pulse_range.0 + angle / span.width() * (pulse_range.1 - pulse_range.0))
}
