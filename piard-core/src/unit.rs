//! A single servo: configuration, clamped state and derived positions

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounded::Bounds;
use crate::convert::{self, Span};
use crate::error::ConfigError;
use crate::types::{AngleFormat, PositionDomain, ServoField};

/// Per-servo configuration as supplied, before any recentering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Lower clamp bound (degrees)
    pub min_angle: f64,
    /// Upper clamp bound (degrees)
    pub max_angle: f64,
    /// Angle on construction and after `reset`
    pub initial_angle: f64,
    /// Full mechanical travel (degrees)
    pub servo_range: f64,
    /// Logical zero shift applied on construction
    pub center_angle_offset: f64,
    /// Reverse the angle ↔ pulse width/value mapping
    pub flip: bool,
    /// Degrees per step command
    pub step_size: f64,
    /// Pulse width at the low end of the native span (µs)
    pub min_pulse_width: f64,
    /// Pulse width at the high end of the native span (µs)
    pub max_pulse_width: f64,
    pub angle_format: AngleFormat,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: -90.0,
            max_angle: 90.0,
            initial_angle: 0.0,
            servo_range: 180.0,
            center_angle_offset: 0.0,
            flip: false,
            step_size: 1.0,
            min_pulse_width: 1000.0,
            max_pulse_width: 2000.0,
            angle_format: AngleFormat::MinusToPlus,
        }
    }
}

impl ServoConfig {
    fn check_numbers(&self, index: usize) -> Result<(), ConfigError> {
        let fields = [
            ("min_angle", self.min_angle),
            ("max_angle", self.max_angle),
            ("initial_angle", self.initial_angle),
            ("servo_range", self.servo_range),
            ("center_angle_offset", self.center_angle_offset),
            ("step_size", self.step_size),
            ("min_pulse_width", self.min_pulse_width),
            ("max_pulse_width", self.max_pulse_width),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue(format!(
                    "servo {}: {} = {} is not finite",
                    index, name, value
                )));
            }
        }
        Ok(())
    }
}

/// Mutable position state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoState {
    /// Current angle, inside the clamp bounds after every setter
    pub angle: f64,
    /// True once a driver has consumed `angle`
    pub written: bool,
}

/// One servo of an array.
///
/// Bounds are kept as configured plus the current center offset, so the
/// live `min_angle`, `max_angle`, `initial_angle`, `center_angle` and native
/// span are always `configured - offset` and recentering back to a previous
/// offset restores them exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoUnit {
    index: usize,
    configured: ServoConfig,
    base_native: Span,
    pulse: Span,
    offset: f64,
    bounds: Bounds,
    initial_angle: f64,
    center_angle: f64,
    native: Span,
    state: ServoState,
}

impl ServoUnit {
    /// Validates `config` and builds the servo at its (clamped) initial angle.
    pub fn new(index: usize, config: ServoConfig) -> Result<Self, ConfigError> {
        config.check_numbers(index)?;

        if config.min_angle > config.max_angle {
            return Err(ConfigError::ConstraintViolation(format!(
                "servo {}: min_angle {} > max_angle {}",
                index, config.min_angle, config.max_angle
            )));
        }
        if config.max_angle - config.min_angle > config.servo_range {
            return Err(ConfigError::ConstraintViolation(format!(
                "servo {}: max_angle - min_angle = {} exceeds servo_range {}",
                index,
                config.max_angle - config.min_angle,
                config.servo_range
            )));
        }

        let (native_min, native_max) = config.angle_format.native_span(config.servo_range);
        let base_native = Span::new(native_min, native_max).map_err(|e| {
            ConfigError::DegenerateRange(format!("servo {} native span: {}", index, e))
        })?;
        let pulse = Span::new(config.min_pulse_width, config.max_pulse_width).map_err(|e| {
            ConfigError::DegenerateRange(format!("servo {} pulse width: {}", index, e))
        })?;

        let mut unit = Self {
            index,
            configured: config,
            base_native,
            pulse,
            offset: 0.0,
            bounds: Bounds::new(config.min_angle, config.max_angle),
            initial_angle: config.initial_angle,
            center_angle: config.angle_format.center(config.servo_range),
            native: base_native,
            state: ServoState {
                angle: 0.0,
                written: true,
            },
        };
        unit.recalibrate(config.center_angle_offset);

        let initial = unit.bounds.clamp(unit.initial_angle);
        if initial != unit.initial_angle {
            warn!(
                servo = index,
                initial_angle = unit.initial_angle,
                clamped = initial,
                "initial angle outside bounds"
            );
        }
        unit.state.angle = initial;
        Ok(unit)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Configuration as supplied at construction
    pub fn configured(&self) -> &ServoConfig {
        &self.configured
    }

    pub fn min_angle(&self) -> f64 {
        self.bounds.min
    }

    pub fn max_angle(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn initial_angle(&self) -> f64 {
        self.initial_angle
    }

    pub fn center_angle(&self) -> f64 {
        self.center_angle
    }

    pub fn center_angle_offset(&self) -> f64 {
        self.offset
    }

    pub fn servo_range(&self) -> f64 {
        self.configured.servo_range
    }

    pub fn servo_min(&self) -> f64 {
        self.native.start()
    }

    pub fn servo_max(&self) -> f64 {
        self.native.end()
    }

    pub fn step_size(&self) -> f64 {
        self.configured.step_size
    }

    pub fn flip(&self) -> bool {
        self.configured.flip
    }

    pub fn angle_format(&self) -> AngleFormat {
        self.configured.angle_format
    }

    pub fn min_pulse_width(&self) -> f64 {
        self.pulse.start()
    }

    pub fn max_pulse_width(&self) -> f64 {
        self.pulse.end()
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn is_written(&self) -> bool {
        self.state.written
    }

    /// Driver acknowledgement: the latest position has been sent.
    pub fn mark_written(&mut self) {
        self.state.written = true;
    }

    /// Conversion span for a domain (angles use the native span)
    pub fn span(&self, domain: PositionDomain) -> Span {
        match domain {
            PositionDomain::Angle => self.native,
            PositionDomain::PulseWidth => self.pulse,
            PositionDomain::Value => Span::VALUE,
        }
    }

    /// Converts `x` between two domains using this servo's ranges and flip.
    pub fn convert(&self, x: f64, from: PositionDomain, to: PositionDomain) -> f64 {
        convert::convert(x, self.span(from), self.span(to), self.flip())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Position
    // ─────────────────────────────────────────────────────────────────────

    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    fn store(&mut self, angle: f64) {
        self.state.angle = self.bounds.clamp(angle);
        self.state.written = false;
    }

    /// Sets the angle, saturating at the bounds. NaN is rejected and leaves
    /// the state untouched.
    pub fn set_angle(&mut self, angle: f64) -> Result<(), ConfigError> {
        if angle.is_nan() {
            return Err(ConfigError::InvalidValue(format!(
                "servo {}: angle is NaN",
                self.index
            )));
        }
        self.store(angle);
        Ok(())
    }

    pub fn pulse_width(&self) -> f64 {
        self.convert(self.state.angle, PositionDomain::Angle, PositionDomain::PulseWidth)
    }

    pub fn set_pulse_width(&mut self, pulse_width: f64) -> Result<(), ConfigError> {
        self.set_angle(self.convert(pulse_width, PositionDomain::PulseWidth, PositionDomain::Angle))
    }

    pub fn value(&self) -> f64 {
        self.convert(self.state.angle, PositionDomain::Angle, PositionDomain::Value)
    }

    pub fn set_value(&mut self, value: f64) -> Result<(), ConfigError> {
        self.set_angle(self.convert(value, PositionDomain::Value, PositionDomain::Angle))
    }

    /// Moves by `delta` degrees, reversed when flipped.
    pub fn move_by(&mut self, delta: f64) -> Result<(), ConfigError> {
        let sign = if self.flip() { -1.0 } else { 1.0 };
        self.set_angle(self.state.angle + delta * sign)
    }

    pub fn reset(&mut self) {
        self.store(self.initial_angle);
    }

    pub fn min(&mut self) {
        self.store(self.bounds.min);
    }

    pub fn mid(&mut self) {
        self.store(self.center_angle);
    }

    pub fn max(&mut self) {
        self.store(self.bounds.max);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Recentering
    // ─────────────────────────────────────────────────────────────────────

    fn recalibrate(&mut self, offset: f64) {
        let config = &self.configured;
        self.offset = offset;
        self.bounds = Bounds::new(config.min_angle, config.max_angle).shifted(offset);
        self.initial_angle = config.initial_angle - offset;
        self.center_angle = config.angle_format.center(config.servo_range) - offset;
        self.native = self.base_native.shifted(offset);
    }

    /// Moves the logical zero: every bound (including the native span) is
    /// shifted down by `new_offset - current_offset`. The current angle is
    /// left as is.
    pub fn recenter(&mut self, new_offset: f64) -> Result<(), ConfigError> {
        if !new_offset.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "servo {}: center offset {} is not finite",
                self.index, new_offset
            )));
        }
        debug!(
            servo = self.index,
            from = self.offset,
            to = new_offset,
            "recentering"
        );
        self.recalibrate(new_offset);
        Ok(())
    }

    /// Numeric projection of one field
    pub fn field(&self, field: ServoField) -> f64 {
        match field {
            ServoField::Index => self.index as f64,
            ServoField::MinAngle => self.min_angle(),
            ServoField::MaxAngle => self.max_angle(),
            ServoField::InitialAngle => self.initial_angle,
            ServoField::CenterAngle => self.center_angle,
            ServoField::CenterAngleOffset => self.offset,
            ServoField::ServoRange => self.servo_range(),
            ServoField::ServoMin => self.servo_min(),
            ServoField::ServoMax => self.servo_max(),
            ServoField::StepSize => self.step_size(),
            ServoField::MinPulseWidth => self.min_pulse_width(),
            ServoField::MaxPulseWidth => self.max_pulse_width(),
            ServoField::Flip => f64::from(u8::from(self.flip())),
            ServoField::Angle => self.angle(),
            ServoField::PulseWidth => self.pulse_width(),
            ServoField::Value => self.value(),
            ServoField::Written => f64::from(u8::from(self.is_written())),
        }
    }
}
