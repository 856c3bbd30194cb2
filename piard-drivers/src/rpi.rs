//! Raspberry Pi GPIO driver (software PWM through `rppal`)

use std::fmt;
use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use tracing::{debug, info, warn};

use piard_core::{Driver, DriverError, DriverResult, ServoArray};

/// Standard hobby servo frame (50 Hz)
pub const PWM_PERIOD: Duration = Duration::from_millis(20);

fn pulse(pulse_width_us: f64) -> Duration {
    Duration::from_micros(pulse_width_us.max(0.0).round() as u64)
}

/// Logs every failed pin and keeps the first failure.
fn first_failure<E: fmt::Display>(
    results: impl IntoIterator<Item = (u8, Result<(), E>)>,
) -> DriverResult<()> {
    let mut first = None;
    for (pin, result) in results {
        if let Err(e) = result {
            warn!(pin, error = %e, "failed to stop PWM");
            first.get_or_insert_with(|| DriverError::WriteFailed(format!("GPIO {}: {}", pin, e)));
        }
    }
    first.map_or(Ok(()), Err)
}

/// One GPIO output per servo, in array order.
#[derive(Debug)]
pub struct RpiDriver {
    pins: Vec<u8>,
    outputs: Vec<OutputPin>,
}

impl RpiDriver {
    pub fn new(pins: Vec<u8>) -> Self {
        Self {
            pins,
            outputs: Vec::new(),
        }
    }

    pub fn pins(&self) -> &[u8] {
        &self.pins
    }
}

impl Driver for RpiDriver {
    fn name(&self) -> &str {
        "rpi"
    }

    /// Claims every pin and starts it at the servo's current pulse width.
    fn connect(&mut self, servos: &ServoArray) -> DriverResult<()> {
        if self.pins.len() != servos.len() {
            return Err(DriverError::ConnectionFailed(format!(
                "{} pins for {} servos",
                self.pins.len(),
                servos.len()
            )));
        }
        self.outputs.clear();
        let gpio = Gpio::new().map_err(|e| DriverError::ConnectionFailed(e.to_string()))?;
        for (&pin, unit) in self.pins.iter().zip(servos) {
            let mut output = gpio
                .get(pin)
                .map_err(|e| DriverError::ConnectionFailed(format!("GPIO {}: {}", pin, e)))?
                .into_output();
            output
                .set_pwm(PWM_PERIOD, pulse(unit.pulse_width()))
                .map_err(|e| DriverError::ConnectionFailed(format!("GPIO {}: {}", pin, e)))?;
            self.outputs.push(output);
        }
        info!(pins = ?self.pins, "gpio outputs claimed");
        Ok(())
    }

    /// Updates only servos whose position changed since the last write.
    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()> {
        if self.outputs.is_empty() {
            return Err(DriverError::NotOpen);
        }
        for index in servos.dirty_indices() {
            let output = self
                .outputs
                .get_mut(index)
                .ok_or_else(|| DriverError::WriteFailed(format!("no GPIO for servo {}", index)))?;
            let unit = servos
                .get_mut(index)
                .ok_or_else(|| DriverError::WriteFailed(format!("no servo {}", index)))?;
            output
                .set_pwm(PWM_PERIOD, pulse(unit.pulse_width()))
                .map_err(|e| DriverError::WriteFailed(e.to_string()))?;
            unit.mark_written();
        }
        Ok(())
    }

    /// Stops PWM on every pin, then releases them all, even when one fails.
    fn close(&mut self) -> DriverResult<()> {
        let cleared = first_failure(
            self.outputs
                .iter_mut()
                .map(|output| (output.pin(), output.clear_pwm())),
        );
        self.outputs.clear();
        debug!("gpio outputs released");
        cleared
    }

    fn is_open(&self) -> bool {
        !self.outputs.is_empty()
    }
}
