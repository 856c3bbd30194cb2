//! Servo controller: an array bound to a driver.
//!
//! ```text
//! ServoController ──owns──▶ ServoArray ──▶ ServoUnit × N
//!        │                        ▲
//!        └──owns──▶ Box<dyn Driver>│ write(&mut ServoArray)
//!
//! controller.servo(i) ──▶ ServoHandle<'_>  (setter → clamp → driver.write)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::array::ServoArray;
use crate::error::{ServoError, ServoResult};
use crate::param::ParamSpec;
use crate::traits::Driver;
use crate::unit::ServoUnit;

fn default_connect() -> bool {
    true
}

/// Controller behaviour switches (`[controller]` manifest section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerOptions {
    /// Every handle setter pushes the array to the driver
    #[serde(default)]
    pub write_on_update: bool,
    /// Open the driver in [`ServoController::new`]
    #[serde(default = "default_connect")]
    pub connect: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            write_on_update: false,
            connect: default_connect(),
        }
    }
}

/// Owns a servo array and the driver that moves it.
#[derive(Debug)]
pub struct ServoController {
    servos: ServoArray,
    driver: Box<dyn Driver>,
    options: ControllerOptions,
}

impl ServoController {
    /// Binds `servos` to `driver`, connecting first when `options.connect`.
    pub fn new(
        servos: ServoArray,
        driver: Box<dyn Driver>,
        options: ControllerOptions,
    ) -> ServoResult<Self> {
        let mut controller = Self {
            servos,
            driver,
            options,
        };
        if options.connect {
            controller.connect()?;
        }
        Ok(controller)
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    pub fn connect(&mut self) -> ServoResult<()> {
        debug!(driver = self.driver.name(), servos = self.servos.len(), "connecting");
        self.driver.connect(&self.servos)?;
        Ok(())
    }

    /// Pushes the array to the driver.
    pub fn write(&mut self) -> ServoResult<()> {
        self.driver.write(&mut self.servos).map_err(|e| {
            warn!(driver = self.driver.name(), error = %e, "write failed");
            ServoError::from(e)
        })
    }

    pub fn close(&mut self) -> ServoResult<()> {
        debug!(driver = self.driver.name(), "closing");
        self.driver.close()?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.driver.is_open()
    }

    pub fn servos(&self) -> &ServoArray {
        &self.servos
    }

    /// Direct access to the array; changes are not written through.
    pub fn servos_mut(&mut self) -> &mut ServoArray {
        &mut self.servos
    }

    pub fn into_parts(self) -> (ServoArray, Box<dyn Driver>) {
        (self.servos, self.driver)
    }

    /// Handle to servo `index`, writing through when `write_on_update` is set.
    pub fn servo(&mut self, index: usize) -> ServoResult<ServoHandle<'_>> {
        self.servos.unit(index)?;
        Ok(ServoHandle {
            controller: self,
            index,
        })
    }

    fn after_update(&mut self, write: bool) -> ServoResult<()> {
        if write {
            self.write()
        } else {
            Ok(())
        }
    }

    /// Moves every servo by `deltas` degrees, then writes if asked.
    pub fn move_by(&mut self, deltas: &[f64], write: bool) -> ServoResult<()> {
        self.servos.move_by(deltas)?;
        self.after_update(write)
    }

    /// Moves every servo by whole steps of its `step_size`.
    pub fn step_by(&mut self, steps: &[f64], write: bool) -> ServoResult<()> {
        self.servos.step_by(steps)?;
        self.after_update(write)
    }

    /// Returns every servo to its initial angle.
    pub fn reset(&mut self, write: bool) -> ServoResult<()> {
        self.servos.reset_all();
        self.after_update(write)
    }

    pub fn recenter_all(&mut self, offsets: &ParamSpec<f64>) -> ServoResult<()> {
        self.servos.recenter_all(offsets)
    }
}

/// Borrowed view of one servo inside a controller.
///
/// Setters clamp through the unit and, with `write_on_update`, call the
/// driver's `write` exactly once. The borrow ends with the handle.
#[derive(Debug)]
pub struct ServoHandle<'a> {
    controller: &'a mut ServoController,
    index: usize,
}

impl ServoHandle<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn unit(&self) -> &ServoUnit {
        &self.controller.servos[self.index]
    }

    fn update(&mut self, f: impl FnOnce(&mut ServoUnit) -> ServoResult<()>) -> ServoResult<()> {
        f(self.controller.servos.unit_mut(self.index)?)?;
        let write = self.controller.options.write_on_update;
        self.controller.after_update(write)
    }

    pub fn angle(&self) -> f64 {
        self.unit().angle()
    }

    pub fn set_angle(&mut self, angle: f64) -> ServoResult<()> {
        self.update(|unit| Ok(unit.set_angle(angle)?))
    }

    pub fn value(&self) -> f64 {
        self.unit().value()
    }

    pub fn set_value(&mut self, value: f64) -> ServoResult<()> {
        self.update(|unit| Ok(unit.set_value(value)?))
    }

    pub fn pulse_width(&self) -> f64 {
        self.unit().pulse_width()
    }

    pub fn set_pulse_width(&mut self, pulse_width: f64) -> ServoResult<()> {
        self.update(|unit| Ok(unit.set_pulse_width(pulse_width)?))
    }

    pub fn move_by(&mut self, delta: f64) -> ServoResult<()> {
        self.update(|unit| Ok(unit.move_by(delta)?))
    }

    pub fn min(&mut self) -> ServoResult<()> {
        self.update(|unit| {
            unit.min();
            Ok(())
        })
    }

    pub fn mid(&mut self) -> ServoResult<()> {
        self.update(|unit| {
            unit.mid();
            Ok(())
        })
    }

    pub fn max(&mut self) -> ServoResult<()> {
        self.update(|unit| {
            unit.max();
            Ok(())
        })
    }

    /// Back to the initial angle. Never writes.
    pub fn reset(&mut self) {
        if let Some(unit) = self.controller.servos.get_mut(self.index) {
            unit.reset();
        }
    }
}
