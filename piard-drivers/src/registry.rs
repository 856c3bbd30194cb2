//! Driver selection by name, honouring compiled-in features

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use piard_core::{Driver, DriverError, DriverResult};

use crate::encoding::EncoderKind;
use crate::link::{DEFAULT_BAUD, DEFAULT_TIMEOUT_MS};
use crate::mock::MockDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    Mock,
    /// Microcontroller over a serial port (feature `serial`)
    Serial,
    /// Raspberry Pi GPIO (feature `rpi`)
    Rpi,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [DriverKind::Mock, DriverKind::Serial, DriverKind::Rpi];

    pub fn as_str(self) -> &'static str {
        match self {
            DriverKind::Mock => "mock",
            DriverKind::Serial => "serial",
            DriverKind::Rpi => "rpi",
        }
    }

    /// Whether this build can open the driver
    pub fn is_available(self) -> bool {
        match self {
            DriverKind::Mock => true,
            DriverKind::Serial => cfg!(feature = "serial"),
            DriverKind::Rpi => cfg!(feature = "rpi"),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DriverError::Unavailable(format!("unknown driver '{}'", s)))
    }
}

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// `[driver]` manifest section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverSpec {
    #[serde(default)]
    pub kind: DriverKind,
    /// Serial device path, e.g. `/dev/ttyACM0` or `COM3`
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Frame format for the serial driver
    #[serde(default)]
    pub encoding: EncoderKind,
    /// BCM pin per servo for the rpi driver
    #[serde(default)]
    pub pins: Vec<u8>,
}

impl Default for DriverSpec {
    fn default() -> Self {
        Self {
            kind: DriverKind::Mock,
            port: None,
            baud: default_baud(),
            timeout_ms: default_timeout_ms(),
            encoding: EncoderKind::default(),
            pins: Vec::new(),
        }
    }
}

#[cfg(any(not(feature = "serial"), not(feature = "rpi")))]
fn unavailable(kind: DriverKind) -> DriverError {
    DriverError::Unavailable(format!(
        "{} driver not compiled in (enable the `{}` feature)",
        kind, kind
    ))
}

#[cfg(feature = "serial")]
fn open_serial(spec: &DriverSpec) -> DriverResult<Box<dyn Driver>> {
    use std::time::Duration;

    use crate::link::SerialLink;
    use crate::microcontroller::MicrocontrollerDriver;

    let port = spec
        .port
        .as_deref()
        .ok_or_else(|| DriverError::ConnectionFailed("serial driver needs a port".into()))?;
    let link = SerialLink::new(port)
        .baud(spec.baud)
        .timeout(Duration::from_millis(spec.timeout_ms));
    Ok(Box::new(MicrocontrollerDriver::with_encoder(link, spec.encoding.build())))
}

#[cfg(not(feature = "serial"))]
fn open_serial(_spec: &DriverSpec) -> DriverResult<Box<dyn Driver>> {
    Err(unavailable(DriverKind::Serial))
}

#[cfg(feature = "rpi")]
fn open_rpi(spec: &DriverSpec) -> DriverResult<Box<dyn Driver>> {
    Ok(Box::new(crate::rpi::RpiDriver::new(spec.pins.clone())))
}

#[cfg(not(feature = "rpi"))]
fn open_rpi(_spec: &DriverSpec) -> DriverResult<Box<dyn Driver>> {
    Err(unavailable(DriverKind::Rpi))
}

/// Builds the driver described by `spec`. The driver is not connected yet.
pub fn open_driver(spec: &DriverSpec) -> DriverResult<Box<dyn Driver>> {
    let driver = match spec.kind {
        DriverKind::Mock => Ok(Box::new(MockDriver::new()) as Box<dyn Driver>),
        DriverKind::Serial => open_serial(spec),
        DriverKind::Rpi => open_rpi(spec),
    }?;
    info!(kind = %spec.kind, driver = driver.name(), "driver ready");
    Ok(driver)
}

/// Driver kinds this build can open
pub fn available_drivers() -> Vec<DriverKind> {
    DriverKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.is_available())
        .collect()
}
