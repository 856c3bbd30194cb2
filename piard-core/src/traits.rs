//! Driver capability consumed by the controller

use std::fmt::Debug;

use thiserror::Error;

use crate::array::ServoArray;

pub type DriverResult<T> = Result<T, DriverError>;

/// Transport failures. Opaque to the servo model; surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Driver not open")]
    NotOpen,

    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Driver kind not compiled in or hardware missing
    #[error("Driver unavailable: {0}")]
    Unavailable(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Something that can move servos.
///
/// `write` receives the whole array; implementations decide whether to send
/// every unit or only the ones not yet written, and acknowledge what they
/// sent with [`ServoUnit::mark_written`](crate::ServoUnit::mark_written).
pub trait Driver: Debug + Send {
    /// Short identifier ("mock", "serial", "rpi")
    fn name(&self) -> &str;

    /// Opens the transport. Called once before the first write.
    fn connect(&mut self, servos: &ServoArray) -> DriverResult<()>;

    /// Pushes the current positions to hardware.
    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()>;

    /// Releases the transport. Closing twice is a no-op.
    fn close(&mut self) -> DriverResult<()>;

    fn is_open(&self) -> bool;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn connect(&mut self, servos: &ServoArray) -> DriverResult<()> {
        (**self).connect(servos)
    }

    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()> {
        (**self).write(servos)
    }

    fn close(&mut self) -> DriverResult<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
