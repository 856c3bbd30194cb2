//! Byte transports for microcontroller drivers

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use piard_core::{DriverError, DriverResult};

/// Default serial baud rate
pub const DEFAULT_BAUD: u32 = 9600;

/// Default serial read/write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// A byte pipe to the microcontroller.
pub trait Link: Debug + Send {
    fn open(&mut self) -> DriverResult<()>;
    fn send(&mut self, frame: &[u8]) -> DriverResult<()>;
    fn close(&mut self) -> DriverResult<()>;
    fn is_open(&self) -> bool;
}

/// Frames sent through a [`MemoryLink`]
pub type FrameLog = Arc<Mutex<Vec<Vec<u8>>>>;

/// Link that keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemoryLink {
    open: bool,
    frames: FrameLog,
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared log of sent frames
    pub fn frames(&self) -> FrameLog {
        Arc::clone(&self.frames)
    }
}

impl Link for MemoryLink {
    fn open(&mut self) -> DriverResult<()> {
        self.open = true;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> DriverResult<()> {
        if !self.open {
            return Err(DriverError::NotOpen);
        }
        self.frames
            .lock()
            .map_err(|_| DriverError::WriteFailed("frame log poisoned".into()))?
            .push(frame.to_vec());
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(feature = "serial")]
pub use serial::SerialLink;

#[cfg(feature = "serial")]
mod serial {
    use std::fmt;
    use std::io::Write;
    use std::time::Duration;

    use serialport::SerialPort;
    use tracing::{info, warn};

    use super::{DEFAULT_BAUD, DEFAULT_TIMEOUT_MS, Link};
    use piard_core::{DriverError, DriverResult};

    /// Serial port link (Arduino and friends).
    pub struct SerialLink {
        path: String,
        baud: u32,
        timeout: Duration,
        port: Option<Box<dyn SerialPort>>,
    }

    impl SerialLink {
        pub fn new(path: impl Into<String>) -> Self {
            Self {
                path: path.into(),
                baud: DEFAULT_BAUD,
                timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
                port: None,
            }
        }

        pub fn baud(mut self, baud: u32) -> Self {
            self.baud = baud;
            self
        }

        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl fmt::Debug for SerialLink {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("SerialLink")
                .field("path", &self.path)
                .field("baud", &self.baud)
                .field("timeout", &self.timeout)
                .field("open", &self.port.is_some())
                .finish()
        }
    }

    impl Link for SerialLink {
        fn open(&mut self) -> DriverResult<()> {
            if self.port.is_some() {
                return Ok(());
            }
            let port = serialport::new(&self.path, self.baud)
                .timeout(self.timeout)
                .open()
                .map_err(|e| DriverError::ConnectionFailed(format!("{}: {}", self.path, e)))?;
            info!(path = %self.path, baud = self.baud, "serial port open");
            self.port = Some(port);
            Ok(())
        }

        fn send(&mut self, frame: &[u8]) -> DriverResult<()> {
            let port = self.port.as_mut().ok_or(DriverError::NotOpen)?;
            port.write_all(frame)
                .and_then(|_| port.flush())
                .map_err(|e| {
                    warn!(path = %self.path, error = %e, "serial write failed");
                    DriverError::WriteFailed(e.to_string())
                })
        }

        fn close(&mut self) -> DriverResult<()> {
            self.port = None;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.port.is_some()
        }
    }
}
