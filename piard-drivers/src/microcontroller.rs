//! Driver for a microcontroller that receives whole-array frames

use tracing::{debug, info};

use piard_core::{Driver, DriverError, DriverResult, ServoArray};

use crate::encoding::{CommaDelimitedEncoder, FrameEncoder};
use crate::link::Link;

/// Encodes the full array on every write and sends it over `L`.
#[derive(Debug)]
pub struct MicrocontrollerDriver<L: Link> {
    link: L,
    encoder: Box<dyn FrameEncoder>,
}

impl<L: Link> MicrocontrollerDriver<L> {
    /// Comma-delimited pulse widths over `link`
    pub fn new(link: L) -> Self {
        Self::with_encoder(link, Box::new(CommaDelimitedEncoder::default()))
    }

    pub fn with_encoder(link: L, encoder: Box<dyn FrameEncoder>) -> Self {
        Self { link, encoder }
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

impl<L: Link> Driver for MicrocontrollerDriver<L> {
    fn name(&self) -> &str {
        "microcontroller"
    }

    fn connect(&mut self, servos: &ServoArray) -> DriverResult<()> {
        self.link.open()?;
        info!(servos = servos.len(), "microcontroller link open");
        Ok(())
    }

    fn write(&mut self, servos: &mut ServoArray) -> DriverResult<()> {
        if !self.link.is_open() {
            return Err(DriverError::NotOpen);
        }
        let frame = self.encoder.frame(servos)?;
        debug!(bytes = frame.len(), "sending frame");
        self.link.send(&frame)?;
        servos.mark_all_written();
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.link.close()
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }
}
