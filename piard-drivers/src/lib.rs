//! # 🔌 piard-drivers — Servo Transports
//!
//! Implementations of [`piard_core::Driver`] plus the wire encodings they
//! use. Hardware backends are cargo features so a build without them still
//! links, and asking for one returns [`DriverError::Unavailable`].
//!
//! ```text
//! ServoController ──▶ Box<dyn Driver>
//!                        ├── MockDriver                       (always)
//!                        ├── MicrocontrollerDriver<Link>
//!                        │     ├── FrameEncoder: comma | two-byte
//!                        │     └── Link: MemoryLink | SerialLink (serial)
//!                        └── RpiDriver                        (rpi)
//! ```
//!
//! | Feature | Driver | Crate |
//! |---------|--------|-------|
//! | (default) | `mock` | |
//! | `serial` | `serial` | `serialport` |
//! | `rpi` | `rpi` | `rppal` |
//!
//! [`DriverError::Unavailable`]: piard_core::DriverError::Unavailable

pub mod encoding;
pub mod error;
pub mod link;
pub mod microcontroller;
pub mod mock;
pub mod registry;

#[cfg(feature = "rpi")]
pub mod rpi;

pub use encoding::{
    ByteOrder, CommaDelimitedEncoder, EncoderKind, FrameEncoder, TextEncoding, TwoByteEncoder,
};
pub use error::{EncodeError, EncodeResult};
pub use link::{Link, MemoryLink};
pub use microcontroller::MicrocontrollerDriver;
pub use mock::{MockDriver, MockHistory};
pub use registry::{DriverKind, DriverSpec, available_drivers, open_driver};

#[cfg(feature = "serial")]
pub use link::SerialLink;

#[cfg(feature = "rpi")]
pub use rpi::RpiDriver;
