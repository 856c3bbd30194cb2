//! # 🦾 piard-core — Servo Array Model
//!
//! Configures an array of N servos whose position can be read and written
//! as an angle (degrees), a pulse width (µs) or a normalized value
//! (`-1..1`). Each servo has its own bounds, direction flip and movable
//! zero point. Hardware transports live in `piard-drivers`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 ServoController                  │
//! │  servo(i) → ServoHandle (write-on-update)        │
//! │  ┌──────────────────────────┐  ┌──────────────┐  │
//! │  │        ServoArray        │  │ Box<dyn      │  │
//! │  │  ServoUnit × N           │─▶│   Driver>    │  │
//! │  │  move_by / show / ...    │  └──────────────┘  │
//! │  └──────────────────────────┘                    │
//! └──────────────────────────────────────────────────┘
//!           ▲                         ▲
//!   ParamSpec expand            convert(x, from, to, flip)
//!   (scalar/dense/sparse/remap) BoundedSequence (clamp-on-write)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use piard_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServoArrayConfig {
//!     flip: ParamSpec::sparse(false, [(1, true)]),
//!     ..Default::default()
//! };
//! let mut servos = ServoArray::new(2, &config)?;
//!
//! servos.move_by(&[200.0, 30.0])?;
//! assert_eq!(servos.angles(), vec![90.0, -30.0]);
//! assert_eq!(servos.pulse_width_payload(), vec![2000, 1667]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Broadcasting**: every per-servo field takes a scalar, a dense list,
//!   a default with `(index, value)` overrides, or `(dst, src)` copies
//! - **Saturation**: out-of-range positions clamp silently; only NaN fails
//! - **Recentering**: exact and reversible (bounds are kept relative to
//!   the configured values)
//! - **Dirty tracking**: drivers can send only what changed

pub mod array;
pub mod bounded;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod param;
pub mod prelude;
pub mod traits;
pub mod types;
pub mod unit;

pub use array::ServoArray;
pub use bounded::{BoundedSequence, Bounds};
pub use config::{ServoArrayConfig, ServoSection};
pub use controller::{ControllerOptions, ServoController, ServoHandle};
pub use convert::{Span, convert, degree_to_pulse_width, try_convert};
pub use error::{ConfigError, ServoError, ServoResult};
pub use param::{ParamInput, ParamSpec, expand};
pub use traits::{Driver, DriverError, DriverResult};
pub use types::{AngleFormat, PositionDomain, ServoField};
pub use unit::{ServoConfig, ServoState, ServoUnit};

#[cfg(test)]
mod tests;
