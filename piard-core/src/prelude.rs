//! Common imports: `use piard_core::prelude::*;`

pub use crate::array::ServoArray;
pub use crate::config::ServoArrayConfig;
pub use crate::controller::{ControllerOptions, ServoController};
pub use crate::error::{ConfigError, ServoError, ServoResult};
pub use crate::param::ParamSpec;
pub use crate::traits::{Driver, DriverError, DriverResult};
pub use crate::types::{AngleFormat, PositionDomain, ServoField};
pub use crate::unit::{ServoConfig, ServoUnit};
