//! piard Project Manifest (piard.toml) Parser
//!
//! ```toml
//! [servos]
//! count = 2
//! min_angle = [-45, [1, -90]]   # default, then (index, value) overrides
//! flip = [0, 1]
//!
//! [driver]
//! kind = "serial"
//! port = "/dev/ttyACM0"
//!
//! [controller]
//! write_on_update = true
//!
//! [keys]
//! move_keys = [["a", "d"], ["s", "w"]]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use piard_core::{ConfigError, ControllerOptions, ServoArray, ServoSection};
use piard_drivers::DriverSpec;

use crate::keymap::KeyMap;

/// File name searched for by [`Manifest::find_and_load`]
pub const MANIFEST_FILE: &str = "piard.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse piard.toml: {0}")]
    Parse(String),

    #[error("No piard.toml found in {0} or any parent directory")]
    NotFound(PathBuf),

    #[error(transparent)]
    Servo(#[from] ConfigError),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// piard manifest (piard.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Array size and per-servo parameters
    #[serde(default)]
    pub servos: ServoSection,

    /// Transport
    #[serde(default)]
    pub driver: DriverSpec,

    #[serde(default)]
    pub controller: ControllerOptions,

    /// Bindings for `piard drive`
    #[serde(default)]
    pub keys: KeyMap,
}

impl Manifest {
    /// Parse a manifest from TOML string
    pub fn from_str(content: &str) -> ManifestResult<Self> {
        toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// Load manifest from a file path
    pub fn from_file(path: &Path) -> ManifestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Find and load manifest by searching up from `start_dir`
    pub fn find_and_load(start_dir: &Path) -> ManifestResult<(Self, PathBuf)> {
        let mut current = start_dir.to_path_buf();
        loop {
            let manifest_path = current.join(MANIFEST_FILE);
            if manifest_path.is_file() {
                let manifest = Self::from_file(&manifest_path)?;
                return Ok((manifest, manifest_path));
            }
            if !current.pop() {
                return Err(ManifestError::NotFound(start_dir.to_path_buf()));
            }
        }
    }

    /// Builds the servo array described by `[servos]`.
    pub fn build_servos(&self) -> ManifestResult<ServoArray> {
        Ok(self.servos.build()?)
    }

    /// Key bindings that point past the end of the array
    pub fn unused_key_pairs(&self) -> usize {
        self.keys.bound_servos().saturating_sub(self.servos.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piard_core::ServoField;
    use piard_drivers::DriverKind;

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = Manifest::from_str("").unwrap();
        assert_eq!(manifest, Manifest::default());
        assert_eq!(manifest.servos.count, 1);
        assert_eq!(manifest.driver.kind, DriverKind::Mock);
        assert!(!manifest.controller.write_on_update);
        assert!(manifest.controller.connect);
    }

    #[test]
    fn test_full_manifest() {
        let manifest = Manifest::from_str(
            r#"
[servos]
count = 3
min_angle = [-45, [1, -90]]
max_pulse_width = [2000, 2100, 2200]
flip = [false, true, false]
angle_format = "minus_to_plus"

[driver]
kind = "serial"
port = "/dev/ttyACM0"
encoding = "two-byte"

[controller]
write_on_update = true

[keys]
move_keys = [["a", "d"], ["s", "w"], ["j", "l"]]
move_size = 5
"#,
        )
        .unwrap();

        let servos = manifest.build_servos().unwrap();
        assert_eq!(servos.show(ServoField::MinAngle), vec![-45.0, -90.0, -45.0]);
        assert_eq!(servos.show(ServoField::Flip), vec![0.0, 1.0, 0.0]);
        assert_eq!(manifest.driver.port.as_deref(), Some("/dev/ttyACM0"));
        assert!(manifest.controller.write_on_update);
        assert_eq!(manifest.keys.move_size, 5.0);
        assert_eq!(manifest.unused_key_pairs(), 0);
    }

    #[test]
    fn test_bad_shape_is_config_error() {
        let manifest = Manifest::from_str("[servos]\ncount = 3\nstep_size = [1, 2]\n").unwrap();
        assert!(matches!(
            manifest.build_servos(),
            Err(ManifestError::Servo(ConfigError::InvalidShape(_)))
        ));
    }

    #[test]
    fn test_bool_for_number_is_invalid_value() {
        let manifest = Manifest::from_str("[servos]\nmin_angle = true\n").unwrap();
        assert!(matches!(
            manifest.build_servos(),
            Err(ManifestError::Servo(ConfigError::InvalidValue(_)))
        ));
    }

    #[test]
    fn test_range_violation() {
        let manifest =
            Manifest::from_str("[servos]\nmin_angle = -100\nmax_angle = 100\n").unwrap();
        assert!(matches!(
            manifest.build_servos(),
            Err(ManifestError::Servo(ConfigError::ConstraintViolation(_)))
        ));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            Manifest::from_str("[motors]\ncount = 1\n"),
            Err(ManifestError::Parse(_))
        ));
    }
}
