//! # 🎛️ piard-cli — Manifest-driven Servo Tool
//!
//! Library half of the `piard` binary, split out so the commands can be
//! exercised against in-memory readers and writers.
//!
//! ```text
//! piard.toml ──▶ Manifest ──▶ ServoArray ──▶ ServoController ──▶ Driver
//!                  │                             ▲
//!                  └── KeyMap ── stdin lines ────┘  (piard drive)
//! ```

pub mod commands;
pub mod keymap;
pub mod manifest;

pub use keymap::{KeyAction, KeyMap, key_name};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestError, ManifestResult};
