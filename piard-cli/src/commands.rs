//! Subcommand bodies for the `piard` binary.
//!
//! Each command writes to a caller-supplied writer so the binary can pass
//! stdout and tests can pass a `Vec<u8>`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::*;
use tracing::{debug, info, warn};

use piard_core::{ParamSpec, ServoArray, ServoController, ServoField};
use piard_drivers::{DriverKind, EncoderKind, open_driver};

use crate::keymap::{KeyAction, KeyMap};
use crate::manifest::Manifest;

/// Columns printed by `piard show` when none are named
pub const DEFAULT_SHOW_FIELDS: [ServoField; 4] = [
    ServoField::Index,
    ServoField::Angle,
    ServoField::PulseWidth,
    ServoField::Value,
];

/// Loads the manifest at `config`, or searches upward from the current
/// directory. A directory argument is searched the same way.
pub fn load_manifest(config: Option<&Path>) -> Result<(Manifest, PathBuf)> {
    match config {
        Some(path) if path.is_dir() => Ok(Manifest::find_and_load(path)?),
        Some(path) => {
            let manifest = Manifest::from_file(path)?;
            Ok((manifest, path.to_path_buf()))
        }
        None => {
            let current_dir = std::env::current_dir().context("cannot read current directory")?;
            Ok(Manifest::find_and_load(&current_dir)?)
        }
    }
}

/// Formats a number without trailing zeros (`90`, `-0.5`, `1666.667`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
    format!("[{}]", items.join(", "))
}

// ============================================================================
// check / show / drivers
// ============================================================================

pub fn check(manifest: &Manifest, path: &Path, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} {}",
        "Checking".green().bold(),
        path.display().to_string().cyan()
    )?;

    let servos = manifest
        .build_servos()
        .context("invalid [servos] section")?;
    writeln!(
        out,
        "{} {} servo(s) at {}",
        "    Servos".green().bold(),
        servos.len(),
        format_list(&servos.angles())
    )?;

    let driver = open_driver(&manifest.driver).context("invalid [driver] section")?;
    writeln!(
        out,
        "{} {} ({})",
        "    Driver".green().bold(),
        manifest.driver.kind,
        driver.name()
    )?;

    let unused = manifest.unused_key_pairs();
    if unused > 0 {
        writeln!(
            out,
            "{} {} key pair(s) in [keys] have no servo",
            "warning:".yellow().bold(),
            unused
        )?;
    }

    writeln!(out, "{}", "Manifest OK".bold())?;
    Ok(())
}

pub fn show(manifest: &Manifest, fields: &[ServoField], out: &mut impl Write) -> Result<()> {
    let servos = manifest
        .build_servos()
        .context("invalid [servos] section")?;
    let fields = if fields.is_empty() {
        &DEFAULT_SHOW_FIELDS[..]
    } else {
        fields
    };

    let header: Vec<String> = fields.iter().map(|f| format!("{:>16}", f.name())).collect();
    writeln!(out, "{}", header.join("").bold())?;

    let columns: Vec<Vec<f64>> = fields.iter().map(|f| servos.show(*f)).collect();
    for row in 0..servos.len() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| format!("{:>16}", format_number(column[row])))
            .collect();
        writeln!(out, "{}", cells.join(""))?;
    }
    Ok(())
}

pub fn drivers(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", "Drivers:".bold())?;
    for kind in DriverKind::ALL {
        let status = if kind.is_available() {
            "available".green().to_string()
        } else {
            format!("enable the `{}` feature", kind).dimmed().to_string()
        };
        writeln!(out, "  {:<8} {}", kind.as_str().cyan(), status)?;
    }
    Ok(())
}

// ============================================================================
// encode
// ============================================================================

/// Renders a frame for the terminal: comma frames as text, binary frames
/// as hex bytes.
pub fn render_frame(format: EncoderKind, frame: &[u8]) -> String {
    match format {
        EncoderKind::Comma => String::from_utf8_lossy(frame).into_owned(),
        EncoderKind::TwoByte => frame
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Encodes the array in its configured initial position, or at `angles`.
pub fn encode(
    manifest: &Manifest,
    format: EncoderKind,
    angles: Option<&[f64]>,
    out: &mut impl Write,
) -> Result<Vec<u8>> {
    let mut servos = manifest
        .build_servos()
        .context("invalid [servos] section")?;
    if let Some(angles) = angles {
        servos
            .set_angles(&ParamSpec::from(angles.to_vec()))
            .context("cannot apply --angles")?;
    }

    let frame = format.build().frame(&servos)?;
    debug!(format = %format, bytes = frame.len(), "frame encoded");
    writeln!(out, "{}", render_frame(format, &frame))?;
    Ok(frame)
}

// ============================================================================
// drive
// ============================================================================

fn print_positions(servos: &ServoArray, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} {}", "angles".cyan(), format_list(&servos.angles()))?;
    Ok(())
}

/// Feeds key lines from `input` to an already built controller until the
/// quit key or end of input. Each key press writes to the driver.
pub fn drive_with(
    controller: &mut ServoController,
    keys: &KeyMap,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let n = controller.servos().len();
    let bindings: Vec<String> = keys
        .move_keys
        .iter()
        .take(n)
        .enumerate()
        .map(|(servo, [plus, minus])| format!("{}: {}/{}", servo, plus, minus))
        .collect();
    writeln!(
        out,
        "{} {} (reset {}, quit {})",
        "Keys".green().bold(),
        bindings.join("  "),
        keys.reset,
        keys.quit
    )?;
    print_positions(controller.servos(), out)?;

    for line in input.lines() {
        let line = line.context("failed to read key input")?;
        for key in keys.keys_in(&line) {
            match keys.action(&key, n) {
                KeyAction::Step(steps) => controller
                    .step_by(&steps, true)
                    .with_context(|| format!("key '{}'", key))?,
                KeyAction::Reset => controller
                    .reset(true)
                    .with_context(|| format!("key '{}'", key))?,
                KeyAction::Quit => {
                    info!("quit requested");
                    return Ok(());
                }
                KeyAction::Unbound => {
                    debug!(key = %key, "unbound key");
                    writeln!(out, "{} unbound key '{}'", "warning:".yellow().bold(), key)?;
                }
            }
        }
        print_positions(controller.servos(), out)?;
    }
    Ok(())
}

/// `piard drive`: builds the controller from the manifest, drives it from
/// `input` and closes the driver afterwards.
pub fn drive(manifest: &Manifest, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    let servos = manifest
        .build_servos()
        .context("invalid [servos] section")?;
    if servos.is_empty() {
        bail!("nothing to drive: [servos] count is 0");
    }
    let driver = open_driver(&manifest.driver).context("invalid [driver] section")?;
    let mut controller = ServoController::new(servos, driver, manifest.controller)
        .context("failed to connect driver")?;

    let session = drive_with(&mut controller, &manifest.keys, input, out);
    end_session(&mut controller, session)
}

/// Closes the driver after a session. A failed session wins over a failed
/// close, which is then only logged.
pub fn end_session(controller: &mut ServoController, session: Result<()>) -> Result<()> {
    let closed = controller.close();
    match (session, closed) {
        (Err(e), Err(close_error)) => {
            warn!(error = %close_error, "failed to close driver after session error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => closed.context("failed to close driver"),
    }
}
