//! Key bindings for `piard drive`.
//!
//! Each servo gets a pair of keys; the first moves it by `+move_size`
//! steps, the second by `-move_size`.

use serde::{Deserialize, Serialize};

/// Name of a key as read from a terminal, with control codes spelled out.
///
/// Only the last character counts, so arrow-key escape sequences
/// (`ESC [ A`) resolve to `up`, `down`, `right` or `left`.
pub fn key_name(raw: &str) -> Option<String> {
    let last = raw.chars().last()?;
    let name = match u32::from(last) {
        127 => "backspace",
        10 => "return",
        32 => "space",
        9 => "tab",
        27 => "esc",
        65 => "up",
        66 => "down",
        67 => "right",
        68 => "left",
        _ => return Some(last.to_string()),
    };
    Some(name.to_string())
}

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// Steps per servo, for `step_by`
    Step(Vec<f64>),
    Reset,
    Quit,
    Unbound,
}

fn default_move_keys() -> Vec<[String; 2]> {
    vec![
        ["a".to_string(), "d".to_string()],
        ["s".to_string(), "w".to_string()],
    ]
}

fn default_move_size() -> f64 {
    10.0
}

fn default_quit() -> String {
    "esc".to_string()
}

fn default_reset() -> String {
    "r".to_string()
}

/// `[keys]` manifest section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyMap {
    /// `[plus, minus]` key pair per servo, in servo order
    #[serde(default = "default_move_keys")]
    pub move_keys: Vec<[String; 2]>,
    /// Steps per key press
    #[serde(default = "default_move_size")]
    pub move_size: f64,
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_reset")]
    pub reset: String,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            move_keys: default_move_keys(),
            move_size: default_move_size(),
            quit: default_quit(),
            reset: default_reset(),
        }
    }
}

impl KeyMap {
    /// Number of servos with bindings
    pub fn bound_servos(&self) -> usize {
        self.move_keys.len()
    }

    /// Resolves a key name for an array of `n` servos.
    pub fn action(&self, key: &str, n: usize) -> KeyAction {
        if key == self.quit {
            return KeyAction::Quit;
        }
        if key == self.reset {
            return KeyAction::Reset;
        }
        for (servo, pair) in self.move_keys.iter().enumerate().take(n) {
            if let Some(j) = pair.iter().position(|k| k == key) {
                let mut steps = vec![0.0; n];
                steps[servo] = if j == 0 { self.move_size } else { -self.move_size };
                return KeyAction::Step(steps);
            }
        }
        KeyAction::Unbound
    }

    /// Splits an input line into key names; named keys may be typed out
    /// (`up`, `esc`), anything else is taken character by character.
    pub fn keys_in(&self, line: &str) -> Vec<String> {
        let mut keys = Vec::new();
        for token in line.split_whitespace() {
            let named = token.chars().count() > 1
                && (token == self.quit
                    || token == self.reset
                    || self.move_keys.iter().flatten().any(|k| k == token)
                    || matches!(token, "up" | "down" | "left" | "right" | "esc"));
            if named {
                keys.push(token.to_string());
            } else {
                keys.extend(token.chars().filter_map(|c| {
                    if c.is_control() {
                        key_name(&c.to_string())
                    } else {
                        Some(c.to_string())
                    }
                }));
            }
        }
        keys
    }
}
