//! Wire framing for microcontroller links.
//!
//! ```text
//! comma:     b"<1500,1000,2000>"
//! two-byte:  [preamble?] 0x10 (hi lo)* 0x11     entry = index << 5 | level
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use piard_core::ServoArray;

use crate::error::{EncodeError, EncodeResult};

/// Turns the current state of an array into one message.
pub trait FrameEncoder: fmt::Debug + Send {
    fn frame(&self, servos: &ServoArray) -> EncodeResult<Vec<u8>>;
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMA DELIMITED
// ═══════════════════════════════════════════════════════════════════════════

/// Text encoding of comma-delimited frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    pub fn encode(self, text: &str) -> EncodeResult<Vec<u8>> {
        let unrepresentable = || EncodeError::Unrepresentable {
            text: text.to_string(),
            encoding: self.name(),
        };
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii if text.is_ascii() => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => Err(unrepresentable()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| unrepresentable()))
                .collect(),
        }
    }
}

/// `<v0,v1,...>` with the array's rounded pulse widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommaDelimitedEncoder {
    pub begin: String,
    pub end: String,
    pub encoding: TextEncoding,
}

impl Default for CommaDelimitedEncoder {
    fn default() -> Self {
        Self {
            begin: "<".into(),
            end: ">".into(),
            encoding: TextEncoding::Utf8,
        }
    }
}

impl CommaDelimitedEncoder {
    pub fn encode_data(&self, data: &[i64]) -> EncodeResult<Vec<u8>> {
        let body = data
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.encoding
            .encode(&format!("{}{}{}", self.begin, body, self.end))
    }
}

impl FrameEncoder for CommaDelimitedEncoder {
    fn frame(&self, servos: &ServoArray) -> EncodeResult<Vec<u8>> {
        self.encode_data(&servos.pulse_width_payload())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TWO BYTE
// ═══════════════════════════════════════════════════════════════════════════

/// Highest level a two-byte entry can carry (5 bits)
pub const MAX_LEVEL: u16 = 31;

/// Highest index a two-byte entry can carry (11 bits)
pub const MAX_INDEX: usize = 0x7FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Binary frame with one 16-bit word per servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoByteEncoder {
    pub begin: u8,
    pub end: u8,
    pub byte_order: ByteOrder,
    /// Extra byte sent before `begin`; some firmwares resync on a leading 0
    pub preamble: Option<u8>,
}

impl Default for TwoByteEncoder {
    fn default() -> Self {
        Self {
            begin: 16,
            end: 17,
            byte_order: ByteOrder::Big,
            preamble: None,
        }
    }
}

impl TwoByteEncoder {
    /// Encodes `(index, level)` entries; levels above [`MAX_LEVEL`] saturate.
    pub fn encode_data(&self, data: &[(usize, u16)]) -> EncodeResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() * 2 + 3);
        out.extend(self.preamble);
        out.push(self.begin);
        for &(index, level) in data {
            if index > MAX_INDEX {
                return Err(EncodeError::IndexOverflow { index });
            }
            let word = ((index as u16) << 5) | level.min(MAX_LEVEL);
            match self.byte_order {
                ByteOrder::Big => out.extend(word.to_be_bytes()),
                ByteOrder::Little => out.extend(word.to_le_bytes()),
            }
        }
        out.push(self.end);
        Ok(out)
    }
}

impl FrameEncoder for TwoByteEncoder {
    fn frame(&self, servos: &ServoArray) -> EncodeResult<Vec<u8>> {
        self.encode_data(&servos.level_payload(MAX_LEVEL))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SELECTION
// ═══════════════════════════════════════════════════════════════════════════

/// Encoder choice in manifests and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncoderKind {
    #[default]
    Comma,
    TwoByte,
}

impl EncoderKind {
    /// Encoder with default delimiters
    pub fn build(self) -> Box<dyn FrameEncoder> {
        match self {
            EncoderKind::Comma => Box::new(CommaDelimitedEncoder::default()),
            EncoderKind::TwoByte => Box::new(TwoByteEncoder::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncoderKind::Comma => "comma",
            EncoderKind::TwoByte => "two-byte",
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comma" => Ok(EncoderKind::Comma),
            "two-byte" | "two_byte" => Ok(EncoderKind::TwoByte),
            other => Err(format!("unknown encoder '{}' (expected comma or two-byte)", other)),
        }
    }
}
