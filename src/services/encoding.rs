//! Best-effort character encoding detection for uploaded text files.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub encoding: &'static Encoding,
    pub confidence: f32,
}

impl Detection {
    pub fn label(&self) -> &'static str {
        self.encoding.name()
    }
}

#[derive(Debug, Clone, Copy)]
enum Utf16Endian {
    Little,
    Big,
}

/// Guess the encoding of `bytes`.
///
/// Returns `None` for empty input and for binary content, so callers fail
/// instead of decoding with a default.
pub fn detect(bytes: &[u8]) -> Option<Detection> {
    if bytes.is_empty() {
        return None;
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(Detection {
            encoding,
            confidence: 1.0,
        });
    }

    if let Some(endian) = sniff_utf16_without_bom(bytes) {
        let encoding = match endian {
            Utf16Endian::Little => UTF_16LE,
            Utf16Endian::Big => UTF_16BE,
        };
        return Some(Detection {
            encoding,
            confidence: 0.75,
        });
    }

    if bytes.contains(&0x00) {
        return None;
    }

    if bytes.is_ascii() {
        return Some(Detection {
            encoding: UTF_8,
            confidence: 1.0,
        });
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Some(Detection {
            encoding: UTF_8,
            confidence: 0.99,
        });
    }

    // Legacy exports from Windows tooling.
    Some(Detection {
        encoding: WINDOWS_1252,
        confidence: 0.5,
    })
}

/// Decode `bytes` with `encoding`, stripping a matching BOM.
///
/// Malformed sequences are an error rather than being replaced.
pub fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Result<Cow<'a, str>, String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(format!("malformed {} byte sequence", encoding.name()));
    }
    Ok(text)
}

/// Text that is mostly Latin script encoded as UTF-16 has a zero high byte in most
/// code units. At least 70% of units must look like that, with zeros in the other
/// position in at most 10% of them. Text dominated by other scripts (CJK, Cyrillic)
/// is not recognised without a BOM.
fn sniff_utf16_without_bom(bytes: &[u8]) -> Option<Utf16Endian> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return None;
    }

    let pairs = bytes.len() / 2;
    let (mut zero_even, mut zero_odd) = (0usize, 0usize);
    for chunk in bytes.chunks_exact(2) {
        if chunk[0] == 0x00 {
            zero_even += 1;
        }
        if chunk[1] == 0x00 {
            zero_odd += 1;
        }
    }

    if zero_odd * 10 >= pairs * 7 && zero_even * 10 <= pairs {
        return Some(Utf16Endian::Little);
    }
    if zero_even * 10 >= pairs * 7 && zero_odd * 10 <= pairs {
        return Some(Utf16Endian::Big);
    }
    None
}
