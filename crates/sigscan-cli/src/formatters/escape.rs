//! Display encoding for matched bytes.

use std::fmt::Write;

/// Render raw bytes for display on one line.
///
/// Follows quoted-printable with `\x` in place of `=`: printable ASCII and tab
/// are kept literally, while `=` and every other byte become `\xHH`. Unlike
/// quoted-printable, line breaks are escaped too and long output is never
/// wrapped, so each match stays on one line.
pub fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &byte in data {
        match byte {
            b'=' => push_hex(&mut out, byte),
            b'\t' | 0x20..=0x7E => out.push(byte as char),
            _ => push_hex(&mut out, byte),
        }
    }
    out
}

fn push_hex(out: &mut String, byte: u8) {
    // Writing to a String cannot fail
    let _ = write!(out, "\\x{:02X}", byte);
}
