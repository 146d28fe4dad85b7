use encoding_rs::Encoding;
use memchr::memchr;
use std::char::{decode_utf16, REPLACEMENT_CHARACTER};

#[inline]
fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    let hi = char::from(hi).to_digit(16)?;
    let lo = char::from(lo).to_digit(16)?;

    u8::try_from(hi << 4 | lo).ok()
}

fn hex_u16(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &b| {
        let digit = char::from(b).to_digit(16)?;

        u16::try_from(digit).ok().map(|digit| acc << 4 | digit)
    })
}

/// Decodes runs of `%XX` escapes as bytes in the given encoding. Runs that
/// are malformed in the encoding are left as they are.
pub fn decode_url_escapes(input: &str, encoding: &'static Encoding) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;

    while idx < bytes.len() {
        let Some(pos) = memchr(b'%', &bytes[idx..]) else {
            out.push_str(&input[idx..]);
            break;
        };

        out.push_str(&input[idx..idx + pos]);
        idx += pos;

        let run_start = idx;
        let mut decoded = Vec::new();

        while idx + 2 < bytes.len() && bytes[idx] == b'%' {
            match hex_byte(bytes[idx + 1], bytes[idx + 2]) {
                Some(byte) => {
                    decoded.push(byte);
                    idx += 3;
                }
                None => break,
            }
        }

        if decoded.is_empty() {
            out.push('%');
            idx += 1;
            continue;
        }

        match encoding.decode_without_bom_handling_and_without_replacement(&decoded) {
            Some(text) => out.push_str(&text),
            None => out.push_str(&input[run_start..idx]),
        }
    }

    out
}

/// Decodes runs of `%uXXXX` escapes as UTF-16 code units.
pub fn decode_unicode_escapes(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;

    while idx < bytes.len() {
        let Some(pos) = memchr(b'%', &bytes[idx..]) else {
            out.push_str(&input[idx..]);
            break;
        };

        out.push_str(&input[idx..idx + pos]);
        idx += pos;

        let mut units = Vec::new();

        while idx + 5 < bytes.len() && bytes[idx] == b'%' && matches!(bytes[idx + 1], b'u' | b'U')
        {
            match hex_u16(&bytes[idx + 2..idx + 6]) {
                Some(unit) => {
                    units.push(unit);
                    idx += 6;
                }
                None => break,
            }
        }

        if units.is_empty() {
            out.push('%');
            idx += 1;
            continue;
        }

        out.extend(decode_utf16(units).map(|r| r.unwrap_or(REPLACEMENT_CHARACTER)));
    }

    out
}

/// Removes the characters that can't take part in an injection or that
/// the server might have stripped or added on the way: backslashes, NULs,
/// zeros and everything outside of printable ASCII.
pub fn canonicalize(input: &str) -> String {
    input
        .chars()
        .filter(|&ch| !matches!(ch, '\\' | '0' | '\0') && ch < '\x7F')
        .collect()
}

/// Decodes the string until it stops shrinking, then canonicalizes it.
pub fn fully_decode(input: &str, encoding: &'static Encoding) -> String {
    let mut working = input.to_string();

    loop {
        let decoded = decode_unicode_escapes(&decode_url_escapes(&working, encoding));
        let shrunk = decoded.chars().count() < working.chars().count();

        working = decoded;

        if !shrunk {
            break;
        }
    }

    canonicalize(&working.replace('+', " "))
}
