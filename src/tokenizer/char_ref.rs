use crate::html::EntitySearch;
use encoding_rs::WINDOWS_1252;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CharRefResult {
    /// The input ends before the reference can be resolved.
    NotEnoughCharacters,
    /// Not a character reference, the `&` is literal text.
    NotFound,
    /// `consumed` characters after the `&` form a reference to `value`.
    Found { consumed: usize, value: char },
}

#[inline]
fn is_unresolved(is_closed: bool) -> CharRefResult {
    if is_closed {
        CharRefResult::NotFound
    } else {
        CharRefResult::NotEnoughCharacters
    }
}

fn code_point_to_char(code_point: u32) -> char {
    match code_point {
        // NOTE: C1 controls are interpreted as Windows-1252 bytes,
        // which is what the legacy numeric references meant.
        0x80..=0x9F => {
            let bytes = [code_point as u8];
            let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);

            decoded.chars().next().unwrap_or('\u{FFFD}')
        }
        0 => '\u{FFFD}',
        _ => char::from_u32(code_point).unwrap_or('\u{FFFD}'),
    }
}

fn consume_numeric(mut chars: impl Iterator<Item = char>, is_closed: bool) -> CharRefResult {
    // NOTE: `#` has been consumed already.
    let mut consumed = 1;
    let mut first = chars.next();

    let radix = match first {
        Some('x' | 'X') => {
            consumed += 1;
            first = chars.next();
            16
        }
        _ => 10,
    };

    let mut code_point: u32 = 0;
    let mut digit_count = 0;
    let mut next = first;

    while let Some(digit) = next.and_then(|ch| ch.to_digit(radix)) {
        // NOTE: saturate above the Unicode range, the value is
        // replaced with U+FFFD anyway.
        code_point = code_point
            .saturating_mul(radix)
            .saturating_add(digit)
            .min(0x11_0000);
        digit_count += 1;
        next = chars.next();
    }

    match next {
        None if !is_closed => CharRefResult::NotEnoughCharacters,
        _ if digit_count == 0 => CharRefResult::NotFound,
        next => {
            consumed += digit_count;

            if next == Some(';') {
                consumed += 1;
            }

            CharRefResult::Found {
                consumed,
                value: code_point_to_char(code_point),
            }
        }
    }
}

fn consume_named(
    chars: impl Iterator<Item = char>,
    is_closed: bool,
    in_attribute_value: bool,
) -> CharRefResult {
    let mut search = EntitySearch::default();
    let mut looked_at = 0;
    let mut next_after_match = None;
    let mut ran_out = true;

    for ch in chars {
        if !search.advance(ch) {
            next_after_match = Some(ch);
            ran_out = false;
            break;
        }

        looked_at += 1;
    }

    if ran_out && !is_closed {
        return CharRefResult::NotEnoughCharacters;
    }

    let Some((name, value)) = search.most_recent_match() else {
        return CharRefResult::NotFound;
    };

    let consumed = name.len();

    if !name.ends_with(';') && in_attribute_value {
        // NOTE: in attribute values a legacy reference without semicolon
        // followed by `=` or an alphanumeric character is literal text.
        let followed_by_name_character = consumed < looked_at
            || next_after_match.is_some_and(|ch| ch == '=' || ch.is_ascii_alphanumeric());

        if followed_by_name_character {
            return CharRefResult::NotFound;
        }
    }

    CharRefResult::Found { consumed, value }
}

/// Resolves the character reference following an already consumed `&`.
///
/// `chars` yields the input after the `&` without consuming it. Nothing is
/// consumed unless `Found` is returned.
pub fn consume_char_ref(
    chars: impl Iterator<Item = char>,
    is_closed: bool,
    additional_allowed_character: Option<char>,
) -> CharRefResult {
    let mut chars = chars.peekable();

    match chars.peek().copied() {
        None => is_unresolved(is_closed),
        Some('\t' | '\n' | '\x0C' | ' ' | '<' | '&') => CharRefResult::NotFound,
        Some(ch) if Some(ch) == additional_allowed_character => CharRefResult::NotFound,
        Some('#') => {
            chars.next();
            consume_numeric(chars, is_closed)
        }
        Some(_) => consume_named(chars, is_closed, additional_allowed_character.is_some()),
    }
}
