use crate::base::TextPosition;
use memchr::{memchr, memchr3, memchr_iter, memrchr};
use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LookAheadResult {
    Match,
    NotEnoughCharacters,
    DidNotMatch,
}

#[derive(Debug, Clone)]
struct Segment {
    text: Arc<str>,
    pos: usize,
}

impl Segment {
    #[inline]
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }
}

/// A queue of text segments consumed one character at a time.
///
/// Segments are shared (`Arc<str>`), so cloning the string for a checkpoint
/// doesn't copy any text. Invariant: every queued segment has at least one
/// unconsumed character.
#[derive(Debug, Clone, Default)]
pub struct SegmentedString {
    segments: VecDeque<Segment>,
    closed: bool,
    offset: usize,
    line: usize,
    column: usize,
}

impl SegmentedString {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let mut string = SegmentedString::default();

        string.append(text);

        string
    }

    pub fn append(&mut self, text: impl Into<Arc<str>>) {
        debug_assert!(!self.closed, "Attempt to append to a closed input stream");

        let text = text.into();

        if !text.is_empty() {
            self.segments.push_back(Segment { text, pos: 0 });
        }
    }

    /// Appends the unconsumed part of another string.
    pub fn append_segmented(&mut self, other: &SegmentedString) {
        debug_assert!(!self.closed, "Attempt to append to a closed input stream");

        self.segments.extend(other.segments.iter().cloned());
    }

    /// Inserts the unconsumed part of another string in front of the
    /// current position. Position tracking isn't affected.
    pub fn prepend(&mut self, other: SegmentedString) {
        for segment in other.segments.into_iter().rev() {
            self.segments.push_front(segment);
        }
    }

    #[inline]
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.text.len() - s.pos).sum()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.closed = false;
    }

    #[inline]
    pub fn current_char(&self) -> Option<char> {
        self.segments.front().and_then(|s| s.rest().chars().next())
    }

    #[inline]
    pub fn position(&self) -> TextPosition {
        TextPosition::new(self.line, self.column)
    }

    /// Number of characters consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn advance(&mut self) {
        let Some(segment) = self.segments.front_mut() else {
            return;
        };

        if let Some(ch) = segment.rest().chars().next() {
            segment.pos += ch.len_utf8();
            self.offset += 1;

            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }

        if segment.pos == segment.text.len() {
            self.segments.pop_front();
        }
    }

    /// Returns the longest prefix of the current segment which doesn't
    /// contain `a`, `b`, CR or NUL.
    #[inline]
    pub fn text_run(&self, a: u8, b: u8) -> &str {
        let Some(segment) = self.segments.front() else {
            return "";
        };

        let rest = segment.rest();
        let bytes = rest.as_bytes();
        let end = memchr3(a, b, b'\r', bytes).unwrap_or(bytes.len());
        let end = memchr(0, &bytes[..end]).unwrap_or(end);

        // NOTE: all the stop bytes are ASCII, so `end` is always
        // on a character boundary.
        &rest[..end]
    }

    /// Consumes `len` bytes of the current segment previously returned by `text_run`.
    pub fn advance_run(&mut self, len: usize) {
        let Some(segment) = self.segments.front_mut() else {
            return;
        };

        let run = &segment.text[segment.pos..segment.pos + len];
        let newlines = memchr_iter(b'\n', run.as_bytes()).count();

        self.offset += run.chars().count();

        if newlines > 0 {
            let last_newline = memrchr(b'\n', run.as_bytes()).unwrap_or(0);

            self.line += newlines;
            self.column = run[last_newline + 1..].chars().count();
        } else {
            self.column += run.chars().count();
        }

        segment.pos += len;

        if segment.pos == segment.text.len() {
            self.segments.pop_front();
        }
    }

    /// Iterates over the unconsumed characters without consuming them.
    #[inline]
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.segments.iter().flat_map(|s| s.rest().chars())
    }

    pub fn look_ahead(&self, expected: &str, ignore_case: bool) -> LookAheadResult {
        let mut actual = self.chars();

        for expected_ch in expected.chars() {
            match actual.next() {
                Some(ch) if ch == expected_ch => (),
                Some(ch) if ignore_case && ch.eq_ignore_ascii_case(&expected_ch) => (),
                Some(_) => return LookAheadResult::DidNotMatch,
                None => return LookAheadResult::NotEnoughCharacters,
            }
        }

        LookAheadResult::Match
    }

    #[inline]
    pub fn look_ahead_ignoring_case(&self, expected: &str) -> LookAheadResult {
        self.look_ahead(expected, true)
    }
}

impl Display for SegmentedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(segment.rest())?;
        }

        Ok(())
    }
}

impl From<&str> for SegmentedString {
    #[inline]
    fn from(text: &str) -> Self {
        SegmentedString::new(text)
    }
}
