//! HTML tokenizer.
//!
//! The tokenizer is a resumable character state machine: `next_token`
//! consumes as much of the input as it needs to complete one token and
//! returns `false` if the input runs out first. All the state required to
//! continue lives in the `Tokenizer` itself and in the in-progress `Token`,
//! so both can be cloned to checkpoint the tokenization and handed over to
//! another thread.

mod char_ref;
mod state;
mod state_machine;
mod token;

use crate::base::TextPosition;
use crate::html::{LocalNameHash, Tag, TextType};
use crate::input::SegmentedString;
use std::mem;

pub use self::state::TokenizerState;
pub use self::token::{DoctypeData, Token, TokenAttribute, TokenKind};

#[derive(Debug, Copy, Clone, Default)]
struct SourceMark {
    len: usize,
    position: TextPosition,
    offset: usize,
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    state: TokenizerState,
    scripting_enabled: bool,
    skip_next_newline: bool,
    force_null_character_replacement: bool,
    should_allow_cdata: bool,
    additional_allowed_character: Option<char>,
    temporary_buffer: String,
    buffered_end_tag_name: String,
    appropriate_end_tag_name: String,
    source: String,
    source_start: SourceMark,
    end_tag_start: SourceMark,
    reached_end: bool,
}

impl Default for Tokenizer {
    #[inline]
    fn default() -> Self {
        Tokenizer::new(true)
    }
}

impl Tokenizer {
    pub fn new(scripting_enabled: bool) -> Self {
        Tokenizer {
            state: TokenizerState::Data,
            scripting_enabled,
            skip_next_newline: false,
            force_null_character_replacement: false,
            should_allow_cdata: false,
            additional_allowed_character: None,
            temporary_buffer: String::new(),
            buffered_end_tag_name: String::new(),
            appropriate_end_tag_name: String::new(),
            source: String::new(),
            source_start: SourceMark::default(),
            end_tag_start: SourceMark::default(),
            reached_end: false,
        }
    }

    #[inline]
    pub fn state(&self) -> TokenizerState {
        self.state
    }

    #[inline]
    pub fn set_state(&mut self, state: TokenizerState) {
        trace!(@state self.state => state);

        self.state = state;
    }

    #[inline]
    pub fn switch_text_type(&mut self, text_type: TextType) {
        self.set_state(text_type.into());
    }

    #[inline]
    pub fn force_null_character_replacement(&self) -> bool {
        self.force_null_character_replacement
    }

    #[inline]
    pub fn set_force_null_character_replacement(&mut self, value: bool) {
        self.force_null_character_replacement = value;
    }

    #[inline]
    pub fn should_allow_cdata(&self) -> bool {
        self.should_allow_cdata
    }

    #[inline]
    pub fn set_should_allow_cdata(&mut self, value: bool) {
        self.should_allow_cdata = value;
    }

    /// Sets the name an end tag must have to leave the RCDATA, RAWTEXT or
    /// script data states. Normally it's the name of the last emitted start tag.
    pub fn set_appropriate_end_tag_name(&mut self, name: &str) {
        self.appropriate_end_tag_name.clear();
        self.appropriate_end_tag_name.push_str(name);
    }

    /// `true` once the end of file token has been produced.
    #[inline]
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    /// Switches to the text state a start tag in the HTML namespace
    /// implies for its content.
    pub fn update_state_for(&mut self, tag_name: &str) {
        let hash = LocalNameHash::from(tag_name);

        if tag_is_one_of!(hash, [Textarea, Title]) {
            self.set_state(TokenizerState::RcData);
        } else if hash == Tag::Plaintext {
            self.set_state(TokenizerState::PlainText);
        } else if hash == Tag::Script {
            self.set_state(TokenizerState::ScriptData);
        } else if tag_is_one_of!(hash, [Style, Iframe, Xmp, Noembed, Noframes])
            || (hash == Tag::Noscript && self.scripting_enabled)
        {
            self.set_state(TokenizerState::RawText);
        }
    }

    /// `true` if no input has been consumed past the last emitted token, so
    /// the tokenizer can be cloned together with the input position.
    #[inline]
    pub(crate) fn is_at_token_boundary(&self) -> bool {
        self.source.is_empty() && self.buffered_end_tag_name.is_empty() && !self.skip_next_newline
    }

    #[inline]
    pub(crate) fn should_skip_null_characters(&self) -> bool {
        !self.force_null_character_replacement
            && matches!(
                self.state,
                TokenizerState::Data | TokenizerState::RcData | TokenizerState::RawText
            )
    }

    /// Returns the next input character after newline normalization and
    /// NUL handling without consuming it.
    fn peek(&mut self, input: &mut SegmentedString) -> Option<char> {
        loop {
            let ch = input.current_char()?;

            match ch {
                '\n' if self.skip_next_newline => {
                    self.skip_next_newline = false;
                    input.advance();
                }
                '\r' => {
                    self.skip_next_newline = true;
                    return Some('\n');
                }
                '\0' if self.should_skip_null_characters() => {
                    self.skip_next_newline = false;
                    input.advance();
                }
                '\0' => {
                    self.skip_next_newline = false;
                    return Some('\u{FFFD}');
                }
                _ => {
                    self.skip_next_newline = false;
                    return Some(ch);
                }
            }
        }
    }

    #[inline]
    fn start_source_if_empty(&mut self, input: &SegmentedString) {
        if self.source.is_empty() {
            self.source_start = SourceMark {
                len: 0,
                position: input.position(),
                offset: input.offset(),
            };
        }
    }

    /// Consumes the current input character. `ch` is the character
    /// returned by `peek` for it.
    #[inline]
    fn consume(&mut self, input: &mut SegmentedString, ch: char) {
        self.start_source_if_empty(input);
        self.source.push(ch);
        input.advance();
    }

    fn consume_raw(&mut self, input: &mut SegmentedString, count: usize) {
        for _ in 0..count {
            match input.current_char() {
                Some(ch) => self.consume(input, ch),
                None => break,
            }
        }
    }

    #[inline]
    fn advance_to(&mut self, input: &mut SegmentedString, ch: char, state: TokenizerState) {
        self.consume(input, ch);
        self.set_state(state);
    }

    /// Remembers where a possible end tag starts in the token source, so a
    /// character token flushed in front of it doesn't include its markup.
    #[inline]
    fn mark_end_tag_start(&mut self, input: &SegmentedString) {
        self.start_source_if_empty(input);

        self.end_tag_start = SourceMark {
            len: self.source.len(),
            position: input.position(),
            offset: input.offset(),
        };
    }

    #[inline]
    fn source_offset(&self) -> usize {
        self.source.len()
    }

    fn emit(&mut self, input: &SegmentedString, token: &mut Token) -> bool {
        self.start_source_if_empty(input);

        let flushed_before_end_tag =
            token.kind() == TokenKind::Character && !self.buffered_end_tag_name.is_empty();

        let rest = if flushed_before_end_tag && self.end_tag_start.len <= self.source.len() {
            self.source.split_off(self.end_tag_start.len)
        } else {
            String::new()
        };

        let source = mem::replace(&mut self.source, rest);

        token.set_source(source, self.source_start.position, self.source_start.offset);

        if flushed_before_end_tag {
            self.source_start = SourceMark {
                len: 0,
                ..self.end_tag_start
            };
        }

        trace!(@token token);

        true
    }

    #[inline]
    fn save_end_tag_name_if_needed(&mut self, token: &Token) {
        if token.kind() == TokenKind::StartTag {
            self.set_appropriate_end_tag_name(token.name());
        }
    }

    fn emit_and_resume_in(
        &mut self,
        input: &mut SegmentedString,
        ch: char,
        token: &mut Token,
        state: TokenizerState,
    ) -> bool {
        self.save_end_tag_name_if_needed(token);
        self.advance_to(input, ch, state);
        self.emit(input, token)
    }

    fn emit_and_reconsume_in(
        &mut self,
        input: &SegmentedString,
        token: &mut Token,
        state: TokenizerState,
    ) -> bool {
        self.save_end_tag_name_if_needed(token);
        self.set_state(state);
        self.emit(input, token)
    }

    fn emit_end_of_file(&mut self, input: &SegmentedString, token: &mut Token) -> bool {
        if token.kind() == TokenKind::Character {
            return self.emit(input, token);
        }

        self.set_state(TokenizerState::Data);

        // NOTE: an unfinished tag, if any, is dropped at the end of input.
        token.clear();
        token.make_end_of_file();
        self.source.clear();
        self.reached_end = true;

        self.emit(input, token)
    }

    /// Drops the markup of a construct that doesn't produce a token.
    #[inline]
    fn discard_source(&mut self, token: &Token) {
        if token.is_uninitialized() {
            self.source.clear();
        }
    }

    #[inline]
    fn add_to_possible_end_tag(&mut self, ch: char) {
        self.buffered_end_tag_name.push(ch.to_ascii_lowercase());
    }

    #[inline]
    fn is_appropriate_end_tag(&self) -> bool {
        self.buffered_end_tag_name == self.appropriate_end_tag_name
    }

    fn begin_buffered_end_tag(&mut self, token: &mut Token) {
        token.begin_end_tag(&self.buffered_end_tag_name);
        self.buffered_end_tag_name.clear();
        self.appropriate_end_tag_name.clear();
        self.temporary_buffer.clear();
    }

    /// Consumes the character that completes an appropriate end tag. Returns
    /// `true` if the pending character token must be emitted first.
    fn flush_buffered_end_tag(
        &mut self,
        input: &mut SegmentedString,
        ch: char,
        token: &mut Token,
    ) -> bool {
        self.consume(input, ch);

        if token.kind() == TokenKind::Character {
            return true;
        }

        self.begin_buffered_end_tag(token);

        false
    }

    /// Gives up on a possible end tag and turns its markup into text.
    fn abandon_possible_end_tag(&mut self, token: &mut Token) {
        token.append_to_character('<');
        token.append_to_character('/');
        token.append_str_to_character(&self.temporary_buffer);
        self.buffered_end_tag_name.clear();
        self.temporary_buffer.clear();
    }
}

#[cfg(test)]
mod tests;
