use crate::base::{Range, TextPosition};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TokenKind {
    #[default]
    Uninitialized,
    Doctype,
    StartTag,
    EndTag,
    Comment,
    Character,
    EndOfFile,
}

/// An attribute of the in-progress tag token. Ranges are byte offsets in
/// the token's source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAttribute {
    pub name: String,
    pub value: String,
    pub name_range: Range,
    pub value_range: Range,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeData {
    pub public_identifier: Option<String>,
    pub system_identifier: Option<String>,
    pub force_quirks: bool,
}

/// The mutable token buffer filled in by the tokenizer character by character.
///
/// A token is consumed exactly once and then `clear`ed for reuse. The
/// character data of `Character` tokens is owned by the buffer, so consumers
/// that need it past the next `clear` must copy it.
#[derive(Debug, Clone, Default)]
pub struct Token {
    kind: TokenKind,
    data: String,
    or_all_data: u32,
    self_closing: bool,
    attributes: Vec<TokenAttribute>,
    doctype: Option<Box<DoctypeData>>,
    source: String,
    position: TextPosition,
    start_offset: usize,
}

impl Token {
    pub fn clear(&mut self) {
        self.kind = TokenKind::Uninitialized;
        self.data.clear();
        self.or_all_data = 0;
        self.self_closing = false;
        self.attributes.clear();
        self.doctype = None;
        self.source.clear();
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn is_uninitialized(&self) -> bool {
        self.kind == TokenKind::Uninitialized
    }

    /// Raw markup the token was produced from.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Position of the first character of the token's markup.
    #[inline]
    pub fn position(&self) -> TextPosition {
        self.position
    }

    /// Offset (in characters) of the first character of the token's markup.
    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// `true` if every character of the name or data fits in a single byte.
    #[inline]
    pub fn is_all_8bit(&self) -> bool {
        self.or_all_data <= 0xFF
    }

    pub(crate) fn set_source(&mut self, source: String, position: TextPosition, offset: usize) {
        self.source = source;
        self.position = position;
        self.start_offset = offset;
    }

    #[inline]
    fn append_to_data(&mut self, ch: char) {
        self.or_all_data |= u32::from(ch);
        self.data.push(ch);
    }

    // Start and end tags
    pub fn begin_start_tag(&mut self, ch: char) {
        debug_assert!(self.is_uninitialized());
        self.kind = TokenKind::StartTag;
        self.append_to_data(ch);
    }

    pub fn begin_end_tag(&mut self, name: &str) {
        debug_assert!(self.is_uninitialized());
        self.kind = TokenKind::EndTag;

        for ch in name.chars() {
            self.append_to_data(ch);
        }
    }

    #[inline]
    pub fn append_to_name(&mut self, ch: char) {
        debug_assert!(matches!(
            self.kind,
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::Doctype
        ));
        self.append_to_data(ch);
    }

    /// Tag or doctype name.
    #[inline]
    pub fn name(&self) -> &str {
        debug_assert!(matches!(
            self.kind,
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::Doctype
        ));
        &self.data
    }

    #[inline]
    pub fn self_closing(&self) -> bool {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));
        self.self_closing
    }

    #[inline]
    pub fn set_self_closing(&mut self) {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));
        self.self_closing = true;
    }

    #[inline]
    pub fn attributes(&self) -> &[TokenAttribute] {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));
        &self.attributes
    }

    #[inline]
    pub(crate) fn attributes_mut(&mut self) -> &mut [TokenAttribute] {
        &mut self.attributes
    }

    /// Attributes without later duplicates of the same name.
    pub fn unique_attributes(&self) -> impl Iterator<Item = &TokenAttribute> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(idx, attr)| !self.attributes[..*idx].iter().any(|a| a.name == attr.name))
            .map(|(_, attr)| attr)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&TokenAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn begin_attribute(&mut self, ch: char, offset: usize) {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));

        self.attributes.push(TokenAttribute {
            name: ch.to_string(),
            name_range: Range::new(offset, offset),
            ..TokenAttribute::default()
        });
    }

    #[inline]
    pub fn append_to_attribute_name(&mut self, ch: char) {
        if let Some(attr) = self.attributes.last_mut() {
            attr.name.push(ch);
        }
    }

    #[inline]
    pub fn end_attribute_name(&mut self, offset: usize) {
        if let Some(attr) = self.attributes.last_mut() {
            attr.name_range.end = offset;
            attr.value_range = Range::new(offset, offset);
        }
    }

    #[inline]
    pub fn begin_attribute_value(&mut self, offset: usize) {
        if let Some(attr) = self.attributes.last_mut() {
            attr.value_range = Range::new(offset, offset);
        }
    }

    #[inline]
    pub fn append_to_attribute_value(&mut self, ch: char) {
        if let Some(attr) = self.attributes.last_mut() {
            attr.value.push(ch);
        }
    }

    #[inline]
    pub fn end_attribute_value(&mut self, offset: usize) {
        if let Some(attr) = self.attributes.last_mut() {
            attr.value_range.end = offset;
        }
    }

    // Characters
    #[inline]
    pub fn ensure_is_character_token(&mut self) {
        debug_assert!(matches!(
            self.kind,
            TokenKind::Uninitialized | TokenKind::Character
        ));
        self.kind = TokenKind::Character;
    }

    #[inline]
    pub fn append_to_character(&mut self, ch: char) {
        self.ensure_is_character_token();
        self.append_to_data(ch);
    }

    pub fn append_str_to_character(&mut self, text: &str) {
        self.ensure_is_character_token();

        for ch in text.chars() {
            self.or_all_data |= u32::from(ch);
        }

        self.data.push_str(text);
    }

    /// Replaces the character data, used to neuter filtered content.
    pub(crate) fn replace_characters(&mut self, text: &str) {
        debug_assert_eq!(self.kind, TokenKind::Character);
        self.data.clear();
        self.or_all_data = 0;
        self.append_str_to_character(text);
    }

    #[inline]
    pub fn characters(&self) -> &str {
        debug_assert_eq!(self.kind, TokenKind::Character);
        &self.data
    }

    // Comments
    #[inline]
    pub fn begin_comment(&mut self) {
        debug_assert!(self.is_uninitialized());
        self.kind = TokenKind::Comment;
    }

    #[inline]
    pub fn append_to_comment(&mut self, ch: char) {
        debug_assert_eq!(self.kind, TokenKind::Comment);
        self.append_to_data(ch);
    }

    #[inline]
    pub fn comment(&self) -> &str {
        debug_assert_eq!(self.kind, TokenKind::Comment);
        &self.data
    }

    // Doctype
    pub fn begin_doctype(&mut self) {
        debug_assert!(self.is_uninitialized());
        self.kind = TokenKind::Doctype;
        self.doctype = Some(Box::default());
    }

    pub fn begin_doctype_with_name(&mut self, ch: char) {
        self.begin_doctype();
        self.append_to_data(ch);
    }

    #[inline]
    fn doctype_mut(&mut self) -> &mut DoctypeData {
        debug_assert_eq!(self.kind, TokenKind::Doctype);
        self.doctype.get_or_insert_with(Box::default)
    }

    #[inline]
    pub fn doctype_data(&self) -> Option<&DoctypeData> {
        debug_assert_eq!(self.kind, TokenKind::Doctype);
        self.doctype.as_deref()
    }

    #[inline]
    pub fn set_force_quirks(&mut self) {
        self.doctype_mut().force_quirks = true;
    }

    #[inline]
    pub fn force_quirks(&self) -> bool {
        self.doctype_data().is_some_and(|d| d.force_quirks)
    }

    #[inline]
    pub fn set_public_identifier_to_empty(&mut self) {
        self.doctype_mut().public_identifier = Some(String::new());
    }

    #[inline]
    pub fn set_system_identifier_to_empty(&mut self) {
        self.doctype_mut().system_identifier = Some(String::new());
    }

    #[inline]
    pub fn append_to_public_identifier(&mut self, ch: char) {
        self.doctype_mut()
            .public_identifier
            .get_or_insert_with(String::new)
            .push(ch);
    }

    #[inline]
    pub fn append_to_system_identifier(&mut self, ch: char) {
        self.doctype_mut()
            .system_identifier
            .get_or_insert_with(String::new)
            .push(ch);
    }

    #[inline]
    pub fn public_identifier(&self) -> Option<&str> {
        self.doctype_data()?.public_identifier.as_deref()
    }

    #[inline]
    pub fn system_identifier(&self) -> Option<&str> {
        self.doctype_data()?.system_identifier.as_deref()
    }

    // End of file
    #[inline]
    pub fn make_end_of_file(&mut self) {
        debug_assert!(self.is_uninitialized());
        self.kind = TokenKind::EndOfFile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_8bit_data() {
        let mut token = Token::default();

        token.append_str_to_character("caf\u{E9}");
        assert!(token.is_all_8bit());

        token.append_to_character('\u{2603}');
        assert!(!token.is_all_8bit());

        token.clear();
        assert!(token.is_uninitialized());
        assert!(token.is_all_8bit());
    }

    #[test]
    fn later_duplicate_attributes_are_skipped() {
        let mut token = Token::default();

        token.begin_start_tag('a');

        for (name, value) in [("id", "1"), ("href", "x"), ("id", "2")] {
            let mut chars = name.chars();

            token.begin_attribute(chars.next().unwrap(), 0);
            chars.for_each(|ch| token.append_to_attribute_name(ch));
            value.chars().for_each(|ch| token.append_to_attribute_value(ch));
        }

        let unique: Vec<_> = token
            .unique_attributes()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();

        assert_eq!(unique, [("id", "1"), ("href", "x")]);
    }
}
