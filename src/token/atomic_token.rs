use super::CompactToken;
use crate::base::TextPosition;
use crate::html::{AttributeNamespace, LocalNameHash, Tag};
use crate::tokenizer::{DoctypeData, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub namespace: AttributeNamespace,
}

impl Attribute {
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
            namespace: AttributeNamespace::None,
        }
    }
}

/// The token shape consumed by the tree builder.
///
/// It can be produced from the tokenizer's mutable token on the
/// synchronous path or from a compact token received from the background
/// thread. Duplicate attributes are dropped on construction, the first
/// occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicToken {
    kind: TokenKind,
    name: String,
    name_hash: LocalNameHash,
    attributes: Vec<Attribute>,
    self_closing: bool,
    data: String,
    doctype: Option<DoctypeData>,
    position: TextPosition,
}

impl AtomicToken {
    fn with_kind(kind: TokenKind, position: TextPosition) -> Self {
        AtomicToken {
            kind,
            name: String::new(),
            name_hash: LocalNameHash::empty(),
            attributes: Vec::new(),
            self_closing: false,
            data: String::new(),
            doctype: None,
            position,
        }
    }

    fn tag(kind: TokenKind, name: &str, position: TextPosition) -> Self {
        let mut token = AtomicToken::with_kind(kind, position);

        token.set_name(name);

        token
    }

    /// A start tag the tree builder processes as if it was in the input.
    #[inline]
    pub fn start_tag(tag: Tag) -> Self {
        AtomicToken::tag(TokenKind::StartTag, tag.name(), TextPosition::default())
    }

    /// An end tag the tree builder processes as if it was in the input.
    #[inline]
    pub fn end_tag(tag: Tag) -> Self {
        AtomicToken::tag(TokenKind::EndTag, tag.name(), TextPosition::default())
    }

    #[inline]
    pub fn end_of_file(position: TextPosition) -> Self {
        AtomicToken::with_kind(TokenKind::EndOfFile, position)
    }

    pub fn characters(text: impl Into<String>, position: TextPosition) -> Self {
        let mut token = AtomicToken::with_kind(TokenKind::Character, position);

        token.data = text.into();

        token
    }

    fn push_attribute_if_unique(&mut self, name: &str, value: &str) {
        if self.attributes.iter().all(|attr| attr.name != name) {
            self.attributes.push(Attribute::new(name, value));
        }
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_hash(&self) -> LocalNameHash {
        self.name_hash
    }

    /// Replaces the tag name, e.g. for `<image>` or SVG case adjustments.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
        self.name_hash = LocalNameHash::from(name);
    }

    #[inline]
    pub fn is_tag(&self, tag: Tag) -> bool {
        self.name_hash == tag
    }

    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));
        &self.attributes
    }

    #[inline]
    pub fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        debug_assert!(matches!(self.kind, TokenKind::StartTag | TokenKind::EndTag));
        &mut self.attributes
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    #[inline]
    pub fn self_closing(&self) -> bool {
        self.self_closing
    }

    #[inline]
    pub fn character_data(&self) -> &str {
        debug_assert_eq!(self.kind, TokenKind::Character);
        &self.data
    }

    #[inline]
    pub(crate) fn character_data_mut(&mut self) -> &mut String {
        debug_assert_eq!(self.kind, TokenKind::Character);
        &mut self.data
    }

    #[inline]
    pub fn comment(&self) -> &str {
        debug_assert_eq!(self.kind, TokenKind::Comment);
        &self.data
    }

    #[inline]
    pub fn public_identifier(&self) -> Option<&str> {
        debug_assert_eq!(self.kind, TokenKind::Doctype);
        self.doctype.as_ref()?.public_identifier.as_deref()
    }

    #[inline]
    pub fn system_identifier(&self) -> Option<&str> {
        debug_assert_eq!(self.kind, TokenKind::Doctype);
        self.doctype.as_ref()?.system_identifier.as_deref()
    }

    #[inline]
    pub fn force_quirks(&self) -> bool {
        debug_assert_eq!(self.kind, TokenKind::Doctype);
        self.doctype.as_ref().is_some_and(|d| d.force_quirks)
    }

    #[inline]
    pub fn position(&self) -> TextPosition {
        self.position
    }
}

impl From<&Token> for AtomicToken {
    fn from(token: &Token) -> Self {
        let kind = token.kind();
        let mut atomic = AtomicToken::with_kind(kind, token.position());

        match kind {
            TokenKind::StartTag | TokenKind::EndTag => {
                atomic.set_name(token.name());
                atomic.self_closing = token.self_closing();
                atomic.attributes = token
                    .unique_attributes()
                    .map(|attr| Attribute::new(attr.name.as_str(), attr.value.as_str()))
                    .collect();
            }
            TokenKind::Doctype => {
                atomic.set_name(token.name());
                atomic.doctype = token.doctype_data().cloned();
            }
            TokenKind::Comment => atomic.data.push_str(token.comment()),
            TokenKind::Character => atomic.data.push_str(token.characters()),
            TokenKind::EndOfFile | TokenKind::Uninitialized => (),
        }

        atomic
    }
}

impl From<&CompactToken> for AtomicToken {
    fn from(token: &CompactToken) -> Self {
        let kind = token.kind();
        let mut atomic = AtomicToken::with_kind(kind, token.position());

        match kind {
            TokenKind::StartTag | TokenKind::EndTag => {
                atomic.set_name(token.data());
                atomic.self_closing = token.self_closing();

                for attr in token.attributes() {
                    atomic.push_attribute_if_unique(attr.name.as_str(), &attr.value);
                }
            }
            TokenKind::Doctype => {
                atomic.set_name(token.data());
                atomic.doctype = Some(DoctypeData {
                    public_identifier: token.public_identifier().map(str::to_string),
                    system_identifier: token.system_identifier().map(str::to_string),
                    force_quirks: token.force_quirks(),
                });
            }
            TokenKind::Comment | TokenKind::Character => atomic.data.push_str(token.data()),
            TokenKind::EndOfFile | TokenKind::Uninitialized => (),
        }

        atomic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SegmentedString;
    use crate::tokenizer::Tokenizer;

    fn both_ways(html: &str) -> Vec<(AtomicToken, AtomicToken)> {
        let mut tokenizer = Tokenizer::default();
        let mut input = SegmentedString::new(html);
        let mut token = Token::default();
        let mut pairs = Vec::new();

        input.close();

        while tokenizer.next_token(&mut input, &mut token) {
            let compact = CompactToken::new(&token, token.position());

            pairs.push((AtomicToken::from(&token), AtomicToken::from(&compact)));

            if token.kind() == TokenKind::StartTag {
                tokenizer.update_state_for(token.name());
            }

            token.clear();
        }

        pairs
    }

    #[test]
    fn compact_and_direct_conversions_agree() {
        let html = "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\">\
                    <!doctype><!DOCTYPE x SYSTEM ''>\
                    <svg viewBox='0 0 1 1'/><a href=x id=1 href=y>t\u{2603}xt</a>\
                    <!-- comment --><title>a<b</title><custom-el data-x></custom-el>";

        for (direct, via_compact) in both_ways(html) {
            assert_eq!(direct, via_compact);
        }
    }

    #[test]
    fn duplicate_attributes_are_dropped() {
        let pairs = both_ways("<a href=x id=1 href=y>");
        let (token, _) = &pairs[0];

        assert_eq!(token.attributes().len(), 2);
        assert_eq!(token.get_attribute("href"), Some("x"));
        assert_eq!(token.get_attribute("id"), Some("1"));
    }

    #[test]
    fn fake_tags() {
        let p = AtomicToken::end_tag(Tag::P);

        assert_eq!(p.kind(), TokenKind::EndTag);
        assert_eq!(p.name(), "p");
        assert!(p.is_tag(Tag::P));
        assert!(p.attributes().is_empty());

        let mut image = AtomicToken::start_tag(Tag::Image);

        image.set_name("img");
        assert!(image.is_tag(Tag::Img));
    }
}
