use crate::base::TextPosition;
use crate::html::Identifier;
use crate::tokenizer::{Token, TokenKind};
use bitflags::bitflags;

bitflags! {
    /// Token kind in the low bits plus per-token flags.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    struct Header: u8 {
        const KIND = 0b0000_0111;
        const SELF_CLOSING = 1 << 3;
        const ALL_8BIT = 1 << 4;
        const FORCE_QUIRKS = 1 << 5;
        const HAS_PUBLIC_IDENTIFIER = 1 << 6;
        const HAS_SYSTEM_IDENTIFIER = 1 << 7;
    }
}

#[inline]
fn encode_kind(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Uninitialized => 0,
        TokenKind::Doctype => 1,
        TokenKind::StartTag => 2,
        TokenKind::EndTag => 3,
        TokenKind::Comment => 4,
        TokenKind::Character => 5,
        TokenKind::EndOfFile => 6,
    }
}

#[inline]
fn decode_kind(bits: u8) -> TokenKind {
    match bits {
        1 => TokenKind::Doctype,
        2 => TokenKind::StartTag,
        3 => TokenKind::EndTag,
        4 => TokenKind::Comment,
        5 => TokenKind::Character,
        6 => TokenKind::EndOfFile,
        _ => TokenKind::Uninitialized,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactAttribute {
    pub name: Identifier,
    pub value: Box<str>,
}

/// An immutable snapshot of a token produced by the background tokenizer.
///
/// Every field is owned, so chunks of compact tokens can be moved to the
/// consumer thread as is. For doctypes the public and system identifiers are
/// stored as the name and value of the only attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactToken {
    header: Header,
    data: Identifier,
    attributes: Vec<CompactAttribute>,
    position: TextPosition,
}

impl CompactToken {
    pub fn new(token: &Token, position: TextPosition) -> Self {
        let kind = token.kind();
        let mut header = Header::from_bits_retain(encode_kind(kind));
        let mut attributes = Vec::new();

        if token.is_all_8bit() {
            header |= Header::ALL_8BIT;
        }

        let data = match kind {
            TokenKind::StartTag | TokenKind::EndTag => {
                if token.self_closing() {
                    header |= Header::SELF_CLOSING;
                }

                attributes.extend(token.attributes().iter().map(|attr| CompactAttribute {
                    name: Identifier::new(&attr.name),
                    value: attr.value.as_str().into(),
                }));

                Identifier::new(token.name())
            }
            TokenKind::Doctype => {
                if token.force_quirks() {
                    header |= Header::FORCE_QUIRKS;
                }

                let public_identifier = token.public_identifier();
                let system_identifier = token.system_identifier();

                header.set(Header::HAS_PUBLIC_IDENTIFIER, public_identifier.is_some());
                header.set(Header::HAS_SYSTEM_IDENTIFIER, system_identifier.is_some());

                if public_identifier.is_some() || system_identifier.is_some() {
                    attributes.push(CompactAttribute {
                        name: Identifier::owned(public_identifier.unwrap_or_default()),
                        value: system_identifier.unwrap_or_default().into(),
                    });
                }

                Identifier::new(token.name())
            }
            TokenKind::Comment => Identifier::owned(token.comment()),
            TokenKind::Character => Identifier::owned(token.characters()),
            TokenKind::EndOfFile | TokenKind::Uninitialized => Identifier::default(),
        };

        CompactToken {
            header,
            data,
            attributes,
            position,
        }
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        decode_kind((self.header & Header::KIND).bits())
    }

    /// Tag or doctype name, comment text or character data.
    #[inline]
    pub fn data(&self) -> &str {
        self.data.as_str()
    }

    #[inline]
    pub fn self_closing(&self) -> bool {
        self.header.contains(Header::SELF_CLOSING)
    }

    /// Hint that the data fits a single byte encoding. Not a part of the
    /// token's content.
    #[inline]
    pub fn is_all_8bit(&self) -> bool {
        self.header.contains(Header::ALL_8BIT)
    }

    #[inline]
    pub fn position(&self) -> TextPosition {
        self.position
    }

    #[inline]
    pub fn attributes(&self) -> &[CompactAttribute] {
        debug_assert!(matches!(
            self.kind(),
            TokenKind::StartTag | TokenKind::EndTag
        ));

        &self.attributes
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name.as_str() == name)
            .map(|attr| &*attr.value)
    }

    #[inline]
    pub fn force_quirks(&self) -> bool {
        debug_assert_eq!(self.kind(), TokenKind::Doctype);
        self.header.contains(Header::FORCE_QUIRKS)
    }

    pub fn public_identifier(&self) -> Option<&str> {
        debug_assert_eq!(self.kind(), TokenKind::Doctype);

        match self.attributes.first() {
            Some(ids) if self.header.contains(Header::HAS_PUBLIC_IDENTIFIER) => {
                Some(ids.name.as_str())
            }
            _ => None,
        }
    }

    pub fn system_identifier(&self) -> Option<&str> {
        debug_assert_eq!(self.kind(), TokenKind::Doctype);

        match self.attributes.first() {
            Some(ids) if self.header.contains(Header::HAS_SYSTEM_IDENTIFIER) => Some(&ids.value),
            _ => None,
        }
    }

    /// Every field is owned, so a compact token never refers to the
    /// buffers of the tokenizer that produced it.
    #[inline]
    pub fn is_safe_to_send_to_another_thread(&self) -> bool {
        fn is_send<T: Send + 'static>(_: &T) -> bool {
            true
        }

        is_send(self)
    }
}
