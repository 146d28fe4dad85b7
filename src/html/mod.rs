#[macro_use]
mod tag;

mod entities;
mod identifier;
mod local_name_hash;
mod namespace;
mod text_type;

pub use self::entities::{EntitySearch, NAMED_ENTITIES};
pub use self::identifier::Identifier;
pub use self::local_name_hash::LocalNameHash;
pub use self::namespace::{AttributeNamespace, Namespace};
pub use self::tag::Tag;
pub use self::text_type::TextType;

#[inline]
pub(crate) fn is_html_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

#[inline]
pub(crate) fn is_all_whitespace(text: &str) -> bool {
    text.chars().all(is_html_whitespace)
}

#[inline]
pub(crate) fn is_all_whitespace_or_replacement_characters(text: &str) -> bool {
    text.chars()
        .all(|ch| is_html_whitespace(ch) || ch == '\u{FFFD}')
}

/// Start tags that close foreign content and are processed as HTML.
pub(crate) fn causes_foreign_content_exit(tag_name_hash: LocalNameHash) -> bool {
    tag_is_one_of!(
        tag_name_hash,
        [
            B, Big, Blockquote, Body, Br, Center, Code, Dd, Div, Dl, Dt, Em, Embed, H1, H2, H3, H4,
            H5, H6, Head, Hr, I, Img, Li, Listing, Menu, Meta, Nobr, Ol, P, Pre, Ruby, S, Small,
            Span, Strong, Strike, Sub, Sup, Table, Tt, U, Ul, Var
        ]
    )
}
