//! Names shared between the background thread and the consumer. Names from
//! the static table are transferred as indices. Everything else is an
//! owned copy, so an `Identifier` never points into the producing
//! thread's buffers.
use std::fmt::{self, Debug, Display};

static KNOWN_NAMES: [&str; 196] = [
    "a", "accept", "accept-charset", "action", "address", "align", "alt", "annotation",
    "annotation-xml", "applet", "archive", "area", "article", "aside", "async", "b",
    "background", "base", "basefont", "bgcolor", "bgsound", "big", "blockquote", "body",
    "border", "br", "button", "caption", "center", "charset", "checked", "cite", "class",
    "classid", "code", "codebase", "col", "colgroup", "color", "cols", "colspan", "command", "content",
    "coords", "crossorigin", "data", "datetime", "dd", "defer", "desc", "details", "dialog",
    "dir", "disabled", "div", "dl", "dt", "em", "embed", "encoding", "enctype", "face",
    "fieldset", "figcaption", "figure", "font", "footer", "for", "foreignobject", "form",
    "formaction", "frame", "frameborder", "frameset", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "headers", "height", "hgroup", "hidden", "hr", "href", "hreflang", "html",
    "http-equiv", "i", "id", "iframe", "image", "img", "input", "integrity", "isindex",
    "keygen", "lang", "language", "li", "link", "listing", "main", "malignmark", "marquee",
    "math", "media", "menu", "meta", "method", "mglyph", "mi", "mn", "mo", "ms", "mtext",
    "multiple", "name", "nav", "nobr", "noembed", "noframes", "nonce", "noscript", "object",
    "ol", "onclick", "onerror", "onload", "optgroup", "option", "p", "param", "placeholder",
    "plaintext", "poster", "pre", "rb", "readonly", "rel", "rows", "rowspan", "rp", "rt", "rtc",
    "ruby", "s", "script", "section", "select", "selected", "shape", "size", "sizes", "small",
    "source", "span", "src", "srcdoc", "srcset", "start", "strike", "strong", "style", "sub",
    "summary", "sup", "svg", "tabindex", "table", "target", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "title", "tr", "track", "tt", "type", "u", "ul",
    "usemap", "valign", "value", "var", "wbr", "width", "xmlns", "xmp",
];

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Known(u16),
    Owned(Box<str>),
}

impl Identifier {
    pub fn new(name: &str) -> Self {
        match KNOWN_NAMES.binary_search(&name) {
            Ok(idx) => Identifier::Known(idx as u16),
            Err(_) => Identifier::Owned(name.into()),
        }
    }

    /// Wraps arbitrary text (e.g. character data) without looking it up.
    #[inline]
    pub fn owned(text: impl Into<Box<str>>) -> Self {
        Identifier::Owned(text.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Known(idx) => KNOWN_NAMES[usize::from(*idx)],
            Identifier::Owned(name) => name,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self, Identifier::Known(_))
    }
}

impl Default for Identifier {
    #[inline]
    fn default() -> Self {
        Identifier::Owned(Box::default())
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::tag::ALL_TAGS;

    #[test]
    fn known_names_are_sorted() {
        assert!(KNOWN_NAMES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn all_tags_are_known() {
        for tag in ALL_TAGS {
            assert!(Identifier::new(tag.name()).is_known(), "{}", tag.name());
        }
    }

    #[test]
    fn unknown_names_are_owned() {
        let id = Identifier::new("my-element");

        assert!(!id.is_known());
        assert_eq!(id.as_str(), "my-element");
        assert_eq!(Identifier::new("href").as_str(), "href");
    }
}
