//! Reflected XSS filter.
//!
//! The auditor looks for markup that also occurs in the request which
//! loaded the document (its URL or form body). Dangerous constructs built
//! from such markup were likely injected by the request, so they are
//! neutered before tree construction sees them: attribute values are
//! erased or replaced and inline script text is blanked. The auditor never
//! adds markup to the document.
mod decode;
mod suffix_tree;

use self::decode::fully_decode;
use self::suffix_tree::SuffixTree;
use crate::base::TextPosition;
use crate::html::{is_html_whitespace, LocalNameHash, Tag};
use crate::tokenizer::{Token, TokenAttribute, TokenKind};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use url::Url;

const MAXIMUM_FRAGMENT_LENGTH_TARGET: usize = 100;
const MINIMUM_LENGTH_FOR_SUFFIX_TREE: usize = 512;
const SUFFIX_TREE_DEPTH: usize = 5;
const SAFE_JAVASCRIPT_URL: &str = "javascript:void(0)";
const BLANK_URL: &str = "about:blank";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum XssMode {
    /// Neuter the injected markup and continue parsing.
    #[default]
    Filter,
    /// Stop parsing the document on the first finding.
    Block,
}

#[derive(Debug, Clone)]
pub struct XssAuditorSettings {
    pub mode: XssMode,
    pub document_url: Url,
    pub http_body: Option<String>,
    pub encoding: &'static Encoding,
}

impl XssAuditorSettings {
    pub fn new(document_url: Url) -> Self {
        XssAuditorSettings {
            mode: XssMode::default(),
            document_url,
            http_body: None,
            encoding: UTF_8,
        }
    }
}

/// A report of markup neutered by the auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XssInfo {
    pub original_url: String,
    pub did_block_entire_page: bool,
    pub did_sanitize: bool,
    pub position: TextPosition,
}

pub struct FilterRequest<'t> {
    pub token: &'t mut Token,
    /// `true` in foreign content, where scripts follow XML comment rules.
    pub should_allow_cdata: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum AttributeKind {
    ScriptLike,
    SrcLike,
    Other,
}

#[inline]
fn has_injection_characters(text: &str) -> bool {
    text.contains(['"', '\'', '<', '>'])
}

#[inline]
fn is_name_of_inline_event_handler(name: &str) -> bool {
    // NOTE: the shortest handler name is `oncut`.
    name.len() >= 5 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

fn is_dangerous_url(value: &str) -> bool {
    let url = value
        .trim_matches(is_html_whitespace)
        .chars()
        .filter(|ch| !matches!(ch, '\t' | '\n' | '\r'))
        .take(11)
        .collect::<String>()
        .to_ascii_lowercase();

    url.starts_with("javascript:") || url.starts_with("data:")
}

fn is_dangerous_http_equiv(value: &str) -> bool {
    let equiv = value.trim_matches(is_html_whitespace);

    equiv.eq_ignore_ascii_case("refresh") || equiv.eq_ignore_ascii_case("set-cookie")
}

#[inline]
fn is_url_parameter(name: &str) -> bool {
    ["data", "movie", "code", "src", "url"]
        .iter()
        .any(|param| name.eq_ignore_ascii_case(param))
}

#[inline]
fn is_terminating_character(ch: u8) -> bool {
    matches!(ch, b'&' | b'/' | b'"' | b'\'' | b'<' | b'>' | b',')
}

#[inline]
fn is_js_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn starts_with_at(chars: &[char], pos: usize, pattern: &str) -> bool {
    pattern
        .chars()
        .enumerate()
        .all(|(idx, expected)| chars.get(pos + idx) == Some(&expected))
}

fn starts_opening_script_tag_at(chars: &[char], pos: usize) -> bool {
    "<script"
        .chars()
        .enumerate()
        .all(|(idx, expected)| {
            chars
                .get(pos + idx)
                .is_some_and(|ch| ch.eq_ignore_ascii_case(&expected))
        })
}

fn find_at(chars: &[char], from: usize, pattern: &str) -> Option<usize> {
    (from..chars.len()).find(|&pos| starts_with_at(chars, pos, pattern))
}

fn truncate_chars(text: &mut String, count: usize) {
    if let Some((idx, _)) = text.char_indices().nth(count) {
        text.truncate(idx);
    }
}

/// Cuts a URL-like snippet at the point after which the characters may
/// come from the page itself: the first `?` or `#`, the third slash, or
/// the first slash or `<` following a comma (data URLs).
fn truncate_src_like_snippet(snippet: &mut String) {
    let mut slash_count = 0;
    let mut comma_seen = false;
    let mut cut = None;

    for (idx, ch) in snippet.char_indices() {
        let is_slash = ch == '/' || ch == '\\';

        if is_slash && !comma_seen {
            slash_count += 1;
        }

        if ch == '?'
            || ch == '#'
            || (is_slash && (comma_seen || slash_count > 2))
            || (ch == '<' && comma_seen)
        {
            cut = Some(idx);
            break;
        }

        if ch == ',' {
            comma_seen = true;
        }
    }

    if let Some(cut) = cut {
        snippet.truncate(cut);
    }
}

/// Cuts a script-like attribute snippet at the first character that
/// terminates the injected value.
fn truncate_script_like_snippet(snippet: &mut String) {
    let bytes = snippet.as_bytes();

    let cut = snippet.find('=').and_then(|eq| {
        let value_start = eq
            + 1
            + bytes[eq + 1..]
                .iter()
                .position(|&b| !is_html_whitespace(char::from(b)))?;

        let search_from = if matches!(bytes[value_start], b'"' | b'\'') {
            value_start + 1
        } else {
            value_start
        };

        bytes[search_from..]
            .iter()
            .position(|&b| is_terminating_character(b))
            .map(|pos| search_from + pos)
    });

    if let Some(cut) = cut {
        snippet.truncate(cut);
    }
}

#[derive(Debug, Clone)]
pub struct XssAuditor {
    enabled: bool,
    mode: XssMode,
    document_url: Url,
    encoding: &'static Encoding,
    decoded_url: String,
    decoded_http_body: String,
    http_body_suffix_tree: Option<SuffixTree>,
    script_tag_nesting_level: usize,
    cached_decoded_snippet: String,
}

impl XssAuditor {
    pub fn new(settings: XssAuditorSettings) -> Self {
        let encoding = settings.encoding;

        let mut decoded_url =
            fully_decode(settings.document_url.as_str(), encoding).to_ascii_lowercase();

        if !has_injection_characters(&decoded_url) {
            decoded_url.clear();
        }

        let mut decoded_http_body = settings
            .http_body
            .as_deref()
            .map(|body| fully_decode(body, encoding).to_ascii_lowercase())
            .unwrap_or_default();

        if !has_injection_characters(&decoded_http_body) {
            decoded_http_body.clear();
        }

        let http_body_suffix_tree = (decoded_http_body.len() >= MINIMUM_LENGTH_FOR_SUFFIX_TREE)
            .then(|| SuffixTree::new(&decoded_http_body, SUFFIX_TREE_DEPTH));

        let enabled = settings.document_url.scheme() != "data"
            && (!decoded_url.is_empty() || !decoded_http_body.is_empty());

        if !enabled {
            debug!(
                "XSS auditor disabled for {}: the request can't carry an injection",
                settings.document_url
            );
        }

        XssAuditor {
            enabled,
            mode: settings.mode,
            document_url: settings.document_url,
            encoding,
            decoded_url,
            decoded_http_body,
            http_body_suffix_tree,
            script_tag_nesting_level: 0,
            cached_decoded_snippet: String::new(),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Checks the token and neuters the parts of it that were reflected
    /// from the request. Must see every token of the document in order.
    pub fn filter(&mut self, request: &mut FilterRequest<'_>) -> Option<XssInfo> {
        if !self.enabled {
            return None;
        }

        let did_block_script = match request.token.kind() {
            TokenKind::StartTag => self.filter_start_tag(request),
            TokenKind::Character if self.script_tag_nesting_level > 0 => {
                self.filter_character_token(request)
            }
            TokenKind::EndTag if self.script_tag_nesting_level > 0 => {
                self.filter_end_tag(request);
                false
            }
            _ => false,
        };

        if !did_block_script {
            return None;
        }

        let did_block_entire_page = self.mode == XssMode::Block;
        let position = request.token.position();

        warn!(
            "Reflected XSS detected at {position} in {}{}",
            self.document_url,
            if did_block_entire_page {
                ", blocking the page"
            } else {
                ""
            }
        );

        Some(XssInfo {
            original_url: self.document_url.to_string(),
            did_block_entire_page,
            did_sanitize: !did_block_entire_page,
            position,
        })
    }

    fn filter_start_tag(&mut self, request: &mut FilterRequest<'_>) -> bool {
        let hash = LocalNameHash::from(request.token.name());
        let mut did_block_script = self.erase_dangerous_attributes_if_injected(request);

        if hash == Tag::Script {
            did_block_script |= self.filter_script_token(request);

            // NOTE: self-closing scripts in foreign content have no end tag.
            if !(request.should_allow_cdata && request.token.self_closing()) {
                self.script_tag_nesting_level += 1;
            }
        } else if hash == Tag::Object {
            did_block_script |= self.filter_object_token(request);
        } else if hash == Tag::Param {
            did_block_script |= self.filter_param_token(request);
        } else if hash == Tag::Embed {
            did_block_script |= self.filter_embed_token(request);
        } else if hash == Tag::Applet {
            did_block_script |= self.filter_applet_token(request);
        } else if tag_is_one_of!(hash, [Iframe, Frame]) {
            did_block_script |= self.filter_frame_token(request);
        } else if hash == Tag::Meta {
            did_block_script |=
                self.erase_attribute_if_injected(request.token, "http-equiv", "", AttributeKind::Other);
        } else if hash == Tag::Base {
            did_block_script |=
                self.erase_attribute_if_injected(request.token, "href", "", AttributeKind::Other);
        } else if hash == Tag::Form {
            did_block_script |= self.erase_attribute_if_injected(
                request.token,
                "action",
                BLANK_URL,
                AttributeKind::Other,
            );
        } else if tag_is_one_of!(hash, [Input, Button]) {
            did_block_script |= self.erase_attribute_if_injected(
                request.token,
                "formaction",
                BLANK_URL,
                AttributeKind::SrcLike,
            );
        }

        did_block_script
    }

    fn filter_end_tag(&mut self, request: &FilterRequest<'_>) {
        if LocalNameHash::from(request.token.name()) == Tag::Script {
            self.script_tag_nesting_level = self.script_tag_nesting_level.saturating_sub(1);
        }
    }

    fn filter_character_token(&mut self, request: &mut FilterRequest<'_>) -> bool {
        if self.is_contained_in_request(&self.cached_decoded_snippet)
            && self.is_contained_in_request(&self.decoded_snippet_for_javascript(request))
        {
            // NOTE: character tokens can't be empty.
            request.token.replace_characters(" ");
            return true;
        }

        false
    }

    fn filter_script_token(&mut self, request: &mut FilterRequest<'_>) -> bool {
        self.cached_decoded_snippet = self.decoded_snippet_for_name(request.token);

        if !self.is_contained_in_request(&self.cached_decoded_snippet) {
            return false;
        }

        let mut did_block_script =
            self.erase_attribute_if_injected(request.token, "src", BLANK_URL, AttributeKind::SrcLike);

        did_block_script |= self.erase_attribute_if_injected(
            request.token,
            "xlink:href",
            BLANK_URL,
            AttributeKind::SrcLike,
        );

        did_block_script
    }

    fn filter_object_token(&self, request: &mut FilterRequest<'_>) -> bool {
        if !self.is_contained_in_request(&self.decoded_snippet_for_name(request.token)) {
            return false;
        }

        let token = &mut *request.token;
        let mut did_block_script =
            self.erase_attribute_if_injected(token, "data", BLANK_URL, AttributeKind::SrcLike);

        did_block_script |= self.erase_attribute_if_injected(token, "type", "", AttributeKind::Other);
        did_block_script |= self.erase_attribute_if_injected(token, "classid", "", AttributeKind::Other);

        did_block_script
    }

    fn filter_param_token(&self, request: &mut FilterRequest<'_>) -> bool {
        let is_url_param = request
            .token
            .get_attribute("name")
            .is_some_and(|name| is_url_parameter(&name.value));

        is_url_param
            && self.erase_attribute_if_injected(
                request.token,
                "value",
                BLANK_URL,
                AttributeKind::SrcLike,
            )
    }

    fn filter_embed_token(&self, request: &mut FilterRequest<'_>) -> bool {
        if !self.is_contained_in_request(&self.decoded_snippet_for_name(request.token)) {
            return false;
        }

        let token = &mut *request.token;
        let mut did_block_script =
            self.erase_attribute_if_injected(token, "code", "", AttributeKind::SrcLike);

        did_block_script |= self.erase_attribute_if_injected(token, "src", "", AttributeKind::SrcLike);
        did_block_script |= self.erase_attribute_if_injected(token, "type", "", AttributeKind::Other);

        did_block_script
    }

    fn filter_applet_token(&self, request: &mut FilterRequest<'_>) -> bool {
        if !self.is_contained_in_request(&self.decoded_snippet_for_name(request.token)) {
            return false;
        }

        let token = &mut *request.token;
        let mut did_block_script =
            self.erase_attribute_if_injected(token, "code", "", AttributeKind::SrcLike);

        did_block_script |=
            self.erase_attribute_if_injected(token, "object", "", AttributeKind::SrcLike);

        did_block_script
    }

    fn filter_frame_token(&self, request: &mut FilterRequest<'_>) -> bool {
        let token = &mut *request.token;
        let mut did_block_script =
            self.erase_attribute_if_injected(token, "srcdoc", "", AttributeKind::ScriptLike);

        if self.is_contained_in_request(&self.decoded_snippet_for_name(token)) {
            did_block_script |=
                self.erase_attribute_if_injected(token, "src", "", AttributeKind::SrcLike);
        }

        did_block_script
    }

    fn erase_dangerous_attributes_if_injected(&self, request: &mut FilterRequest<'_>) -> bool {
        let mut did_block_script = false;

        for idx in 0..request.token.attributes().len() {
            let attr = &request.token.attributes()[idx];
            let is_inline_event_handler = is_name_of_inline_event_handler(&attr.name);
            let has_dangerous_url = !is_inline_event_handler && is_dangerous_url(&attr.value);

            if !is_inline_event_handler && !has_dangerous_url {
                continue;
            }

            let snippet = self.decoded_snippet_for_attribute(
                &*request.token,
                attr,
                AttributeKind::ScriptLike,
            );

            if !self.is_contained_in_request(&snippet) {
                continue;
            }

            request.token.attributes_mut()[idx].value = if has_dangerous_url {
                SAFE_JAVASCRIPT_URL.to_string()
            } else {
                String::new()
            };

            did_block_script = true;
        }

        did_block_script
    }

    fn erase_attribute_if_injected(
        &self,
        token: &mut Token,
        name: &str,
        replacement: &str,
        kind: AttributeKind,
    ) -> bool {
        let Some(idx) = token.attributes().iter().position(|attr| attr.name == name) else {
            return false;
        };

        let attr = &token.attributes()[idx];

        if !self.is_contained_in_request(&self.decoded_snippet_for_attribute(token, attr, kind)) {
            return false;
        }

        if name == "src" && self.is_likely_safe_resource(&attr.value) {
            return false;
        }

        if name == "http-equiv" && !is_dangerous_http_equiv(&attr.value) {
            return false;
        }

        token.attributes_mut()[idx].value = replacement.to_string();

        true
    }

    /// Same-host resources without a query can't carry the injection to
    /// the server.
    fn is_likely_safe_resource(&self, value: &str) -> bool {
        let value = value.trim_matches(is_html_whitespace);

        if value.is_empty() || value == BLANK_URL {
            return true;
        }

        match self.document_url.join(value) {
            Ok(resource) => {
                resource.host_str() == self.document_url.host_str()
                    && resource.query().map_or(true, str::is_empty)
            }
            Err(_) => false,
        }
    }

    /// The tag's `<` followed by its name, e.g. `<script`.
    fn decoded_snippet_for_name(&self, token: &Token) -> String {
        let mut snippet = fully_decode(token.source(), self.encoding);

        truncate_chars(&mut snippet, token.name().chars().count() + 1);

        snippet
    }

    /// The attribute's markup from the start of its name to the end of its
    /// value, excluding the character that terminates the value.
    fn decoded_snippet_for_attribute(
        &self,
        token: &Token,
        attr: &TokenAttribute,
        kind: AttributeKind,
    ) -> String {
        let start = attr.name_range.start;
        let end = attr.value_range.end.max(attr.name_range.end);

        let Some(raw) = token.source().get(start..end) else {
            return String::new();
        };

        let mut snippet = fully_decode(raw, self.encoding);

        truncate_chars(&mut snippet, MAXIMUM_FRAGMENT_LENGTH_TARGET);

        match kind {
            AttributeKind::SrcLike => truncate_src_like_snippet(&mut snippet),
            AttributeKind::ScriptLike => truncate_script_like_snippet(&mut snippet),
            AttributeKind::Other => (),
        }

        snippet
    }

    /// The leading part of the inline script, skipping comments, up to the
    /// next comment, comma or nested `<script`.
    fn decoded_snippet_for_javascript(&self, request: &FilterRequest<'_>) -> String {
        let chars: Vec<char> = request.token.source().chars().collect();
        let end = chars.len();
        let mut start = 0;

        while start < end {
            while start < end && is_html_whitespace(chars[start]) {
                start += 1;
            }

            // NOTE: in foreign content HTML comments are separate tokens
            // and JavaScript comments don't matter.
            if request.should_allow_cdata {
                break;
            }

            if starts_with_at(&chars, start, "<!--") || starts_with_at(&chars, start, "//") {
                while start < end && !is_js_newline(chars[start]) {
                    start += 1;
                }
            } else if starts_with_at(&chars, start, "/*") {
                start = find_at(&chars, start + 2, "*/").map_or(end, |pos| pos + 2);
            } else {
                break;
            }
        }

        let mut stop = start;
        let mut last_non_space = None;

        while stop < end {
            if !request.should_allow_cdata
                && (starts_with_at(&chars, stop, "//")
                    || starts_with_at(&chars, stop, "/*")
                    || starts_with_at(&chars, stop, "<!--"))
            {
                break;
            }

            let ch = chars[stop];

            if ch == ',' {
                break;
            }

            if let Some(last) = last_non_space {
                if starts_opening_script_tag_at(&chars, stop) {
                    stop = last + 1;
                    break;
                }
            }

            // NOTE: past the length target only stop on whitespace, which
            // can't be in the middle of an escape sequence.
            if stop > start + MAXIMUM_FRAGMENT_LENGTH_TARGET && is_html_whitespace(ch) {
                break;
            }

            if !is_html_whitespace(ch) {
                last_non_space = Some(stop);
            }

            stop += 1;
        }

        let raw: String = chars[start..stop].iter().collect();

        fully_decode(&raw, self.encoding)
    }

    fn is_contained_in_request(&self, decoded_snippet: &str) -> bool {
        if decoded_snippet.is_empty() {
            return false;
        }

        let snippet = decoded_snippet.to_ascii_lowercase();

        if self.decoded_url.contains(snippet.as_str()) {
            return true;
        }

        if self.decoded_http_body.is_empty() {
            return false;
        }

        if let Some(tree) = &self.http_body_suffix_tree {
            if !tree.might_contain(&snippet) {
                return false;
            }
        }

        self.decoded_http_body.contains(snippet.as_str())
    }
}
