//! Insertion modes after the `<body>` element and the frameset modes.
use super::{take_leading_whitespace, InsertionMode, Step, TreeBuilder, TreeSink};
use crate::html::{is_html_whitespace, Tag};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;

impl<S: TreeSink> TreeBuilder<S> {
    /// Processes the leading whitespace of a character token with the in
    /// body rules and leaves the rest in the token.
    fn process_leading_whitespace_in_body(&mut self, token: &mut AtomicToken) {
        let whitespace = take_leading_whitespace(token);

        if !whitespace.is_empty() {
            let mut whitespace = AtomicToken::characters(whitespace, token.position());
            let _ = self.in_body_mode(&mut whitespace);
        }
    }

    /// Inserts only the whitespace characters of the token. Everything else
    /// is a parse error.
    fn insert_whitespace_only(&mut self, token: &AtomicToken) {
        let text = token.character_data();
        let whitespace: String = text.chars().filter(|&ch| is_html_whitespace(ch)).collect();

        if whitespace.len() != text.len() {
            self.parse_error("unexpected-char-in-frameset");
        }

        self.insert_text(&whitespace);
    }

    pub(super) fn after_body_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Character => {
                self.process_leading_whitespace_in_body(token);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::Comment => {
                if let Some(html) = self.open_elements.html_element() {
                    self.insert_comment_in(html, token);
                }

                return Step::Done;
            }
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::StartTag if token.is_tag(Tag::Html) => return self.in_body_mode(token),
            TokenKind::EndTag if token.is_tag(Tag::Html) => {
                self.mode = InsertionMode::AfterAfterBody;
                return Step::Done;
            }
            TokenKind::EndOfFile => {
                self.stop_parsing();
                return Step::Done;
            }
            _ => (),
        }

        self.parse_error("unexpected-token-after-body");
        self.mode = InsertionMode::InBody;

        Step::Reprocess
    }

    pub(super) fn in_frameset_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character => self.insert_whitespace_only(token),
            TokenKind::Comment => self.insert_comment(token),
            TokenKind::Doctype => self.parse_error("unexpected-doctype"),
            TokenKind::StartTag if hash == Tag::Html => return self.in_body_mode(token),
            TokenKind::StartTag if hash == Tag::Frameset => {
                self.insert_html_element(token);
            }
            TokenKind::StartTag if hash == Tag::Frame => self.insert_void_html_element(token),
            TokenKind::StartTag if hash == Tag::Noframes => return self.in_head_mode(token),
            TokenKind::EndTag if hash == Tag::Frameset => {
                if self.open_elements.len() <= 1 {
                    self.parse_error("unexpected-frameset-in-frameset-innerhtml");
                } else {
                    self.open_elements.pop();

                    if !self.current_node_is(Tag::Frameset) {
                        self.mode = InsertionMode::AfterFrameset;
                    }
                }
            }
            TokenKind::EndOfFile => {
                if self.open_elements.len() > 1 {
                    self.parse_error("eof-in-frameset");
                }

                self.stop_parsing();
            }
            _ => self.parse_error("unexpected-token-in-frameset"),
        }

        Step::Done
    }

    pub(super) fn after_frameset_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character => self.insert_whitespace_only(token),
            TokenKind::Comment => self.insert_comment(token),
            TokenKind::Doctype => self.parse_error("unexpected-doctype"),
            TokenKind::StartTag if hash == Tag::Html => return self.in_body_mode(token),
            TokenKind::StartTag if hash == Tag::Noframes => return self.in_head_mode(token),
            TokenKind::EndTag if hash == Tag::Html => {
                self.mode = InsertionMode::AfterAfterFrameset;
            }
            TokenKind::EndOfFile => self.stop_parsing(),
            _ => self.parse_error("unexpected-token-after-frameset"),
        }

        Step::Done
    }

    pub(super) fn after_after_body_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Comment => {
                let document = self.sink.document();

                self.insert_comment_in(document, token);
                return Step::Done;
            }
            TokenKind::Doctype => return self.in_body_mode(token),
            TokenKind::Character => {
                self.process_leading_whitespace_in_body(token);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::StartTag if token.is_tag(Tag::Html) => return self.in_body_mode(token),
            TokenKind::EndOfFile => {
                self.stop_parsing();
                return Step::Done;
            }
            _ => (),
        }

        self.parse_error("expected-eof-but-got-token");
        self.mode = InsertionMode::InBody;

        Step::Reprocess
    }

    pub(super) fn after_after_frameset_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Comment => {
                let document = self.sink.document();

                self.insert_comment_in(document, token);
            }
            TokenKind::Doctype => return self.in_body_mode(token),
            TokenKind::Character => {
                self.process_leading_whitespace_in_body(token);

                if !token.character_data().is_empty() {
                    self.parse_error("expected-eof-but-got-char");
                }
            }
            TokenKind::StartTag if token.is_tag(Tag::Html) => return self.in_body_mode(token),
            TokenKind::StartTag if token.is_tag(Tag::Noframes) => return self.in_head_mode(token),
            TokenKind::EndOfFile => self.stop_parsing(),
            _ => self.parse_error("expected-eof-but-got-token"),
        }

        Step::Done
    }
}
