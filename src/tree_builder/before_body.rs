//! Insertion modes up to the `<body>` element, plus the text mode.
use super::open_elements::ElementRecord;
use super::quirks::{is_doctype_error, quirks_mode_for};
use super::{take_leading_whitespace, InsertionMode, QuirksMode, ScriptToProcess, Step, TreeBuilder, TreeSink};
use crate::html::{Namespace, Tag, TextType};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;

impl<S: TreeSink> TreeBuilder<S> {
    pub(super) fn initial_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Character => {
                take_leading_whitespace(token);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::Comment => {
                let document = self.sink.document();

                self.insert_comment_in(document, token);
                return Step::Done;
            }
            TokenKind::Doctype => {
                if is_doctype_error(token) {
                    self.parse_error("bad-doctype");
                }

                self.sink.append_doctype(
                    token.name(),
                    token.public_identifier().unwrap_or_default(),
                    token.system_identifier().unwrap_or_default(),
                );

                self.quirks_mode = quirks_mode_for(token);
                self.sink.set_quirks_mode(self.quirks_mode);
                self.mode = InsertionMode::BeforeHtml;

                return Step::Done;
            }
            _ => (),
        }

        self.parse_error("expected-doctype-but-got-other");
        self.quirks_mode = QuirksMode::Quirks;
        self.sink.set_quirks_mode(QuirksMode::Quirks);
        self.mode = InsertionMode::BeforeHtml;

        Step::Reprocess
    }

    pub(super) fn before_html_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::Comment => {
                let document = self.sink.document();

                self.insert_comment_in(document, token);
                return Step::Done;
            }
            TokenKind::Character => {
                take_leading_whitespace(token);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::StartTag if token.is_tag(Tag::Html) => {
                self.insert_html_element(token);
                self.mode = InsertionMode::BeforeHead;

                return Step::Done;
            }
            TokenKind::EndTag if !tag_is_one_of!(token.name_hash(), [Head, Body, Html, Br]) => {
                self.parse_error("unexpected-end-tag-before-html");
                return Step::Done;
            }
            _ => (),
        }

        self.insert_fake_html_element(Tag::Html);
        self.mode = InsertionMode::BeforeHead;

        Step::Reprocess
    }

    pub(super) fn before_head_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Character => {
                take_leading_whitespace(token);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::Comment => {
                self.insert_comment(token);
                return Step::Done;
            }
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::StartTag if token.is_tag(Tag::Html) => {
                return self.in_body_mode(token);
            }
            TokenKind::StartTag if token.is_tag(Tag::Head) => {
                self.head = Some(self.insert_html_element(token));
                self.mode = InsertionMode::InHead;

                return Step::Done;
            }
            TokenKind::EndTag if !tag_is_one_of!(token.name_hash(), [Head, Body, Html, Br]) => {
                self.parse_error("end-tag-after-implied-root");
                return Step::Done;
            }
            _ => (),
        }

        self.head = Some(self.insert_fake_html_element(Tag::Head));
        self.mode = InsertionMode::InHead;

        Step::Reprocess
    }

    pub(super) fn in_head_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character => {
                let whitespace = take_leading_whitespace(token);

                self.insert_text(&whitespace);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::Comment => {
                self.insert_comment(token);
                return Step::Done;
            }
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::StartTag => {
                if hash == Tag::Html {
                    return self.in_body_mode(token);
                }

                if tag_is_one_of!(hash, [Base, Basefont, Bgsound, Link, Meta]) {
                    self.insert_void_html_element(token);
                    return Step::Done;
                }

                if hash == Tag::Title {
                    self.parse_text_element(token, TextType::RcData);
                    return Step::Done;
                }

                if tag_is_one_of!(hash, [Noframes, Style])
                    || (hash == Tag::Noscript && self.options.scripting_enabled)
                {
                    self.parse_text_element(token, TextType::RawText);
                    return Step::Done;
                }

                if hash == Tag::Noscript {
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InHeadNoscript;

                    return Step::Done;
                }

                if hash == Tag::Script {
                    self.parse_text_element(token, TextType::ScriptData);
                    return Step::Done;
                }

                if hash == Tag::Template {
                    self.insert_html_element(token);
                    self.formatting.push_marker();
                    self.frameset_ok = false;
                    self.mode = InsertionMode::TemplateContents;
                    self.template_modes.push(InsertionMode::TemplateContents);

                    return Step::Done;
                }

                if hash == Tag::Head {
                    self.parse_error("two-heads-are-not-better-than-one");
                    return Step::Done;
                }
            }
            TokenKind::EndTag => {
                if hash == Tag::Head {
                    self.open_elements.pop();
                    self.mode = InsertionMode::AfterHead;

                    return Step::Done;
                }

                if hash == Tag::Template {
                    if self.open_elements.contains_tag(Tag::Template) {
                        self.close_template_element();
                    } else {
                        self.parse_error("unexpected-end-tag");
                    }

                    return Step::Done;
                }

                if !tag_is_one_of!(hash, [Body, Html, Br]) {
                    self.parse_error("unexpected-end-tag");
                    return Step::Done;
                }
            }
            _ => (),
        }

        self.open_elements.pop();
        self.mode = InsertionMode::AfterHead;

        Step::Reprocess
    }

    pub(super) fn in_head_noscript_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::Comment => return self.in_head_mode(token),
            TokenKind::Character => {
                let whitespace = take_leading_whitespace(token);

                self.insert_text(&whitespace);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::StartTag if hash == Tag::Html => return self.in_body_mode(token),
            TokenKind::StartTag
                if tag_is_one_of!(hash, [Basefont, Bgsound, Link, Meta, Noframes, Style]) =>
            {
                return self.in_head_mode(token);
            }
            TokenKind::StartTag if tag_is_one_of!(hash, [Head, Noscript]) => {
                self.parse_error("unexpected-start-tag");
                return Step::Done;
            }
            TokenKind::EndTag if hash == Tag::Noscript => {
                self.open_elements.pop();
                self.mode = InsertionMode::InHead;

                return Step::Done;
            }
            TokenKind::EndTag if hash != Tag::Br => {
                self.parse_error("unexpected-end-tag");
                return Step::Done;
            }
            _ => (),
        }

        self.parse_error("unexpected-token-in-head-noscript");
        self.open_elements.pop();
        self.mode = InsertionMode::InHead;

        Step::Reprocess
    }

    pub(super) fn after_head_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character => {
                let whitespace = take_leading_whitespace(token);

                self.insert_text(&whitespace);

                if token.character_data().is_empty() {
                    return Step::Done;
                }
            }
            TokenKind::Comment => {
                self.insert_comment(token);
                return Step::Done;
            }
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                return Step::Done;
            }
            TokenKind::StartTag => {
                if hash == Tag::Html {
                    return self.in_body_mode(token);
                }

                if hash == Tag::Body {
                    self.insert_html_element(token);
                    self.frameset_ok = false;
                    self.mode = InsertionMode::InBody;

                    return Step::Done;
                }

                if hash == Tag::Frameset {
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InFrameset;

                    return Step::Done;
                }

                if tag_is_one_of!(
                    hash,
                    [Base, Basefont, Bgsound, Link, Meta, Noframes, Script, Style, Template, Title]
                ) {
                    self.parse_error("unexpected-start-tag-out-of-my-head");

                    return match self.head {
                        Some(head) => {
                            self.open_elements
                                .push(ElementRecord::new(head, "head", Namespace::Html));

                            let step = self.in_head_mode(token);

                            self.open_elements.remove(head);

                            step
                        }
                        None => self.in_head_mode(token),
                    };
                }

                if hash == Tag::Head {
                    self.parse_error("unexpected-start-tag");
                    return Step::Done;
                }
            }
            TokenKind::EndTag => {
                if hash == Tag::Template {
                    return self.in_head_mode(token);
                }

                if !tag_is_one_of!(hash, [Body, Html, Br]) {
                    self.parse_error("unexpected-end-tag");
                    return Step::Done;
                }
            }
            _ => (),
        }

        self.insert_fake_html_element(Tag::Body);
        self.mode = InsertionMode::InBody;

        Step::Reprocess
    }

    pub(super) fn text_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Character => {
                self.insert_text(token.character_data());
                Step::Done
            }
            TokenKind::EndOfFile => {
                self.parse_error("expected-named-closing-tag-but-got-eof");

                if let Some(script) = self.current_node().filter(|r| r.is(Tag::Script)) {
                    let node = script.node;

                    self.sink.mark_script_already_started(node);
                }

                self.open_elements.pop();
                self.mode = self.original_mode;

                Step::Reprocess
            }
            TokenKind::EndTag if token.is_tag(Tag::Script) => {
                if let Some(script) = self.open_elements.pop() {
                    if self.sink.is_attached(script.node) {
                        self.script_to_process = Some(ScriptToProcess {
                            element: script.node,
                            position: self.script_start_position,
                        });
                    } else {
                        self.sink.mark_script_already_started(script.node);
                    }
                }

                self.mode = self.original_mode;

                Step::Done
            }
            _ => {
                self.open_elements.pop();
                self.mode = self.original_mode;

                Step::Done
            }
        }
    }
}
