//! Rules for tokens inside SVG and MathML elements.
use super::{Step, TreeBuilder, TreeSink};
use crate::html::{causes_foreign_content_exit, is_all_whitespace_or_replacement_characters, Namespace, Tag};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;

fn is_font_breakout(token: &AtomicToken) -> bool {
    token.is_tag(Tag::Font)
        && token
            .attributes()
            .iter()
            .any(|attr| matches!(attr.name.as_str(), "color" | "face" | "size"))
}

impl<S: TreeSink> TreeBuilder<S> {
    pub(super) fn should_process_in_foreign_content(&self, token: &AtomicToken) -> bool {
        let Some(current) = self.current_node() else {
            return false;
        };

        if current.is_html() {
            return false;
        }

        let kind = token.kind();

        if current.is_math_ml_text_integration_point() {
            match kind {
                TokenKind::Character => return false,
                TokenKind::StartTag
                    if !tag_is_one_of!(token.name_hash(), [Mglyph, MalignMark]) =>
                {
                    return false;
                }
                _ => (),
            }
        }

        if current.is_math_ml_annotation_xml()
            && kind == TokenKind::StartTag
            && token.is_tag(Tag::Svg)
        {
            return false;
        }

        if current.html_integration_point
            && matches!(kind, TokenKind::StartTag | TokenKind::Character)
        {
            return false;
        }

        kind != TokenKind::EndOfFile
    }

    pub(super) fn process_in_foreign_content(&mut self, token: &mut AtomicToken) -> Step {
        trace!(@mode "foreign content", token);

        match token.kind() {
            TokenKind::Character => {
                self.insert_text(token.character_data());

                if !is_all_whitespace_or_replacement_characters(token.character_data()) {
                    self.frameset_ok = false;
                }

                Step::Done
            }
            TokenKind::Comment => {
                self.insert_comment(token);
                Step::Done
            }
            TokenKind::Doctype => {
                self.parse_error("unexpected-doctype");
                Step::Done
            }
            TokenKind::StartTag
                if causes_foreign_content_exit(token.name_hash()) || is_font_breakout(token) =>
            {
                self.parse_error("unexpected-html-element-in-foreign-content");

                self.open_elements.pop_while_not(|r| {
                    r.is_html() || r.html_integration_point || r.is_math_ml_text_integration_point()
                });

                Step::Reprocess
            }
            TokenKind::StartTag => {
                self.insert_foreign_element(token);
                Step::Done
            }
            TokenKind::EndTag => self.foreign_end_tag(token),
            TokenKind::EndOfFile | TokenKind::Uninitialized => Step::Done,
        }
    }

    fn insert_foreign_element(&mut self, token: &mut AtomicToken) {
        let ns = self
            .current_node()
            .map_or(Namespace::Html, |current| current.namespace);

        match ns {
            Namespace::Svg => {
                if let Some(adjusted) = self.tables.svg_tag_name(token.name()) {
                    token.set_name(adjusted);
                }

                self.tables.adjust_svg_attributes(token.attributes_mut());
            }
            Namespace::MathML => self.tables.adjust_math_ml_attributes(token.attributes_mut()),
            Namespace::Html => (),
        }

        self.tables.adjust_foreign_attributes(token.attributes_mut());
        self.insert_element(token, ns);

        if token.self_closing() {
            self.open_elements.pop();
        }
    }

    fn foreign_end_tag(&mut self, token: &mut AtomicToken) -> Step {
        let len = self.open_elements.len();

        if self
            .current_node()
            .is_some_and(|r| !r.name.eq_ignore_ascii_case(token.name()))
        {
            self.parse_error("unexpected-end-tag");
        }

        for idx in (1..len).rev() {
            let Some(record) = self.open_elements.get(idx) else {
                break;
            };

            if record.name.eq_ignore_ascii_case(token.name()) {
                let node = record.node;

                self.open_elements.pop_until_node(node);
                return Step::Done;
            }

            if self.open_elements.get(idx - 1).is_some_and(|r| r.is_html()) {
                return self.process_in_mode(self.mode, token);
            }
        }

        Step::Done
    }
}
