use super::open_elements::{ElementRecord, Scope};
use super::{InsertionMode, QuirksMode, Step, TreeBuilder, TreeSink};
use crate::html::{is_all_whitespace, LocalNameHash, Namespace, Tag, TextType};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;

/// Start tags that close an open `<p>` element in button scope.
fn closes_p_element(hash: LocalNameHash) -> bool {
    tag_is_one_of!(
        hash,
        [
            Address, Article, Aside, Blockquote, Center, Details, Dialog, Dir, Div, Dl, Fieldset,
            Figcaption, Figure, Footer, Header, Hgroup, Main, Menu, Nav, Ol, P, Section, Summary,
            Ul
        ]
    )
}

/// End tags that close a block element in scope.
fn is_block_end_tag(hash: LocalNameHash) -> bool {
    tag_is_one_of!(
        hash,
        [
            Address, Article, Aside, Blockquote, Button, Center, Details, Dialog, Dir, Div, Dl,
            Fieldset, Figcaption, Figure, Footer, Header, Hgroup, Listing, Main, Menu, Nav, Ol,
            Pre, Section, Summary, Ul
        ]
    )
}

#[inline]
fn is_formatting_tag(hash: LocalNameHash) -> bool {
    tag_is_one_of!(
        hash,
        [B, Big, Code, Em, Font, I, S, Small, Strike, Strong, Tt, U]
    )
}

#[inline]
fn is_numbered_header(hash: LocalNameHash) -> bool {
    tag_is_one_of!(hash, [H1, H2, H3, H4, H5, H6])
}

impl<S: TreeSink> TreeBuilder<S> {
    pub(super) fn in_body_mode(&mut self, token: &mut AtomicToken) -> Step {
        match token.kind() {
            TokenKind::Character => {
                self.reconstruct_active_formatting_elements();
                self.insert_text(token.character_data());

                if !is_all_whitespace(token.character_data()) {
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
            TokenKind::StartTag => self.in_body_start_tag(token),
            TokenKind::EndTag => self.in_body_end_tag(token),
            TokenKind::EndOfFile => {
                if !self.template_modes.is_empty() {
                    return self.template_contents_mode(token);
                }

                self.stop_parsing();
                Step::Done
            }
            TokenKind::Uninitialized => Step::Done,
        }
    }

    fn in_body_start_tag(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        if hash == Tag::Html {
            self.parse_error("non-html-root");

            if !self.open_elements.contains_tag(Tag::Template) {
                if let Some(html) = self.open_elements.html_element() {
                    self.sink.add_attrs_if_missing(html, token.attributes());
                }
            }
        } else if tag_is_one_of!(
            hash,
            [Base, Basefont, Bgsound, Link, Meta, Noframes, Script, Style, Template, Title]
        ) {
            return self.in_head_mode(token);
        } else if hash == Tag::Body {
            self.parse_error("unexpected-start-tag");

            match self.open_elements.body_element() {
                Some(body) if !self.open_elements.contains_tag(Tag::Template) => {
                    self.frameset_ok = false;
                    self.sink.add_attrs_if_missing(body, token.attributes());
                }
                _ => (),
            }
        } else if hash == Tag::Frameset {
            self.parse_error("unexpected-start-tag");

            match self.open_elements.body_element() {
                Some(body) if self.frameset_ok => {
                    self.sink.remove_from_parent(body);
                    self.open_elements.truncate(1);
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InFrameset;
                }
                _ => (),
            }
        } else if closes_p_element(hash) {
            self.close_p_element_in_button_scope();
            self.insert_html_element(token);
        } else if is_numbered_header(hash) {
            self.close_p_element_in_button_scope();

            if self.current_node().is_some_and(|r| r.is_numbered_header()) {
                self.parse_error("unexpected-start-tag");
                self.open_elements.pop();
            }

            self.insert_html_element(token);
        } else if tag_is_one_of!(hash, [Pre, Listing]) {
            self.close_p_element_in_button_scope();
            self.insert_html_element(token);
            self.skip_leading_newline = true;
            self.frameset_ok = false;
        } else if hash == Tag::Form {
            let has_template = self.open_elements.contains_tag(Tag::Template);

            if self.form.is_some() && !has_template {
                self.parse_error("unexpected-start-tag");
            } else {
                self.close_p_element_in_button_scope();

                let form = self.insert_html_element(token);

                if !has_template {
                    self.form = Some(form);
                }
            }
        } else if tag_is_one_of!(hash, [Li, Dd, Dt]) {
            self.close_list_item_for(hash);
            self.close_p_element_in_button_scope();
            self.insert_html_element(token);
        } else if hash == Tag::Plaintext {
            self.close_p_element_in_button_scope();
            self.insert_html_element(token);
            self.requested_text_state = Some(TextType::PlainText);
        } else if hash == Tag::Button {
            if self.open_elements.has_in_scope(Tag::Button, Scope::Default) {
                self.parse_error("unexpected-start-tag-implies-end-tag");
                self.generate_implied_end_tags(None);
                self.open_elements.pop_until(Tag::Button);
            }

            self.reconstruct_active_formatting_elements();
            self.insert_html_element(token);
            self.frameset_ok = false;
        } else if hash == Tag::A {
            if let Some(a) = self.formatting.last_element_with_name(hash, token.name()) {
                self.parse_error("unexpected-start-tag-implies-end-tag");

                if !self.run_adoption_agency(token) {
                    self.any_other_end_tag_in_body(token);
                }

                self.formatting.remove(a);
                self.open_elements.remove(a);
            }

            self.reconstruct_active_formatting_elements();
            self.insert_formatting_element(token);
        } else if is_formatting_tag(hash) {
            self.reconstruct_active_formatting_elements();
            self.insert_formatting_element(token);
        } else if hash == Tag::Nobr {
            self.reconstruct_active_formatting_elements();

            if self.open_elements.has_in_scope(Tag::Nobr, Scope::Default) {
                self.parse_error("unexpected-start-tag-implies-end-tag");

                if !self.run_adoption_agency(token) {
                    self.any_other_end_tag_in_body(token);
                }

                self.reconstruct_active_formatting_elements();
            }

            self.insert_formatting_element(token);
        } else if tag_is_one_of!(hash, [Applet, Marquee, Object]) {
            self.reconstruct_active_formatting_elements();
            self.insert_html_element(token);
            self.formatting.push_marker();
            self.frameset_ok = false;
        } else if hash == Tag::Table {
            if self.quirks_mode != QuirksMode::Quirks {
                self.close_p_element_in_button_scope();
            }

            self.insert_html_element(token);
            self.frameset_ok = false;
            self.mode = InsertionMode::InTable;
        } else if tag_is_one_of!(hash, [Area, Br, Embed, Img, Keygen, Wbr]) {
            self.reconstruct_active_formatting_elements();
            self.insert_void_html_element(token);
            self.frameset_ok = false;
        } else if hash == Tag::Input {
            let is_hidden = token
                .get_attribute("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));

            self.reconstruct_active_formatting_elements();
            self.insert_void_html_element(token);

            if !is_hidden {
                self.frameset_ok = false;
            }
        } else if tag_is_one_of!(hash, [Param, Source, Track]) {
            self.insert_void_html_element(token);
        } else if hash == Tag::Hr {
            self.close_p_element_in_button_scope();
            self.insert_void_html_element(token);
            self.frameset_ok = false;
        } else if hash == Tag::Image {
            self.parse_error("unexpected-start-tag-treated-as");
            token.set_name(Tag::Img.name());

            return Step::Reprocess;
        } else if hash == Tag::Textarea {
            self.parse_text_element(token, TextType::RcData);
            self.skip_leading_newline = true;
            self.frameset_ok = false;
        } else if hash == Tag::Xmp {
            self.close_p_element_in_button_scope();
            self.reconstruct_active_formatting_elements();
            self.frameset_ok = false;
            self.parse_text_element(token, TextType::RawText);
        } else if hash == Tag::Iframe {
            self.frameset_ok = false;
            self.parse_text_element(token, TextType::RawText);
        } else if hash == Tag::Noembed || (hash == Tag::Noscript && self.options.scripting_enabled)
        {
            self.parse_text_element(token, TextType::RawText);
        } else if hash == Tag::Select {
            self.reconstruct_active_formatting_elements();
            self.insert_html_element(token);
            self.frameset_ok = false;

            self.mode = if self.mode.is_table_related() {
                InsertionMode::InSelectInTable
            } else {
                InsertionMode::InSelect
            };
        } else if tag_is_one_of!(hash, [Optgroup, Option]) {
            if self.current_node_is(Tag::Option) {
                self.open_elements.pop();
            }

            self.reconstruct_active_formatting_elements();
            self.insert_html_element(token);
        } else if tag_is_one_of!(hash, [Rb, Rtc]) {
            if self.open_elements.has_in_scope(Tag::Ruby, Scope::Default) {
                self.generate_implied_end_tags(None);

                if !self.current_node_is(Tag::Ruby) {
                    self.parse_error("unexpected-start-tag");
                }
            }

            self.insert_html_element(token);
        } else if tag_is_one_of!(hash, [Rp, Rt]) {
            if self.open_elements.has_in_scope(Tag::Ruby, Scope::Default) {
                self.generate_implied_end_tags(Some(Tag::Rtc));

                if !self.current_node_is(Tag::Ruby) && !self.current_node_is(Tag::Rtc) {
                    self.parse_error("unexpected-start-tag");
                }
            }

            self.insert_html_element(token);
        } else if hash == Tag::Math {
            self.reconstruct_active_formatting_elements();
            self.tables.adjust_math_ml_attributes(token.attributes_mut());
            self.tables.adjust_foreign_attributes(token.attributes_mut());
            self.insert_element(token, Namespace::MathML);

            if token.self_closing() {
                self.open_elements.pop();
            }
        } else if hash == Tag::Svg {
            self.reconstruct_active_formatting_elements();
            self.tables.adjust_svg_attributes(token.attributes_mut());
            self.tables.adjust_foreign_attributes(token.attributes_mut());
            self.insert_element(token, Namespace::Svg);

            if token.self_closing() {
                self.open_elements.pop();
            }
        } else if tag_is_one_of!(
            hash,
            [Caption, Col, Colgroup, Frame, Head, Tbody, Td, Tfoot, Th, Thead, Tr]
        ) {
            self.parse_error("unexpected-start-tag-ignored");
        } else {
            self.reconstruct_active_formatting_elements();
            self.insert_html_element(token);
        }

        Step::Done
    }

    /// Closes an open `<li>`, or `<dd>`/`<dt>` before a new list item.
    fn close_list_item_for(&mut self, hash: LocalNameHash) {
        self.frameset_ok = false;

        let closes = |r: &ElementRecord| {
            if hash == Tag::Li {
                r.is(Tag::Li)
            } else {
                r.is(Tag::Dd) || r.is(Tag::Dt)
            }
        };

        let mut to_close = None;

        for record in self.open_elements.iter().rev() {
            if closes(record) {
                to_close = Some((record.node, record.hash));
                break;
            }

            if record.is_special()
                && !(record.is(Tag::Address) || record.is(Tag::Div) || record.is(Tag::P))
            {
                break;
            }
        }

        if let Some((node, item_hash)) = to_close {
            self.open_elements
                .pop_while_not(|r| !r.has_implied_end_tag() || r.hash == item_hash);

            if !self.open_elements.top().is_some_and(|r| r.node == node) {
                self.parse_error("end-tag-too-early");
            }

            self.open_elements.pop_until_node(node);
        }
    }

    fn in_body_end_tag(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        if hash == Tag::Template {
            return self.in_head_mode(token);
        } else if hash == Tag::Body || hash == Tag::Html {
            if !self.open_elements.has_in_scope(Tag::Body, Scope::Default) {
                self.parse_error("unexpected-end-tag");
                return Step::Done;
            }

            self.mode = InsertionMode::AfterBody;

            if hash == Tag::Html {
                return Step::Reprocess;
            }
        } else if is_block_end_tag(hash) {
            self.close_element_in_scope(token, Scope::Default);
        } else if hash == Tag::Form {
            self.close_form_element();
        } else if hash == Tag::P {
            if !self.open_elements.has_in_scope(Tag::P, Scope::Button) {
                self.parse_error("unexpected-end-tag");
                self.insert_fake_html_element(Tag::P);
            }

            self.close_p_element();
        } else if hash == Tag::Li {
            self.close_element_in_scope(token, Scope::ListItem);
        } else if tag_is_one_of!(hash, [Dd, Dt]) {
            self.close_element_in_scope(token, Scope::Default);
        } else if is_numbered_header(hash) {
            if !self.open_elements.has_numbered_header_in_scope() {
                self.parse_error("unexpected-end-tag");
                return Step::Done;
            }

            self.generate_implied_end_tags(None);

            if !self.current_node().is_some_and(|r| r.is_html() && r.hash == hash) {
                self.parse_error("end-tag-too-early");
            }

            self.open_elements.pop_until_numbered_header();
        } else if hash == Tag::A || hash == Tag::Nobr || is_formatting_tag(hash) {
            if !self.run_adoption_agency(token) {
                self.any_other_end_tag_in_body(token);
            }
        } else if tag_is_one_of!(hash, [Applet, Marquee, Object]) {
            if self.close_element_in_scope(token, Scope::Default) {
                self.formatting.clear_to_last_marker();
            }
        } else if hash == Tag::Br {
            self.parse_error("unexpected-end-tag-treated-as");
            self.reconstruct_active_formatting_elements();
            self.insert_void_html_element(&AtomicToken::start_tag(Tag::Br));
            self.frameset_ok = false;
        } else {
            self.any_other_end_tag_in_body(token);
        }

        Step::Done
    }

    /// Closes the HTML element the end tag names if it is in scope. Returns
    /// `false` if the end tag was ignored.
    fn close_element_in_scope(&mut self, token: &AtomicToken, scope: Scope) -> bool {
        let hash = token.name_hash();

        if !self.open_elements.has_hash_in_scope(hash, scope) {
            self.parse_error("unexpected-end-tag");
            return false;
        }

        self.open_elements
            .pop_while_not(|r| !r.has_implied_end_tag() || (r.is_html() && r.hash == hash));

        if !self.current_node().is_some_and(|r| r.is_html() && r.hash == hash) {
            self.parse_error("end-tag-too-early");
        }

        self.open_elements.pop_until_hash(hash);

        true
    }

    fn close_form_element(&mut self) {
        if self.open_elements.contains_tag(Tag::Template) {
            if !self.open_elements.has_in_scope(Tag::Form, Scope::Default) {
                self.parse_error("unexpected-end-tag");
                return;
            }

            self.generate_implied_end_tags(None);

            if !self.current_node_is(Tag::Form) {
                self.parse_error("end-tag-too-early");
            }

            self.open_elements.pop_until(Tag::Form);

            return;
        }

        match self.form.take() {
            Some(form) if self.open_elements.has_node_in_scope(form) => {
                self.generate_implied_end_tags(None);

                if !self.open_elements.top().is_some_and(|r| r.node == form) {
                    self.parse_error("end-tag-too-early");
                }

                self.open_elements.remove(form);
            }
            _ => self.parse_error("unexpected-end-tag"),
        }
    }

    pub(super) fn any_other_end_tag_in_body(&mut self, token: &AtomicToken) {
        let mut matching = None;

        for record in self.open_elements.iter().rev() {
            if record.is_html() && &*record.name == token.name() {
                matching = Some(record.node);
                break;
            }

            if record.is_special() {
                break;
            }
        }

        let Some(node) = matching else {
            self.parse_error("unexpected-end-tag");
            return;
        };

        let hash = token.name_hash();

        self.open_elements.pop_while_not(|r| {
            r.node == node || !r.has_implied_end_tag() || (!hash.is_empty() && r.hash == hash)
        });

        if !self.open_elements.top().is_some_and(|r| r.node == node) {
            self.parse_error("end-tag-too-early");
        }

        self.open_elements.pop_until_node(node);
    }
}
