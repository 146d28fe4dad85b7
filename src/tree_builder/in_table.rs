//! Table insertion modes. Content that isn't allowed in a table is moved in
//! front of it ("foster parenting").
use super::open_elements::Scope;
use super::{take_leading_whitespace, InsertionMode, Step, TreeBuilder, TreeSink};
use crate::html::{is_all_whitespace, Tag};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;
use std::mem;

impl<S: TreeSink> TreeBuilder<S> {
    pub(super) fn in_table_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character
                if self.current_node().is_some_and(|r| {
                    r.is_html() && tag_is_one_of!(r.hash, [Table, Tbody, Template, Tfoot, Thead, Tr])
                }) =>
            {
                self.pending_table_text.clear();
                self.original_mode = self.mode;
                self.mode = InsertionMode::InTableText;

                return Step::Reprocess;
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
                if hash == Tag::Caption {
                    self.open_elements.clear_back_to_table_context();
                    self.formatting.push_marker();
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InCaption;

                    return Step::Done;
                }

                if hash == Tag::Colgroup {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InColumnGroup;

                    return Step::Done;
                }

                if hash == Tag::Col {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_fake_html_element(Tag::Colgroup);
                    self.mode = InsertionMode::InColumnGroup;

                    return Step::Reprocess;
                }

                if tag_is_one_of!(hash, [Tbody, Tfoot, Thead]) {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_html_element(token);
                    self.mode = InsertionMode::InTableBody;

                    return Step::Done;
                }

                if tag_is_one_of!(hash, [Td, Th, Tr]) {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_fake_html_element(Tag::Tbody);
                    self.mode = InsertionMode::InTableBody;

                    return Step::Reprocess;
                }

                if hash == Tag::Table {
                    self.parse_error("unexpected-start-tag-implies-end-tag");

                    if !self.open_elements.has_in_scope(Tag::Table, Scope::Table) {
                        return Step::Done;
                    }

                    self.open_elements.pop_until(Tag::Table);
                    self.reset_insertion_mode_appropriately();

                    return Step::Reprocess;
                }

                if tag_is_one_of!(hash, [Style, Script, Template]) {
                    return self.in_head_mode(token);
                }

                if hash == Tag::Input
                    && token
                        .get_attribute("type")
                        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
                {
                    self.parse_error("unexpected-hidden-input-in-table");
                    self.insert_void_html_element(token);

                    return Step::Done;
                }

                if hash == Tag::Form {
                    self.parse_error("unexpected-form-in-table");

                    if self.form.is_none() && !self.open_elements.contains_tag(Tag::Template) {
                        self.form = Some(self.insert_html_element(token));
                        self.open_elements.pop();
                    }

                    return Step::Done;
                }
            }
            TokenKind::EndTag => {
                if hash == Tag::Table {
                    if self.open_elements.has_in_scope(Tag::Table, Scope::Table) {
                        self.open_elements.pop_until(Tag::Table);
                        self.reset_insertion_mode_appropriately();
                    } else {
                        self.parse_error("unexpected-end-tag");
                    }

                    return Step::Done;
                }

                if tag_is_one_of!(
                    hash,
                    [Body, Caption, Col, Colgroup, Html, Tbody, Td, Tfoot, Th, Thead, Tr]
                ) {
                    self.parse_error("unexpected-end-tag");
                    return Step::Done;
                }

                if hash == Tag::Template {
                    return self.in_head_mode(token);
                }
            }
            TokenKind::EndOfFile => return self.in_body_mode(token),
            _ => (),
        }

        self.parse_error("unexpected-token-implies-table-voodoo");
        self.process_with_foster_parenting(token);

        Step::Done
    }

    /// Processes the token using the in body rules with the insertion point
    /// moved in front of the table.
    fn process_with_foster_parenting(&mut self, token: &mut AtomicToken) {
        self.foster_parenting = true;

        if let Step::Reprocess = self.in_body_mode(token) {
            self.process_token(token);
        }

        self.foster_parenting = false;
    }

    pub(super) fn in_table_text_mode(&mut self, token: &mut AtomicToken) -> Step {
        if token.kind() == TokenKind::Character {
            self.pending_table_text.push_str(token.character_data());
            return Step::Done;
        }

        let text = mem::take(&mut self.pending_table_text);

        if is_all_whitespace(&text) {
            self.insert_text(&text);
        } else {
            self.parse_error("unexpected-char-implies-table-voodoo");

            let mut characters = AtomicToken::characters(text, token.position());

            self.process_with_foster_parenting(&mut characters);
        }

        self.mode = self.original_mode;

        Step::Reprocess
    }

    /// Closes the caption. Returns `false` if there is no caption in table
    /// scope.
    fn close_caption(&mut self) -> bool {
        if !self.open_elements.has_in_scope(Tag::Caption, Scope::Table) {
            self.parse_error("unexpected-end-tag");
            return false;
        }

        self.generate_implied_end_tags(None);

        if !self.current_node_is(Tag::Caption) {
            self.parse_error("expected-one-end-tag-but-got-another");
        }

        self.open_elements.pop_until(Tag::Caption);
        self.formatting.clear_to_last_marker();
        self.mode = InsertionMode::InTable;

        true
    }

    pub(super) fn in_caption_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::EndTag if hash == Tag::Caption => {
                self.close_caption();
                Step::Done
            }
            TokenKind::StartTag
                if tag_is_one_of!(
                    hash,
                    [Caption, Col, Colgroup, Tbody, Td, Tfoot, Th, Thead, Tr]
                ) =>
            {
                if self.close_caption() {
                    Step::Reprocess
                } else {
                    Step::Done
                }
            }
            TokenKind::EndTag if hash == Tag::Table => {
                if self.close_caption() {
                    Step::Reprocess
                } else {
                    Step::Done
                }
            }
            TokenKind::EndTag
                if tag_is_one_of!(
                    hash,
                    [Body, Col, Colgroup, Html, Tbody, Td, Tfoot, Th, Thead, Tr]
                ) =>
            {
                self.parse_error("unexpected-end-tag");
                Step::Done
            }
            _ => self.in_body_mode(token),
        }
    }

    pub(super) fn in_column_group_mode(&mut self, token: &mut AtomicToken) -> Step {
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
            TokenKind::StartTag if hash == Tag::Html => return self.in_body_mode(token),
            TokenKind::StartTag if hash == Tag::Col => {
                self.insert_void_html_element(token);
                return Step::Done;
            }
            TokenKind::StartTag | TokenKind::EndTag if hash == Tag::Template => {
                return self.in_head_mode(token);
            }
            TokenKind::EndTag if hash == Tag::Colgroup => {
                if self.current_node_is(Tag::Colgroup) {
                    self.open_elements.pop();
                    self.mode = InsertionMode::InTable;
                } else {
                    self.parse_error("unexpected-end-tag");
                }

                return Step::Done;
            }
            TokenKind::EndTag if hash == Tag::Col => {
                self.parse_error("no-end-tag");
                return Step::Done;
            }
            TokenKind::EndOfFile => return self.in_body_mode(token),
            _ => (),
        }

        if !self.current_node_is(Tag::Colgroup) {
            self.parse_error("unexpected-token-in-column-group");
            return Step::Done;
        }

        self.open_elements.pop();
        self.mode = InsertionMode::InTable;

        Step::Reprocess
    }

    fn has_table_section_in_table_scope(&self) -> bool {
        self.open_elements.has_in_scope(Tag::Tbody, Scope::Table)
            || self.open_elements.has_in_scope(Tag::Thead, Scope::Table)
            || self.open_elements.has_in_scope(Tag::Tfoot, Scope::Table)
    }

    pub(super) fn in_table_body_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::StartTag if hash == Tag::Tr => {
                self.open_elements.clear_back_to_table_body_context();
                self.insert_html_element(token);
                self.mode = InsertionMode::InRow;

                Step::Done
            }
            TokenKind::StartTag if tag_is_one_of!(hash, [Td, Th]) => {
                self.parse_error("unexpected-cell-in-table-body");
                self.open_elements.clear_back_to_table_body_context();
                self.insert_fake_html_element(Tag::Tr);
                self.mode = InsertionMode::InRow;

                Step::Reprocess
            }
            TokenKind::EndTag if tag_is_one_of!(hash, [Tbody, Tfoot, Thead]) => {
                if self.open_elements.has_hash_in_scope(hash, Scope::Table) {
                    self.open_elements.clear_back_to_table_body_context();
                    self.open_elements.pop();
                    self.mode = InsertionMode::InTable;
                } else {
                    self.parse_error("unexpected-end-tag-in-table-body");
                }

                Step::Done
            }
            TokenKind::StartTag
                if tag_is_one_of!(hash, [Caption, Col, Colgroup, Tbody, Tfoot, Thead]) =>
            {
                self.close_table_section()
            }
            TokenKind::EndTag if hash == Tag::Table => self.close_table_section(),
            TokenKind::EndTag
                if tag_is_one_of!(hash, [Body, Caption, Col, Colgroup, Html, Td, Th, Tr]) =>
            {
                self.parse_error("unexpected-end-tag-in-table-body");
                Step::Done
            }
            _ => self.in_table_mode(token),
        }
    }

    fn close_table_section(&mut self) -> Step {
        if !self.has_table_section_in_table_scope() {
            self.parse_error("unexpected-token-in-table-body");
            return Step::Done;
        }

        self.open_elements.clear_back_to_table_body_context();
        self.open_elements.pop();
        self.mode = InsertionMode::InTable;

        Step::Reprocess
    }

    /// Closes the current row. Returns `false` if there is no row in table
    /// scope.
    fn close_row(&mut self) -> bool {
        if !self.open_elements.has_in_scope(Tag::Tr, Scope::Table) {
            self.parse_error("unexpected-token-in-table-row");
            return false;
        }

        self.open_elements.clear_back_to_table_row_context();
        self.open_elements.pop();
        self.mode = InsertionMode::InTableBody;

        true
    }

    pub(super) fn in_row_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::StartTag if tag_is_one_of!(hash, [Td, Th]) => {
                self.open_elements.clear_back_to_table_row_context();
                self.insert_html_element(token);
                self.mode = InsertionMode::InCell;
                self.formatting.push_marker();

                Step::Done
            }
            TokenKind::EndTag if hash == Tag::Tr => {
                self.close_row();
                Step::Done
            }
            TokenKind::StartTag
                if tag_is_one_of!(hash, [Caption, Col, Colgroup, Tbody, Tfoot, Thead, Tr]) =>
            {
                if self.close_row() {
                    Step::Reprocess
                } else {
                    Step::Done
                }
            }
            TokenKind::EndTag if hash == Tag::Table => {
                if self.close_row() {
                    Step::Reprocess
                } else {
                    Step::Done
                }
            }
            TokenKind::EndTag if tag_is_one_of!(hash, [Tbody, Tfoot, Thead]) => {
                if !self.open_elements.has_hash_in_scope(hash, Scope::Table) {
                    self.parse_error("unexpected-end-tag-in-table-row");
                    return Step::Done;
                }

                if self.close_row() {
                    Step::Reprocess
                } else {
                    Step::Done
                }
            }
            TokenKind::EndTag
                if tag_is_one_of!(hash, [Body, Caption, Col, Colgroup, Html, Td, Th]) =>
            {
                self.parse_error("unexpected-end-tag-in-table-row");
                Step::Done
            }
            _ => self.in_table_mode(token),
        }
    }

    fn close_cell(&mut self) {
        self.generate_implied_end_tags(None);

        if !(self.current_node_is(Tag::Td) || self.current_node_is(Tag::Th)) {
            self.parse_error("unexpected-cell-end-tag");
        }

        self.open_elements
            .pop_while_not(|r| r.is(Tag::Td) || r.is(Tag::Th));
        self.open_elements.pop();
        self.formatting.clear_to_last_marker();
        self.mode = InsertionMode::InRow;
    }

    pub(super) fn in_cell_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::EndTag if tag_is_one_of!(hash, [Td, Th]) => {
                if !self.open_elements.has_hash_in_scope(hash, Scope::Table) {
                    self.parse_error("unexpected-end-tag");
                    return Step::Done;
                }

                self.generate_implied_end_tags(None);

                if !self.current_node().is_some_and(|r| r.is_html() && r.hash == hash) {
                    self.parse_error("unexpected-cell-end-tag");
                }

                self.open_elements.pop_until_hash(hash);
                self.formatting.clear_to_last_marker();
                self.mode = InsertionMode::InRow;

                Step::Done
            }
            TokenKind::StartTag
                if tag_is_one_of!(
                    hash,
                    [Caption, Col, Colgroup, Tbody, Td, Tfoot, Th, Thead, Tr]
                ) =>
            {
                if !self.open_elements.has_in_scope(Tag::Td, Scope::Table)
                    && !self.open_elements.has_in_scope(Tag::Th, Scope::Table)
                {
                    self.parse_error("unexpected-start-tag");
                    return Step::Done;
                }

                self.close_cell();
                Step::Reprocess
            }
            TokenKind::EndTag if tag_is_one_of!(hash, [Body, Caption, Col, Colgroup, Html]) => {
                self.parse_error("unexpected-end-tag");
                Step::Done
            }
            TokenKind::EndTag if tag_is_one_of!(hash, [Table, Tbody, Tfoot, Thead, Tr]) => {
                if !self.open_elements.has_hash_in_scope(hash, Scope::Table) {
                    self.parse_error("unexpected-end-tag");
                    return Step::Done;
                }

                self.close_cell();
                Step::Reprocess
            }
            _ => self.in_body_mode(token),
        }
    }
}
