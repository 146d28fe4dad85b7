use super::open_elements::Scope;
use super::{InsertionMode, Step, TreeBuilder, TreeSink};
use crate::html::Tag;
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;

impl<S: TreeSink> TreeBuilder<S> {
    fn close_select(&mut self) -> bool {
        if !self.open_elements.has_in_scope(Tag::Select, Scope::Select) {
            return false;
        }

        self.open_elements.pop_until(Tag::Select);
        self.reset_insertion_mode_appropriately();

        true
    }

    pub(super) fn in_select_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character => self.insert_text(token.character_data()),
            TokenKind::Comment => self.insert_comment(token),
            TokenKind::Doctype => self.parse_error("unexpected-doctype"),
            TokenKind::StartTag => {
                if hash == Tag::Html {
                    return self.in_body_mode(token);
                } else if hash == Tag::Option {
                    if self.current_node_is(Tag::Option) {
                        self.open_elements.pop();
                    }

                    self.insert_html_element(token);
                } else if hash == Tag::Optgroup {
                    if self.current_node_is(Tag::Option) {
                        self.open_elements.pop();
                    }

                    if self.current_node_is(Tag::Optgroup) {
                        self.open_elements.pop();
                    }

                    self.insert_html_element(token);
                } else if hash == Tag::Select {
                    self.parse_error("unexpected-select-in-select");
                    self.close_select();
                } else if tag_is_one_of!(hash, [Input, Keygen, Textarea]) {
                    self.parse_error("unexpected-input-in-select");

                    if self.close_select() {
                        return Step::Reprocess;
                    }
                } else if tag_is_one_of!(hash, [Script, Template]) {
                    return self.in_head_mode(token);
                } else {
                    self.parse_error("unexpected-start-tag-in-select");
                }
            }
            TokenKind::EndTag => {
                if hash == Tag::Optgroup {
                    let option_in_optgroup = self.current_node_is(Tag::Option)
                        && self
                            .open_elements
                            .len()
                            .checked_sub(2)
                            .and_then(|idx| self.open_elements.get(idx))
                            .is_some_and(|r| r.is(Tag::Optgroup));

                    if option_in_optgroup {
                        self.open_elements.pop();
                    }

                    if self.current_node_is(Tag::Optgroup) {
                        self.open_elements.pop();
                    } else {
                        self.parse_error("unexpected-end-tag-in-select");
                    }
                } else if hash == Tag::Option {
                    if self.current_node_is(Tag::Option) {
                        self.open_elements.pop();
                    } else {
                        self.parse_error("unexpected-end-tag-in-select");
                    }
                } else if hash == Tag::Select {
                    if !self.close_select() {
                        self.parse_error("unexpected-end-tag");
                    }
                } else if hash == Tag::Template {
                    return self.in_head_mode(token);
                } else {
                    self.parse_error("unexpected-end-tag-in-select");
                }
            }
            TokenKind::EndOfFile => return self.in_body_mode(token),
            TokenKind::Uninitialized => (),
        }

        Step::Done
    }

    pub(super) fn in_select_in_table_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();
        let is_table_tag = tag_is_one_of!(hash, [Caption, Table, Tbody, Tfoot, Thead, Tr, Td, Th]);

        match token.kind() {
            TokenKind::StartTag if is_table_tag => {
                self.parse_error("unexpected-table-element-start-tag-in-select-in-table");
                self.open_elements.pop_until(Tag::Select);
                self.reset_insertion_mode_appropriately();

                Step::Reprocess
            }
            TokenKind::EndTag if is_table_tag => {
                self.parse_error("unexpected-table-element-end-tag-in-select-in-table");

                if !self.open_elements.has_hash_in_scope(hash, Scope::Table) {
                    return Step::Done;
                }

                self.open_elements.pop_until(Tag::Select);
                self.reset_insertion_mode_appropriately();

                Step::Reprocess
            }
            _ => self.in_select_mode(token),
        }
    }

    fn switch_template_mode(&mut self, mode: InsertionMode) -> Step {
        self.template_modes.pop();
        self.template_modes.push(mode);
        self.mode = mode;

        Step::Reprocess
    }

    pub(super) fn template_contents_mode(&mut self, token: &mut AtomicToken) -> Step {
        let hash = token.name_hash();

        match token.kind() {
            TokenKind::Character | TokenKind::Comment | TokenKind::Doctype => {
                self.in_body_mode(token)
            }
            TokenKind::StartTag => {
                if tag_is_one_of!(
                    hash,
                    [Base, Basefont, Bgsound, Link, Meta, Noframes, Script, Style, Template, Title]
                ) {
                    self.in_head_mode(token)
                } else if tag_is_one_of!(hash, [Caption, Colgroup, Tbody, Tfoot, Thead]) {
                    self.switch_template_mode(InsertionMode::InTable)
                } else if hash == Tag::Col {
                    self.switch_template_mode(InsertionMode::InColumnGroup)
                } else if hash == Tag::Tr {
                    self.switch_template_mode(InsertionMode::InTableBody)
                } else if tag_is_one_of!(hash, [Td, Th]) {
                    self.switch_template_mode(InsertionMode::InRow)
                } else {
                    self.switch_template_mode(InsertionMode::InBody)
                }
            }
            TokenKind::EndTag if hash == Tag::Template => self.in_head_mode(token),
            TokenKind::EndTag => {
                self.parse_error("unexpected-end-tag-in-template");
                Step::Done
            }
            TokenKind::EndOfFile => {
                if !self.open_elements.contains_tag(Tag::Template) {
                    self.stop_parsing();
                    return Step::Done;
                }

                self.parse_error("eof-in-template");
                self.open_elements.pop_until(Tag::Template);
                self.formatting.clear_to_last_marker();
                self.template_modes.pop();
                self.reset_insertion_mode_appropriately();

                Step::Reprocess
            }
            TokenKind::Uninitialized => Step::Done,
        }
    }
}
