//! HTML tree construction.
//!
//! The tree builder consumes `AtomicToken`s and mutates a document through
//! the `TreeSink` trait. Every combination of insertion mode and token has
//! a recovery action, so construction never fails. Tokens that have to be
//! processed again in another mode go through an explicit trampoline loop
//! in `process_token`.
mod adoption_agency;
mod after_body;
mod before_body;
mod foreign_content;
mod foreign_names;
mod formatting;
mod in_body;
mod in_select;
mod in_table;
mod insertion_mode;
mod open_elements;
mod quirks;
mod sink;

use self::formatting::{ActiveFormattingElements, FormattingEntry};
use self::open_elements::{ElementRecord, OpenElements, Scope};
use crate::base::TextPosition;
use crate::html::{is_html_whitespace, Namespace, Tag, TextType};
use crate::token::AtomicToken;
use crate::tokenizer::TokenKind;
use std::sync::Arc;

pub use self::foreign_names::ForeignNameTables;
pub use self::insertion_mode::InsertionMode;
pub use self::sink::{NodeId, QuirksMode, TreeSink};

#[derive(Debug, Copy, Clone)]
pub struct TreeBuilderOptions {
    /// Whether `<noscript>` content is parsed as raw text.
    pub scripting_enabled: bool,
}

impl Default for TreeBuilderOptions {
    #[inline]
    fn default() -> Self {
        TreeBuilderOptions {
            scripting_enabled: true,
        }
    }
}

/// A parser-inserted script whose end tag has been processed. Tree
/// construction is paused until the script is taken and the host
/// resumes parsing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScriptToProcess {
    pub element: NodeId,
    pub position: TextPosition,
}

#[must_use]
enum Step {
    Done,
    Reprocess,
}

#[derive(Debug, Copy, Clone)]
enum InsertionPlace {
    Append(NodeId),
    Before(NodeId),
}

/// Splits off the leading whitespace of a character token.
fn take_leading_whitespace(token: &mut AtomicToken) -> String {
    let data = token.character_data_mut();
    let len = data.len() - data.trim_start_matches(is_html_whitespace).len();

    data.drain(..len).collect()
}

fn is_html_annotation_xml_encoding(token: &AtomicToken) -> bool {
    token.get_attribute("encoding").is_some_and(|encoding| {
        encoding.eq_ignore_ascii_case("text/html")
            || encoding.eq_ignore_ascii_case("application/xhtml+xml")
    })
}

pub struct TreeBuilder<S: TreeSink> {
    sink: S,
    tables: Arc<ForeignNameTables>,
    options: TreeBuilderOptions,
    mode: InsertionMode,
    original_mode: InsertionMode,
    template_modes: Vec<InsertionMode>,
    open_elements: OpenElements,
    formatting: ActiveFormattingElements,
    head: Option<NodeId>,
    form: Option<NodeId>,
    frameset_ok: bool,
    foster_parenting: bool,
    skip_leading_newline: bool,
    quirks_mode: QuirksMode,
    pending_table_text: String,
    requested_text_state: Option<TextType>,
    script_to_process: Option<ScriptToProcess>,
    script_start_position: TextPosition,
    parse_error_count: usize,
    stopped: bool,
}

impl<S: TreeSink> TreeBuilder<S> {
    pub fn new(sink: S, options: TreeBuilderOptions, tables: Arc<ForeignNameTables>) -> Self {
        TreeBuilder {
            sink,
            tables,
            options,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            template_modes: Vec::new(),
            open_elements: OpenElements::default(),
            formatting: ActiveFormattingElements::default(),
            head: None,
            form: None,
            frameset_ok: true,
            foster_parenting: false,
            skip_leading_newline: false,
            quirks_mode: QuirksMode::NoQuirks,
            pending_table_text: String::new(),
            requested_text_state: None,
            script_to_process: None,
            script_start_position: TextPosition::default(),
            parse_error_count: 0,
            stopped: false,
        }
    }

    #[inline]
    pub fn insertion_mode(&self) -> InsertionMode {
        self.mode
    }

    /// The insertion mode text and table text content returns to.
    #[inline]
    pub fn original_insertion_mode(&self) -> InsertionMode {
        self.original_mode
    }

    #[inline]
    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    #[inline]
    pub fn parse_error_count(&self) -> usize {
        self.parse_error_count
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// `true` once the end of file token has been processed.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.stopped
    }

    /// Namespaces and names of the open elements from the bottom of the
    /// stack to its top, each paired with whether the element's content is
    /// parsed as HTML.
    pub fn open_element_namespaces(
        &self,
    ) -> impl Iterator<Item = (Namespace, &str, bool)> + '_ {
        self.open_elements.iter().map(|r| {
            (
                r.namespace,
                &*r.name,
                r.html_integration_point || r.is_math_ml_text_integration_point(),
            )
        })
    }

    /// Whether the adjusted current node is an SVG or MathML element, in
    /// which case the tokenizer should recognize CDATA sections.
    #[inline]
    pub fn adjusted_current_node_is_foreign(&self) -> bool {
        self.open_elements.top().is_some_and(|r| !r.is_html())
    }

    /// The text parsing state the last processed token switches the
    /// tokenizer to, if any.
    #[inline]
    pub fn take_requested_text_state(&mut self) -> Option<TextType> {
        self.requested_text_state.take()
    }

    #[inline]
    pub fn has_parser_blocking_script(&self) -> bool {
        self.script_to_process.is_some()
    }

    #[inline]
    pub fn take_script_to_process(&mut self) -> Option<ScriptToProcess> {
        self.script_to_process.take()
    }

    pub fn construct_tree(&mut self, mut token: AtomicToken) {
        if self.stopped || token.kind() == TokenKind::Uninitialized {
            return;
        }

        if token.kind() == TokenKind::Character {
            if self.skip_leading_newline {
                let data = token.character_data_mut();

                if data.starts_with('\n') {
                    data.remove(0);
                }
            }

            if token.character_data().is_empty() {
                return;
            }
        }

        self.skip_leading_newline = false;
        self.process_token(&mut token);
    }

    fn process_token(&mut self, token: &mut AtomicToken) {
        loop {
            let step = if self.should_process_in_foreign_content(token) {
                self.process_in_foreign_content(token)
            } else {
                self.process_in_mode(self.mode, token)
            };

            if let Step::Done = step {
                break;
            }
        }
    }

    fn process_in_mode(&mut self, mode: InsertionMode, token: &mut AtomicToken) -> Step {
        trace!(@mode mode, token);

        match mode {
            InsertionMode::Initial => self.initial_mode(token),
            InsertionMode::BeforeHtml => self.before_html_mode(token),
            InsertionMode::BeforeHead => self.before_head_mode(token),
            InsertionMode::InHead => self.in_head_mode(token),
            InsertionMode::InHeadNoscript => self.in_head_noscript_mode(token),
            InsertionMode::AfterHead => self.after_head_mode(token),
            InsertionMode::InBody => self.in_body_mode(token),
            InsertionMode::Text => self.text_mode(token),
            InsertionMode::InTable => self.in_table_mode(token),
            InsertionMode::InTableText => self.in_table_text_mode(token),
            InsertionMode::InCaption => self.in_caption_mode(token),
            InsertionMode::InColumnGroup => self.in_column_group_mode(token),
            InsertionMode::InTableBody => self.in_table_body_mode(token),
            InsertionMode::InRow => self.in_row_mode(token),
            InsertionMode::InCell => self.in_cell_mode(token),
            InsertionMode::InSelect => self.in_select_mode(token),
            InsertionMode::InSelectInTable => self.in_select_in_table_mode(token),
            InsertionMode::AfterBody => self.after_body_mode(token),
            InsertionMode::InFrameset => self.in_frameset_mode(token),
            InsertionMode::AfterFrameset => self.after_frameset_mode(token),
            InsertionMode::AfterAfterBody => self.after_after_body_mode(token),
            InsertionMode::AfterAfterFrameset => self.after_after_frameset_mode(token),
            InsertionMode::TemplateContents => self.template_contents_mode(token),
        }
    }

    fn parse_error(&mut self, message: &'static str) {
        self.parse_error_count += 1;
        log::trace!("Parse error in {:?}: {message}", self.mode);
        self.sink.parse_error(message);
    }

    fn stop_parsing(&mut self) {
        self.open_elements.truncate(0);

        if !self.stopped {
            self.stopped = true;
            self.sink.finished();
        }
    }

    #[inline]
    fn current_node(&self) -> Option<&ElementRecord> {
        self.open_elements.top()
    }

    #[inline]
    fn current_node_is(&self, tag: Tag) -> bool {
        self.open_elements.top_is(tag)
    }

    // Insertion
    fn place_in(&mut self, record_idx: usize) -> InsertionPlace {
        match self.open_elements.get(record_idx) {
            Some(record) if record.is(Tag::Template) => {
                let node = record.node;

                InsertionPlace::Append(self.sink.template_contents(node))
            }
            Some(record) => InsertionPlace::Append(record.node),
            None => InsertionPlace::Append(self.sink.document()),
        }
    }

    fn foster_parent_place(&mut self) -> InsertionPlace {
        let last_template = self.open_elements.last_index_of(Tag::Template);
        let last_table = self.open_elements.last_index_of(Tag::Table);

        match (last_template, last_table) {
            (Some(template), table) if table.map_or(true, |table| template > table) => {
                self.place_in(template)
            }
            (_, None) => self.place_in(0),
            (_, Some(table)) => {
                let table_node = self.open_elements.get(table).map(|r| r.node);

                match table_node {
                    Some(node) if self.sink.parent(node).is_some() => InsertionPlace::Before(node),
                    _ => self.place_in(table.saturating_sub(1)),
                }
            }
        }
    }

    /// The appropriate place for inserting a node, optionally overriding
    /// the target with the element at the given stack index.
    fn appropriate_place(&mut self, override_target: Option<usize>) -> InsertionPlace {
        if self.open_elements.is_empty() {
            return InsertionPlace::Append(self.sink.document());
        }

        let target = override_target.unwrap_or(self.open_elements.len() - 1);

        let needs_foster_parenting = self.foster_parenting
            && self.open_elements.get(target).is_some_and(|r| {
                r.is_html() && tag_is_one_of!(r.hash, [Table, Tbody, Tfoot, Thead, Tr])
            });

        if needs_foster_parenting {
            self.foster_parent_place()
        } else {
            self.place_in(target)
        }
    }

    fn insert_node_at(&mut self, place: InsertionPlace, node: NodeId) {
        match place {
            InsertionPlace::Append(parent) => self.sink.append(parent, node),
            InsertionPlace::Before(sibling) => self.sink.insert_before(sibling, node),
        }
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        match self.appropriate_place(None) {
            InsertionPlace::Append(parent) => self.sink.append_text(parent, text),
            InsertionPlace::Before(sibling) => self.sink.insert_text_before(sibling, text),
        }
    }

    fn insert_comment(&mut self, token: &AtomicToken) {
        let place = self.appropriate_place(None);
        let comment = self.sink.create_comment(token.comment());

        self.insert_node_at(place, comment);
    }

    fn insert_comment_in(&mut self, parent: NodeId, token: &AtomicToken) {
        let comment = self.sink.create_comment(token.comment());

        self.sink.append(parent, comment);
    }

    fn create_element_for(&mut self, token: &AtomicToken, ns: Namespace) -> ElementRecord {
        let node = self.sink.create_element(token.name(), ns, token.attributes());
        let mut record = ElementRecord::new(node, token.name(), ns);

        record.html_integration_point = match ns {
            Namespace::Html => false,
            Namespace::Svg => tag_is_one_of!(record.hash, [ForeignObject, Desc, Title]),
            Namespace::MathML => {
                record.is_math_ml_annotation_xml() && is_html_annotation_xml_encoding(token)
            }
        };

        record
    }

    fn insert_element(&mut self, token: &AtomicToken, ns: Namespace) -> NodeId {
        let place = self.appropriate_place(None);
        let record = self.create_element_for(token, ns);
        let node = record.node;

        self.insert_node_at(place, node);
        self.open_elements.push(record);

        node
    }

    #[inline]
    fn insert_html_element(&mut self, token: &AtomicToken) -> NodeId {
        self.insert_element(token, Namespace::Html)
    }

    #[inline]
    fn insert_fake_html_element(&mut self, tag: Tag) -> NodeId {
        self.insert_html_element(&AtomicToken::start_tag(tag))
    }

    /// Inserts an element that can't have content and pops it right away.
    fn insert_void_html_element(&mut self, token: &AtomicToken) {
        self.insert_html_element(token);
        self.open_elements.pop();
    }

    fn insert_formatting_element(&mut self, token: &AtomicToken) {
        let node = self.insert_html_element(token);

        self.formatting.push(node, token.clone());
    }

    /// Switches to the text mode for elements whose content is raw text,
    /// RCDATA or script data.
    fn parse_text_element(&mut self, token: &AtomicToken, text_type: TextType) {
        self.insert_html_element(token);

        if token.is_tag(Tag::Script) {
            self.script_start_position = token.position();
        }

        self.requested_text_state = Some(text_type);
        self.original_mode = self.mode;
        self.mode = InsertionMode::Text;
    }

    // Stack manipulation
    fn generate_implied_end_tags(&mut self, except: Option<Tag>) {
        self.open_elements.pop_while_not(|r| {
            !r.has_implied_end_tag() || except.is_some_and(|tag| r.is(tag))
        });
    }

    fn generate_implied_end_tags_thoroughly(&mut self) {
        self.open_elements
            .pop_while_not(|r| !r.has_implied_end_tag_thoroughly());
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some(Tag::P));

        if !self.current_node_is(Tag::P) {
            self.parse_error("unexpected-open-element-when-closing-p");
        }

        self.open_elements.pop_until(Tag::P);
    }

    fn close_p_element_in_button_scope(&mut self) {
        if self.open_elements.has_in_scope(Tag::P, Scope::Button) {
            self.close_p_element();
        }
    }

    fn reconstruct_active_formatting_elements(&mut self) {
        let len = self.formatting.len();

        let is_open_or_marker = |this: &Self, idx: usize| match this.formatting.get(idx) {
            Some(FormattingEntry::Element { node, .. }) => this.open_elements.contains(*node),
            _ => true,
        };

        if len == 0 || is_open_or_marker(self, len - 1) {
            return;
        }

        let mut first = len - 1;

        while first > 0 && !is_open_or_marker(self, first - 1) {
            first -= 1;
        }

        for idx in first..len {
            let token = match self.formatting.get(idx) {
                Some(FormattingEntry::Element { token, .. }) => token.clone(),
                _ => continue,
            };

            let node = self.insert_html_element(&token);

            self.formatting.replace(idx, node, token);
        }
    }

    fn close_template_element(&mut self) {
        self.generate_implied_end_tags_thoroughly();

        if !self.current_node_is(Tag::Template) {
            self.parse_error("unexpected-open-element-when-closing-template");
        }

        self.open_elements.pop_until(Tag::Template);
        self.formatting.clear_to_last_marker();
        self.template_modes.pop();
        self.reset_insertion_mode_appropriately();
    }

    fn reset_insertion_mode_appropriately(&mut self) {
        let len = self.open_elements.len();

        for idx in (0..len).rev() {
            let Some(record) = self.open_elements.get(idx) else {
                continue;
            };

            let last = idx == 0;

            if !record.is_html() {
                if last {
                    break;
                }

                continue;
            }

            let hash = record.hash;

            let mode = if hash == Tag::Select {
                let in_table = self
                    .open_elements
                    .iter()
                    .take(idx)
                    .rev()
                    .take_while(|r| !r.is(Tag::Template))
                    .any(|r| r.is(Tag::Table));

                if in_table && !last {
                    InsertionMode::InSelectInTable
                } else {
                    InsertionMode::InSelect
                }
            } else if tag_is_one_of!(hash, [Td, Th]) && !last {
                InsertionMode::InCell
            } else if hash == Tag::Tr {
                InsertionMode::InRow
            } else if tag_is_one_of!(hash, [Tbody, Thead, Tfoot]) {
                InsertionMode::InTableBody
            } else if hash == Tag::Caption {
                InsertionMode::InCaption
            } else if hash == Tag::Colgroup {
                InsertionMode::InColumnGroup
            } else if hash == Tag::Table {
                InsertionMode::InTable
            } else if hash == Tag::Template {
                self.template_modes
                    .last()
                    .copied()
                    .unwrap_or(InsertionMode::TemplateContents)
            } else if hash == Tag::Head && !last {
                InsertionMode::InHead
            } else if hash == Tag::Body {
                InsertionMode::InBody
            } else if hash == Tag::Frameset {
                InsertionMode::InFrameset
            } else if hash == Tag::Html {
                if self.head.is_none() {
                    InsertionMode::BeforeHead
                } else {
                    InsertionMode::AfterHead
                }
            } else if last {
                InsertionMode::InBody
            } else {
                continue;
            };

            self.mode = mode;
            return;
        }

        self.mode = InsertionMode::InBody;
    }
}
