use super::NodeId;
use crate::html::{LocalNameHash, Namespace, Tag};

#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub node: NodeId,
    pub name: Box<str>,
    pub hash: LocalNameHash,
    pub namespace: Namespace,
    /// `true` for SVG and MathML elements whose content is parsed as HTML.
    pub html_integration_point: bool,
}

impl ElementRecord {
    pub fn new(node: NodeId, name: &str, namespace: Namespace) -> Self {
        ElementRecord {
            node,
            name: name.into(),
            hash: LocalNameHash::from(name),
            namespace,
            html_integration_point: false,
        }
    }

    /// An HTML element with the given tag name.
    #[inline]
    pub fn is(&self, tag: Tag) -> bool {
        self.namespace == Namespace::Html && self.hash == tag
    }

    #[inline]
    pub fn is_html(&self) -> bool {
        self.namespace == Namespace::Html
    }

    #[inline]
    pub fn is_math_ml_text_integration_point(&self) -> bool {
        self.namespace == Namespace::MathML && tag_is_one_of!(self.hash, [Mi, Mo, Mn, Ms, Mtext])
    }

    #[inline]
    pub fn is_math_ml_annotation_xml(&self) -> bool {
        self.namespace == Namespace::MathML && &*self.name == "annotation-xml"
    }

    #[inline]
    pub fn is_numbered_header(&self) -> bool {
        self.is_html() && tag_is_one_of!(self.hash, [H1, H2, H3, H4, H5, H6])
    }

    pub fn is_special(&self) -> bool {
        match self.namespace {
            Namespace::Html => tag_is_one_of!(
                self.hash,
                [
                    Address, Applet, Area, Article, Aside, Base, Basefont, Bgsound, Blockquote,
                    Body, Br, Button, Caption, Center, Col, Colgroup, Dd, Details, Dir, Div, Dl,
                    Dt, Embed, Fieldset, Figcaption, Figure, Footer, Form, Frame, Frameset, H1,
                    H2, H3, H4, H5, H6, Head, Header, Hgroup, Hr, Html, Iframe, Img, Input,
                    Keygen, Li, Link, Listing, Main, Marquee, Menu, Meta, Nav, Noembed,
                    Noframes, Noscript, Object, Ol, P, Param, Plaintext, Pre, Script, Section,
                    Select, Source, Style, Summary, Table, Tbody, Td, Template, Textarea, Tfoot,
                    Th, Thead, Title, Tr, Track, Ul, Wbr, Xmp
                ]
            ),
            Namespace::MathML => {
                self.is_math_ml_text_integration_point() || self.is_math_ml_annotation_xml()
            }
            Namespace::Svg => tag_is_one_of!(self.hash, [ForeignObject, Desc, Title]),
        }
    }

    fn is_scope_boundary(&self) -> bool {
        match self.namespace {
            Namespace::Html => tag_is_one_of!(
                self.hash,
                [Applet, Caption, Html, Table, Td, Th, Marquee, Object, Template]
            ),
            Namespace::MathML => {
                self.is_math_ml_text_integration_point() || self.is_math_ml_annotation_xml()
            }
            Namespace::Svg => tag_is_one_of!(self.hash, [ForeignObject, Desc, Title]),
        }
    }

    /// Elements that are closed by an end tag of another element without
    /// an error.
    #[inline]
    pub fn has_implied_end_tag(&self) -> bool {
        self.is_html()
            && tag_is_one_of!(
                self.hash,
                [Dd, Dt, Li, Optgroup, Option, P, Rb, Rp, Rt, Rtc]
            )
    }

    #[inline]
    pub fn has_implied_end_tag_thoroughly(&self) -> bool {
        self.has_implied_end_tag()
            || (self.is_html()
                && tag_is_one_of!(self.hash, [Caption, Colgroup, Tbody, Td, Tfoot, Th, Thead, Tr]))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

impl Scope {
    fn is_boundary(self, record: &ElementRecord) -> bool {
        match self {
            Scope::Default => record.is_scope_boundary(),
            Scope::ListItem => {
                record.is_scope_boundary() || record.is(Tag::Ol) || record.is(Tag::Ul)
            }
            Scope::Button => record.is_scope_boundary() || record.is(Tag::Button),
            Scope::Table => {
                record.is(Tag::Html) || record.is(Tag::Table) || record.is(Tag::Template)
            }
            Scope::Select => !(record.is(Tag::Optgroup) || record.is(Tag::Option)),
        }
    }
}

/// The stack of open elements. The bottommost element is at index 0.
#[derive(Debug, Default)]
pub struct OpenElements {
    stack: Vec<ElementRecord>,
}

impl OpenElements {
    #[inline]
    pub fn push(&mut self, record: ElementRecord) {
        self.stack.push(record);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<ElementRecord> {
        self.stack.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[inline]
    pub fn top(&self) -> Option<&ElementRecord> {
        self.stack.last()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&ElementRecord> {
        self.stack.get(idx)
    }

    #[inline]
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = &ElementRecord> + ExactSizeIterator + '_ {
        self.stack.iter()
    }

    #[inline]
    pub fn top_is(&self, tag: Tag) -> bool {
        self.top().is_some_and(|r| r.is(tag))
    }

    #[inline]
    pub fn html_element(&self) -> Option<NodeId> {
        self.stack.first().map(|r| r.node)
    }

    /// The `<body>` element, if it is the second element on the stack.
    #[inline]
    pub fn body_element(&self) -> Option<NodeId> {
        self.stack
            .get(1)
            .filter(|r| r.is(Tag::Body))
            .map(|r| r.node)
    }

    #[inline]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.stack.iter().rposition(|r| r.node == node)
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.index_of(node).is_some()
    }

    #[inline]
    pub fn last_index_of(&self, tag: Tag) -> Option<usize> {
        self.stack.iter().rposition(|r| r.is(tag))
    }

    #[inline]
    pub fn contains_tag(&self, tag: Tag) -> bool {
        self.last_index_of(tag).is_some()
    }

    pub fn remove(&mut self, node: NodeId) -> Option<ElementRecord> {
        let idx = self.index_of(node)?;

        Some(self.stack.remove(idx))
    }

    #[inline]
    pub fn insert(&mut self, idx: usize, record: ElementRecord) {
        self.stack.insert(idx, record);
    }

    #[inline]
    pub fn replace(&mut self, idx: usize, record: ElementRecord) {
        self.stack[idx] = record;
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    fn has_in_scope_matching(
        &self,
        scope: Scope,
        mut matches: impl FnMut(&ElementRecord) -> bool,
    ) -> bool {
        for record in self.stack.iter().rev() {
            if matches(record) {
                return true;
            }

            if scope.is_boundary(record) {
                return false;
            }
        }

        false
    }

    #[inline]
    pub fn has_in_scope(&self, tag: Tag, scope: Scope) -> bool {
        self.has_in_scope_matching(scope, |r| r.is(tag))
    }

    /// Like `has_in_scope`, for a tag name that is only known by its hash.
    #[inline]
    pub fn has_hash_in_scope(&self, hash: LocalNameHash, scope: Scope) -> bool {
        !hash.is_empty() && self.has_in_scope_matching(scope, |r| r.is_html() && r.hash == hash)
    }

    #[inline]
    pub fn has_node_in_scope(&self, node: NodeId) -> bool {
        self.has_in_scope_matching(Scope::Default, |r| r.node == node)
    }

    #[inline]
    pub fn has_numbered_header_in_scope(&self) -> bool {
        self.has_in_scope_matching(Scope::Default, ElementRecord::is_numbered_header)
    }

    /// Pops elements until an HTML element with the tag name has been popped.
    pub fn pop_until(&mut self, tag: Tag) {
        while let Some(record) = self.stack.pop() {
            if record.is(tag) {
                break;
            }
        }
    }

    pub fn pop_until_hash(&mut self, hash: LocalNameHash) {
        while let Some(record) = self.stack.pop() {
            if record.is_html() && record.hash == hash {
                break;
            }
        }
    }

    pub fn pop_until_numbered_header(&mut self) {
        while let Some(record) = self.stack.pop() {
            if record.is_numbered_header() {
                break;
            }
        }
    }

    pub fn pop_until_node(&mut self, node: NodeId) {
        while let Some(record) = self.stack.pop() {
            if record.node == node {
                break;
            }
        }
    }

    /// Pops elements while the current node doesn't satisfy `stop`.
    pub fn pop_while_not(&mut self, mut stop: impl FnMut(&ElementRecord) -> bool) {
        while let Some(record) = self.stack.last() {
            if stop(record) {
                break;
            }

            self.stack.pop();
        }
    }

    pub fn clear_back_to_table_context(&mut self) {
        self.pop_while_not(|r| r.is(Tag::Table) || r.is(Tag::Template) || r.is(Tag::Html));
    }

    pub fn clear_back_to_table_body_context(&mut self) {
        self.pop_while_not(|r| {
            tag_is_one_of!(r.hash, [Tbody, Tfoot, Thead, Template, Html]) && r.is_html()
        });
    }

    pub fn clear_back_to_table_row_context(&mut self) {
        self.pop_while_not(|r| r.is(Tag::Tr) || r.is(Tag::Template) || r.is(Tag::Html));
    }

    /// The topmost special element above the element at `idx`.
    pub fn furthest_block_after(&self, idx: usize) -> Option<usize> {
        self.stack
            .iter()
            .enumerate()
            .skip(idx + 1)
            .find(|(_, r)| r.is_special())
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(names: &[(&str, Namespace)]) -> OpenElements {
        let mut stack = OpenElements::default();

        for (idx, (name, ns)) in names.iter().enumerate() {
            stack.push(ElementRecord::new(NodeId::new(idx), name, *ns));
        }

        stack
    }

    #[test]
    fn scopes() {
        let s = stack(&[
            ("html", Namespace::Html),
            ("body", Namespace::Html),
            ("p", Namespace::Html),
            ("button", Namespace::Html),
            ("span", Namespace::Html),
        ]);

        assert!(s.has_in_scope(Tag::P, Scope::Default));
        assert!(!s.has_in_scope(Tag::P, Scope::Button));
        assert!(s.has_in_scope(Tag::Body, Scope::Table));
        assert!(!s.has_in_scope(Tag::Li, Scope::ListItem));
    }

    #[test]
    fn foreign_elements_bound_scope() {
        let s = stack(&[
            ("html", Namespace::Html),
            ("p", Namespace::Html),
            ("svg", Namespace::Svg),
            ("foreignObject", Namespace::Svg),
        ]);

        assert!(!s.has_in_scope(Tag::P, Scope::Default));

        // NOTE: `p` in the SVG namespace is not an HTML paragraph.
        let s = stack(&[("html", Namespace::Html), ("p", Namespace::Svg)]);

        assert!(!s.has_in_scope(Tag::P, Scope::Default));
    }

    #[test]
    fn iterates_a_prefix_from_the_top() {
        let s = stack(&[
            ("html", Namespace::Html),
            ("table", Namespace::Html),
            ("template", Namespace::Html),
            ("select", Namespace::Html),
        ]);

        assert_eq!(s.iter().len(), 4);

        let below_select = s
            .iter()
            .take(3)
            .rev()
            .map(|r| &*r.name)
            .collect::<Vec<_>>();

        assert_eq!(below_select, ["template", "table", "html"]);
    }

    #[test]
    fn table_contexts() {
        let mut s = stack(&[
            ("html", Namespace::Html),
            ("table", Namespace::Html),
            ("tbody", Namespace::Html),
            ("tr", Namespace::Html),
            ("td", Namespace::Html),
        ]);

        s.clear_back_to_table_body_context();
        assert!(s.top_is(Tag::Tbody));

        s.clear_back_to_table_context();
        assert!(s.top_is(Tag::Table));
        assert_eq!(s.furthest_block_after(0), Some(1));
    }
}
