//! A minimal arena-backed document that implements `TreeSink`.
//!
//! Nodes live in a single vector and refer to each other by `NodeId`, so the
//! tree has no reference cycles and can be moved across threads once built.
mod serializer;

use crate::html::Namespace;
use crate::token::Attribute;
use crate::tree_builder::{NodeId, QuirksMode, TreeSink};

pub use self::serializer::serialize_for_test;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    DocumentFragment,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: String,
        namespace: Namespace,
        attributes: Vec<Attribute>,
        template_contents: Option<NodeId>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Node {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The local name if the node is an element.
    #[inline]
    pub fn element_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
    parse_errors: Vec<&'static str>,
    started_scripts: Vec<NodeId>,
    finished: bool,
}

impl Default for Dom {
    #[inline]
    fn default() -> Self {
        Dom::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Dom {
            nodes: vec![Node::new(NodeData::Document)],
            quirks_mode: QuirksMode::NoQuirks,
            parse_errors: Vec::new(),
            started_scripts: Vec::new(),
            finished: false,
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());

        self.nodes.push(Node::new(data));

        id
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.node(id).first_child;

        std::iter::from_fn(move || {
            let current = next?;

            next = self.node(current).next_sibling;

            Some(current)
        })
    }

    /// Elements of the document in tree order, template contents excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();

        stack.reverse();

        while let Some(node) = stack.pop() {
            result.push(node);

            let len = stack.len();

            stack.extend(self.children(node));
            stack[len..].reverse();
        }

        result
    }

    /// The first element with the given local name in tree order.
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|&id| self.node(id).element_name() == Some(name))
    }

    /// Concatenated text of the node's descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|id| match &self.node(id).data {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[inline]
    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    #[inline]
    pub fn parse_errors(&self) -> &[&'static str] {
        &self.parse_errors
    }

    #[inline]
    pub fn started_scripts(&self) -> &[NodeId] {
        &self.started_scripts
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);

            (node.parent, node.prev_sibling, node.next_sibling)
        };

        let Some(parent) = parent else {
            return;
        };

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let node = self.node_mut(id);

        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);

        let last = self.node(parent).last_child;

        {
            let node = self.node_mut(child);

            node.parent = Some(parent);
            node.prev_sibling = last;
        }

        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }

        self.node_mut(parent).last_child = Some(child);
    }

    fn insert_child_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some(parent) = self.node(sibling).parent else {
            return;
        };

        self.detach(child);

        let prev = self.node(sibling).prev_sibling;

        {
            let node = self.node_mut(child);

            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = Some(sibling);
        }

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }

        self.node_mut(sibling).prev_sibling = Some(child);
    }

    /// Appends text to the node if it is a text node.
    fn merge_text(&mut self, id: Option<NodeId>, text: &str) -> bool {
        let Some(id) = id else {
            return false;
        };

        match &mut self.node_mut(id).data {
            NodeData::Text(existing) => {
                existing.push_str(text);
                true
            }
            _ => false,
        }
    }
}

impl TreeSink for Dom {
    #[inline]
    fn document(&self) -> NodeId {
        NodeId::new(0)
    }

    fn create_element(&mut self, name: &str, ns: Namespace, attributes: &[Attribute]) -> NodeId {
        let template_contents = if ns == Namespace::Html && name == "template" {
            Some(self.push_node(NodeData::DocumentFragment))
        } else {
            None
        };

        self.push_node(NodeData::Element {
            name: name.to_string(),
            namespace: ns,
            attributes: attributes.to_vec(),
            template_contents,
        })
    }

    #[inline]
    fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Comment(text.to_string()))
    }

    fn append_doctype(&mut self, name: &str, public_id: &str, system_id: &str) {
        let doctype = self.push_node(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });

        self.append_child(self.document(), doctype);
    }

    #[inline]
    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.append_child(parent, child);
    }

    fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.node(parent).last_child;

        if !self.merge_text(last, text) {
            let node = self.push_node(NodeData::Text(text.to_string()));

            self.append_child(parent, node);
        }
    }

    #[inline]
    fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        self.insert_child_before(sibling, child);
    }

    fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        let prev = self.node(sibling).prev_sibling;

        if !self.merge_text(prev, text) {
            let node = self.push_node(NodeData::Text(text.to_string()));

            self.insert_child_before(sibling, node);
        }
    }

    #[inline]
    fn remove_from_parent(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn reparent_children(&mut self, node: NodeId, new_parent: NodeId) {
        while let Some(child) = self.node(node).first_child {
            self.append_child(new_parent, child);
        }
    }

    #[inline]
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn add_attrs_if_missing(&mut self, element: NodeId, new_attributes: &[Attribute]) {
        if let NodeData::Element { attributes, .. } = &mut self.node_mut(element).data {
            for attr in new_attributes {
                if attributes.iter().all(|existing| existing.name != attr.name) {
                    attributes.push(attr.clone());
                }
            }
        }
    }

    fn template_contents(&mut self, template: NodeId) -> NodeId {
        match &self.node(template).data {
            NodeData::Element {
                template_contents: Some(contents),
                ..
            } => *contents,
            _ => template,
        }
    }

    #[inline]
    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    #[inline]
    fn mark_script_already_started(&mut self, script: NodeId) {
        self.started_scripts.push(script);
    }

    #[inline]
    fn parse_error(&mut self, message: &'static str) {
        self.parse_errors.push(message);
    }

    #[inline]
    fn finished(&mut self) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_merged() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let p = dom.create_element("p", Namespace::Html, &[]);

        dom.append(doc, p);
        dom.append_text(p, "a");
        dom.append_text(p, "b");

        let b = dom.create_element("b", Namespace::Html, &[]);

        dom.append(p, b);
        dom.insert_text_before(b, "c");

        assert_eq!(dom.children(p).count(), 2);
        assert_eq!(dom.text_content(p), "abc");
    }

    #[test]
    fn nodes_move_between_parents() {
        let mut dom = Dom::new();
        let doc = dom.document();
        let a = dom.create_element("a", Namespace::Html, &[]);
        let b = dom.create_element("b", Namespace::Html, &[]);

        dom.append(doc, a);
        dom.append(doc, b);
        dom.append_text(a, "x");
        dom.reparent_children(a, b);

        assert_eq!(dom.children(a).count(), 0);
        assert_eq!(dom.text_content(b), "x");

        dom.insert_before(a, b);
        assert_eq!(dom.children(doc).collect::<Vec<_>>(), vec![b, a]);

        dom.remove_from_parent(b);
        assert_eq!(dom.children(doc).collect::<Vec<_>>(), vec![a]);
        assert_eq!(dom.parent(b), None);
    }

    #[test]
    fn templates_own_a_fragment() {
        let mut dom = Dom::new();
        let template = dom.create_element("template", Namespace::Html, &[]);
        let contents = dom.template_contents(template);

        assert_ne!(contents, template);
        assert_eq!(dom.node(contents).data, NodeData::DocumentFragment);
    }
}
