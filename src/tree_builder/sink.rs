use crate::html::Namespace;
use crate::token::Attribute;

/// A handle of a node owned by the tree sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    LimitedQuirks,
    Quirks,
}

/// The document the tree builder mutates.
///
/// The tree builder only ever refers to nodes by the handles the sink gives
/// out. Text inserted next to an existing text node is expected to be merged
/// into it.
pub trait TreeSink {
    fn document(&self) -> NodeId;

    fn create_element(&mut self, name: &str, ns: Namespace, attributes: &[Attribute]) -> NodeId;

    fn create_comment(&mut self, text: &str) -> NodeId;

    fn append_doctype(&mut self, name: &str, public_id: &str, system_id: &str);

    fn append(&mut self, parent: NodeId, child: NodeId);

    fn append_text(&mut self, parent: NodeId, text: &str);

    fn insert_before(&mut self, sibling: NodeId, child: NodeId);

    fn insert_text_before(&mut self, sibling: NodeId, text: &str);

    fn remove_from_parent(&mut self, node: NodeId);

    /// Moves all the children of `node` to the end of `new_parent`.
    fn reparent_children(&mut self, node: NodeId, new_parent: NodeId);

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is connected to the document. Template contents
    /// are not.
    fn is_attached(&self, node: NodeId) -> bool {
        let document = self.document();
        let mut current = Some(node);

        while let Some(id) = current {
            if id == document {
                return true;
            }

            current = self.parent(id);
        }

        false
    }

    fn add_attrs_if_missing(&mut self, element: NodeId, attributes: &[Attribute]);

    /// The document fragment holding the content of a `<template>` element.
    fn template_contents(&mut self, template: NodeId) -> NodeId;

    fn set_quirks_mode(&mut self, mode: QuirksMode);

    fn mark_script_already_started(&mut self, _script: NodeId) {}

    fn parse_error(&mut self, _message: &'static str) {}

    /// Called once when the document is complete.
    fn finished(&mut self) {}
}
