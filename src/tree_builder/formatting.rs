use super::NodeId;
use crate::html::LocalNameHash;
use crate::token::AtomicToken;

/// Maximum number of identical formatting elements after the last marker
/// (the "Noah's Ark" clause).
const IDENTICAL_ELEMENTS_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub enum FormattingEntry {
    Marker,
    Element { node: NodeId, token: AtomicToken },
}

impl FormattingEntry {
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            FormattingEntry::Marker => None,
            FormattingEntry::Element { node, .. } => Some(*node),
        }
    }
}

fn same_attributes(a: &AtomicToken, b: &AtomicToken) -> bool {
    let (a, b) = (a.attributes(), b.attributes());

    a.len() == b.len()
        && a.iter().all(|attr| {
            b.iter()
                .any(|other| other.name == attr.name && other.value == attr.value)
        })
}

/// The list of active formatting elements.
#[derive(Debug, Default)]
pub struct ActiveFormattingElements {
    entries: Vec<FormattingEntry>,
}

impl ActiveFormattingElements {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&FormattingEntry> {
        self.entries.get(idx)
    }

    #[inline]
    pub fn push_marker(&mut self) {
        self.entries.push(FormattingEntry::Marker);
    }

    fn entries_after_last_marker(&self) -> impl DoubleEndedIterator<Item = (usize, &FormattingEntry)> {
        let start = self
            .entries
            .iter()
            .rposition(|e| matches!(e, FormattingEntry::Marker))
            .map_or(0, |idx| idx + 1);

        self.entries.iter().enumerate().skip(start)
    }

    pub fn push(&mut self, node: NodeId, token: AtomicToken) {
        let identical: Vec<usize> = self
            .entries_after_last_marker()
            .filter(|(_, entry)| match entry {
                FormattingEntry::Element { token: other, .. } => {
                    other.name() == token.name() && same_attributes(other, &token)
                }
                FormattingEntry::Marker => false,
            })
            .map(|(idx, _)| idx)
            .collect();

        if identical.len() >= IDENTICAL_ELEMENTS_LIMIT {
            self.entries.remove(identical[0]);
        }

        self.entries.push(FormattingEntry::Element { node, token });
    }

    pub fn clear_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FormattingEntry::Marker) {
                break;
            }
        }
    }

    #[inline]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.entries.iter().rposition(|e| e.node() == Some(node))
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.index_of(node).is_some()
    }

    pub fn remove(&mut self, node: NodeId) {
        if let Some(idx) = self.index_of(node) {
            self.entries.remove(idx);
        }
    }

    #[inline]
    pub fn remove_at(&mut self, idx: usize) -> FormattingEntry {
        self.entries.remove(idx)
    }

    #[inline]
    pub fn insert(&mut self, idx: usize, node: NodeId, token: AtomicToken) {
        self.entries.insert(idx, FormattingEntry::Element { node, token });
    }

    #[inline]
    pub fn replace(&mut self, idx: usize, node: NodeId, token: AtomicToken) {
        self.entries[idx] = FormattingEntry::Element { node, token };
    }

    pub fn token_of(&self, node: NodeId) -> Option<&AtomicToken> {
        match self.entries.get(self.index_of(node)?) {
            Some(FormattingEntry::Element { token, .. }) => Some(token),
            _ => None,
        }
    }

    /// The last element with the tag name between the end of the list and
    /// the last marker.
    pub fn last_element_with_name(&self, hash: LocalNameHash, name: &str) -> Option<NodeId> {
        self.entries_after_last_marker()
            .rev()
            .find_map(|(_, entry)| match entry {
                FormattingEntry::Element { node, token }
                    if token.name_hash() == hash && token.name() == name =>
                {
                    Some(*node)
                }
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Tag;
    use crate::token::Attribute;

    fn b_with_class(class: &str) -> AtomicToken {
        let mut token = AtomicToken::start_tag(Tag::B);

        token.attributes_mut().push(Attribute::new("class", class));
        token
    }

    #[test]
    fn noahs_ark_clause() {
        let mut list = ActiveFormattingElements::default();

        for idx in 0..4 {
            list.push(NodeId::new(idx), b_with_class("x"));
        }

        list.push(NodeId::new(4), b_with_class("y"));

        assert_eq!(list.len(), 4);
        assert!(!list.contains(NodeId::new(0)));
        assert!(list.contains(NodeId::new(4)));
    }

    #[test]
    fn markers_bound_lookups() {
        let mut list = ActiveFormattingElements::default();
        let b = AtomicToken::start_tag(Tag::B);

        list.push(NodeId::new(0), b.clone());
        list.push_marker();

        assert_eq!(list.last_element_with_name(b.name_hash(), "b"), None);

        list.push(NodeId::new(1), b.clone());
        assert_eq!(
            list.last_element_with_name(b.name_hash(), "b"),
            Some(NodeId::new(1))
        );

        list.clear_to_last_marker();
        assert_eq!(list.len(), 1);
    }
}
