//! The adoption agency algorithm that repairs misnested formatting elements,
//! e.g. `<b><p>x</b>y</p>`.
use super::formatting::FormattingEntry;
use super::{TreeBuilder, TreeSink};
use crate::html::Namespace;
use crate::token::AtomicToken;

const OUTER_LOOP_LIMIT: usize = 8;
const INNER_LOOP_LIMIT: usize = 3;

impl<S: TreeSink> TreeBuilder<S> {
    /// Runs the algorithm for the tag name of the token. Returns `false` if
    /// there is no formatting element to close and the token should be
    /// handled like any other end tag instead.
    pub(super) fn run_adoption_agency(&mut self, token: &AtomicToken) -> bool {
        let hash = token.name_hash();
        let name = token.name();

        if let Some(current) = self.current_node() {
            let node = current.node;

            if current.is_html() && &*current.name == name && !self.formatting.contains(node) {
                self.open_elements.pop();
                return true;
            }
        }

        for _ in 0..OUTER_LOOP_LIMIT {
            let Some(formatting_element) = self.formatting.last_element_with_name(hash, name)
            else {
                return false;
            };

            let Some(formatting_idx) = self.open_elements.index_of(formatting_element) else {
                self.parse_error("adoption-agency-1.2");
                self.formatting.remove(formatting_element);

                return true;
            };

            if !self.open_elements.has_node_in_scope(formatting_element) {
                self.parse_error("adoption-agency-4.4");
                return true;
            }

            if self.open_elements.top().map(|r| r.node) != Some(formatting_element) {
                self.parse_error("adoption-agency-1.3");
            }

            let Some(furthest_block_idx) = self.open_elements.furthest_block_after(formatting_idx)
            else {
                self.open_elements.pop_until_node(formatting_element);
                self.formatting.remove(formatting_element);

                return true;
            };

            let common_ancestor_idx = formatting_idx.saturating_sub(1);
            let Some(furthest_block) = self.open_elements.get(furthest_block_idx).map(|r| r.node)
            else {
                return true;
            };

            let mut bookmark = self.formatting.index_of(formatting_element).unwrap_or(0);
            let mut node_idx = furthest_block_idx;
            let mut last_node = furthest_block;
            let mut inner_loop_counter = 0;

            loop {
                inner_loop_counter += 1;
                node_idx -= 1;

                let Some(node) = self.open_elements.get(node_idx).map(|r| r.node) else {
                    break;
                };

                if node == formatting_element {
                    break;
                }

                if inner_loop_counter > INNER_LOOP_LIMIT {
                    if let Some(idx) = self.formatting.index_of(node) {
                        self.formatting.remove_at(idx);

                        if idx < bookmark {
                            bookmark -= 1;
                        }
                    }
                }

                let Some(entry_idx) = self.formatting.index_of(node) else {
                    self.open_elements.remove(node);
                    continue;
                };

                let Some(FormattingEntry::Element { token, .. }) =
                    self.formatting.get(entry_idx).cloned()
                else {
                    continue;
                };

                let record = self.create_element_for(&token, Namespace::Html);
                let new_node = record.node;

                self.formatting.replace(entry_idx, new_node, token);
                self.open_elements.replace(node_idx, record);

                if last_node == furthest_block {
                    bookmark = entry_idx + 1;
                }

                self.sink.remove_from_parent(last_node);
                self.sink.append(new_node, last_node);

                last_node = new_node;
            }

            self.sink.remove_from_parent(last_node);

            let place = self.appropriate_place(Some(common_ancestor_idx));

            self.insert_node_at(place, last_node);

            let Some(token) = self.formatting.token_of(formatting_element).cloned() else {
                return true;
            };

            let record = self.create_element_for(&token, Namespace::Html);
            let new_element = record.node;

            self.sink.reparent_children(furthest_block, new_element);
            self.sink.append(furthest_block, new_element);

            if let Some(idx) = self.formatting.index_of(formatting_element) {
                self.formatting.remove_at(idx);

                if idx < bookmark {
                    bookmark -= 1;
                }
            }

            self.formatting
                .insert(bookmark.min(self.formatting.len()), new_element, token);

            self.open_elements.remove(formatting_element);

            if let Some(idx) = self.open_elements.index_of(furthest_block) {
                self.open_elements.insert(idx + 1, record);
            }
        }

        true
    }
}
