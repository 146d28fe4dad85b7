use hashbrown::HashMap;

#[inline]
fn code_for(byte: u8) -> u8 {
    byte.to_ascii_lowercase() & 0x7F
}

/// A trie of every substring of a text that is at most `depth` characters
/// long.
///
/// `might_contain` never gives false negatives, so a `false` answer lets the
/// caller skip the linear search in large request bodies.
#[derive(Debug, Clone)]
pub struct SuffixTree {
    nodes: Vec<HashMap<u8, usize>>,
    depth: usize,
}

impl SuffixTree {
    pub fn new(text: &str, depth: usize) -> Self {
        let bytes = text.as_bytes();
        let mut tree = SuffixTree {
            nodes: vec![HashMap::new()],
            depth,
        };

        for start in 0..bytes.len() {
            let mut node = 0;

            for &byte in bytes[start..].iter().take(depth) {
                node = tree.child_or_insert(node, code_for(byte));
            }
        }

        tree
    }

    fn child_or_insert(&mut self, node: usize, code: u8) -> usize {
        if let Some(&child) = self.nodes[node].get(&code) {
            return child;
        }

        let child = self.nodes.len();

        self.nodes.push(HashMap::new());
        self.nodes[node].insert(code, child);

        child
    }

    pub fn might_contain(&self, query: &str) -> bool {
        let mut node = 0;

        for &byte in query.as_bytes().iter().take(self.depth) {
            match self.nodes[node].get(&code_for(byte)) {
                Some(&child) => node = child,
                None => return false,
            }
        }

        true
    }
}
