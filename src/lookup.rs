//! Field-name lookup for the schema matcher: names shorter than 9 bytes go
//! into a byte trie, longer names into a map. Built once per record shape
//! and read-only afterwards.

use std::collections::HashMap;

const TRIE_MAX_LEN: usize = 8;

#[derive(Debug)]
pub(crate) struct FieldLookup {
    trie: Trie,
    long: HashMap<String, usize>,
}

impl FieldLookup {
    pub(crate) fn build<'a>(names: impl Iterator<Item = &'a str>) -> FieldLookup {
        let mut lookup = FieldLookup {
            trie: Trie::new(),
            long: HashMap::new(),
        };
        for (idx, name) in names.enumerate() {
            if name.len() <= TRIE_MAX_LEN {
                lookup.trie.insert(name.as_bytes(), idx);
            } else {
                lookup.long.insert(name.to_string(), idx);
            }
        }
        lookup
    }

    pub(crate) fn get(&self, name: &str) -> Option<usize> {
        if name.len() <= TRIE_MAX_LEN {
            self.trie.get(name.as_bytes())
        } else {
            self.long.get(name).copied()
        }
    }
}

#[derive(Debug)]
struct Trie {
    nodes: Vec<Node>,
}

#[derive(Debug, Default)]
struct Node {
    children: Vec<(u8, u32)>,
    value: Option<usize>,
}

impl Trie {
    fn new() -> Trie {
        Trie {
            nodes: vec![Node::default()],
        }
    }

    fn insert(&mut self, key: &[u8], value: usize) {
        let mut at = 0usize;
        for &b in key {
            at = match self.nodes[at].children.iter().find(|(c, _)| *c == b) {
                Some((_, next)) => *next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[at].children.push((b, next as u32));
                    next
                }
            };
        }
        self.nodes[at].value = Some(value);
    }

    fn get(&self, key: &[u8]) -> Option<usize> {
        let mut at = 0usize;
        for &b in key {
            let (_, next) = self.nodes[at].children.iter().find(|(c, _)| *c == b)?;
            at = *next as usize;
        }
        self.nodes[at].value
    }
}
