use std::{borrow::Cow, fmt::Display, io};

use itertools::Itertools;
use log::trace;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

pub const DEFAULT_INDEX_ORDER: usize = 4;

/// Leaf of an ordered index. `values` is strictly ascending and `keys[i]`
/// holds every key inserted under `values[i]`, oldest first.
///
/// `order` is the branching factor a multi-level tree would split at; a
/// single node never splits.
#[derive(Debug, Clone)]
pub struct IndexNode<V, K> {
    order: usize,
    values: Vec<V>,
    keys: Vec<Vec<K>>,
}

impl<V: Ord, K> IndexNode<V, K> {
    pub fn new(order: usize) -> Self {
        IndexNode {
            order,
            values: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: V, key: K) {
        match self.values.iter().find_position(|v| **v >= value) {
            Some((i, existing)) if *existing == value => {
                trace!("grouping key under existing value at {}", i);
                self.keys[i].push(key);
            }
            Some((i, _)) => {
                trace!("inserting value at {}", i);
                self.values.insert(i, value);
                self.keys.insert(i, vec![key]);
            }
            None => {
                trace!("appending value at {}", self.values.len());
                self.values.push(value);
                self.keys.push(vec![key]);
            }
        }
    }

    pub fn get(&self, value: &V) -> Option<&[K]> {
        self.values
            .binary_search(value)
            .ok()
            .map(|i| self.keys[i].as_slice())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&V, &[K])> {
        self.values
            .iter()
            .zip(self.keys.iter().map(|k| k.as_slice()))
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn keys(&self) -> &[Vec<K>] {
        &self.keys
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V: Ord + Display, K: Display> IndexNode<V, K> {
    pub fn pretty_print(&self, out: &mut impl io::Write) -> io::Result<()> {
        let entries = self
            .entries()
            .map(|(value, keys)| IndexItem::Entry {
                value: value.to_string(),
                keys: keys.iter().join(", "),
            })
            .collect();
        let root = IndexItem::Node {
            order: self.order,
            entries,
        };
        write_tree_with(&root, out, &PrintConfig::default())
    }
}

#[derive(Debug, Clone)]
enum IndexItem {
    Node { order: usize, entries: Vec<IndexItem> },
    Entry { value: String, keys: String },
}

impl TreeItem for IndexItem {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _: &Style) -> io::Result<()> {
        match self {
            IndexItem::Node { order, entries } => {
                write!(f, "Leaf-{} (order {})", entries.len(), order)
            }
            IndexItem::Entry { value, keys } => write!(f, "{} -> [{}]", value, keys),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            IndexItem::Node { entries, .. } => Cow::from(entries),
            IndexItem::Entry { .. } => Cow::from(vec![]),
        }
    }
}
