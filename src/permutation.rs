//! Exact integer permutations over sticker slots.
//!
//! Every turn, move sequence, and puzzle state reduces to a permutation of
//! sticker slot indices, so all state arithmetic stays in integers and never
//! drifts no matter how many turns are applied.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A permutation of slot indices.
///
/// Stored in "pull" form: `perm[new] = old`, i.e. the slot shown at `new`
/// takes its content from `old`. The identity maps every slot to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permutation(pub Vec<usize>);

impl Permutation {
    /// The identity permutation over `len` slots.
    pub fn identity(len: usize) -> Self {
        Permutation((0..len).collect())
    }

    /// Number of slots this permutation acts on.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every slot maps to itself.
    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &v)| i == v)
    }

    /// The permutation obtained by applying `self` first, then `next`.
    pub fn then(&self, next: &Permutation) -> Permutation {
        debug_assert_eq!(self.len(), next.len());
        Permutation(next.0.iter().map(|&mid| self.0[mid]).collect())
    }

    /// The inverse permutation: `p.then(&p.invert())` is the identity.
    pub fn invert(&self) -> Permutation {
        let mut inverted = vec![0; self.0.len()];
        for (new, &old) in self.0.iter().enumerate() {
            inverted[old] = new;
        }
        Permutation(inverted)
    }

    /// True if applying `other` after `self` restores every slot.
    pub fn is_inverse_of(&self, other: &Permutation) -> bool {
        self.0.iter().enumerate().all(|(new, &old)| other.0[old] == new)
    }

    /// Restricts the permutation to the masked slots; unmasked slots map to
    /// themselves. Used to compare net effects on a single piece type.
    pub fn mask(&self, mask: &[bool]) -> Permutation {
        debug_assert_eq!(mask.len(), self.0.len());
        Permutation(
            self.0
                .iter()
                .enumerate()
                .map(|(new, &old)| if mask[new] { old } else { new })
                .collect(),
        )
    }

    /// Number of slots not mapped to themselves.
    pub fn support_size(&self) -> usize {
        self.0.iter().enumerate().filter(|&(i, &v)| i != v).count()
    }

    /// Entries where `self` and `other` disagree.
    pub fn differences(&self, other: &Permutation) -> usize {
        debug_assert_eq!(self.len(), other.len());
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Decomposes into cycles of length >= 2, each listed starting from its
    /// smallest slot. Fixed slots are omitted.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.0.len()];
        let mut cycles = Vec::new();
        for start in 0..self.0.len() {
            if seen[start] || self.0[start] == start {
                continue;
            }
            let mut cycle = vec![start];
            seen[start] = true;
            let mut at = self.0[start];
            while at != start {
                seen[at] = true;
                cycle.push(at);
                at = self.0[at];
            }
            if cycle.len() > 1 {
                cycles.push(cycle);
            }
        }
        cycles
    }
}

/// A trie keyed by permutation entries, supporting exact and most-similar
/// lookup.
///
/// Each level of the trie corresponds to one slot; a path from the root
/// spells out `perm[0], perm[1], ...`. Most-similar search walks the trie
/// best-first by accumulated mismatch count, so results stream out in
/// ascending difference order without scanning the whole library.
#[derive(Debug)]
pub struct PermutationTrie<T> {
    root: TrieNode<T>,
    len: usize,
}

#[derive(Debug)]
struct TrieNode<T> {
    children: Vec<(usize, TrieNode<T>)>,
    value: Option<T>,
}

impl<T> TrieNode<T> {
    fn empty() -> Self {
        TrieNode {
            children: Vec::new(),
            value: None,
        }
    }
}

impl<T> PermutationTrie<T> {
    pub fn new() -> Self {
        PermutationTrie {
            root: TrieNode::empty(),
            len: 0,
        }
    }

    /// Number of stored permutations.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value` under `key`, replacing any existing entry.
    pub fn insert(&mut self, key: &Permutation, value: T) {
        let mut node = &mut self.root;
        for &entry in &key.0 {
            let found = node
                .children
                .iter()
                .position(|(child_entry, _)| *child_entry == entry);
            node = match found {
                Some(index) => &mut node.children[index].1,
                None => {
                    node.children.push((entry, TrieNode::empty()));
                    let last = node.children.len() - 1;
                    &mut node.children[last].1
                }
            };
        }
        if node.value.replace(value).is_none() {
            self.len += 1;
        }
    }

    /// Exact lookup.
    pub fn get(&self, key: &Permutation) -> Option<&T> {
        let mut node = &self.root;
        for &entry in &key.0 {
            let found = node
                .children
                .iter()
                .find(|(child_entry, _)| *child_entry == entry);
            node = match found {
                Some((_, child)) => child,
                None => return None,
            };
        }
        node.value.as_ref()
    }

    /// Streams stored entries in ascending order of how many slot mappings
    /// differ from `key`. An exact match comes out first with difference 0.
    pub fn most_similar<'a>(
        &'a self,
        key: &Permutation,
    ) -> impl Iterator<Item = (usize, &'a T)> + 'a {
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            node: &self.root,
            mismatches: 0,
            depth: 0,
        });
        SimilarIter {
            heap,
            key: key.clone(),
        }
    }
}

struct HeapEntry<'a, T> {
    node: &'a TrieNode<T>,
    mismatches: usize,
    depth: usize,
}

impl<T> Ord for HeapEntry<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on mismatch count
        self.mismatches.cmp(&other.mismatches).reverse()
    }
}

impl<T> PartialOrd for HeapEntry<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for HeapEntry<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.mismatches == other.mismatches
    }
}

impl<T> Eq for HeapEntry<'_, T> {}

struct SimilarIter<'a, T> {
    heap: BinaryHeap<HeapEntry<'a, T>>,
    key: Permutation,
}

impl<'a, T> Iterator for SimilarIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.heap.pop()?;
            for (slot_value, child) in &entry.node.children {
                self.heap.push(HeapEntry {
                    node: child,
                    mismatches: if *slot_value == self.key.0[entry.depth] {
                        entry.mismatches
                    } else {
                        entry.mismatches + 1
                    },
                    depth: entry.depth + 1,
                });
            }
            if let Some(value) = &entry.node.value {
                return Some((entry.mismatches, value));
            }
        }
    }
}

impl<T> Default for PermutationTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}
