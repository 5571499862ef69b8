use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint-set forest over lazily introduced elements.
///
/// Elements are registered the first time they are seen, either explicitly through
/// [`insert`](Self::insert) or implicitly by [`union`](Self::union). Lookups use path
/// compression and unions are by size, giving amortized near-constant operations.
///
/// Registration order is remembered: [`groups`](Self::groups) lists groups by the
/// first-registered member of each group, and members in registration order, so the
/// output is deterministic for a fixed sequence of operations.
#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    slots: HashMap<T, usize>,
    elements: Vec<T>,
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl<T: Copy + Eq + Hash> Default for UnionFind<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> UnionFind<T> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            elements: Vec::new(),
            parent: Vec::new(),
            size: Vec::new(),
        }
    }

    /// Registers `element` as a singleton set if it is not known yet.
    pub fn insert(&mut self, element: T) -> usize {
        if let Some(&slot) = self.slots.get(&element) {
            return slot;
        }
        let slot = self.elements.len();
        self.slots.insert(element, slot);
        self.elements.push(element);
        self.parent.push(slot);
        self.size.push(1);
        slot
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: T) -> bool {
        self.slots.contains_key(&element)
    }

    /// Returns the representative of the set containing `element`, or `None` if the
    /// element was never introduced.
    pub fn find(&mut self, element: T) -> Option<T> {
        let slot = *self.slots.get(&element)?;
        let root = self.find_slot(slot);
        Some(self.elements[root])
    }

    /// Merges the sets containing `a` and `b`, introducing either element if needed.
    ///
    /// Returns `true` if two distinct sets were merged and `false` if `a` and `b` were
    /// already connected.
    pub fn union(&mut self, a: T, b: T) -> bool {
        let slot_a = self.insert(a);
        let slot_b = self.insert(b);
        let root_a = self.find_slot(slot_a);
        let root_b = self.find_slot(slot_b);
        if root_a == root_b {
            return false;
        }

        let (big, small) = if self.size[root_a] >= self.size[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }

    pub fn connected(&mut self, a: T, b: T) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// Partitions every registered element by representative.
    pub fn groups(&mut self) -> Vec<Vec<T>> {
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<T>> = Vec::new();
        for slot in 0..self.elements.len() {
            let root = self.find_slot(slot);
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.elements[slot]);
        }
        groups
    }

    fn find_slot(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }
}

/// Connected components of the graph given by `edges`.
///
/// Only elements that appear in at least one edge are part of the output. Components
/// are ordered by their first-seen element and list members in first-seen order.
pub fn connected_components<T, I>(edges: I) -> Vec<Vec<T>>
where
    T: Copy + Eq + Hash,
    I: IntoIterator<Item = (T, T)>,
{
    let mut forest = UnionFind::new();
    for (a, b) in edges {
        forest.union(a, b);
    }
    forest.groups()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_merges_sets_and_reports_redundant_edges() {
        let mut forest = UnionFind::new();
        assert!(forest.union(1, 2));
        assert!(forest.union(3, 4));
        assert!(forest.union(2, 3));
        assert!(!forest.union(1, 4));

        assert!(forest.connected(1, 4));
        assert_eq!(forest.len(), 4);
        assert_eq!(forest.find(1), forest.find(4));
    }

    #[test]
    fn find_returns_none_for_unknown_elements() {
        let mut forest: UnionFind<u32> = UnionFind::new();
        forest.insert(7);
        assert_eq!(forest.find(7), Some(7));
        assert_eq!(forest.find(8), None);
        assert!(!forest.connected(7, 8));
    }

    #[test]
    fn connected_components_groups_in_first_seen_order() {
        let edges = vec![(5, 6), (1, 2), (6, 7), (2, 3), (9, 9)];
        let components = connected_components(edges);
        assert_eq!(components, vec![vec![5, 6, 7], vec![1, 2, 3], vec![9]]);
    }

    #[test]
    fn connected_components_ignores_elements_without_edges() {
        let components: Vec<Vec<usize>> = connected_components(Vec::new());
        assert!(components.is_empty());
    }

    #[test]
    fn long_chains_collapse_into_a_single_component() {
        let edges: Vec<(usize, usize)> = (0..1000).map(|i| (i, i + 1)).collect();
        let components = connected_components(edges);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 1001);
        assert_eq!(components[0][0], 0);
        assert_eq!(components[0][1000], 1000);
    }

    #[test]
    fn groups_are_stable_under_repeated_calls() {
        let mut forest = UnionFind::new();
        forest.union('a', 'b');
        forest.insert('z');
        forest.union('c', 'a');
        let first = forest.groups();
        let second = forest.groups();
        assert_eq!(first, second);
        assert_eq!(first, vec![vec!['a', 'b', 'c'], vec!['z']]);
    }
}
