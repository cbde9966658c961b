//! Groups records into clusters using transitive relationships.
//!
//! If A matches B and B matches C, then {A, B, C} forms a single group
//! even if A doesn't directly match C.

use super::GroupKind;

/// How two records were linked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Same content hash
    Exact,
    /// Fingerprints within the similarity threshold
    Similar,
}

/// A link between two record indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub kind: LinkKind,
    /// Normalized fingerprint distance (0 for exact links)
    pub distance: f64,
}

/// A connected component of linked indices
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Member indices in ascending order
    pub members: Vec<usize>,
    pub kind: GroupKind,
    /// Largest link distance inside the component
    pub max_distance: f64,
}

/// Union-find over `0..n`
///
/// The root of every set is its smallest index, so the result never
/// depends on the order links are added in.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}

/// Groups linked indices into connected components
pub struct TransitiveGrouper;

impl TransitiveGrouper {
    /// Create a new transitive grouper
    pub fn new() -> Self {
        Self
    }

    /// Connected components with at least two members, ordered by their
    /// smallest member
    pub fn group(&self, n: usize, links: &[Link]) -> Vec<Component> {
        if links.is_empty() {
            return Vec::new();
        }

        let mut set = DisjointSet::new(n);
        for link in links {
            set.union(link.a, link.b);
        }

        // Roots are smallest members, so visiting in index order keeps
        // components ordered and members ascending.
        let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
        let mut components: Vec<Component> = Vec::new();
        for index in 0..n {
            let root = set.find(index);
            let slot = match slot_of_root[root] {
                Some(slot) => slot,
                None => {
                    components.push(Component {
                        members: Vec::new(),
                        kind: GroupKind::Exact,
                        max_distance: 0.0,
                    });
                    slot_of_root[root] = Some(components.len() - 1);
                    components.len() - 1
                }
            };
            components[slot].members.push(index);
        }

        let mut has_exact = vec![false; components.len()];
        let mut has_similar = vec![false; components.len()];
        for link in links {
            let root = set.find(link.a);
            let Some(slot) = slot_of_root[root] else {
                continue;
            };
            match link.kind {
                LinkKind::Exact => has_exact[slot] = true,
                LinkKind::Similar => has_similar[slot] = true,
            }
            if link.distance > components[slot].max_distance {
                components[slot].max_distance = link.distance;
            }
        }

        for (slot, component) in components.iter_mut().enumerate() {
            component.kind = match (has_exact[slot], has_similar[slot]) {
                (_, false) => GroupKind::Exact,
                (false, true) => GroupKind::Similar,
                (true, true) => GroupKind::Mixed,
            };
        }

        components.retain(|c| c.members.len() >= 2);
        components
    }
}

impl Default for TransitiveGrouper {
    fn default() -> Self {
        Self::new()
    }
}
