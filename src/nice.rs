use crate::datastructures::BitSet;
use crate::error::ConsistencyError;
use crate::tree_decomposition::TreeDecomposition;
use std::collections::VecDeque;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Leaf,
    Introduce(usize),
    Forget(usize),
    Join,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Introduce(_) => "intro",
            NodeKind::Forget(_) => "forget",
            NodeKind::Join => "join",
        }
    }

    /// The vertex an introduce or forget node is labeled with.
    pub fn vertex(&self) -> Option<usize> {
        match self {
            NodeKind::Introduce(v) | NodeKind::Forget(v) => Some(*v),
            _ => None,
        }
    }

    /// Derives the kind of a node from its bag and the bags of its children.
    /// All bags have to be sorted. `None` if the node is not a nice node.
    pub fn derive(bag: &[usize], children: &[&[usize]]) -> Option<NodeKind> {
        match children {
            [] if bag.is_empty() => Some(NodeKind::Leaf),
            [child] => {
                if let Some(v) = single_extra(bag, child) {
                    Some(NodeKind::Introduce(v))
                } else {
                    single_extra(child, bag).map(NodeKind::Forget)
                }
            }
            [left, right] if *left == bag && *right == bag => Some(NodeKind::Join),
            _ => None,
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.vertex() {
            Some(v) => write!(f, "{}({})", self.label(), v),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// The one vertex of `larger` that is missing in `smaller`, if `larger` is
/// `smaller` plus exactly one vertex.
fn single_extra(larger: &[usize], smaller: &[usize]) -> Option<usize> {
    if larger.len() != smaller.len() + 1 {
        return None;
    }
    let mut extra = None;
    let mut j = 0;
    for v in larger.iter().copied() {
        if j < smaller.len() && smaller[j] == v {
            j += 1;
        } else if extra.is_none() {
            extra = Some(v);
        } else {
            return None;
        }
    }
    if j == smaller.len() {
        extra
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiceNode {
    pub id: usize,
    pub bag: Vec<usize>,
    pub kind: NodeKind,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub introduced_edges: Vec<(usize, usize)>,
}

impl NiceNode {
    pub fn contains(&self, v: usize) -> bool {
        self.bag.binary_search(&v).is_ok()
    }
}

/// Nice tree decomposition stored as an arena. Node `0` is the root, and node
/// indices follow breadth first order from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiceTreeDecomposition {
    nodes: Vec<NiceNode>,
}

impl NiceTreeDecomposition {
    pub fn root(&self) -> &NiceNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[NiceNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &NiceNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: usize) -> &mut NiceNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn width(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.bag.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Tree neighbors of a node sorted by index, so the parent comes first.
    pub fn neighbors(&self, id: usize) -> Vec<usize> {
        let node = &self.nodes[id];
        let mut neighbors: Vec<usize> = node.parent.iter().copied().collect();
        neighbors.extend(node.children.iter().copied());
        neighbors.sort_unstable();
        neighbors
    }

    pub fn leaves(&self) -> impl Iterator<Item = &NiceNode> + '_ {
        self.nodes.iter().filter(|n| n.children.is_empty())
    }

    pub fn introduced_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.introduced_edges.len()).sum()
    }

    /// Checks the structural invariants of a nice tree decomposition.
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        if !self.root().bag.is_empty() || self.root().parent.is_some() {
            return Err(ConsistencyError::NonEmptyRoot { node: 0 });
        }
        for node in &self.nodes {
            for child in node.children.iter().copied() {
                if child <= node.id || self.nodes[child].parent != Some(node.id) {
                    return Err(ConsistencyError::BrokenLink {
                        node: child,
                        parent: node.id,
                    });
                }
            }
            let derived = self.derive_kind(node.id)?;
            if derived != node.kind {
                return Err(ConsistencyError::LabelMismatch {
                    node: node.id,
                    stored: node.kind.to_string(),
                    derived: derived.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn derive_kind(&self, id: usize) -> Result<NodeKind, ConsistencyError> {
        let node = &self.nodes[id];
        let children: Vec<&[usize]> = node
            .children
            .iter()
            .map(|c| self.nodes[*c].bag.as_slice())
            .collect();
        NodeKind::derive(&node.bag, &children).ok_or(ConsistencyError::InvalidNode { node: id })
    }
}

/// Turns an arbitrary tree decomposition into a nice one.
pub struct Nicifier<'a> {
    td: &'a TreeDecomposition,
    nodes: Vec<NiceNode>,
}

impl<'a> Nicifier<'a> {
    pub fn new(td: &'a TreeDecomposition) -> Self {
        Self {
            td,
            nodes: Vec::with_capacity(td.bags.len() * 2 + 1),
        }
    }

    pub fn nicify(mut self) -> Result<NiceTreeDecomposition, ConsistencyError> {
        let root = self.push(Vec::new(), None);
        if !self.td.bags.is_empty() {
            let sorted: Vec<Vec<usize>> =
                self.td.bags.iter().map(|b| b.sorted_vertices()).collect();
            let input_root = (0..sorted.len())
                .min_by(|a, b| sorted[*a].cmp(&sorted[*b]).then(a.cmp(b)))
                .ok_or(ConsistencyError::NotATree)?;

            let mut visited = BitSet::from_slice(sorted.len(), &[input_root]);
            let top = self.chain(root, &sorted[input_root]);
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(input_root, None, top)];
            while let Some((bag, parent, nice)) = stack.pop() {
                let mut children: Vec<usize> = self.td.bags[bag]
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|c| Some(*c) != parent)
                    .collect();
                children.sort_unstable_by(|a, b| sorted[*a].cmp(&sorted[*b]).then(a.cmp(b)));

                if children.is_empty() {
                    self.chain(nice, &[]);
                    continue;
                }
                let heads = self.branch(nice, children.len());
                for (child, head) in children.into_iter().zip(heads.into_iter()) {
                    if visited.set_bit(child) {
                        return Err(ConsistencyError::NotATree);
                    }
                    let bottom = self.chain(head, &sorted[child]);
                    stack.push((child, Some(bag), bottom));
                }
            }
            if !visited.full() {
                return Err(ConsistencyError::NotATree);
            }
        }

        let nice = NiceTreeDecomposition {
            nodes: breadth_first(self.nodes),
        };
        nice.verify()?;
        Ok(nice)
    }

    fn push(&mut self, bag: Vec<usize>, parent: Option<usize>) -> usize {
        let id = self.nodes.len();
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        self.nodes.push(NiceNode {
            id,
            bag,
            kind: NodeKind::Leaf,
            parent,
            children: Vec::new(),
            introduced_edges: Vec::new(),
        });
        id
    }

    /// Steps down from `top` to a node with bag `target`, one vertex at a
    /// time: first the vertices missing in `target` are dropped, then the new
    /// ones are added, both in ascending order. Returns the bottom node.
    fn chain(&mut self, top: usize, target: &[usize]) -> usize {
        let mut current = top;
        let mut bag = self.nodes[top].bag.clone();
        let dropped: Vec<usize> = bag
            .iter()
            .copied()
            .filter(|v| target.binary_search(v).is_err())
            .collect();
        let added: Vec<usize> = target
            .iter()
            .copied()
            .filter(|v| bag.binary_search(v).is_err())
            .collect();

        for v in dropped {
            self.nodes[current].kind = NodeKind::Introduce(v);
            if let Ok(pos) = bag.binary_search(&v) {
                bag.remove(pos);
            }
            current = self.push(bag.clone(), Some(current));
        }
        for v in added {
            self.nodes[current].kind = NodeKind::Forget(v);
            if let Err(pos) = bag.binary_search(&v) {
                bag.insert(pos, v);
            }
            current = self.push(bag.clone(), Some(current));
        }
        current
    }

    /// Splits `at` into `count` branches carrying the same bag, using a
    /// cascade of join nodes.
    fn branch(&mut self, at: usize, count: usize) -> Vec<usize> {
        let mut heads = Vec::with_capacity(count);
        let mut current = at;
        for _ in 1..count {
            let bag = self.nodes[current].bag.clone();
            self.nodes[current].kind = NodeKind::Join;
            heads.push(self.push(bag.clone(), Some(current)));
            current = self.push(bag, Some(current));
        }
        heads.push(current);
        heads
    }
}

/// Renumbers the arena in breadth first order from node `0`.
fn breadth_first(mut nodes: Vec<NiceNode>) -> Vec<NiceNode> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut queue = VecDeque::new();
    queue.push_back(0);
    while let Some(id) = queue.pop_front() {
        order.push(id);
        queue.extend(nodes[id].children.iter().copied());
    }

    let mut new_id = vec![0; nodes.len()];
    for (new, old) in order.iter().enumerate() {
        new_id[*old] = new;
    }

    let mut renumbered = Vec::with_capacity(order.len());
    for old in order {
        let mut node = std::mem::replace(
            &mut nodes[old],
            NiceNode {
                id: 0,
                bag: Vec::new(),
                kind: NodeKind::Leaf,
                parent: None,
                children: Vec::new(),
                introduced_edges: Vec::new(),
            },
        );
        node.id = new_id[old];
        node.parent = node.parent.map(|p| new_id[p]);
        node.children = node.children.iter().map(|c| new_id[*c]).collect();
        renumbered.push(node);
    }
    renumbered
}

#[cfg(test)]
mod tests {
    use crate::nice::{NiceTreeDecomposition, Nicifier, NodeKind};
    use crate::tree_decomposition::TreeDecomposition;
    use fxhash::{FxHashMap, FxHashSet};
    use rand::prelude::*;

    fn set(vertices: &[usize]) -> FxHashSet<usize> {
        vertices.iter().copied().collect()
    }

    fn td(bags: &[&[usize]], edges: &[(usize, usize)]) -> TreeDecomposition {
        let mut td = TreeDecomposition::default();
        for bag in bags {
            td.add_bag(set(bag));
        }
        for (a, b) in edges {
            td.add_edge(*a, *b);
        }
        td
    }

    /// Every vertex is introduced and forgotten exactly once on each
    /// root-to-leaf path.
    fn assert_paths(nice: &NiceTreeDecomposition) {
        for leaf in nice.leaves() {
            assert!(leaf.bag.is_empty());
            let mut introduced: FxHashMap<usize, usize> = FxHashMap::default();
            let mut forgotten: FxHashMap<usize, usize> = FxHashMap::default();
            let mut current = Some(leaf.id);
            while let Some(id) = current {
                let node = nice.node(id);
                match node.kind {
                    NodeKind::Introduce(v) => *introduced.entry(v).or_insert(0) += 1,
                    NodeKind::Forget(v) => *forgotten.entry(v).or_insert(0) += 1,
                    _ => {}
                }
                current = node.parent;
            }
            assert!(introduced.values().all(|c| *c == 1));
            assert_eq!(introduced, forgotten);
        }
    }

    #[test]
    fn derive_kinds() {
        assert_eq!(NodeKind::derive(&[], &[]), Some(NodeKind::Leaf));
        assert_eq!(NodeKind::derive(&[1], &[]), None);
        assert_eq!(
            NodeKind::derive(&[1, 3, 5], &[&[1, 5]]),
            Some(NodeKind::Introduce(3))
        );
        assert_eq!(
            NodeKind::derive(&[1, 5], &[&[1, 5, 7]]),
            Some(NodeKind::Forget(7))
        );
        assert_eq!(NodeKind::derive(&[1, 5], &[&[1, 6]]), None);
        assert_eq!(NodeKind::derive(&[1, 5], &[&[1, 5]]), None);
        assert_eq!(
            NodeKind::derive(&[2, 4], &[&[2, 4], &[2, 4]]),
            Some(NodeKind::Join)
        );
        assert_eq!(NodeKind::derive(&[2, 4], &[&[2, 4], &[2]]), None);
        assert_eq!(NodeKind::Introduce(4).to_string(), "intro(4)");
    }

    #[test]
    fn path_decomposition() {
        let nice = Nicifier::new(&td(&[&[1, 2], &[2, 3]], &[(0, 1)]))
            .nicify()
            .unwrap();
        assert!(nice.len() > 2);
        assert_eq!(nice.width(), 1);
        assert!(nice.root().bag.is_empty());
        assert_eq!(nice.root().kind, NodeKind::Forget(1));
        assert_eq!(nice.leaves().count(), 1);
        // forget 1, forget 2, introduce 1 ... down to the leaf below {2, 3}
        let kinds: Vec<_> = nice.nodes().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Forget(1),
                NodeKind::Forget(2),
                NodeKind::Introduce(1),
                NodeKind::Forget(3),
                NodeKind::Introduce(2),
                NodeKind::Introduce(3),
                NodeKind::Leaf,
            ]
        );
        assert_paths(&nice);
    }

    #[test]
    fn single_bag() {
        let nice = Nicifier::new(&td(&[&[4, 2, 9]], &[])).nicify().unwrap();
        assert_eq!(nice.len(), 7);
        assert_eq!(nice.leaves().count(), 1);
        assert_eq!(nice.node(3).bag, vec![2, 4, 9]);
        assert_paths(&nice);
    }

    #[test]
    fn empty_decomposition() {
        let nice = Nicifier::new(&TreeDecomposition::default())
            .nicify()
            .unwrap();
        assert_eq!(nice.len(), 1);
        assert_eq!(nice.root().kind, NodeKind::Leaf);
    }

    #[test]
    fn identical_bags_collapse() {
        let nice = Nicifier::new(&td(&[&[1, 2], &[1, 2]], &[(0, 1)]))
            .nicify()
            .unwrap();
        let single = Nicifier::new(&td(&[&[1, 2]], &[])).nicify().unwrap();
        assert_eq!(nice, single);
    }

    #[test]
    fn star_gets_join_cascade() {
        let nice = Nicifier::new(&td(
            &[&[1, 2], &[1, 3], &[1, 4], &[1, 5]],
            &[(0, 1), (0, 2), (0, 3)],
        ))
        .nicify()
        .unwrap();
        let joins: Vec<_> = nice
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Join)
            .collect();
        assert_eq!(joins.len(), 2);
        for join in joins {
            assert_eq!(join.bag, vec![1, 2]);
            assert_eq!(join.children.len(), 2);
        }
        assert_eq!(nice.leaves().count(), 3);
        assert_paths(&nice);
    }

    #[test]
    fn parents_precede_children() {
        let nice = Nicifier::new(&td(
            &[&[1, 2, 3], &[2, 3, 4], &[3, 5], &[1, 6]],
            &[(0, 1), (1, 2), (0, 3)],
        ))
        .nicify()
        .unwrap();
        for node in nice.nodes() {
            for child in node.children.iter() {
                assert!(*child > node.id);
                assert_eq!(nice.node(*child).parent, Some(node.id));
            }
            let neighbors = nice.neighbors(node.id);
            if let Some(parent) = node.parent {
                assert_eq!(neighbors[0], parent);
            }
        }
        assert_eq!(nice.width(), 2);
        assert_paths(&nice);
    }

    #[test]
    fn rejects_cycles() {
        let cyclic = td(&[&[1], &[1], &[1]], &[(0, 1), (1, 2), (2, 0)]);
        assert!(Nicifier::new(&cyclic).nicify().is_err());
        let disconnected = td(&[&[1], &[2]], &[]);
        assert!(Nicifier::new(&disconnected).nicify().is_err());
    }

    #[test]
    fn random_trees() {
        let mut rng = StdRng::seed_from_u64(1337);
        for _ in 0..50 {
            let bags = rng.gen_range(1..20);
            let mut decomposition = TreeDecomposition::default();
            for _ in 0..bags {
                let size = rng.gen_range(0..5);
                let vertices: FxHashSet<usize> =
                    (0..size).map(|_| rng.gen_range(1..12)).collect();
                decomposition.add_bag(vertices);
            }
            for b in 1..bags {
                let parent = rng.gen_range(0..b);
                decomposition.add_edge(parent, b);
            }
            let nice = Nicifier::new(&decomposition).nicify().unwrap();
            assert!(nice.verify().is_ok());
            assert_eq!(nice.width(), decomposition.width());
            assert_paths(&nice);
        }
    }
}
