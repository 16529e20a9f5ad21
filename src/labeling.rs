use crate::error::ConsistencyError;
use crate::graph::BaseGraph;
use crate::nice::NiceTreeDecomposition;
use fxhash::FxHashSet;
#[cfg(feature = "log")]
use log::debug;

/// Decides at which node an edge of the graph gets introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Walks the tree from the root. A vertex `v` that appears for the first
    /// time on the current root path introduces every edge to an already seen
    /// vertex of the same bag, so both endpoints are always in the bag.
    RootPath,
    /// Scans all nodes in index order with one global set of seen vertices.
    /// Only the edge count and uniqueness are checked afterwards.
    CanonicalOrder,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy::RootPath
    }
}

/// Introduced edges per node, indexed like the nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSchedule {
    edges: Vec<Vec<(usize, usize)>>,
}

impl EdgeSchedule {
    pub fn at(&self, node: usize) -> &[(usize, usize)] {
        &self.edges[node]
    }

    /// Total number of introduced edges.
    pub fn len(&self) -> usize {
        self.edges.iter().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, (usize, usize))> + '_ {
        self.edges
            .iter()
            .enumerate()
            .flat_map(|(node, edges)| edges.iter().map(move |e| (node, *e)))
    }
}

enum Visit {
    Enter(usize),
    Exit(Vec<usize>),
}

/// Re-derives the node kinds of a nice tree decomposition and assigns every
/// edge of the graph to exactly one node.
pub struct Labeler<'a, G: BaseGraph> {
    graph: &'a G,
    policy: SchedulePolicy,
}

impl<'a, G: BaseGraph> Labeler<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            policy: SchedulePolicy::default(),
        }
    }

    impl_setter!(self, policy, SchedulePolicy);

    /// Labels `nice` in place. Running it again recomputes the same result.
    pub fn label(&self, nice: &mut NiceTreeDecomposition) -> Result<EdgeSchedule, ConsistencyError> {
        self.label_nodes(nice)?;
        let schedule = match self.policy {
            SchedulePolicy::RootPath => self.root_path_schedule(nice),
            SchedulePolicy::CanonicalOrder => self.canonical_order_schedule(nice),
        };
        self.check(nice, &schedule)?;
        for (id, edges) in schedule.edges.iter().enumerate() {
            nice.node_mut(id).introduced_edges = edges.clone();
        }
        #[cfg(feature = "log")]
        debug!(
            "introduced {} edges on {} nodes",
            schedule.len(),
            nice.len()
        );
        Ok(schedule)
    }

    fn label_nodes(&self, nice: &mut NiceTreeDecomposition) -> Result<(), ConsistencyError> {
        for id in 0..nice.len() {
            let derived = nice.derive_kind(id)?;
            let stored = nice.node(id).kind;
            if derived != stored {
                return Err(ConsistencyError::LabelMismatch {
                    node: id,
                    stored: stored.to_string(),
                    derived: derived.to_string(),
                });
            }
            nice.node_mut(id).kind = derived;
        }
        Ok(())
    }

    /// Vertices of `bag` not in `seen` are added one by one in ascending
    /// order, each pairing with its neighbors already seen in the same bag.
    fn introduce(
        &self,
        bag: &[usize],
        mut seen: FxHashSet<usize>,
    ) -> (FxHashSet<usize>, Vec<(usize, usize)>, Vec<usize>) {
        let mut edges = Vec::new();
        let mut added = Vec::new();
        for v in bag.iter().copied() {
            if seen.contains(&v) {
                continue;
            }
            edges.extend(
                bag.iter()
                    .copied()
                    .filter(|u| seen.contains(u) && self.graph.has_edge(*u, v))
                    .map(|u| (u, v)),
            );
            seen.insert(v);
            added.push(v);
        }
        (seen, edges, added)
    }

    fn root_path_schedule(&self, nice: &NiceTreeDecomposition) -> EdgeSchedule {
        let mut edges = vec![Vec::new(); nice.len()];
        let mut seen = FxHashSet::default();
        let mut stack = vec![Visit::Enter(0)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    let node = nice.node(id);
                    let (next, introduced, added) = self.introduce(&node.bag, seen);
                    seen = next;
                    edges[id] = introduced;
                    stack.push(Visit::Exit(added));
                    stack.extend(node.children.iter().rev().map(|c| Visit::Enter(*c)));
                }
                Visit::Exit(added) => {
                    for v in added {
                        seen.remove(&v);
                    }
                }
            }
        }
        debug_assert!(seen.is_empty());
        EdgeSchedule { edges }
    }

    fn canonical_order_schedule(&self, nice: &NiceTreeDecomposition) -> EdgeSchedule {
        let mut edges = vec![Vec::new(); nice.len()];
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut seen_order: Vec<usize> = Vec::new();
        for node in nice.nodes() {
            for v in node.bag.iter().copied() {
                if seen.contains(&v) {
                    continue;
                }
                edges[node.id].extend(
                    seen_order
                        .iter()
                        .copied()
                        .filter(|u| self.graph.has_edge(*u, v))
                        .map(|u| (u, v)),
                );
                seen.insert(v);
                seen_order.push(v);
            }
        }
        EdgeSchedule { edges }
    }

    fn check(
        &self,
        nice: &NiceTreeDecomposition,
        schedule: &EdgeSchedule,
    ) -> Result<(), ConsistencyError> {
        let mut introduced: FxHashSet<(usize, usize)> = FxHashSet::default();
        for (node, (u, v)) in schedule.iter() {
            if !introduced.insert((u.min(v), u.max(v))) {
                return Err(ConsistencyError::DuplicateEdge { u, v });
            }
            if self.policy == SchedulePolicy::RootPath {
                let bag = nice.node(node);
                if !bag.contains(u) || !bag.contains(v) {
                    return Err(ConsistencyError::EdgeOutsideBag { node, u, v });
                }
            }
        }
        if introduced.len() != self.graph.num_edges() {
            return Err(ConsistencyError::EdgeCount {
                introduced: introduced.len(),
                expected: self.graph.num_edges(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ConsistencyError;
    use crate::graph::{BaseGraph, HashMapGraph, MutableGraph};
    use crate::labeling::{Labeler, SchedulePolicy};
    use crate::nice::{NiceTreeDecomposition, Nicifier};
    use crate::solver::{DecompositionSolver, ExactSolver};
    use crate::tree_decomposition::TreeDecomposition;
    use fxhash::FxHashSet;
    use rand::prelude::*;

    fn set(vertices: &[usize]) -> FxHashSet<usize> {
        vertices.iter().copied().collect()
    }

    fn path() -> (HashMapGraph, NiceTreeDecomposition) {
        let mut graph = HashMapGraph::with_vertices(3);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        let mut td = TreeDecomposition::default();
        td.add_bag(set(&[1, 2]));
        td.add_bag(set(&[2, 3]));
        td.add_edge(0, 1);
        let nice = Nicifier::new(&td).nicify().unwrap();
        (graph, nice)
    }

    #[test]
    fn root_path_on_path() {
        let (graph, mut nice) = path();
        let schedule = Labeler::new(&graph).label(&mut nice).unwrap();
        assert_eq!(schedule.len(), 2);
        // nodes: {} {1} {1,2} {2} {2,3} {3} {}
        assert_eq!(schedule.at(2), &[(1, 2)]);
        assert_eq!(schedule.at(4), &[(2, 3)]);
        assert_eq!(nice.introduced_edge_count(), 2);
        assert_eq!(nice.node(2).introduced_edges, vec![(1, 2)]);
    }

    #[test]
    fn canonical_order_on_path() {
        let (graph, mut nice) = path();
        let schedule = Labeler::new(&graph)
            .policy(SchedulePolicy::CanonicalOrder)
            .label(&mut nice)
            .unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.at(2), &[(1, 2)]);
        assert_eq!(schedule.at(4), &[(2, 3)]);
    }

    #[test]
    fn labeling_is_idempotent() {
        let (graph, mut nice) = path();
        let labeler = Labeler::new(&graph);
        let first = labeler.label(&mut nice).unwrap();
        let snapshot = nice.clone();
        let second = labeler.label(&mut nice).unwrap();
        assert_eq!(first, second);
        assert_eq!(snapshot, nice);
    }

    #[test]
    fn rejects_edge_count_mismatch() {
        let (mut graph, mut nice) = path();
        graph.add_edge(1, 3);
        assert_eq!(
            Labeler::new(&graph).label(&mut nice),
            Err(ConsistencyError::EdgeCount {
                introduced: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn both_policies_cover_triangle() {
        let mut graph = HashMapGraph::with_vertices(3);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(1, 3);
        let mut td = TreeDecomposition::default();
        td.add_bag(set(&[1, 2]));
        td.add_bag(set(&[1, 2, 3]));
        td.add_edge(0, 1);
        let mut nice = Nicifier::new(&td).nicify().unwrap();

        let root_path = Labeler::new(&graph).label(&mut nice).unwrap();
        assert_eq!(root_path.len(), 3);
        for (node, (u, v)) in root_path.iter() {
            assert!(nice.node(node).contains(u) && nice.node(node).contains(v));
        }

        let canonical = Labeler::new(&graph)
            .policy(SchedulePolicy::CanonicalOrder)
            .label(&mut nice)
            .unwrap();
        assert_eq!(canonical.len(), 3);
    }

    #[test]
    fn random_graphs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..25 {
            let n = rng.gen_range(1..10);
            let mut graph = HashMapGraph::with_vertices(n);
            for u in 1..=n {
                for v in u + 1..=n {
                    if rng.gen_bool(0.35) {
                        graph.add_edge(u, v);
                    }
                }
            }
            let td = ExactSolver::default().solve(&graph).unwrap();
            let mut nice = Nicifier::new(&td).nicify().unwrap();
            let schedule = Labeler::new(&graph).label(&mut nice).unwrap();
            assert_eq!(schedule.len(), graph.num_edges());
            for (node, (u, v)) in schedule.iter() {
                assert!(graph.has_edge(u, v));
                assert!(nice.node(node).contains(u) && nice.node(node).contains(v));
            }
            assert!(nice.verify().is_ok());
        }
    }
}
