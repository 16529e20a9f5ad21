use crate::datastructures::BitSet;
use crate::elimination_order::EliminationOrder;
use crate::graph::{BaseGraph, HashMapGraph};
use fxhash::FxHashMap;
use std::cmp::max;

#[cfg(feature = "log")]
use log::debug;

/// Exact treewidth by dynamic programming over vertex subsets:
///
/// `TW(S) = min over v in S of max(TW(S \ {v}), |Q(S \ {v}, v)|)`
///
/// where `Q(S, v)` are the vertices outside `S + v` reachable from `v` through
/// `S`. Exponential in the order of the graph.
pub struct TreewidthDp {
    vertices: Vec<usize>,
    neighbors: Vec<Vec<usize>>,
    memory: FxHashMap<BitSet, (usize, usize)>,
}

impl TreewidthDp {
    pub fn with_graph(graph: &HashMapGraph) -> Self {
        let vertices = graph.sorted_vertices();
        let vertex_map: FxHashMap<usize, usize> =
            vertices.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let neighbors = vertices
            .iter()
            .map(|v| {
                let mut nb: Vec<usize> = graph
                    .neighborhood(*v)
                    .filter_map(|u| vertex_map.get(&u).copied())
                    .collect();
                nb.sort_unstable();
                nb
            })
            .collect();
        Self {
            vertices,
            neighbors,
            memory: FxHashMap::default(),
        }
    }

    pub fn compute(mut self) -> EliminationOrder {
        let n = self.vertices.len();
        let all = BitSet::new_all_set(n);
        let width = self.treewidth(&all);
        #[cfg(feature = "log")]
        debug!("exact dp stored {} subsets", self.memory.len());

        let mut order = Vec::with_capacity(n);
        let mut remaining = all;
        while let Some((_, last)) = self.memory.get(&remaining).copied() {
            order.push(self.vertices[last]);
            remaining.unset_bit(last);
        }
        order.reverse();
        EliminationOrder::new(order, width)
    }

    fn treewidth(&mut self, set: &BitSet) -> usize {
        if set.empty() {
            return 0;
        }
        if let Some((width, _)) = self.memory.get(set) {
            return *width;
        }

        let mut best = usize::MAX;
        let mut best_vertex = 0;
        for v in set.iter() {
            let mut rest = set.clone();
            rest.unset_bit(v);
            let q = self.q_size(&rest, v);
            if q >= best {
                continue;
            }
            let width = max(self.treewidth(&rest), q);
            if width < best {
                best = width;
                best_vertex = v;
            }
        }
        self.memory.insert(set.clone(), (best, best_vertex));
        best
    }

    fn q_size(&self, set: &BitSet, v: usize) -> usize {
        let mut visited = BitSet::new(self.vertices.len());
        visited.set_bit(v);
        let mut stack = vec![v];
        let mut count = 0;
        while let Some(x) = stack.pop() {
            for w in self.neighbors[x].iter().copied() {
                if visited.set_bit(w) {
                    continue;
                }
                if set[w] {
                    stack.push(w);
                } else {
                    count += 1;
                }
            }
        }
        count
    }
}
