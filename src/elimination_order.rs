use crate::graph::{BaseGraph, HashMapGraph, MutableGraph};
use crate::tree_decomposition::TreeDecomposition;
use fxhash::{FxHashMap, FxHashSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EliminationOrder {
    data: Vec<usize>,
    width: usize,
}

impl EliminationOrder {
    pub(crate) fn new(data: Vec<usize>, width: usize) -> Self {
        EliminationOrder { data, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn order(&self) -> &[usize] {
        self.data.as_slice()
    }

    /// Eliminates the vertices in order. The bag of `v` is `v` together with
    /// its neighborhood at elimination time and hangs below the bag of the
    /// earliest eliminated of those neighbors. The last vertex gives the root.
    pub fn to_tree_decomposition<G: BaseGraph>(&self, graph: &G) -> TreeDecomposition {
        let mut td = TreeDecomposition::default();
        let mut graph = HashMapGraph::from_graph(graph);

        let position: FxHashMap<usize, usize> =
            self.data.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let mut stack: Vec<(usize, Vec<usize>)> = Vec::with_capacity(self.data.len());
        for v in self.data.iter().copied() {
            let nb: Vec<usize> = graph.neighborhood(v).collect();
            stack.push((v, nb));
            graph.eliminate_vertex(v);
        }

        let mut bag_of: FxHashMap<usize, usize> = FxHashMap::default();
        for (v, nb) in stack.into_iter().rev() {
            let mut bag: FxHashSet<usize> = nb.iter().copied().collect();
            bag.insert(v);
            let id = td.add_bag(bag);
            bag_of.insert(v, id);

            let parent = nb
                .iter()
                .copied()
                .min_by_key(|u| position.get(u).copied().unwrap_or(usize::MAX))
                .and_then(|u| bag_of.get(&u).copied());
            match parent {
                Some(parent) => td.add_edge(id, parent),
                None if id != 0 => td.add_edge(id, 0),
                None => {}
            }
        }
        td
    }
}

/// Width of the decomposition induced by eliminating `order` from `graph`.
pub fn get_width<G: MutableGraph>(graph: &G, order: &[usize]) -> usize {
    let mut graph = graph.clone();
    order
        .iter()
        .map(|v| {
            let degree = graph.degree(*v);
            graph.eliminate_vertex(*v);
            degree
        })
        .max()
        .unwrap_or(0)
}
