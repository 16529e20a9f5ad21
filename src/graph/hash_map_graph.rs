use crate::graph::base_graph::BaseGraph;
use crate::graph::mutable_graph::MutableGraph;
use fxhash::FxHashMap;
use fxhash::FxHashSet;
use std::collections::TryReserveError;

#[derive(Clone, Debug)]
pub struct HashMapGraph {
    data: FxHashMap<usize, FxHashSet<usize>>,
}

impl HashMapGraph {
    /// Graph on the vertices `1..=n` without any edges.
    pub fn with_vertices(n: usize) -> Self {
        let mut graph = Self::with_capacity(n);
        for u in 1..=n {
            graph.add_vertex(u);
        }
        graph
    }

    /// Like `with_vertices`, but reports a failed allocation instead of
    /// aborting. `n` usually comes straight from an input header.
    pub fn try_with_vertices(n: usize) -> Result<Self, TryReserveError> {
        let mut data: FxHashMap<usize, FxHashSet<usize>> = FxHashMap::default();
        data.try_reserve(n)?;
        for u in 1..=n {
            data.insert(u, FxHashSet::default());
        }
        Ok(HashMapGraph { data })
    }

    pub fn neighborhood_set(&self, u: usize) -> &FxHashSet<usize> {
        self.data.get(&u).unwrap()
    }

    pub fn dfs(&self, u: usize) -> HashMapGraphDfs {
        assert!(self.data.contains_key(&u));
        let mut visited = FxHashSet::with_capacity_and_hasher(self.data.len(), Default::default());
        visited.insert(u);
        HashMapGraphDfs {
            graph: self,
            stack: vec![u],
            visited,
        }
    }

    /// Components ordered by their smallest vertex.
    pub fn connected_components(&self) -> Vec<FxHashSet<usize>> {
        let mut components: Vec<FxHashSet<usize>> = Vec::new();
        let mut visited: FxHashSet<usize> =
            FxHashSet::with_capacity_and_hasher(self.data.len(), Default::default());
        for u in self.sorted_vertices() {
            if visited.contains(&u) {
                continue;
            }
            let component: FxHashSet<usize> = self.dfs(u).collect();
            visited.extend(component.iter().copied());
            components.push(component);
        }
        components
    }

    /// Subgraph induced by `vertex_set`, isolated vertices included.
    pub fn vertex_induced(&self, vertex_set: &FxHashSet<usize>) -> Self {
        let mut subgraph = HashMapGraph::with_capacity(vertex_set.len());
        for u in vertex_set.iter().copied() {
            subgraph.add_vertex(u);
            for v in self
                .neighborhood_set(u)
                .iter()
                .copied()
                .filter(|v| u < *v && vertex_set.contains(v))
            {
                subgraph.add_edge(u, v);
            }
        }
        subgraph
    }
}

pub struct HashMapGraphDfs<'a> {
    graph: &'a HashMapGraph,
    stack: Vec<usize>,
    visited: FxHashSet<usize>,
}

impl<'a> Iterator for HashMapGraphDfs<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        for c in self.graph.data.get(&current).unwrap().iter().copied() {
            if self.visited.insert(c) {
                self.stack.push(c);
            }
        }
        Some(current)
    }
}

impl MutableGraph for HashMapGraph {
    fn add_vertex(&mut self, u: usize) {
        self.data.entry(u).or_insert_with(FxHashSet::default);
    }

    fn add_edge(&mut self, u: usize, v: usize) {
        assert_ne!(u, v);
        let first = self.data.entry(u).or_insert_with(FxHashSet::default);
        first.insert(v);
        let second = self.data.entry(v).or_insert_with(FxHashSet::default);
        second.insert(u);
    }

    fn eliminate_vertex(&mut self, u: usize) {
        assert!(self.data.contains_key(&u));
        let nb = self.data.remove(&u).unwrap();
        for i in &nb {
            self.data.get_mut(i).unwrap().remove(&u);
        }
        for i in &nb {
            for j in &nb {
                if i < j {
                    self.data.get_mut(i).unwrap().insert(*j);
                    self.data.get_mut(j).unwrap().insert(*i);
                }
            }
        }
    }

    fn new() -> Self {
        HashMapGraph {
            data: FxHashMap::default(),
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMapGraph {
            data: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }
}

impl BaseGraph for HashMapGraph {
    fn degree(&self, u: usize) -> usize {
        assert!(self.data.contains_key(&u));
        self.data.get(&u).unwrap().len()
    }

    fn order(&self) -> usize {
        self.data.len()
    }

    fn num_edges(&self) -> usize {
        self.data.values().map(|nb| nb.len()).sum::<usize>() / 2
    }

    fn has_vertex(&self, u: usize) -> bool {
        self.data.contains_key(&u)
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.data.get(&u).map_or(false, |nb| nb.contains(&v))
    }

    fn vertices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        let keys = self.data.keys().copied();
        Box::new(keys)
    }

    fn neighborhood(&self, u: usize) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.data.get(&u).unwrap().iter().copied())
    }

    fn edges(&self) -> Box<dyn Iterator<Item = (usize, usize)> + '_> {
        Box::new(self.data.iter().flat_map(|(u, nb)| {
            let u = *u;
            nb.iter().copied().filter(move |v| u < *v).map(move |v| (u, v))
        }))
    }
}

impl HashMapGraph {
    pub fn from_graph<G: BaseGraph>(graph: &G) -> Self {
        let data = graph
            .vertices()
            .map(|v| (v, graph.neighborhood(v).collect()))
            .collect();
        HashMapGraph { data }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::base_graph::BaseGraph;
    use crate::graph::hash_map_graph::HashMapGraph;
    use crate::graph::mutable_graph::MutableGraph;
    use fxhash::FxHashSet;

    #[test]
    fn test_order() {
        let mut graph = HashMapGraph::new();
        assert_eq!(graph.order(), 0);

        graph.add_vertex(1);
        graph.add_vertex(1);
        assert_eq!(graph.order(), 1);

        let graph = HashMapGraph::with_vertices(5);
        assert_eq!(graph.order(), 5);
        assert_eq!(graph.sorted_vertices(), vec![1, 2, 3, 4, 5]);
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn bounded_vertex_allocation() {
        let graph = HashMapGraph::try_with_vertices(3).unwrap();
        assert_eq!(graph.sorted_vertices(), vec![1, 2, 3]);
        assert!(HashMapGraph::try_with_vertices(usize::MAX).is_err());
    }

    #[test]
    fn test_degree() {
        let mut graph = HashMapGraph::new();
        graph.add_edge(1, 2);

        assert_eq!(graph.degree(1), 1);
        assert_eq!(graph.degree(2), 1);
        assert_eq!(graph.order(), 2);
        assert_eq!(graph.num_edges(), 1);

        graph.add_edge(2, 1);

        assert_eq!(graph.degree(1), 1);
        assert_eq!(graph.degree(2), 1);
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn edges_are_listed_once() {
        let mut graph = HashMapGraph::with_vertices(4);
        graph.add_edge(1, 2);
        graph.add_edge(3, 2);
        graph.add_edge(4, 1);
        let mut edges: Vec<_> = graph.edges().collect();
        edges.sort_unstable();
        assert_eq!(edges, vec![(1, 2), (1, 4), (2, 3)]);
        assert!(graph.has_edge(2, 3));
        assert!(!graph.has_edge(2, 4));
        assert!(!graph.has_edge(2, 17));
    }

    #[test]
    fn eliminate_makes_clique() {
        let mut graph = HashMapGraph::with_vertices(5);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(1, 4);
        graph.add_edge(4, 5);
        graph.eliminate_vertex(1);
        assert!(!graph.has_vertex(1));
        assert!(graph.has_edge(2, 3) && graph.has_edge(2, 4) && graph.has_edge(3, 4));
        assert_eq!(graph.degree(5), 1);
    }

    #[test]
    fn components() {
        let mut graph = HashMapGraph::with_vertices(7);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(5, 6);

        let components = graph.connected_components();
        assert_eq!(components.len(), 4);
        assert_eq!(components[0].len(), 3);
        assert!(components[1].contains(&4));
        assert!(components[2].contains(&5) && components[2].contains(&6));
        assert!(components[3].contains(&7));

        let induced = graph.vertex_induced(&components[2]);
        assert_eq!(induced.order(), 2);
        assert_eq!(induced.num_edges(), 1);

        let isolated: FxHashSet<usize> = [4].iter().copied().collect();
        let induced = graph.vertex_induced(&isolated);
        assert_eq!(induced.order(), 1);
        assert_eq!(induced.num_edges(), 0);
    }
}
