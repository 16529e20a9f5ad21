use crate::datastructures::BitSet;
use crate::graph::BaseGraph;
use fxhash::FxHashSet;
use std::cmp::max;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeDecompositionValidationError {
    #[error("Has Cycle")]
    HasCycle,
    #[error("Not Connected")]
    NotConnected,
    #[error("Unknown Vertex: {0}")]
    UnknownVertex(usize),
    #[error("Missing Vertex: {0}")]
    MissingVertex(usize),
    #[error("Missing Edge: ({0}, {1})")]
    MissingEdge(usize, usize),
    #[error("Not Inducing Subtree: {0}")]
    NotInducingSubtree(usize),
}

#[derive(Debug, Clone)]
pub struct TreeDecomposition {
    pub bags: Vec<Bag>,
    pub root: Option<usize>,
    pub max_bag_size: usize,
}

impl Default for TreeDecomposition {
    fn default() -> Self {
        Self {
            bags: Default::default(),
            root: None,
            max_bag_size: 0,
        }
    }
}

impl TreeDecomposition {
    /// Merges every bag into a neighbor whose vertex set contains it.
    pub fn flatten(&mut self) {
        while let Some((parent, child)) = self.find_combinable() {
            self.reroute(child, parent);
            self.remove_bag(child);
        }
        self.root = if self.bags.is_empty() { None } else { Some(0) };
    }

    fn reroute(&mut self, old_bag: usize, parent_idx: usize) {
        let old_neighbors = self.bags[old_bag].neighbors.clone();

        self.bags[parent_idx].neighbors.extend(old_neighbors.iter());
        self.bags[parent_idx].neighbors.remove(&parent_idx);
        self.bags[parent_idx].neighbors.remove(&old_bag);

        let old_id = self.bags[old_bag].id;
        for neighbor_idx in old_neighbors {
            if neighbor_idx == parent_idx {
                continue;
            }
            assert!(!self.bags[neighbor_idx].neighbors.contains(&parent_idx));

            assert!(self.bags[neighbor_idx].neighbors.remove(&old_id));
            assert!(self.bags[neighbor_idx].neighbors.insert(parent_idx));
        }

        self.bags[old_bag].neighbors.clear();
    }

    fn remove_bag(&mut self, id: usize) {
        assert!(self.bags[id].neighbors.is_empty());
        if id == self.bags.len() - 1 {
            self.bags.pop();
        } else {
            let removed = self.bags.swap_remove(id);
            assert!(removed.neighbors.is_empty());
            self.bags[id].id = id;
            let old_last = self.bags.len();
            for neighbor in self.bags[id].neighbors.clone() {
                assert!(self.bags[neighbor].neighbors.remove(&old_last));
                assert!(self.bags[neighbor].neighbors.insert(id));
            }
        }
    }

    fn find_combinable(&self) -> Option<(usize, usize)> {
        for b in &self.bags {
            if let Some(n) = b
                .neighbors
                .iter()
                .find(|n| self.bags[**n].vertex_set.is_subset(&b.vertex_set))
            {
                return Some((b.id, self.bags[*n].id));
            }
        }
        None
    }

    pub fn add_bag(&mut self, vertex_set: FxHashSet<usize>) -> usize {
        let id = self.bags.len();
        if id == 0 {
            self.root = Some(id);
        }
        self.max_bag_size = max(self.max_bag_size, vertex_set.len());
        self.bags.push(Bag {
            id,
            vertex_set,
            neighbors: FxHashSet::default(),
        });
        id
    }

    pub fn add_edge(&mut self, b1: usize, b2: usize) {
        assert!(b1 < self.bags.len());
        assert!(b2 < self.bags.len());
        assert_ne!(b1, b2);
        self.bags[b1].neighbors.insert(b2);
        self.bags[b2].neighbors.insert(b1);
    }

    /// Number of tree edges.
    pub fn num_edges(&self) -> usize {
        self.bags.iter().map(|b| b.neighbors.len()).sum::<usize>() / 2
    }

    pub fn width(&self) -> usize {
        self.max_bag_size.saturating_sub(1)
    }

    pub fn dfs(&self) -> TreeDecompositionIterator {
        let mut visited = BitSet::new(self.bags.len());
        let stack = match self.root {
            Some(root) => {
                visited.set_bit(root);
                vec![root]
            }
            None => vec![],
        };
        TreeDecompositionIterator {
            td: self,
            stack,
            visited,
        }
    }

    /// Glues `other` below `glue_point`, attached to the first bag of `other`
    /// that contains the glue point's vertices.
    pub fn combine_with(&mut self, glue_point: usize, mut other: TreeDecomposition) {
        assert!(glue_point < self.bags.len());
        self.max_bag_size = max(self.max_bag_size, other.max_bag_size);
        let offset = self.bags.len();
        for b in other.bags.iter_mut() {
            b.id += offset;
            b.neighbors = b.neighbors.iter().map(|n| *n + offset).collect();
        }
        let other_glue_point = other
            .bags
            .iter_mut()
            .find(|b| b.vertex_set.is_superset(&self.bags[glue_point].vertex_set))
            .unwrap();
        other_glue_point.neighbors.insert(glue_point);
        self.bags[glue_point].neighbors.insert(other_glue_point.id);
        self.bags.extend(other.bags.drain(..));
    }

    pub fn verify<G: BaseGraph>(&self, graph: &G) -> Result<(), TreeDecompositionValidationError> {
        if !self.is_connected() {
            return Err(TreeDecompositionValidationError::NotConnected);
        }

        if self.is_cyclic() {
            return Err(TreeDecompositionValidationError::HasCycle);
        }

        if let Some(v) = self.get_unknown_vertex(graph) {
            return Err(TreeDecompositionValidationError::UnknownVertex(v));
        }

        if let Some(v) = self.get_missing_vertex(graph) {
            return Err(TreeDecompositionValidationError::MissingVertex(v));
        }

        if let Some((u, v)) = self.get_missing_edge(graph) {
            return Err(TreeDecompositionValidationError::MissingEdge(u, v));
        }

        if let Some(v) = self.get_vertex_not_inducing_subtree(graph) {
            return Err(TreeDecompositionValidationError::NotInducingSubtree(v));
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.dfs().count() == self.bags.len()
    }

    // only meaningful once the decomposition is known to be connected
    fn is_cyclic(&self) -> bool {
        !self.bags.is_empty() && self.num_edges() != self.bags.len() - 1
    }

    fn get_unknown_vertex<G: BaseGraph>(&self, graph: &G) -> Option<usize> {
        self.bags
            .iter()
            .flat_map(|b| b.vertex_set.iter().copied())
            .filter(|v| !graph.has_vertex(*v))
            .min()
    }

    fn get_missing_vertex<G: BaseGraph>(&self, graph: &G) -> Option<usize> {
        let mut vertices: FxHashSet<usize> = graph.vertices().collect();
        self.bags.iter().for_each(|b| {
            b.vertex_set.iter().for_each(|x| {
                vertices.remove(x);
            })
        });
        vertices.iter().copied().min()
    }

    fn get_missing_edge<G: BaseGraph>(&self, graph: &G) -> Option<(usize, usize)> {
        let mut edges: Vec<_> = graph.edges().collect();
        edges.sort_unstable();
        edges.into_iter().find(|(u, v)| {
            !self
                .bags
                .iter()
                .any(|b| b.vertex_set.contains(u) && b.vertex_set.contains(v))
        })
    }

    fn get_vertex_not_inducing_subtree<G: BaseGraph>(&self, graph: &G) -> Option<usize> {
        for u in graph.sorted_vertices() {
            let mut inducing_bags: FxHashSet<usize> = self
                .bags
                .iter()
                .filter(|b| b.vertex_set.contains(&u))
                .map(|b| b.id)
                .collect();

            let first = match inducing_bags.iter().min() {
                Some(first) => *first,
                None => continue,
            };
            inducing_bags.remove(&first);
            let mut visited = BitSet::new(self.bags.len());
            visited.set_bit(first);
            let mut stack: Vec<usize> = vec![first];
            while let Some(c) = stack.pop() {
                for n in self.bags[c].neighbors.iter().copied() {
                    let bag = &self.bags[n];
                    if !visited[n] && bag.vertex_set.contains(&u) {
                        inducing_bags.remove(&bag.id);
                        stack.push(n);
                        visited.set_bit(n);
                    }
                }
            }
            if !inducing_bags.is_empty() {
                return Some(u);
            }
        }
        None
    }
}

pub struct TreeDecompositionIterator<'a> {
    td: &'a TreeDecomposition,
    stack: Vec<usize>,
    visited: BitSet,
}

impl<'a> Iterator for TreeDecompositionIterator<'a> {
    type Item = &'a Bag;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        for c in self.td.bags[current].neighbors.iter().copied() {
            if !self.visited[c] {
                self.stack.push(c);
                self.visited.set_bit(c);
            }
        }
        self.td.bags.get(current)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Bag {
    pub id: usize,
    pub vertex_set: FxHashSet<usize>,
    pub neighbors: FxHashSet<usize>,
}

impl Bag {
    /// Vertex set in ascending order.
    pub fn sorted_vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<_> = self.vertex_set.iter().copied().collect();
        vertices.sort_unstable();
        vertices
    }
}
