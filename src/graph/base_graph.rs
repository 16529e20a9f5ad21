use std::fmt::Debug;

pub trait BaseGraph: Clone + Debug {
    fn degree(&self, u: usize) -> usize;
    fn order(&self) -> usize;
    fn num_edges(&self) -> usize;
    fn has_vertex(&self, u: usize) -> bool;
    fn has_edge(&self, u: usize, v: usize) -> bool;
    fn vertices(&self) -> Box<dyn Iterator<Item = usize> + '_>;
    fn neighborhood(&self, u: usize) -> Box<dyn Iterator<Item = usize> + '_>;

    /// Every undirected edge once, as `(u, v)` with `u < v`.
    fn edges(&self) -> Box<dyn Iterator<Item = (usize, usize)> + '_>;

    /// Vertices in ascending order, for everything that has to be reproducible.
    fn sorted_vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<_> = self.vertices().collect();
        vertices.sort_unstable();
        vertices
    }
}
