use crate::graph::base_graph::BaseGraph;

pub trait MutableGraph: BaseGraph {
    fn add_vertex(&mut self, u: usize);
    fn add_edge(&mut self, u: usize, v: usize);
    fn eliminate_vertex(&mut self, u: usize);
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}
