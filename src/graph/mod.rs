pub use base_graph::BaseGraph;
pub use hash_map_graph::{HashMapGraph, HashMapGraphDfs};
pub use mutable_graph::MutableGraph;

mod base_graph;
mod hash_map_graph;
mod mutable_graph;
