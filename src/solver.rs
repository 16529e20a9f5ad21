use crate::elimination_order::{get_width, EliminationOrder};
use crate::error::SolverError;
use crate::exact::TreewidthDp;
use crate::graph::{BaseGraph, HashMapGraph};
use crate::tree_decomposition::{TreeDecomposition, TreeDecompositionValidationError};
use fxhash::FxHashSet;
#[cfg(feature = "log")]
use log::info;

pub trait DecompositionSolver {
    fn solve(&self, graph: &HashMapGraph) -> Result<TreeDecomposition, SolverError>;
}

pub trait DecompositionValidator {
    fn validate(
        &self,
        graph: &HashMapGraph,
        td: &TreeDecomposition,
    ) -> Result<(), TreeDecompositionValidationError>;

    fn is_valid(&self, graph: &HashMapGraph, td: &TreeDecomposition) -> bool {
        self.validate(graph, td).is_ok()
    }
}

/// Checks the three tree decomposition properties together with the tree shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDecompositionVerifier;

impl DecompositionValidator for TreeDecompositionVerifier {
    fn validate(
        &self,
        graph: &HashMapGraph,
        td: &TreeDecomposition,
    ) -> Result<(), TreeDecompositionValidationError> {
        td.verify(graph)
    }
}

/// Decomposes along a fixed elimination order.
#[derive(Debug, Clone)]
pub struct EliminationOrderDecomposer {
    order: Vec<usize>,
}

impl EliminationOrderDecomposer {
    pub fn new(order: Vec<usize>) -> Self {
        Self { order }
    }
}

impl DecompositionSolver for EliminationOrderDecomposer {
    fn solve(&self, graph: &HashMapGraph) -> Result<TreeDecomposition, SolverError> {
        let order: Vec<usize> = self
            .order
            .iter()
            .copied()
            .filter(|v| graph.has_vertex(*v))
            .collect();
        let seen: FxHashSet<usize> = order.iter().copied().collect();
        let mut order = order;
        order.extend(graph.sorted_vertices().into_iter().filter(|v| !seen.contains(v)));

        let width = get_width(graph, &order);
        let mut td = EliminationOrder::new(order, width).to_tree_decomposition(graph);
        td.flatten();
        Ok(td)
    }
}

/// Optimal tree decompositions, solving every connected component on its own.
#[derive(Debug, Clone, Copy)]
pub struct ExactSolver {
    max_order: Option<usize>,
    flatten: bool,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self {
            max_order: None,
            flatten: true,
        }
    }
}

impl ExactSolver {
    impl_setter!(self, max_order, Option<usize>);
    impl_setter!(self, flatten, bool);
}

impl DecompositionSolver for ExactSolver {
    fn solve(&self, graph: &HashMapGraph) -> Result<TreeDecomposition, SolverError> {
        #[cfg(feature = "log")]
        info!("attempting to solve graph with {} vertices", graph.order());

        let mut td = TreeDecomposition::default();
        if graph.order() == 0 {
            return Ok(td);
        }
        if graph.order() <= 2 {
            td.add_bag(graph.vertices().collect());
            return Ok(td);
        }

        let components = graph.connected_components();
        #[cfg(feature = "log")]
        info!("graph has {} connected components", components.len());
        if components.len() > 1 {
            td.add_bag(FxHashSet::default());
        }

        for component in components {
            if component.len() <= 2 {
                let id = td.add_bag(component);
                if id > 0 {
                    td.add_edge(0, id);
                }
                continue;
            }
            if let Some(limit) = self.max_order {
                if component.len() > limit {
                    return Err(SolverError::TooLarge {
                        order: component.len(),
                        limit,
                    });
                }
            }

            let subgraph = graph.vertex_induced(&component);
            let order = TreewidthDp::with_graph(&subgraph).compute();
            #[cfg(feature = "log")]
            info!(
                "solved component with {} vertices, width {}",
                subgraph.order(),
                order.width()
            );
            let mut partial = order.to_tree_decomposition(&subgraph);
            if self.flatten {
                partial.flatten();
            }
            if td.bags.is_empty() {
                td = partial;
            } else {
                td.combine_with(0, partial);
            }
        }
        td.root = Some(0);
        #[cfg(feature = "log")]
        info!("computed tree decomposition of width {}", td.width());
        Ok(td)
    }
}
