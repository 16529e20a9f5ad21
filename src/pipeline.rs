use crate::dominating_set::{DominatingSet, DominatingSetSolver};
use crate::error::Error;
#[cfg(feature = "log")]
use crate::graph::BaseGraph;
use crate::graph::HashMapGraph;
use crate::io::{read_graph, read_tree_decomposition};
use crate::labeling::{Labeler, SchedulePolicy};
use crate::nice::{NiceTreeDecomposition, Nicifier};
use crate::solver::{
    DecompositionSolver, DecompositionValidator, ExactSolver, TreeDecompositionVerifier,
};
use crate::tree_decomposition::TreeDecomposition;
#[cfg(feature = "log")]
use log::info;
use std::path::{Path, PathBuf};

/// Graph and optional decomposition in, labeled nice tree decomposition out.
pub struct Pipeline {
    solver: Box<dyn DecompositionSolver>,
    validator: Box<dyn DecompositionValidator>,
    schedule_policy: SchedulePolicy,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            solver: Box::new(ExactSolver::default()),
            validator: Box::new(TreeDecompositionVerifier),
            schedule_policy: SchedulePolicy::default(),
        }
    }
}

impl Pipeline {
    impl_setter!(self, solver, Box<dyn DecompositionSolver>);
    impl_setter!(self, validator, Box<dyn DecompositionValidator>);
    impl_setter!(self, schedule_policy, SchedulePolicy);

    /// A supplied decomposition is validated against `graph`, otherwise one is
    /// computed by the solver.
    pub fn run(
        &self,
        graph: &HashMapGraph,
        td: Option<TreeDecomposition>,
    ) -> Result<NiceTreeDecomposition, Error> {
        let td = match td {
            Some(td) => {
                self.validator.validate(graph, &td)?;
                #[cfg(feature = "log")]
                info!("supplied decomposition has width {}", td.width());
                td
            }
            None => {
                #[cfg(feature = "log")]
                info!(
                    "computing decomposition of a graph with {} vertices and {} edges",
                    graph.order(),
                    graph.num_edges()
                );
                self.solver.solve(graph)?
            }
        };

        let mut nice = Nicifier::new(&td).nicify()?;
        #[cfg(feature = "log")]
        info!("nice decomposition has {} nodes", nice.len());
        Labeler::new(graph)
            .policy(self.schedule_policy)
            .label(&mut nice)?;
        Ok(nice)
    }

    pub fn run_files(
        &self,
        graph_path: &Path,
        td_path: Option<&Path>,
    ) -> Result<(HashMapGraph, NiceTreeDecomposition), Error> {
        let graph = read_graph(graph_path)?;
        let td = match td_path {
            Some(path) => Some(read_tree_decomposition(path)?),
            None => None,
        };
        let nice = self.run(&graph, td)?;
        Ok((graph, nice))
    }

    /// Minimum dominating set of the graph a labeled decomposition was built for.
    pub fn dominating_set(&self, nice: &NiceTreeDecomposition) -> Result<DominatingSet, Error> {
        let set = DominatingSetSolver::new(nice).solve()?;
        #[cfg(feature = "log")]
        info!("minimum dominating set has size {}", set.size);
        Ok(set)
    }
}

/// Splits the optional file arguments into decomposition and output file. A
/// single file is the decomposition if it ends in `.td`, otherwise the output.
pub fn split_file_arguments(mut files: Vec<PathBuf>) -> (Option<PathBuf>, Option<PathBuf>) {
    match files.len() {
        0 => (None, None),
        1 => {
            let file = files.remove(0);
            if file.extension().map_or(false, |e| e == "td") {
                (Some(file), None)
            } else {
                (None, Some(file))
            }
        }
        _ => {
            let output = files.remove(1);
            (Some(files.remove(0)), Some(output))
        }
    }
}
