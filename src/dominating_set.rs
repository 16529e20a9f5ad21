use crate::error::ConsistencyError;
use crate::nice::{NiceNode, NiceTreeDecomposition, NodeKind};
use fxhash::{FxHashMap, FxHashSet};
#[cfg(feature = "log")]
use log::debug;

const INFEASIBLE: usize = usize::MAX;

/// State of a bag vertex in a partial solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Not in the set, has to be dominated by the partial solution.
    White,
    /// In the set.
    Black,
    /// Not in the set, may or may not be dominated.
    Grey,
}

const COLORS: [Color; 3] = [Color::White, Color::Black, Color::Grey];

/// Colors of the bag vertices, aligned with the sorted bag.
type Coloring = Vec<Color>;
type Table = FxHashMap<Coloring, usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominatingSet {
    pub size: usize,
    pub vertices: Vec<usize>,
}

/// Minimum dominating set by dynamic programming over a labeled nice tree
/// decomposition. Needs the introduced edges assigned by the labeler, and takes
/// time and memory exponential in the bag size.
pub struct DominatingSetSolver<'a> {
    nice: &'a NiceTreeDecomposition,
    tables: Vec<Table>,
}

impl<'a> DominatingSetSolver<'a> {
    pub fn new(nice: &'a NiceTreeDecomposition) -> Self {
        Self {
            nice,
            tables: Vec::new(),
        }
    }

    pub fn solve(mut self) -> Result<DominatingSet, ConsistencyError> {
        let mut tables: Vec<Table> = vec![Table::default(); self.nice.len()];
        // children have larger indices than their parents
        for id in (0..self.nice.len()).rev() {
            let node = self.nice.node(id);
            let base = self.base_table(node, &tables);
            tables[id] = self.introduce_edges(node, base)?;
        }
        self.tables = tables;

        let size = lookup(&self.tables[0], &[]);
        if size == INFEASIBLE {
            return Err(ConsistencyError::InvalidNode { node: 0 });
        }
        let vertices = self.witness(size);
        #[cfg(feature = "log")]
        debug!("dominating set of size {}: {:?}", size, vertices);
        Ok(DominatingSet { size, vertices })
    }

    fn base_table(&self, node: &NiceNode, tables: &[Table]) -> Table {
        let mut table = Table::default();
        match node.kind {
            NodeKind::Leaf => {
                table.insert(Vec::new(), 0);
            }
            NodeKind::Introduce(v) => {
                let child = &tables[node.children[0]];
                let pos = position(&node.bag, v);
                for coloring in colorings(node.bag.len()) {
                    let mut reduced = coloring.clone();
                    let color = reduced.remove(pos);
                    let value = match color {
                        Color::White => INFEASIBLE,
                        Color::Grey => lookup(child, &reduced),
                        Color::Black => add(lookup(child, &reduced), 1),
                    };
                    table.insert(coloring, value);
                }
            }
            NodeKind::Forget(w) => {
                let child = &tables[node.children[0]];
                let pos = position(&self.nice.node(node.children[0]).bag, w);
                for coloring in colorings(node.bag.len()) {
                    let value = [Color::Black, Color::White]
                        .iter()
                        .map(|c| lookup(child, &with_color(&coloring, pos, *c)))
                        .min()
                        .unwrap_or(INFEASIBLE);
                    table.insert(coloring, value);
                }
            }
            NodeKind::Join => {
                let left = &tables[node.children[0]];
                let right = &tables[node.children[1]];
                for coloring in colorings(node.bag.len()) {
                    let black = coloring.iter().filter(|c| **c == Color::Black).count();
                    let value = splits(&coloring)
                        .map(|(l, r)| {
                            let value = add(lookup(left, &l), lookup(right, &r));
                            if value == INFEASIBLE {
                                INFEASIBLE
                            } else {
                                value - black
                            }
                        })
                        .min()
                        .unwrap_or(INFEASIBLE);
                    table.insert(coloring, value);
                }
            }
        }
        table
    }

    /// An edge `(u, v)` lets a black endpoint dominate a white one, so the
    /// white endpoint may be treated as grey.
    fn introduce_edges(
        &self,
        node: &NiceNode,
        mut table: Table,
    ) -> Result<Table, ConsistencyError> {
        for (u, v) in node.introduced_edges.iter().copied() {
            let (pu, pv) = match (node.bag.binary_search(&u), node.bag.binary_search(&v)) {
                (Ok(pu), Ok(pv)) => (pu, pv),
                _ => {
                    return Err(ConsistencyError::EdgeOutsideBag {
                        node: node.id,
                        u,
                        v,
                    })
                }
            };
            table = table
                .keys()
                .map(|coloring| {
                    let source = relax(coloring, pu, pv);
                    (coloring.clone(), lookup(&table, &source))
                })
                .collect();
        }
        Ok(table)
    }

    /// Walks down from the root, picking for every node a coloring of its
    /// children that realizes the optimum.
    fn witness(&self, size: usize) -> Vec<usize> {
        let mut vertices: FxHashSet<usize> = FxHashSet::default();
        let mut stack: Vec<(usize, Coloring, usize)> = vec![(0, Vec::new(), size)];
        while let Some((id, mut coloring, value)) = stack.pop() {
            let node = self.nice.node(id);
            for (u, v) in node.introduced_edges.iter().rev() {
                if let (Ok(pu), Ok(pv)) = (node.bag.binary_search(u), node.bag.binary_search(v)) {
                    coloring = relax(&coloring, pu, pv);
                }
            }
            match node.kind {
                NodeKind::Leaf => {}
                NodeKind::Introduce(v) => {
                    let pos = position(&node.bag, v);
                    let color = coloring.remove(pos);
                    let value = if color == Color::Black {
                        vertices.insert(v);
                        value - 1
                    } else {
                        value
                    };
                    stack.push((node.children[0], coloring, value));
                }
                NodeKind::Forget(w) => {
                    let child = node.children[0];
                    let pos = position(&self.nice.node(child).bag, w);
                    if let Some(next) = [Color::Black, Color::White]
                        .iter()
                        .map(|c| with_color(&coloring, pos, *c))
                        .find(|c| lookup(&self.tables[child], c) == value)
                    {
                        stack.push((child, next, value));
                    }
                }
                NodeKind::Join => {
                    let (left, right) = (node.children[0], node.children[1]);
                    let black = coloring.iter().filter(|c| **c == Color::Black).count();
                    if let Some((l, r)) = splits(&coloring).find(|(l, r)| {
                        add(lookup(&self.tables[left], l), lookup(&self.tables[right], r))
                            == value + black
                    }) {
                        let left_value = lookup(&self.tables[left], &l);
                        let right_value = lookup(&self.tables[right], &r);
                        stack.push((left, l, left_value));
                        stack.push((right, r, right_value));
                    }
                }
            }
        }
        let mut vertices: Vec<usize> = vertices.into_iter().collect();
        vertices.sort_unstable();
        vertices
    }
}

fn add(a: usize, b: usize) -> usize {
    if a == INFEASIBLE || b == INFEASIBLE {
        INFEASIBLE
    } else {
        a + b
    }
}

fn lookup(table: &Table, coloring: &[Color]) -> usize {
    table.get(coloring).copied().unwrap_or(INFEASIBLE)
}

fn position(bag: &[usize], v: usize) -> usize {
    bag.binary_search(&v).unwrap_or_else(|pos| pos)
}

fn with_color(coloring: &[Color], pos: usize, color: Color) -> Coloring {
    let mut extended = coloring.to_vec();
    extended.insert(pos, color);
    extended
}

fn relax(coloring: &[Color], pu: usize, pv: usize) -> Coloring {
    let mut relaxed = coloring.to_vec();
    match (coloring[pu], coloring[pv]) {
        (Color::Black, Color::White) => relaxed[pv] = Color::Grey,
        (Color::White, Color::Black) => relaxed[pu] = Color::Grey,
        _ => {}
    }
    relaxed
}

/// All `3^k` colorings of a bag of size `k`.
fn colorings(k: usize) -> Vec<Coloring> {
    let mut all: Vec<Coloring> = vec![Vec::with_capacity(k)];
    for _ in 0..k {
        all = all
            .into_iter()
            .flat_map(|prefix| {
                COLORS.iter().map(move |c| {
                    let mut next = prefix.clone();
                    next.push(*c);
                    next
                })
            })
            .collect();
    }
    all
}

/// Pairs of child colorings consistent with a join coloring: black and grey
/// are kept on both sides, a white vertex is dominated on exactly one side and
/// grey on the other.
fn splits(coloring: &[Color]) -> impl Iterator<Item = (Coloring, Coloring)> + '_ {
    let whites: Vec<usize> = coloring
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == Color::White)
        .map(|(i, _)| i)
        .collect();
    (0..1u64 << whites.len()).map(move |mask| {
        let mut left = coloring.to_vec();
        let mut right = coloring.to_vec();
        for (bit, pos) in whites.iter().enumerate() {
            if mask & (1 << bit) == 0 {
                right[*pos] = Color::Grey;
            } else {
                left[*pos] = Color::Grey;
            }
        }
        (left, right)
    })
}

#[cfg(test)]
mod tests {
    use crate::dominating_set::{colorings, DominatingSetSolver};
    use crate::graph::{BaseGraph, HashMapGraph, MutableGraph};
    use crate::labeling::{Labeler, SchedulePolicy};
    use crate::nice::Nicifier;
    use crate::solver::{DecompositionSolver, EliminationOrderDecomposer, ExactSolver};
    use crate::tree_decomposition::TreeDecomposition;
    use rand::prelude::*;

    fn solve_with(
        graph: &HashMapGraph,
        td: &TreeDecomposition,
        policy: SchedulePolicy,
    ) -> (usize, Vec<usize>) {
        let mut nice = Nicifier::new(td).nicify().unwrap();
        Labeler::new(graph).policy(policy).label(&mut nice).unwrap();
        let set = DominatingSetSolver::new(&nice).solve().unwrap();
        assert_eq!(set.size, set.vertices.len());
        assert!(dominates(graph, &set.vertices));
        (set.size, set.vertices)
    }

    fn solve(graph: &HashMapGraph) -> usize {
        let td = ExactSolver::default().solve(graph).unwrap();
        solve_with(graph, &td, SchedulePolicy::RootPath).0
    }

    fn dominates(graph: &HashMapGraph, set: &[usize]) -> bool {
        graph
            .vertices()
            .all(|v| set.contains(&v) || graph.neighborhood(v).any(|u| set.contains(&u)))
    }

    fn brute_force(graph: &HashMapGraph) -> usize {
        let vertices = graph.sorted_vertices();
        (0u32..1 << vertices.len())
            .filter_map(|mask| {
                let set: Vec<usize> = vertices
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, v)| *v)
                    .collect();
                if dominates(graph, &set) {
                    Some(set.len())
                } else {
                    None
                }
            })
            .min()
            .unwrap()
    }

    fn path(n: usize) -> HashMapGraph {
        let mut graph = HashMapGraph::with_vertices(n);
        for u in 1..n {
            graph.add_edge(u, u + 1);
        }
        graph
    }

    #[test]
    fn enumerates_colorings() {
        assert_eq!(colorings(0).len(), 1);
        assert_eq!(colorings(3).len(), 27);
    }

    #[test]
    fn known_sizes() {
        assert_eq!(solve(&path(3)), 1);

        let mut star = HashMapGraph::with_vertices(5);
        for v in 2..=5 {
            star.add_edge(1, v);
        }
        assert_eq!(solve(&star), 1);

        let mut cycle = path(5);
        cycle.add_edge(5, 1);
        assert_eq!(solve(&cycle), 2);

        let mut grid = HashMapGraph::with_vertices(9);
        for v in 1..=9 {
            if v % 3 != 0 {
                grid.add_edge(v, v + 1);
            }
            if v + 3 <= 9 {
                grid.add_edge(v, v + 3);
            }
        }
        assert_eq!(solve(&grid), 3);

        assert_eq!(solve(&HashMapGraph::with_vertices(6)), 6);
        assert_eq!(solve(&HashMapGraph::with_vertices(0)), 0);
    }

    #[test]
    fn witness_on_star() {
        let mut star = HashMapGraph::with_vertices(5);
        for v in 2..=5 {
            star.add_edge(1, v);
        }
        let td = ExactSolver::default().solve(&star).unwrap();
        assert_eq!(solve_with(&star, &td, SchedulePolicy::RootPath).1, vec![1]);
    }

    #[test]
    fn needs_introduced_edges() {
        let graph = path(3);
        let td = ExactSolver::default().solve(&graph).unwrap();
        let nice = Nicifier::new(&td).nicify().unwrap();
        // without introduced edges nothing can be dominated by a neighbor
        let set = DominatingSetSolver::new(&nice).solve().unwrap();
        assert_eq!(set.size, 3);
    }

    #[test]
    fn random_graphs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..30 {
            let n = rng.gen_range(1..9);
            let mut graph = HashMapGraph::with_vertices(n);
            for u in 1..=n {
                for v in u + 1..=n {
                    if rng.gen_bool(0.3) {
                        graph.add_edge(u, v);
                    }
                }
            }
            let expected = brute_force(&graph);
            let exact = ExactSolver::default().solve(&graph).unwrap();
            assert_eq!(solve_with(&graph, &exact, SchedulePolicy::RootPath).0, expected);
            assert_eq!(
                solve_with(&graph, &exact, SchedulePolicy::CanonicalOrder).0,
                expected
            );

            let mut order: Vec<usize> = (1..=n).collect();
            order.shuffle(&mut rng);
            let wide = EliminationOrderDecomposer::new(order).solve(&graph).unwrap();
            assert_eq!(solve_with(&graph, &wide, SchedulePolicy::RootPath).0, expected);
        }
    }
}
