use crate::error::{Error, FormatError};
use crate::graph::{HashMapGraph, MutableGraph};
use crate::nice::{NiceNode, NiceTreeDecomposition};
use crate::tree_decomposition::TreeDecomposition;
use fxhash::{FxHashMap, FxHashSet};
#[cfg(feature = "log")]
use log::warn;
use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const GRAPH_HEADER: &str = "p tw <vertices> <edges>";
const TD_HEADER: &str = "s td <bags> <width + 1> <vertices>";

fn parse_number(token: &str) -> Option<usize> {
    token.parse::<usize>().ok()
}

fn invalid_line(line: usize, content: &str) -> FormatError {
    FormatError::InvalidLine {
        line,
        content: content.to_string(),
    }
}

/// Reads a graph in the `.gr` format of the PACE challenge. Vertices are
/// `1..=n`, an edge may be given once per direction.
pub struct GraphReader<T: BufRead>(pub T);

impl<T: BufRead> TryFrom<GraphReader<T>> for HashMapGraph {
    type Error = Error;

    fn try_from(reader: GraphReader<T>) -> Result<Self, Self::Error> {
        let reader = reader.0;
        let mut header: Option<(usize, usize)> = None;
        let mut graph = HashMapGraph::new();
        let mut declared: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut found = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();

            if line.starts_with('p') {
                if header.is_some() {
                    return Err(FormatError::MultipleHeaders { line: line_no }.into());
                }
                let invalid = FormatError::InvalidHeader {
                    line: line_no,
                    expected: GRAPH_HEADER,
                };
                if tokens.len() != 4 || tokens[0] != "p" || tokens[1] != "tw" {
                    return Err(invalid.into());
                }
                match (parse_number(tokens[2]), parse_number(tokens[3])) {
                    (Some(n), Some(m)) => {
                        header = Some((n, m));
                        graph = HashMapGraph::try_with_vertices(n).map_err(|_| {
                            FormatError::TooManyVertices {
                                line: line_no,
                                order: n,
                            }
                        })?;
                    }
                    _ => return Err(invalid.into()),
                }
                continue;
            }

            let (n, _) = header.ok_or(FormatError::LineBeforeHeader { line: line_no })?;
            if tokens.len() != 2 {
                return Err(invalid_line(line_no, line).into());
            }
            let (u, v) = match (parse_number(tokens[0]), parse_number(tokens[1])) {
                (Some(u), Some(v)) => (u, v),
                _ => return Err(invalid_line(line_no, line).into()),
            };
            for vertex in [u, v].iter().copied() {
                if vertex == 0 || vertex > n {
                    return Err(FormatError::VertexOutOfRange {
                        line: line_no,
                        vertex,
                        order: n,
                    }
                    .into());
                }
            }
            if u == v {
                return Err(FormatError::SelfLoop {
                    line: line_no,
                    vertex: u,
                }
                .into());
            }
            if !declared.insert((u, v)) {
                return Err(FormatError::DuplicateEdge { line: line_no, u, v }.into());
            }
            graph.add_edge(u, v);
            found += 1;
        }

        let (_, m) = header.ok_or(FormatError::MissingHeader)?;
        if found != m {
            return Err(FormatError::EdgeCountMismatch {
                declared: m,
                found,
            }
            .into());
        }
        Ok(graph)
    }
}

/// Reads a tree decomposition in the `.td` format of the PACE challenge. Bag
/// ids of the file are mapped to dense indices in order of appearance.
pub struct TreeDecompositionReader<T: BufRead>(pub T);

impl<T: BufRead> TryFrom<TreeDecompositionReader<T>> for TreeDecomposition {
    type Error = Error;

    fn try_from(reader: TreeDecompositionReader<T>) -> Result<Self, Self::Error> {
        let reader = reader.0;
        let mut header: Option<(usize, usize, usize)> = None;
        let mut td = TreeDecomposition::default();
        let mut bag_index: FxHashMap<usize, usize> = FxHashMap::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();

            if line.starts_with('s') {
                if header.is_some() {
                    return Err(FormatError::MultipleHeaders { line: line_no }.into());
                }
                let invalid = FormatError::InvalidHeader {
                    line: line_no,
                    expected: TD_HEADER,
                };
                if tokens.len() != 5 || tokens[0] != "s" || tokens[1] != "td" {
                    return Err(invalid.into());
                }
                match (
                    parse_number(tokens[2]),
                    parse_number(tokens[3]),
                    parse_number(tokens[4]),
                ) {
                    (Some(bags), Some(size), Some(vertices)) => {
                        header = Some((bags, size, vertices))
                    }
                    _ => return Err(invalid.into()),
                }
            } else if line.starts_with('b') {
                if header.is_none() {
                    return Err(FormatError::LineBeforeHeader { line: line_no }.into());
                }
                if tokens[0] != "b" || tokens.len() < 2 {
                    return Err(invalid_line(line_no, line).into());
                }
                let numbers: Option<Vec<usize>> =
                    tokens[1..].iter().map(|t| parse_number(t)).collect();
                let numbers = numbers.ok_or_else(|| invalid_line(line_no, line))?;
                let bag = numbers[0];
                if bag_index.contains_key(&bag) {
                    return Err(FormatError::DuplicateBag { line: line_no, bag }.into());
                }
                let id = td.add_bag(numbers[1..].iter().copied().collect());
                bag_index.insert(bag, id);
            } else {
                if tokens.len() != 2 {
                    return Err(invalid_line(line_no, line).into());
                }
                let (a, b) = match (parse_number(tokens[0]), parse_number(tokens[1])) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(invalid_line(line_no, line).into()),
                };
                let lookup = |bag: usize| {
                    bag_index
                        .get(&bag)
                        .copied()
                        .ok_or(FormatError::UndeclaredBag { line: line_no, bag })
                };
                let (a, b) = (lookup(a)?, lookup(b)?);
                if a == b {
                    return Err(invalid_line(line_no, line).into());
                }
                td.add_edge(a, b);
            }
        }

        let (bags, size, _) = header.ok_or(FormatError::MissingHeader)?;
        if bags != td.bags.len() || size != td.max_bag_size {
            #[cfg(feature = "log")]
            warn!(
                "td header announces {} bags of size {}, found {} bags of size {}",
                bags,
                size,
                td.bags.len(),
                td.max_bag_size
            );
        }
        Ok(td)
    }
}

pub fn read_graph<P: AsRef<Path>>(path: P) -> Result<HashMapGraph, Error> {
    let file = File::open(path)?;
    HashMapGraph::try_from(GraphReader(BufReader::new(file)))
}

pub fn read_tree_decomposition<P: AsRef<Path>>(path: P) -> Result<TreeDecomposition, Error> {
    let file = File::open(path)?;
    TreeDecomposition::try_from(TreeDecompositionReader(BufReader::new(file)))
}

/// Writes one line per node in index order:
/// `(id,{bag}) label [neighbors] [introduced edges]`.
pub struct NiceTreeDecompositionWriter<'a, W: Write> {
    nice: &'a NiceTreeDecomposition,
    writer: W,
}

impl<'a, W: Write> NiceTreeDecompositionWriter<'a, W> {
    pub fn new(nice: &'a NiceTreeDecomposition, writer: W) -> Self {
        Self { nice, writer }
    }

    pub fn output(mut self) -> io::Result<()> {
        for node in self.nice.nodes() {
            let neighbors: Vec<String> = self
                .nice
                .neighbors(node.id)
                .into_iter()
                .map(|n| format_node(self.nice.node(n)))
                .collect();
            let edges: Vec<String> = node
                .introduced_edges
                .iter()
                .map(|(u, v)| format!("({},{})", u, v))
                .collect();
            writeln!(
                self.writer,
                "{} {} [{}] [{}]",
                format_node(node),
                node.kind.label(),
                neighbors.join(","),
                edges.join(",")
            )?;
        }
        self.writer.flush()
    }
}

fn format_node(node: &NiceNode) -> String {
    let bag: Vec<String> = node.bag.iter().map(|v| v.to_string()).collect();
    format!("({},{{{}}})", node.id, bag.join(","))
}
