use crate::tree_decomposition::TreeDecompositionValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: more than one header line")]
    MultipleHeaders { line: usize },
    #[error("line {line}: invalid header, expected `{expected}`")]
    InvalidHeader { line: usize, expected: &'static str },
    #[error("line {line}: the first non-comment line must be the header")]
    LineBeforeHeader { line: usize },
    #[error("line {line}: malformed line `{content}`")]
    InvalidLine { line: usize, content: String },
    #[error("line {line}: vertex {vertex} is not in 1..={order}")]
    VertexOutOfRange {
        line: usize,
        vertex: usize,
        order: usize,
    },
    #[error("line {line}: self-loop on vertex {vertex}")]
    SelfLoop { line: usize, vertex: usize },
    #[error("line {line}: edge ({u}, {v}) is declared twice")]
    DuplicateEdge { line: usize, u: usize, v: usize },
    #[error("line {line}: bag {bag} is declared twice")]
    DuplicateBag { line: usize, bag: usize },
    #[error("line {line}: bag {bag} is not declared")]
    UndeclaredBag { line: usize, bag: usize },
    #[error("line {line}: cannot allocate a graph with {order} vertices")]
    TooManyVertices { line: usize, order: usize },
    #[error("missing header line")]
    MissingHeader,
    #[error("header declares {declared} edges but {found} were given")]
    EdgeCountMismatch { declared: usize, found: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("node {node} matches no nice node type")]
    InvalidNode { node: usize },
    #[error("node {node} is labeled {stored} but its children make it {derived}")]
    LabelMismatch {
        node: usize,
        stored: String,
        derived: String,
    },
    #[error("node {node} is not linked to its parent {parent}")]
    BrokenLink { node: usize, parent: usize },
    #[error("the root {node} does not have an empty bag")]
    NonEmptyRoot { node: usize },
    #[error("{introduced} edges were introduced but the graph has {expected}")]
    EdgeCount { introduced: usize, expected: usize },
    #[error("edge ({u}, {v}) is introduced more than once")]
    DuplicateEdge { u: usize, v: usize },
    #[error("edge ({u}, {v}) is introduced at node {node} whose bag misses an endpoint")]
    EdgeOutsideBag { node: usize, u: usize, v: usize },
    #[error("input decomposition is not a tree")]
    NotATree,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("component with {order} vertices exceeds the exact solver limit of {limit}")]
    TooLarge { order: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("supplied decomposition does not cover graph: {0}")]
    Validation(#[from] TreeDecompositionValidationError),
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),
}
