//! Bridge to the host's editable graph ("graph-core").
//!
//! The host owns vertex geometry. We only read its two adjacency matrices and,
//! when a search result is opened for editing, write vertices and edges back.

use std::f64::consts::TAU;
use std::fmt;

use crate::graph::{Edge, Graph};

/// The host-side graph the engine reads from and materializes into.
pub trait GraphCore {
    /// Skew adjacency: +1 at (i, j) and −1 at (j, i) for an edge oriented i → j.
    fn adjacency_matrix(&self) -> Vec<Vec<i64>>;
    /// 0/1 undirected adjacency.
    fn symmetric_adj_matrix(&self) -> Vec<Vec<i64>>;
    fn clear_graph(&mut self);
    fn create_vertex(&mut self, position: (f64, f64), index: usize);
    fn add_edge(&mut self, i: usize, j: usize);
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    NotSquare { rows: usize, cols: usize },
    SizeMismatch { skew: usize, symmetric: usize },
    InvalidEntry { i: usize, j: usize, value: i64 },
    Inconsistent { i: usize, j: usize },
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::NotSquare { rows, cols } => {
                write!(f, "adjacency matrix is {rows}x{cols}, not square")
            }
            CollaboratorError::SizeMismatch { skew, symmetric } => {
                write!(f, "skew matrix has {skew} rows but symmetric matrix has {symmetric}")
            }
            CollaboratorError::InvalidEntry { i, j, value } => {
                write!(f, "entry ({i}, {j}) = {value} is not a valid adjacency value")
            }
            CollaboratorError::Inconsistent { i, j } => {
                write!(f, "skew and symmetric matrices disagree at ({i}, {j})")
            }
        }
    }
}

impl std::error::Error for CollaboratorError {}

fn check_square(m: &[Vec<i64>]) -> Result<usize, CollaboratorError> {
    let n = m.len();
    match m.iter().find(|row| row.len() != n) {
        Some(row) => Err(CollaboratorError::NotSquare {
            rows: n,
            cols: row.len(),
        }),
        None => Ok(n),
    }
}

/// Derive the undirected graph from the host's matrices, rejecting any
/// disagreement between them.
pub fn read_graph(core: &impl GraphCore) -> Result<Graph, CollaboratorError> {
    let skew = core.adjacency_matrix();
    let sym = core.symmetric_adj_matrix();
    let n = check_square(&sym)?;
    let skew_n = check_square(&skew)?;
    if skew_n != n {
        return Err(CollaboratorError::SizeMismatch {
            skew: skew_n,
            symmetric: n,
        });
    }
    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let (s, a) = (sym[i][j], skew[i][j]);
            if !(0..=1).contains(&s) || (i == j && s != 0) {
                return Err(CollaboratorError::InvalidEntry { i, j, value: s });
            }
            if !(-1..=1).contains(&a) {
                return Err(CollaboratorError::InvalidEntry { i, j, value: a });
            }
            if sym[j][i] != s || skew[j][i] != -a || a.abs() != s {
                return Err(CollaboratorError::Inconsistent { i, j });
            }
            if i < j && s == 1 {
                edges.push((i, j));
            }
        }
    }
    Graph::new(n, edges).map_err(|_| CollaboratorError::Inconsistent { i: 0, j: 0 })
}

/// Replace the host's graph with `graph`, vertices on a circle of `radius`.
pub fn materialize(core: &mut impl GraphCore, graph: &Graph, radius: f64) {
    core.clear_graph();
    let n = graph.n();
    for i in 0..n {
        let angle = TAU * i as f64 / n.max(1) as f64;
        core.create_vertex((radius * angle.cos(), radius * angle.sin()), i);
    }
    for &Edge(a, b) in graph.edges() {
        core.add_edge(a, b);
    }
}

/// In-memory host graph, with edges oriented as added.
///
/// Hosts without their own editor use it to lay a result out: the MCP
/// server materializes classified graphs into one to report vertex positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditableGraph {
    pub positions: Vec<(f64, f64)>,
    pub arcs: Vec<(usize, usize)>,
}

impl GraphCore for EditableGraph {
    fn adjacency_matrix(&self) -> Vec<Vec<i64>> {
        let n = self.positions.len();
        let mut m = vec![vec![0; n]; n];
        for &(i, j) in &self.arcs {
            m[i][j] = 1;
            m[j][i] = -1;
        }
        m
    }

    fn symmetric_adj_matrix(&self) -> Vec<Vec<i64>> {
        let n = self.positions.len();
        let mut m = vec![vec![0; n]; n];
        for &(i, j) in &self.arcs {
            m[i][j] = 1;
            m[j][i] = 1;
        }
        m
    }

    fn clear_graph(&mut self) {
        self.positions.clear();
        self.arcs.clear();
    }

    fn create_vertex(&mut self, position: (f64, f64), index: usize) {
        if index >= self.positions.len() {
            self.positions.resize(index + 1, (0.0, 0.0));
        }
        self.positions[index] = position;
    }

    fn add_edge(&mut self, i: usize, j: usize) {
        let n = self.positions.len();
        if i != j && i < n && j < n && !self.arcs.iter().any(|&(a, b)| (a, b) == (i, j) || (a, b) == (j, i)) {
            self.arcs.push((i, j));
        }
    }
}
