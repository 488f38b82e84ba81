use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EDGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*[-:]\s*(\d+)").unwrap());

/// Undirected edge between two distinct vertices, stored with `0 < 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge(pub usize, pub usize);

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        if a < b { Edge(a, b) } else { Edge(b, a) }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Which adjacency matrix a spectrum refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixKind {
    /// A[i][j] = +1, A[j][i] = −1 per edge. Spectrum on the imaginary axis.
    #[default]
    Skew,
    /// 0/1 undirected adjacency. Spectrum on the real axis.
    Symmetric,
}

impl MatrixKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skew => "skew",
            Self::Symmetric => "symmetric",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skew" | "skew-symmetric" => Some(Self::Skew),
            "symmetric" | "sym" => Some(Self::Symmetric),
            _ => None,
        }
    }
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    VertexOutOfRange { vertex: usize, n: usize },
    SelfLoop(usize),
    Parse(String),
    TooLarge { n: usize, max: usize },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::VertexOutOfRange { vertex, n } => {
                write!(f, "vertex {vertex} out of range for n={n}")
            }
            GraphError::SelfLoop(v) => write!(f, "self-loop at vertex {v}"),
            GraphError::Parse(msg) => write!(f, "invalid edge list: {msg}"),
            GraphError::TooLarge { n, max } => {
                write!(f, "{n} vertices exceeds the canonical labelling limit of {max}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Simple undirected graph on vertices `0..n`.
///
/// The edge set is the only state. Both adjacency matrices are derived from it
/// on demand and never stored, so they cannot drift from the edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Graph {
    n: usize,
    edges: Vec<Edge>,
}

/// Number of possible undirected edges on `n` vertices.
pub fn edge_slots(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Position of edge (i, j), i < j, in lexicographic pair order.
pub fn pair_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    i * (2 * n - i - 1) / 2 + (j - i - 1)
}

impl Graph {
    pub fn new(
        n: usize,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GraphError> {
        let mut list = Vec::new();
        for (a, b) in edges {
            if a >= n {
                return Err(GraphError::VertexOutOfRange { vertex: a, n });
            }
            if b >= n {
                return Err(GraphError::VertexOutOfRange { vertex: b, n });
            }
            if a == b {
                return Err(GraphError::SelfLoop(a));
            }
            list.push(Edge::new(a, b));
        }
        list.sort_unstable();
        list.dedup();
        Ok(Self { n, edges: list })
    }

    pub fn empty(n: usize) -> Self {
        Self {
            n,
            edges: Vec::new(),
        }
    }

    /// Trusted construction from generated edges; normalizes order only.
    pub(crate) fn from_edges(n: usize, mut edges: Vec<Edge>) -> Self {
        debug_assert!(edges.iter().all(|e| e.0 < e.1 && e.1 < n));
        edges.sort_unstable();
        edges.dedup();
        Self { n, edges }
    }

    /// Graph whose edges are the set bits of `mask` in lexicographic pair order.
    pub fn from_mask(n: usize, mask: u64) -> Self {
        let mut edges = Vec::with_capacity(mask.count_ones() as usize);
        let mut idx = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if idx < 64 && mask & (1u64 << idx) != 0 {
                    edges.push(Edge(i, j));
                }
                idx += 1;
            }
        }
        Self { n, edges }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_pairs(&self) -> Vec<(usize, usize)> {
        self.edges.iter().map(|e| (e.0, e.1)).collect()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        a != b && self.edges.binary_search(&Edge::new(a, b)).is_ok()
    }

    /// Neighbor bitsets. Only valid for n ≤ 64.
    pub fn adjacency_bits(&self) -> Vec<u64> {
        debug_assert!(self.n <= 64);
        let mut adj = vec![0u64; self.n];
        for &Edge(a, b) in &self.edges {
            adj[a] |= 1 << b;
            adj[b] |= 1 << a;
        }
        adj
    }

    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.n];
        for &Edge(a, b) in &self.edges {
            adj[a].push(b);
            adj[b].push(a);
        }
        adj
    }

    pub fn degrees(&self) -> Vec<usize> {
        let mut deg = vec![0; self.n];
        for &Edge(a, b) in &self.edges {
            deg[a] += 1;
            deg[b] += 1;
        }
        deg
    }

    pub fn max_degree(&self) -> usize {
        self.degrees().into_iter().max().unwrap_or(0)
    }

    pub fn is_regular(&self) -> bool {
        let deg = self.degrees();
        deg.windows(2).all(|w| w[0] == w[1])
    }

    /// Connected components, each sorted, ordered by smallest vertex.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let adj = self.neighbors();
        let mut seen = vec![false; self.n];
        let mut out = Vec::new();
        for start in 0..self.n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut comp = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                for &w in &adj[v] {
                    if !seen[w] {
                        seen[w] = true;
                        comp.push(w);
                        queue.push_back(w);
                    }
                }
            }
            comp.sort_unstable();
            out.push(comp);
        }
        out
    }

    /// Breadth-first connectivity check. The empty graph on 0 or 1 vertex is connected.
    pub fn is_connected(&self) -> bool {
        if self.n <= 1 {
            return true;
        }
        if self.edges.len() < self.n - 1 {
            return false;
        }
        self.components().len() == 1
    }

    pub fn is_bipartite(&self) -> bool {
        let adj = self.neighbors();
        let mut side: Vec<Option<bool>> = vec![None; self.n];
        for start in 0..self.n {
            if side[start].is_some() {
                continue;
            }
            side[start] = Some(false);
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                let sv = side[v].unwrap_or(false);
                for &w in &adj[v] {
                    match side[w] {
                        None => {
                            side[w] = Some(!sv);
                            queue.push_back(w);
                        }
                        Some(sw) if sw == sv => return false,
                        Some(_) => {}
                    }
                }
            }
        }
        true
    }

    /// Subgraph induced by `vertices`, relabelled so `vertices[k]` becomes `k`.
    pub fn induced(&self, vertices: &[usize]) -> Graph {
        let mut index = vec![usize::MAX; self.n];
        for (k, &v) in vertices.iter().enumerate() {
            index[v] = k;
        }
        let mut edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| index[e.0] != usize::MAX && index[e.1] != usize::MAX)
            .map(|e| Edge::new(index[e.0], index[e.1]))
            .collect();
        edges.sort_unstable();
        Graph {
            n: vertices.len(),
            edges,
        }
    }

    /// Relabel vertex `v` as `perm[v]`.
    pub fn relabel(&self, perm: &[usize]) -> Graph {
        debug_assert_eq!(perm.len(), self.n);
        let mut edges: Vec<Edge> = self
            .edges
            .iter()
            .map(|e| Edge::new(perm[e.0], perm[e.1]))
            .collect();
        edges.sort_unstable();
        Graph { n: self.n, edges }
    }

    /// Skew-symmetric adjacency with every edge oriented from lower to higher index.
    pub fn skew_adjacency(&self) -> Vec<Vec<i64>> {
        let identity: Vec<usize> = (0..self.n).collect();
        self.skew_adjacency_oriented(&identity)
    }

    /// Skew-symmetric adjacency with each edge oriented from lower to higher `rank`.
    pub fn skew_adjacency_oriented(&self, rank: &[usize]) -> Vec<Vec<i64>> {
        let mut m = vec![vec![0i64; self.n]; self.n];
        for &Edge(a, b) in &self.edges {
            let (from, to) = if rank[a] < rank[b] { (a, b) } else { (b, a) };
            m[from][to] = 1;
            m[to][from] = -1;
        }
        m
    }

    pub fn symmetric_adjacency(&self) -> Vec<Vec<i64>> {
        let mut m = vec![vec![0i64; self.n]; self.n];
        for &Edge(a, b) in &self.edges {
            m[a][b] = 1;
            m[b][a] = 1;
        }
        m
    }

    /// Cartesian product G □ H; vertex (g, h) becomes `g * |H| + h`.
    pub fn cartesian_product(&self, other: &Graph) -> Graph {
        let m = other.n;
        let mut edges = Vec::new();
        for g in 0..self.n {
            for &Edge(a, b) in &other.edges {
                edges.push(Edge::new(g * m + a, g * m + b));
            }
        }
        for &Edge(a, b) in &self.edges {
            for h in 0..m {
                edges.push(Edge::new(a * m + h, b * m + h));
            }
        }
        edges.sort_unstable();
        edges.dedup();
        Graph {
            n: self.n * m,
            edges,
        }
    }

    /// Tensor (Kronecker) product G × H.
    pub fn tensor_product(&self, other: &Graph) -> Graph {
        let m = other.n;
        let mut edges = Vec::new();
        for &Edge(a, b) in &self.edges {
            for &Edge(c, d) in &other.edges {
                edges.push(Edge::new(a * m + c, b * m + d));
                edges.push(Edge::new(a * m + d, b * m + c));
            }
        }
        edges.sort_unstable();
        edges.dedup();
        Graph {
            n: self.n * m,
            edges,
        }
    }

    /// Disjoint union; `other`'s vertices are shifted by `self.n()`.
    pub fn disjoint_union(&self, other: &Graph) -> Graph {
        let shift = self.n;
        let mut edges = self.edges.clone();
        edges.extend(other.edges.iter().map(|e| Edge(e.0 + shift, e.1 + shift)));
        Graph {
            n: self.n + other.n,
            edges,
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edges.is_empty() {
            return write!(f, "n={} (no edges)", self.n);
        }
        let list: Vec<String> = self.edges.iter().map(|e| e.to_string()).collect();
        write!(f, "n={} {{{}}}", self.n, list.join(", "))
    }
}

/// Parse `"0-1, 1-2 2:3"` style edge lists.
pub fn parse_edge_list(n: usize, text: &str) -> Result<Graph, GraphError> {
    let mut pairs = Vec::new();
    for cap in EDGE_TOKEN.captures_iter(text) {
        let a = cap[1]
            .parse::<usize>()
            .map_err(|e| GraphError::Parse(format!("{}: {e}", &cap[1])))?;
        let b = cap[2]
            .parse::<usize>()
            .map_err(|e| GraphError::Parse(format!("{}: {e}", &cap[2])))?;
        pairs.push((a, b));
    }
    let leftover = EDGE_TOKEN.replace_all(text, "");
    if leftover.chars().any(|c| !(c.is_whitespace() || c == ',' || c == ';')) {
        return Err(GraphError::Parse(format!(
            "unrecognized tokens in {text:?}"
        )));
    }
    Graph::new(n, pairs)
}
