//! Isomorphism-invariant graph fingerprints.
//!
//! `canonical_form` computes an exact canonical labelling: colour refinement
//! to an equitable partition, then individualization of each vertex of the
//! first non-singleton cell, keeping the lexicographically largest adjacency
//! code over all leaves. Interchangeable twins are explored once, since the
//! transposition of two twins is an automorphism that fixes the current
//! colouring. Equal hashes therefore mean isomorphic graphs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CANONICAL_N, POLY_HASH_DECIMALS};
use crate::graph::{Graph, GraphError, edge_slots, pair_index};

/// Fingerprint of a graph's isomorphism class, rendered `"{n}:{code}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalHash(String);

impl CanonicalHash {
    /// Wrap a previously rendered hash (e.g. read back from storage).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of a characteristic polynomial's rounded coefficient sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolynomialHash(String);

impl PolynomialHash {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolynomialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical labelling: `labeling[v]` is the canonical position of vertex `v`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalForm {
    pub code: Vec<u64>,
    pub labeling: Vec<usize>,
}

impl CanonicalForm {
    pub fn hash(&self, n: usize) -> CanonicalHash {
        let words: Vec<String> = self.code.iter().map(|w| format!("{w:x}")).collect();
        CanonicalHash(format!("{n}:{}", words.join(".")))
    }
}

/// Exact canonical labelling.
///
/// # Panics
///
/// If the graph has more than [`MAX_CANONICAL_N`] vertices; untrusted input
/// goes through [`try_canonical_hash`].
pub fn canonical_form(graph: &Graph) -> CanonicalForm {
    let n = graph.n();
    assert!(n <= MAX_CANONICAL_N, "canonical labelling supports at most 64 vertices");
    let words = edge_slots(n).div_ceil(64).max(1);
    if n == 0 {
        return CanonicalForm {
            code: vec![0; words],
            labeling: Vec::new(),
        };
    }
    let adj = graph.adjacency_bits();
    let mut best: Option<CanonicalForm> = None;
    search(&adj, vec![0; n], words, &mut best);
    // A search over a non-empty vertex set always reaches at least one leaf.
    best.unwrap_or_else(|| CanonicalForm {
        code: vec![0; words],
        labeling: (0..n).collect(),
    })
}

pub fn canonical_hash(graph: &Graph) -> CanonicalHash {
    canonical_form(graph).hash(graph.n())
}

/// [`canonical_hash`] for graphs of unchecked size.
pub fn try_canonical_hash(graph: &Graph) -> Result<CanonicalHash, GraphError> {
    if graph.n() > MAX_CANONICAL_N {
        return Err(GraphError::TooLarge {
            n: graph.n(),
            max: MAX_CANONICAL_N,
        });
    }
    Ok(canonical_hash(graph))
}

/// The representative of `graph`'s isomorphism class.
pub fn canonical_graph(graph: &Graph) -> Graph {
    graph.relabel(&canonical_form(graph).labeling)
}

/// Per-component canonical ranks used to orient skew matrices.
///
/// Each edge is oriented from the lower to the higher rank, and ranks are
/// canonical within the edge's connected component, so the oriented spectrum
/// depends only on the isomorphism class and a disjoint union's spectrum is the
/// union of its components' spectra.
pub fn canonical_orientation(graph: &Graph) -> Vec<usize> {
    let mut rank = vec![0; graph.n()];
    for component in graph.components() {
        if component.len() == 1 {
            continue;
        }
        let sub = graph.induced(&component);
        let form = canonical_form(&sub);
        for (local, &v) in component.iter().enumerate() {
            rank[v] = form.labeling[local];
        }
    }
    rank
}

/// Hash a coefficient sequence after rounding to a fixed number of decimals,
/// so numerically identical polynomials collide despite floating-point noise.
pub fn polynomial_hash(coeffs: &[f64]) -> PolynomialHash {
    let scale = 10f64.powi(POLY_HASH_DECIMALS);
    let unit = scale as i128;
    let parts: Vec<String> = coeffs
        .iter()
        .map(|&c| {
            let micro = (c * scale).round() as i128;
            if micro % unit == 0 {
                format!("{}", micro / unit)
            } else {
                let sign = if micro < 0 { "-" } else { "" };
                let abs = micro.abs();
                let frac = format!(
                    "{:0width$}",
                    abs % unit,
                    width = POLY_HASH_DECIMALS as usize
                );
                format!("{sign}{}.{}", abs / unit, frac.trim_end_matches('0'))
            }
        })
        .collect();
    PolynomialHash(format!("{}:{}", coeffs.len().saturating_sub(1), parts.join(",")))
}

fn search(adj: &[u64], mut colors: Vec<usize>, words: usize, best: &mut Option<CanonicalForm>) {
    let n = adj.len();
    let cells = refine(adj, &mut colors);
    if cells == n {
        let code = leaf_code(adj, &colors, words);
        let better = match best {
            None => true,
            Some(b) => code > b.code,
        };
        if better {
            *best = Some(CanonicalForm {
                code,
                labeling: colors,
            });
        }
        return;
    }

    let mut sizes = vec![0usize; cells];
    for &c in &colors {
        sizes[c] += 1;
    }
    let target = match sizes.iter().position(|&s| s > 1) {
        Some(t) => t,
        None => return,
    };

    let mut explored: Vec<usize> = Vec::new();
    for v in (0..n).filter(|&v| colors[v] == target) {
        if explored.iter().any(|&u| are_twins(adj, u, v)) {
            continue;
        }
        explored.push(v);
        let mut child: Vec<usize> = colors.iter().map(|&c| 2 * c + 1).collect();
        child[v] = 2 * colors[v];
        search(adj, child, words, best);
    }
}

/// Refine `colors` to the coarsest equitable partition finer than it.
/// Colours are re-ranked canonically; returns the number of cells.
fn refine(adj: &[u64], colors: &mut [usize]) -> usize {
    let n = colors.len();
    let mut cells = compress(colors);
    loop {
        let mut sigs: Vec<(usize, Vec<u16>, usize)> = (0..n)
            .map(|v| {
                let mut counts = vec![0u16; cells];
                let mut bits = adj[v];
                while bits != 0 {
                    let w = bits.trailing_zeros() as usize;
                    counts[colors[w]] += 1;
                    bits &= bits - 1;
                }
                (colors[v], counts, v)
            })
            .collect();
        sigs.sort_unstable();

        let mut next = 0usize;
        for i in 0..n {
            if i > 0 && (sigs[i].0 != sigs[i - 1].0 || sigs[i].1 != sigs[i - 1].1) {
                next += 1;
            }
            colors[sigs[i].2] = next;
        }
        let refined = next + 1;
        if refined == cells {
            return cells;
        }
        cells = refined;
    }
}

/// Replace colour values by their rank among distinct values.
fn compress(colors: &mut [usize]) -> usize {
    let mut distinct: Vec<usize> = colors.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    for c in colors.iter_mut() {
        *c = distinct.binary_search(c).unwrap_or(0);
    }
    distinct.len()
}

fn are_twins(adj: &[u64], u: usize, w: usize) -> bool {
    (adj[u] & !(1u64 << w)) == (adj[w] & !(1u64 << u))
}

fn leaf_code(adj: &[u64], labeling: &[usize], words: usize) -> Vec<u64> {
    let n = adj.len();
    let mut code = vec![0u64; words];
    for a in 0..n {
        let mut bits = if a + 1 >= 64 { 0 } else { adj[a] >> (a + 1) << (a + 1) };
        while bits != 0 {
            let b = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            let (i, j) = if labeling[a] < labeling[b] {
                (labeling[a], labeling[b])
            } else {
                (labeling[b], labeling[a])
            };
            let idx = pair_index(n, i, j);
            code[idx / 64] |= 1u64 << (63 - idx % 64);
        }
    }
    code
}
