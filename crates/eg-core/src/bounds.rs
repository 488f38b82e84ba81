//! Zeid–Rosenberg topological eigenvalue bounds.
//!
//! A point graph with uniform damping α and coupling β has eigenvalues
//! λ = −α + iβ·s, where s runs over the structural skew spectrum of its
//! topology. For catalogued families s has a closed form; for everything else
//! only a bound on |s| is known and the returned points are flagged `approx`.
//! No polynomial is ever factored here.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash;
use crate::families;
use crate::graph::Graph;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Topology {
    Empty { n: usize },
    Path { n: usize },
    Cycle { n: usize },
    Star { n: usize },
    Complete { n: usize },
    Grid { rows: usize, cols: usize },
    Ladder { rungs: usize },
    Wheel { n: usize },
    Hypercube { dim: u32 },
    GeneralizedStarTree { arms: usize, arm_length: usize },
    Tree { n: usize, max_degree: usize },
    General {
        n: usize,
        edges: usize,
        max_degree: usize,
        connected: bool,
    },
}

impl Topology {
    pub fn n(&self) -> usize {
        match *self {
            Topology::Empty { n }
            | Topology::Path { n }
            | Topology::Cycle { n }
            | Topology::Star { n }
            | Topology::Complete { n }
            | Topology::Wheel { n }
            | Topology::Tree { n, .. }
            | Topology::General { n, .. } => n,
            Topology::Grid { rows, cols } => rows * cols,
            Topology::Ladder { rungs } => 2 * rungs,
            Topology::Hypercube { dim } => 1 << dim,
            Topology::GeneralizedStarTree { arms, arm_length } => 1 + arms * arm_length,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::Empty { .. } => "empty",
            Topology::Path { .. } => "path",
            Topology::Cycle { .. } => "cycle",
            Topology::Star { .. } => "star",
            Topology::Complete { .. } => "complete",
            Topology::Grid { .. } => "grid",
            Topology::Ladder { .. } => "ladder",
            Topology::Wheel { .. } => "wheel",
            Topology::Hypercube { .. } => "hypercube",
            Topology::GeneralizedStarTree { .. } => "generalized_star_tree",
            Topology::Tree { .. } => "tree",
            Topology::General { .. } => "general",
        }
    }

    /// Families whose full structural spectrum is known in closed form.
    pub fn is_simple_full(&self) -> bool {
        matches!(
            self,
            Topology::Empty { .. }
                | Topology::Path { .. }
                | Topology::Cycle { .. }
                | Topology::Star { .. }
                | Topology::Complete { .. }
                | Topology::Grid { .. }
                | Topology::Ladder { .. }
                | Topology::Hypercube { .. }
        )
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Grid { rows, cols } => write!(f, "grid {rows}x{cols}"),
            Topology::Ladder { rungs } => write!(f, "ladder with {rungs} rungs"),
            Topology::Hypercube { dim } => write!(f, "hypercube Q{dim}"),
            Topology::GeneralizedStarTree { arms, arm_length } => {
                write!(f, "generalized star tree ({arms} arms of length {arm_length})")
            }
            other => write!(f, "{} on {} vertices", other.name(), other.n()),
        }
    }
}

/// One eigenvalue (or bounding point, when `approx`) of the point graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub re: f64,
    pub im: f64,
    pub multiplicity: usize,
    pub approx: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    /// Number of eigenvalues of the point graph.
    pub n: usize,
    pub alpha: f64,
    pub beta: f64,
    pub eigenvalues: Vec<SpectrumPoint>,
    pub exact_spectrum: bool,
    /// Eigenvalues covered only by the bounding points.
    pub unresolved: usize,
    pub real_bounds: (f64, f64),
    pub imag_bounds: (f64, f64),
    /// Largest |s| over the structural spectrum (or its bound).
    pub structural_radius: f64,
    pub spectral_radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityVerdict {
    AsymptoticallyStable,
    MarginallyStable,
    Unstable,
    Indeterminate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stability {
    pub verdict: StabilityVerdict,
    pub reason: String,
}

/// Classify a graph's topology from degree sequence and edge-count signatures,
/// confirming the structured families by canonical isomorphism.
pub fn detect_topology(graph: &Graph) -> Topology {
    let n = graph.n();
    let m = graph.edge_count();
    if m == 0 {
        return Topology::Empty { n };
    }
    let degrees = graph.degrees();
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let connected = graph.is_connected();
    let general = Topology::General {
        n,
        edges: m,
        max_degree,
        connected,
    };
    if !connected {
        return general;
    }
    let count = |d: usize| degrees.iter().filter(|&&x| x == d).count();

    if m == n - 1 && count(1) == 2 && count(2) == n - 2 {
        return Topology::Path { n };
    }
    if m == n * (n - 1) / 2 {
        return Topology::Complete { n };
    }
    if n >= 4 && m == n - 1 && count(n - 1) == 1 && count(1) == n - 1 {
        return Topology::Star { n };
    }
    if m == n && count(2) == n {
        return Topology::Cycle { n };
    }
    if n >= 5 && m == 2 * (n - 1) && count(n - 1) == 1 && count(3) == n - 1 {
        return Topology::Wheel { n };
    }
    if n >= 8 && n.is_power_of_two() {
        let dim = n.trailing_zeros();
        if m == dim as usize * n / 2 && count(dim as usize) == n && same_class(graph, &families::hypercube(dim)) {
            return Topology::Hypercube { dim };
        }
    }
    if n >= 6 && n % 2 == 0 {
        let rungs = n / 2;
        if m == 3 * rungs - 2 && count(2) == 4 && same_class(graph, &families::ladder(rungs)) {
            return Topology::Ladder { rungs };
        }
    }
    for rows in 3..=n.isqrt() {
        if n % rows != 0 {
            continue;
        }
        let cols = n / rows;
        if m == 2 * n - rows - cols && count(2) == 4 && same_class(graph, &families::grid(rows, cols)) {
            return Topology::Grid { rows, cols };
        }
    }
    if m == n - 1 {
        if let Some((arms, arm_length)) = spider_shape(graph, &degrees) {
            return Topology::GeneralizedStarTree { arms, arm_length };
        }
        return Topology::Tree { n, max_degree };
    }
    general
}

fn same_class(a: &Graph, b: &Graph) -> bool {
    a.n() == b.n() && a.edge_count() == b.edge_count() && canonical_hash(a) == canonical_hash(b)
}

/// (arms, arm length) if the tree is a single branch vertex with equal arms.
fn spider_shape(graph: &Graph, degrees: &[usize]) -> Option<(usize, usize)> {
    let branch: Vec<usize> = (0..graph.n()).filter(|&v| degrees[v] >= 3).collect();
    if branch.len() != 1 {
        return None;
    }
    let center = branch[0];
    let adj = graph.neighbors();
    let mut dist = vec![usize::MAX; graph.n()];
    dist[center] = 0;
    let mut queue = VecDeque::from([center]);
    while let Some(v) = queue.pop_front() {
        for &w in &adj[v] {
            if dist[w] == usize::MAX {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
        }
    }
    let leaves: Vec<usize> = (0..graph.n()).filter(|&v| degrees[v] == 1).collect();
    let arm_length = dist[*leaves.first()?];
    leaves
        .iter()
        .all(|&v| dist[v] == arm_length)
        .then_some((degrees[center], arm_length))
}

fn binomial(n: u32, k: u32) -> usize {
    (0..k).fold(1usize, |acc, i| acc * (n - i) as usize / (i + 1) as usize)
}

fn path_values(n: usize) -> Vec<f64> {
    (1..=n)
        .map(|k| 2.0 * (k as f64 * PI / (n + 1) as f64).cos())
        .collect()
}

fn grid_values(rows: usize, cols: usize) -> Vec<f64> {
    let (a, b) = (path_values(rows), path_values(cols));
    a.iter().flat_map(|x| b.iter().map(move |y| x + y)).collect()
}

/// Structural values s (with multiplicity) and, for bound-only families,
/// the number of eigenvalues left to the bound R.
fn structural(topology: &Topology) -> (Vec<(f64, usize)>, usize, Option<f64>) {
    let ones = |v: Vec<f64>| v.into_iter().map(|s| (s, 1)).collect::<Vec<_>>();
    match *topology {
        Topology::Empty { n } => (vec![(0.0, n)], 0, None),
        Topology::Path { n } => (ones(path_values(n)), 0, None),
        Topology::Cycle { n } => (
            ones((0..n).map(|k| 2.0 * (2.0 * PI * k as f64 / n as f64).sin()).collect()),
            0,
            None,
        ),
        Topology::Star { n } => {
            let r = (n.saturating_sub(1) as f64).sqrt();
            (vec![(r, 1), (0.0, n.saturating_sub(2)), (-r, 1)], 0, None)
        }
        Topology::Complete { n } => (
            ones(
                (1..=n)
                    .map(|k| 1.0 / ((2 * k - 1) as f64 * PI / (2 * n) as f64).tan())
                    .collect(),
            ),
            0,
            None,
        ),
        Topology::Grid { rows, cols } => (ones(grid_values(rows, cols)), 0, None),
        Topology::Ladder { rungs } => (ones(grid_values(2, rungs)), 0, None),
        Topology::Hypercube { dim } => (
            (0..=dim)
                .map(|j| (dim as f64 - 2.0 * j as f64, binomial(dim, j)))
                .collect(),
            0,
            None,
        ),
        Topology::Wheel { n } => (Vec::new(), n, Some(1.0 + (n as f64).sqrt())),
        Topology::GeneralizedStarTree { arms, arm_length } => {
            let exact = path_values(arm_length)
                .into_iter()
                .map(|s| (s, arms.saturating_sub(1)))
                .collect();
            let bound = arms as f64 / (arms.saturating_sub(1).max(1) as f64).sqrt();
            (exact, arm_length + 1, Some(bound))
        }
        Topology::Tree { n, max_degree } => {
            let bound = (2.0 * ((max_degree.max(2) - 1) as f64).sqrt())
                .min((n.saturating_sub(1) as f64).sqrt());
            (Vec::new(), n, Some(bound))
        }
        Topology::General {
            n,
            edges,
            max_degree,
            connected,
        } => {
            let bound = if connected && 2 * edges + 1 >= n {
                (max_degree as f64).min(((2 * edges + 1 - n) as f64).sqrt())
            } else {
                max_degree as f64
            };
            (Vec::new(), n, Some(bound))
        }
    }
}

fn finish(
    topology: Option<Topology>,
    n: usize,
    alpha: f64,
    beta: f64,
    eigenvalues: Vec<SpectrumPoint>,
    unresolved: usize,
) -> Spectrum {
    let structural_radius = if beta == 0.0 {
        0.0
    } else {
        eigenvalues
            .iter()
            .map(|p| (p.im / beta).abs())
            .fold(0.0, f64::max)
    };
    let (mut re_lo, mut re_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut im_lo, mut im_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &eigenvalues {
        re_lo = re_lo.min(p.re);
        re_hi = re_hi.max(p.re);
        im_lo = im_lo.min(p.im);
        im_hi = im_hi.max(p.im);
    }
    if eigenvalues.is_empty() {
        (re_lo, re_hi, im_lo, im_hi) = (-alpha, -alpha, 0.0, 0.0);
    }
    let spectral_radius = eigenvalues
        .iter()
        .map(|p| p.re.hypot(p.im))
        .fold(0.0, f64::max);
    Spectrum {
        topology,
        n,
        alpha,
        beta,
        exact_spectrum: unresolved == 0 && eigenvalues.iter().all(|p| !p.approx),
        eigenvalues,
        unresolved,
        real_bounds: (re_lo, re_hi),
        imag_bounds: (im_lo, im_hi),
        structural_radius,
        spectral_radius,
    }
}

/// Eigenvalues λ = −α + iβ·s of the point graph, or bounding points for
/// families without a closed form.
pub fn compute_spectrum(topology: &Topology, alpha: f64, beta: f64) -> Spectrum {
    let (values, unresolved, bound) = structural(topology);
    let mut points: Vec<SpectrumPoint> = Vec::new();
    for (s, multiplicity) in values {
        if multiplicity == 0 {
            continue;
        }
        let s = if s.abs() < 1e-12 { 0.0 } else { s };
        match points.iter_mut().find(|p| (p.im - beta * s).abs() < 1e-9 && !p.approx) {
            Some(p) => p.multiplicity += multiplicity,
            None => points.push(SpectrumPoint {
                re: -alpha,
                im: beta * s,
                multiplicity,
                approx: false,
            }),
        }
    }
    if let Some(r) = bound {
        for s in [r, -r] {
            points.push(SpectrumPoint {
                re: -alpha,
                im: beta * s,
                multiplicity: 1,
                approx: true,
            });
        }
    }
    points.sort_by(|a, b| a.im.total_cmp(&b.im).then(a.approx.cmp(&b.approx)));
    finish(Some(topology.clone()), topology.n(), alpha, beta, points, unresolved)
}

/// Spectrum of a direct-sum composition: every pairwise sum of eigenvalues.
pub fn compute_direct_sum(a: &Spectrum, b: &Spectrum) -> Spectrum {
    let mut points = Vec::with_capacity(a.eigenvalues.len() * b.eigenvalues.len());
    for x in &a.eigenvalues {
        for y in &b.eigenvalues {
            points.push(SpectrumPoint {
                re: x.re + y.re,
                im: x.im + y.im,
                multiplicity: x.multiplicity * y.multiplicity,
                approx: x.approx || y.approx,
            });
        }
    }
    points.sort_by(|p, q| p.im.total_cmp(&q.im).then(p.re.total_cmp(&q.re)));
    let n = a.n * b.n;
    let unresolved = n - (a.n - a.unresolved) * (b.n - b.unresolved);
    finish(
        None,
        n,
        a.alpha + b.alpha,
        if a.beta == b.beta { a.beta } else { a.beta.max(b.beta) },
        points,
        unresolved,
    )
}

/// Fixed decision rule: asymptotically stable iff α > 0, the topology is in
/// the simple full class and every real part is strictly negative.
pub fn check_stability(spectrum: &Spectrum) -> Stability {
    let simple = spectrum
        .topology
        .as_ref()
        .is_some_and(Topology::is_simple_full);
    let max_re = spectrum
        .eigenvalues
        .iter()
        .map(|p| p.re)
        .fold(f64::NEG_INFINITY, f64::max);
    let (verdict, reason) = if spectrum.alpha < 0.0 || max_re > 0.0 {
        (StabilityVerdict::Unstable, "eigenvalues in the right half-plane".to_string())
    } else if spectrum.alpha == 0.0 || max_re == 0.0 {
        (StabilityVerdict::MarginallyStable, "eigenvalues on the imaginary axis".to_string())
    } else if simple && spectrum.exact_spectrum {
        (
            StabilityVerdict::AsymptoticallyStable,
            format!("α = {} > 0 with every real part negative", spectrum.alpha),
        )
    } else {
        (
            StabilityVerdict::Indeterminate,
            "topology outside the simple full class; only bounds are known".to_string(),
        )
    };
    Stability { verdict, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_detect_catalogue() {
        assert_eq!(detect_topology(&families::path(5)), Topology::Path { n: 5 });
        assert_eq!(detect_topology(&families::cycle(6)), Topology::Cycle { n: 6 });
        assert_eq!(detect_topology(&families::star(5)), Topology::Star { n: 5 });
        assert_eq!(detect_topology(&families::complete(4)), Topology::Complete { n: 4 });
        assert_eq!(detect_topology(&families::wheel(6)), Topology::Wheel { n: 6 });
        assert_eq!(detect_topology(&families::hypercube(3)), Topology::Hypercube { dim: 3 });
        assert_eq!(detect_topology(&families::ladder(4)), Topology::Ladder { rungs: 4 });
        assert_eq!(
            detect_topology(&families::grid(3, 4)),
            Topology::Grid { rows: 3, cols: 4 }
        );
        assert_eq!(
            detect_topology(&families::spider(3, 2)),
            Topology::GeneralizedStarTree {
                arms: 3,
                arm_length: 2
            }
        );
        assert_eq!(detect_topology(&Graph::empty(3)), Topology::Empty { n: 3 });
    }

    #[test]
    fn test_detect_tree_and_general() {
        // Spider with unequal arms is a plain tree.
        let g = Graph::new(6, [(0, 1), (0, 2), (0, 3), (3, 4), (4, 5)]).unwrap();
        assert_eq!(detect_topology(&g), Topology::Tree { n: 6, max_degree: 3 });
        let two_edges = Graph::new(4, [(0, 1), (2, 3)]).unwrap();
        assert!(matches!(
            detect_topology(&two_edges),
            Topology::General { connected: false, .. }
        ));
    }

    #[test]
    fn test_complete_k4_cotangents() {
        let s = compute_spectrum(&Topology::Complete { n: 4 }, 1.0, 1.0);
        assert!(s.exact_spectrum);
        let mut ims: Vec<f64> = s.eigenvalues.iter().map(|p| p.im).collect();
        ims.sort_by(f64::total_cmp);
        let c1 = 1.0 / (PI / 8.0).tan();
        let c3 = 1.0 / (3.0 * PI / 8.0).tan();
        for (v, e) in ims.iter().zip([-c1, -c3, c3, c1]) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-12);
        }
        assert!(s.eigenvalues.iter().all(|p| p.re == -1.0));
    }

    #[test]
    fn test_star_magnitudes() {
        let s = compute_spectrum(&Topology::Star { n: 5 }, 0.0, 1.0);
        let zero = s.eigenvalues.iter().find(|p| p.im == 0.0).unwrap();
        assert_eq!(zero.multiplicity, 3);
        assert_abs_diff_eq!(s.structural_radius, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hypercube_multiplicities() {
        let s = compute_spectrum(&Topology::Hypercube { dim: 3 }, 0.5, 1.0);
        let mults: Vec<usize> = s.eigenvalues.iter().map(|p| p.multiplicity).collect();
        assert_eq!(mults, vec![1, 3, 3, 1]);
    }

    #[test]
    fn test_bounds_are_flagged_approx() {
        let s = compute_spectrum(&Topology::Wheel { n: 9 }, 1.0, 2.0);
        assert!(!s.exact_spectrum);
        assert!(s.eigenvalues.iter().all(|p| p.approx));
        assert_abs_diff_eq!(s.imag_bounds.1, 2.0 * 4.0, epsilon = 1e-12);

        let spider = compute_spectrum(
            &Topology::GeneralizedStarTree {
                arms: 4,
                arm_length: 2,
            },
            1.0,
            1.0,
        );
        assert_eq!(spider.unresolved, 3);
        let exact: usize = spider
            .eigenvalues
            .iter()
            .filter(|p| !p.approx)
            .map(|p| p.multiplicity)
            .sum();
        assert_eq!(exact, 6);
    }

    #[test]
    fn test_direct_sum_pairs_every_eigenvalue() {
        let a = compute_spectrum(&Topology::Path { n: 2 }, 0.5, 1.0);
        let b = compute_spectrum(&Topology::Path { n: 3 }, 0.5, 1.0);
        let sum = compute_direct_sum(&a, &b);
        let total: usize = sum.eigenvalues.iter().map(|p| p.multiplicity).sum();
        assert_eq!(total, 6);
        assert!(sum.eigenvalues.iter().all(|p| p.re == -1.0));
        assert_abs_diff_eq!(sum.imag_bounds.1, 1.0 + 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_stability_rule() {
        let stable = compute_spectrum(&Topology::Cycle { n: 5 }, 0.3, 1.0);
        assert_eq!(check_stability(&stable).verdict, StabilityVerdict::AsymptoticallyStable);
        let undamped = compute_spectrum(&Topology::Cycle { n: 5 }, 0.0, 1.0);
        assert_eq!(check_stability(&undamped).verdict, StabilityVerdict::MarginallyStable);
        let unstable = compute_spectrum(&Topology::Path { n: 3 }, -0.1, 1.0);
        assert_eq!(check_stability(&unstable).verdict, StabilityVerdict::Unstable);
        let tree = compute_spectrum(&Topology::Tree { n: 7, max_degree: 3 }, 0.3, 1.0);
        assert_eq!(check_stability(&tree).verdict, StabilityVerdict::Indeterminate);
    }
}
