//! Named graph families: generators for seeding and human-readable labels.

use crate::bounds::{Topology, detect_topology};
use crate::graph::{Edge, Graph};

/// Families bootstrapped into a fresh database.
pub const SEED_FAMILIES: &[&str] = &[
    "empty",
    "path",
    "cycle",
    "star",
    "complete",
    "complete_bipartite",
    "wheel",
    "hypercube",
];

fn build(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Graph {
    Graph::from_edges(n, edges.into_iter().map(|(a, b)| Edge::new(a, b)).collect())
}

pub fn empty(n: usize) -> Graph {
    Graph::empty(n)
}

pub fn path(n: usize) -> Graph {
    build(n, (1..n).map(|i| (i - 1, i)))
}

/// Cycle on n ≥ 3 vertices; smaller n degrade to the path.
pub fn cycle(n: usize) -> Graph {
    if n < 3 {
        return path(n);
    }
    build(n, (0..n).map(|i| (i, (i + 1) % n)))
}

/// K_{1,n−1} with the center at vertex 0.
pub fn star(n: usize) -> Graph {
    build(n, (1..n).map(|i| (0, i)))
}

pub fn complete(n: usize) -> Graph {
    build(n, (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))))
}

pub fn complete_bipartite(a: usize, b: usize) -> Graph {
    build(a + b, (0..a).flat_map(|i| (a..a + b).map(move |j| (i, j))))
}

/// Hub 0 joined to a cycle on 1..n.
pub fn wheel(n: usize) -> Graph {
    if n < 4 {
        return complete(n);
    }
    let rim = n - 1;
    build(
        n,
        (1..n)
            .map(|i| (0, i))
            .chain((0..rim).map(|i| (1 + i, 1 + (i + 1) % rim))),
    )
}

/// P_rows □ P_cols, row-major.
pub fn grid(rows: usize, cols: usize) -> Graph {
    let at = |r: usize, c: usize| r * cols + c;
    let horizontal = (0..rows).flat_map(move |r| (1..cols).map(move |c| (at(r, c - 1), at(r, c))));
    let vertical = (1..rows).flat_map(move |r| (0..cols).map(move |c| (at(r - 1, c), at(r, c))));
    build(rows * cols, horizontal.chain(vertical))
}

pub fn ladder(rungs: usize) -> Graph {
    grid(2, rungs)
}

pub fn hypercube(dim: u32) -> Graph {
    let n = 1usize << dim;
    build(
        n,
        (0..n).flat_map(move |v| {
            (0..dim)
                .map(move |b| (v, v ^ (1 << b)))
                .filter(|&(a, b)| a < b)
        }),
    )
}

/// Center 0 with `arms` paths of `arm_length` vertices each.
pub fn spider(arms: usize, arm_length: usize) -> Graph {
    let n = 1 + arms * arm_length;
    build(
        n,
        (0..arms).flat_map(move |a| {
            let first = 1 + a * arm_length;
            std::iter::once((0, first)).chain((1..arm_length).map(move |k| (first + k - 1, first + k)))
        }),
    )
}

/// Seed graphs on exactly n vertices, tagged with their family name.
pub fn seed_graphs(n: usize) -> Vec<(&'static str, Graph)> {
    let mut out = vec![("empty", empty(n)), ("path", path(n))];
    if n >= 3 {
        out.push(("cycle", cycle(n)));
        out.push(("complete", complete(n)));
    }
    if n >= 4 {
        out.push(("star", star(n)));
        out.push(("complete_bipartite", complete_bipartite(n / 2, n - n / 2)));
    }
    if n >= 5 {
        out.push(("wheel", wheel(n)));
    }
    if n >= 8 && n.is_power_of_two() {
        out.push(("hypercube", hypercube(n.trailing_zeros())));
    }
    out
}

fn is_complete_bipartite(graph: &Graph) -> Option<(usize, usize)> {
    let n = graph.n();
    if n < 4 || !graph.is_connected() {
        return None;
    }
    let adj = graph.neighbors();
    let mut side = vec![None; n];
    side[0] = Some(false);
    let mut stack = vec![0];
    while let Some(v) = stack.pop() {
        let colour = side[v]?;
        for &w in &adj[v] {
            match side[w] {
                None => {
                    side[w] = Some(!colour);
                    stack.push(w);
                }
                Some(c) if c == colour => return None,
                Some(_) => {}
            }
        }
    }
    let left = side.iter().filter(|&&c| c == Some(false)).count();
    let (a, b) = (left.min(n - left), left.max(n - left));
    (a >= 2 && a * b == graph.edge_count()).then_some((a, b))
}

/// Human-readable family label, if the graph belongs to a catalogued family.
pub fn identify_family(graph: &Graph) -> Option<String> {
    let n = graph.n();
    if n == 0 {
        return None;
    }
    let label = match detect_topology(graph) {
        Topology::Empty { n } => format!("Empty graph E_{n}"),
        Topology::Complete { n } => format!("Complete graph K_{n}"),
        Topology::Path { n } => format!("Path graph P_{n}"),
        Topology::Cycle { n } => format!("Cycle graph C_{n}"),
        Topology::Star { n } => format!("Star graph K_{{1,{}}}", n - 1),
        Topology::Wheel { n } => format!("Wheel graph W_{n}"),
        Topology::Grid { rows, cols } => format!("Grid graph P_{rows} □ P_{cols}"),
        Topology::Ladder { rungs } => format!("Ladder graph L_{rungs}"),
        Topology::Hypercube { dim } => format!("Hypercube Q_{dim}"),
        Topology::GeneralizedStarTree { arms, arm_length } => {
            format!("Spider graph S({arms}, {arm_length})")
        }
        Topology::Tree { .. } | Topology::General { .. } => {
            if let Some((a, b)) = is_complete_bipartite(graph) {
                format!("Complete bipartite graph K_{{{a},{b}}}")
            } else if graph.is_regular() {
                format!("{}-regular graph on {n} vertices", graph.max_degree())
            } else {
                return None;
            }
        }
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_sizes() {
        assert_eq!(path(5).edge_count(), 4);
        assert_eq!(cycle(5).edge_count(), 5);
        assert_eq!(star(6).edge_count(), 5);
        assert_eq!(complete(5).edge_count(), 10);
        assert_eq!(complete_bipartite(2, 3).edge_count(), 6);
        assert_eq!(wheel(6).edge_count(), 10);
        assert_eq!(grid(3, 4).edge_count(), 17);
        assert_eq!(ladder(4).edge_count(), 10);
        assert_eq!(hypercube(3).edge_count(), 12);
        assert_eq!(spider(3, 2).n(), 7);
        assert_eq!(spider(3, 2).edge_count(), 6);
        assert!(cycle(2).is_connected());
    }

    #[test]
    fn test_labels() {
        assert_eq!(identify_family(&empty(4)).as_deref(), Some("Empty graph E_4"));
        assert_eq!(identify_family(&complete(5)).as_deref(), Some("Complete graph K_5"));
        assert_eq!(identify_family(&path(4)).as_deref(), Some("Path graph P_4"));
        assert_eq!(identify_family(&cycle(6)).as_deref(), Some("Cycle graph C_6"));
        assert_eq!(identify_family(&star(5)).as_deref(), Some("Star graph K_{1,4}"));
        assert_eq!(
            identify_family(&complete_bipartite(3, 3)).as_deref(),
            Some("Complete bipartite graph K_{3,3}")
        );
    }

    #[test]
    fn test_regular_fallback() {
        // Two disjoint triangles: 2-regular but not a cycle.
        let g = cycle(3).disjoint_union(&cycle(3));
        assert_eq!(identify_family(&g).as_deref(), Some("2-regular graph on 6 vertices"));
        let irregular = Graph::new(5, [(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();
        assert_eq!(identify_family(&irregular), None);
    }

    #[test]
    fn test_seed_graphs_cover_size() {
        for n in 1..=9 {
            for (_, g) in seed_graphs(n) {
                assert_eq!(g.n(), n);
            }
        }
        assert!(seed_graphs(8).iter().any(|(name, _)| *name == "hypercube"));
    }
}
