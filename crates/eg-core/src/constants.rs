/// Largest vertex count the exhaustive search accepts (edge masks fit in a u64).
pub const MAX_SEARCH_N: usize = 11;

/// Matching tolerance for Chebyshev and factor verification.
pub const TOLERANCE: f64 = 1e-8;

/// Tighter tolerance for catalogue pattern matching of numeric eigenvalues.
pub const PATTERN_TOLERANCE: f64 = 1e-9;

/// Largest vertex count canonical labelling handles (adjacency rows are u64 bitsets).
pub const MAX_CANONICAL_N: usize = 64;

/// Relative tolerance when checking a product spectrum against the exact
/// characteristic polynomial of the product's own matrix.
pub const PRODUCT_CHECK_TOLERANCE: f64 = 1e-6;

/// Decimal places kept when hashing polynomial coefficients.
pub const POLY_HASH_DECIMALS: i32 = 6;

/// Highest factor degree solved by radicals. Abel–Ruffini: nothing above quartic.
pub const MAX_RADICAL_DEGREE: usize = 4;

/// Un-factored roots the algebraic tier may patch with pattern matching.
pub const RESIDUE_LIMIT: usize = 2;

/// Fraction of exact roots at which a Chebyshev match is reported as partial.
pub const CHEBYSHEV_THRESHOLD: f64 = 0.8;

/// Default ceiling on unique graphs processed per search run.
pub const DEFAULT_MAX_UNIQUE_GRAPHS: usize = 100_000;

/// Masks between two progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 4096;

/// Masks processed per driver step by the synchronous search loop.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Matrices at or above this size are offloaded by the tiered solver.
pub const OFFLOAD_THRESHOLD: usize = 8;

/// Connected graphs on n unlabeled vertices (OEIS A001349), indexed by n.
pub const CONNECTED_GRAPH_COUNTS: [u64; MAX_SEARCH_N + 1] = [
    1, 1, 1, 2, 6, 21, 112, 853, 11_117, 261_080, 11_716_571, 1_006_700_565,
];

/// Expected number of connected graphs on `n` vertices, if tabulated.
pub fn expected_connected(n: usize) -> Option<u64> {
    CONNECTED_GRAPH_COUNTS.get(n).copied()
}
