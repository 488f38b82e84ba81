//! Analytic graph-spectrum engine.
//!
//! Enumerates small simple graphs up to isomorphism and decides which have an
//! "analytic" spectrum: every eigenvalue of the skew-symmetric (or symmetric)
//! adjacency matrix expressible in closed form. Classification runs exact
//! Faddeev–LeVerrier polynomials through three tiers (radical factorization,
//! Chebyshev matching, catalogue matching); the search driver resolves most
//! graphs from a database of earlier decisions, product tables and component
//! spectra. The Zeid–Rosenberg bound engine gives closed-form eigenvalues or
//! bounds for point-graph topologies without any factoring.
//!
//! No I/O happens here: storage arrives through the `Persistence` trait and
//! graph editors through `GraphCore`.

pub mod bounds;
pub mod canonical;
pub mod charpoly;
pub mod classify;
pub mod collaborator;
pub mod constants;
pub mod database;
pub mod eigen;
pub mod families;
pub mod forms;
pub mod graph;
pub mod polynomial;
pub mod search;
pub mod serde_compat;
pub mod spectrum;

pub use bounds::{
    Spectrum, SpectrumPoint, Stability, StabilityVerdict, Topology, check_stability,
    compute_direct_sum, compute_spectrum, detect_topology,
};
pub use canonical::{
    CanonicalHash, PolynomialHash, canonical_form, canonical_hash, polynomial_hash, try_canonical_hash,
};
pub use charpoly::{char_poly, char_poly_exact};
pub use classify::{Classification, Classifier, ClassifierConfig, ClassifyError, Method};
pub use collaborator::{CollaboratorError, EditableGraph, GraphCore, materialize, read_graph};
pub use constants::{MAX_SEARCH_N, TOLERANCE};
pub use database::{
    AnalyticGraphEntry, DatabaseStats, GraphDatabase, NoPersistence, Persistence, Provenance,
    Rejection,
};
pub use eigen::{DirectSolver, EigenSolver, SolveError, TieredSolver};
pub use families::identify_family;
pub use graph::{Edge, Graph, GraphError, MatrixKind, parse_edge_list};
pub use search::{
    CancelToken, DriverState, GraphPolynomial, Phase, ProgressEvent, SearchContext, SearchDriver,
    SearchError, SearchOptions, SearchResult, SearchStats, find_analytic_graphs,
};
pub use serde_compat::{CURRENT_VERSION, export_json, import_json};
pub use spectrum::EigenvalueRecord;
