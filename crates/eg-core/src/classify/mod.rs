//! Closed-form classification of a graph's spectrum.
//!
//! Three tiers, tried in order:
//!
//! 1. [`algebraic`]: exact factorization of the characteristic polynomial into
//!    integer factors of degree ≤ 4, solved by radicals.
//! 2. [`chebyshev`]: numeric roots matched against 2cos(kπ/m).
//! 3. [`numeric`]: numeric roots matched against a catalogue of closed forms.
//!
//! A tier ends the chain only when its eigenvalue multiplicities sum to n.

pub mod algebraic;
pub mod chebyshev;
pub mod numeric;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::{PolynomialHash, canonical_orientation, polynomial_hash};
use crate::charpoly::char_poly_exact;
use crate::constants::{
    CHEBYSHEV_THRESHOLD, MAX_CANONICAL_N, PATTERN_TOLERANCE, RESIDUE_LIMIT, TOLERANCE,
};
use crate::eigen::{DirectSolver, EigenSolver, SolveError};
use crate::graph::{Graph, MatrixKind};
use crate::polynomial::Polynomial;
use crate::spectrum::{EigenvalueRecord, total_multiplicity};

use chebyshev::ChebyshevOutcome;

/// How a set of eigenvalues was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Algebraic,
    AlgebraicPattern,
    Chebyshev,
    Numeric,
    Product,
    Disconnected,
    Unclassified,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Algebraic => "algebraic",
            Self::AlgebraicPattern => "algebraic_pattern",
            Self::Chebyshev => "chebyshev",
            Self::Numeric => "numeric",
            Self::Product => "product",
            Self::Disconnected => "disconnected",
            Self::Unclassified => "unclassified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "algebraic" => Self::Algebraic,
            "algebraic_pattern" => Self::AlgebraicPattern,
            "chebyshev" => Self::Chebyshev,
            "numeric" => Self::Numeric,
            "product" => Self::Product,
            "disconnected" => Self::Disconnected,
            "unclassified" => Self::Unclassified,
            _ => return None,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub analytic: bool,
    pub eigenvalues: Vec<EigenvalueRecord>,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Classification {
    pub fn analytic(eigenvalues: Vec<EigenvalueRecord>, method: Method) -> Self {
        Self {
            analytic: true,
            eigenvalues,
            method,
            reason: None,
        }
    }

    pub fn rejected(eigenvalues: Vec<EigenvalueRecord>, method: Method, reason: String) -> Self {
        Self {
            analytic: false,
            eigenvalues,
            method,
            reason: Some(reason),
        }
    }

    /// Sum of eigenvalue multiplicities.
    pub fn multiplicity(&self) -> usize {
        total_multiplicity(&self.eigenvalues)
    }

    /// Non-analytic but carrying a mostly closed-form spectrum worth keeping.
    pub fn is_partial(&self) -> bool {
        !self.analytic
            && !self.eigenvalues.is_empty()
            && matches!(self.method, Method::Chebyshev | Method::Disconnected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyError {
    Solver(SolveError),
    RootCount { expected: usize, found: usize },
    TooLarge { n: usize, max: usize },
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Solver(e) => write!(f, "eigensolver: {e}"),
            ClassifyError::RootCount { expected, found } => {
                write!(f, "expected {expected} eigenvalues, solver returned {found}")
            }
            ClassifyError::TooLarge { n, max } => {
                write!(f, "{n} vertices exceeds the classifiable limit of {max}")
            }
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifyError::Solver(e) => Some(e),
            ClassifyError::RootCount { .. } | ClassifyError::TooLarge { .. } => None,
        }
    }
}

impl From<SolveError> for ClassifyError {
    fn from(e: SolveError) -> Self {
        ClassifyError::Solver(e)
    }
}

/// Tolerances and thresholds for the classifier tiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Match tolerance for factor verification and Chebyshev matching.
    pub tolerance: f64,
    /// Match tolerance for the numeric catalogue.
    pub pattern_tolerance: f64,
    /// Un-factored roots the algebraic tier may patch from the catalogue.
    pub residue_limit: usize,
    /// Fraction of exact roots at which a Chebyshev match counts as partial.
    pub chebyshev_threshold: f64,
    /// Largest Chebyshev denominator is this times (n + 1).
    pub chebyshev_denominator_scale: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            pattern_tolerance: PATTERN_TOLERANCE,
            residue_limit: RESIDUE_LIMIT,
            chebyshev_threshold: CHEBYSHEV_THRESHOLD,
            chebyshev_denominator_scale: 2,
        }
    }
}

impl ClassifierConfig {
    /// Denominator bound for 2cos(kπ/m) and catalogue matches on n vertices.
    pub fn max_denominator(&self, n: usize) -> i64 {
        (self.chebyshev_denominator_scale.max(1) * (n + 1)).max(12) as i64
    }
}

/// A graph's oriented matrix and exact characteristic polynomial.
#[derive(Clone, Debug)]
pub struct PreparedGraph {
    pub n: usize,
    pub kind: MatrixKind,
    pub matrix: Vec<Vec<i64>>,
    /// det(λI − M), highest power first.
    pub poly: Vec<i128>,
}

impl PreparedGraph {
    pub fn polynomial_hash(&self) -> PolynomialHash {
        let coeffs: Vec<f64> = self.poly.iter().map(|&c| c as f64).collect();
        polynomial_hash(&coeffs)
    }
}

pub struct Classifier<S = DirectSolver> {
    solver: S,
    config: ClassifierConfig,
}

impl Default for Classifier<DirectSolver> {
    fn default() -> Self {
        Self::new(DirectSolver, ClassifierConfig::default())
    }
}

impl<S: EigenSolver> Classifier<S> {
    pub fn new(solver: S, config: ClassifierConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Build the matrix to classify. Skew matrices are oriented by the
    /// per-component canonical ranks, so the spectrum is a class invariant.
    pub fn prepare(&self, graph: &Graph, kind: MatrixKind) -> PreparedGraph {
        let matrix = match kind {
            MatrixKind::Skew => graph.skew_adjacency_oriented(&canonical_orientation(graph)),
            MatrixKind::Symmetric => graph.symmetric_adjacency(),
        };
        let poly = char_poly_exact(&matrix);
        PreparedGraph {
            n: graph.n(),
            kind,
            matrix,
            poly,
        }
    }

    pub fn classify(&self, graph: &Graph, kind: MatrixKind) -> Result<Classification, ClassifyError> {
        if graph.n() > MAX_CANONICAL_N {
            return Err(ClassifyError::TooLarge {
                n: graph.n(),
                max: MAX_CANONICAL_N,
            });
        }
        self.classify_prepared(&self.prepare(graph, kind))
    }

    pub fn classify_prepared(&self, prepared: &PreparedGraph) -> Result<Classification, ClassifyError> {
        let n = prepared.n;
        let kind = prepared.kind;
        if n == 0 {
            return Ok(Classification::analytic(Vec::new(), Method::Algebraic));
        }
        let values = self.solver.solve(&prepared.matrix, kind)?;
        if values.len() != n {
            return Err(ClassifyError::RootCount {
                expected: n,
                found: values.len(),
            });
        }

        let poly = Polynomial::from_descending(&prepared.poly);
        if let Some(found) = algebraic::classify(&poly, &values, kind, &self.config) {
            if found.multiplicity() == n {
                return Ok(found);
            }
        }

        let held = match chebyshev::classify(&values, kind, &self.config) {
            ChebyshevOutcome::Full(c) if c.multiplicity() == n => return Ok(c),
            ChebyshevOutcome::Full(_) | ChebyshevOutcome::Miss => None,
            ChebyshevOutcome::Partial(c) => Some(c),
        };

        let fallback = numeric::classify(&values, kind, &self.config);
        if fallback.analytic && fallback.multiplicity() == n {
            return Ok(fallback);
        }
        Ok(held.unwrap_or(fallback))
    }
}
