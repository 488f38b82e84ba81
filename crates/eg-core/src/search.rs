//! Exhaustive search for analytic graphs on n vertices.
//!
//! [`SearchDriver`] is a resumable state machine:
//! `Idle → Building(k) → ProductPrecompute → Searching(n) → Completed | Cancelled`.
//! Each call to [`SearchDriver::step`] processes at most `budget` edge masks
//! and returns, so the host decides the cadence. Cancellation is checked once
//! per mask; a candidate already being classified always finishes first.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::canonical::{CanonicalForm, CanonicalHash, PolynomialHash, canonical_form};
use crate::classify::{Classification, Classifier, Method, PreparedGraph};
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_UNIQUE_GRAPHS, DEFAULT_PROGRESS_INTERVAL, MAX_SEARCH_N,
};
use crate::database::{AnalyticGraphEntry, GraphDatabase, Persistence, Provenance, Rejection};
use crate::eigen::EigenSolver;
use crate::graph::{Graph, MatrixKind, edge_slots};
use crate::polynomial::Polynomial;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub connected_only: bool,
    pub regular_only: bool,
    pub min_edges: Option<usize>,
    pub max_edges: Option<usize>,
    /// Safety valve: the run stops, flagged `truncated`, past this many
    /// unique graphs.
    pub max_unique_graphs: usize,
    /// Scan under-populated smaller levels first.
    pub build_incremental: bool,
    /// Seed the catalogued families up to n before searching.
    pub seed_families: bool,
    /// Masks between progress events.
    pub progress_interval: u64,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            connected_only: false,
            regular_only: false,
            min_edges: None,
            max_edges: None,
            max_unique_graphs: DEFAULT_MAX_UNIQUE_GRAPHS,
            build_incremental: true,
            seed_families: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: None,
        }
    }
}

impl SearchOptions {
    fn unfiltered(&self) -> bool {
        !self.regular_only && self.min_edges.is_none() && self.max_edges.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    TooLarge { n: usize, max: usize },
    InvalidOptions(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::TooLarge { n, max } => {
                write!(f, "n = {n} is beyond the exhaustive search ceiling of {max}")
            }
            SearchError::InvalidOptions(msg) => write!(f, "invalid search options: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Building,
    Products,
    Searching,
}

/// Structured progress report. Observational only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// Level being processed.
    pub n: usize,
    pub target: usize,
    pub masks_done: u64,
    pub masks_total: u64,
    pub unique_graphs: usize,
    pub analytic_found: usize,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub masks_scanned: u64,
    pub filtered: u64,
    pub duplicates: u64,
    pub unique_graphs: usize,
    pub from_database: usize,
    pub from_products: usize,
    pub from_disconnected: usize,
    pub from_session_poly: usize,
    pub from_durable_poly: usize,
    pub fresh: usize,
    pub analytic: usize,
    pub rejected: usize,
    pub failures: usize,
    pub levels_built: Vec<usize>,
    pub products_computed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPolynomial {
    /// det(λI − M) rendered in x.
    pub polynomial: String,
    /// Non-isomorphic graphs in this run sharing the polynomial.
    pub isomorphism_class_size: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub n: usize,
    pub kind: MatrixKind,
    /// Analytic graphs on n vertices, by edge count, polynomial, then hash.
    pub graphs: Vec<AnalyticGraphEntry>,
    /// Characteristic polynomial of each graph in `graphs`.
    #[serde(default)]
    pub polynomials: BTreeMap<CanonicalHash, GraphPolynomial>,
    pub stats: SearchStats,
    pub cancelled: bool,
    pub truncated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DriverState {
    Idle,
    Building { k: usize, mask: u64 },
    ProductPrecompute,
    Searching { mask: u64 },
    Completed,
    Cancelled,
}

/// Everything a search reads and writes besides its own session state.
pub struct SearchContext<'a, S, P> {
    pub db: &'a mut GraphDatabase,
    pub classifier: &'a Classifier<S>,
    pub persistence: &'a mut P,
    pub progress: Option<&'a mut dyn FnMut(&ProgressEvent)>,
}

impl<'a, S: EigenSolver, P: Persistence> SearchContext<'a, S, P> {
    pub fn new(db: &'a mut GraphDatabase, classifier: &'a Classifier<S>, persistence: &'a mut P) -> Self {
        Self {
            db,
            classifier,
            persistence,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a mut dyn FnMut(&ProgressEvent)) -> Self {
        self.progress = Some(progress);
        self
    }

    fn emit(&mut self, event: ProgressEvent) {
        if let Some(cb) = self.progress.as_mut() {
            cb(&event);
        }
    }

    fn save(&mut self) {
        if let Err(e) = self.persistence.save_database(self.db) {
            warn!(error = %e, "database save failed; continuing in memory");
        }
    }
}

pub struct SearchDriver {
    n: usize,
    options: SearchOptions,
    state: DriverState,
    pending_levels: VecDeque<usize>,
    /// Hashes seen in the level being scanned.
    seen: HashSet<CanonicalHash>,
    session_poly: HashMap<(usize, PolynomialHash), Classification>,
    graphs: Vec<AnalyticGraphEntry>,
    /// Unique target graphs per characteristic polynomial.
    cospectral: HashMap<PolynomialHash, usize>,
    target_polys: HashMap<CanonicalHash, (PolynomialHash, String)>,
    stats: SearchStats,
    cancelled: bool,
    truncated: bool,
}

impl SearchDriver {
    pub fn new(n: usize, options: SearchOptions) -> Result<Self, SearchError> {
        if n > MAX_SEARCH_N {
            return Err(SearchError::TooLarge {
                n,
                max: MAX_SEARCH_N,
            });
        }
        if n == 0 {
            return Err(SearchError::InvalidOptions("n must be at least 1".into()));
        }
        if let (Some(lo), Some(hi)) = (options.min_edges, options.max_edges) {
            if lo > hi {
                return Err(SearchError::InvalidOptions(format!(
                    "min_edges {lo} exceeds max_edges {hi}"
                )));
            }
        }
        if options.max_unique_graphs == 0 {
            return Err(SearchError::InvalidOptions("max_unique_graphs must be positive".into()));
        }
        Ok(Self {
            n,
            options,
            state: DriverState::Idle,
            pending_levels: VecDeque::new(),
            seen: HashSet::new(),
            session_poly: HashMap::new(),
            graphs: Vec::new(),
            cospectral: HashMap::new(),
            target_polys: HashMap::new(),
            stats: SearchStats::default(),
            cancelled: false,
            truncated: false,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, DriverState::Completed | DriverState::Cancelled)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Process up to `budget` masks. Returns true while work remains.
    pub fn step<S: EigenSolver, P: Persistence>(
        &mut self,
        ctx: &mut SearchContext<'_, S, P>,
        budget: usize,
    ) -> bool {
        let mut remaining = budget.max(1);
        while remaining > 0 && !self.is_finished() {
            match self.state {
                DriverState::Idle => self.start(ctx),
                DriverState::Building { k, mask } => {
                    let end = self.scan(ctx, k, mask, &mut remaining);
                    if let Some(mask) = end {
                        self.state = DriverState::Building { k, mask };
                    } else if !self.is_finished() {
                        self.finish_level(ctx, k);
                    }
                }
                DriverState::ProductPrecompute => {
                    let added = ctx.db.precompute_product_graphs(self.n);
                    self.stats.products_computed = added;
                    ctx.emit(self.event(Phase::Products, self.n, 0, 0, format!(
                        "{added} product graphs on {} vertices",
                        self.n
                    )));
                    self.seen.clear();
                    self.state = DriverState::Searching { mask: 0 };
                }
                DriverState::Searching { mask } => {
                    let end = self.scan(ctx, self.n, mask, &mut remaining);
                    if let Some(mask) = end {
                        self.state = DriverState::Searching { mask };
                    } else if !self.is_finished() {
                        if self.options.unfiltered() {
                            ctx.db.mark_complete(self.n);
                        }
                        ctx.save();
                        info!(
                            n = self.n,
                            analytic = self.graphs.len(),
                            fresh = self.stats.fresh,
                            "search completed"
                        );
                        self.state = DriverState::Completed;
                    }
                }
                DriverState::Completed | DriverState::Cancelled => break,
            }
        }
        !self.is_finished()
    }

    fn start<S: EigenSolver, P: Persistence>(&mut self, ctx: &mut SearchContext<'_, S, P>) {
        if self.options.seed_families {
            ctx.db.seed_known_families(self.n, ctx.classifier);
        }
        if self.options.build_incremental {
            self.pending_levels = (2..self.n).filter(|&k| ctx.db.is_under_populated(k)).collect();
        }
        self.advance_level(ctx);
    }

    fn advance_level<S: EigenSolver, P: Persistence>(&mut self, ctx: &mut SearchContext<'_, S, P>) {
        self.seen.clear();
        self.state = match self.pending_levels.pop_front() {
            Some(k) => {
                ctx.emit(self.event(Phase::Building, k, 0, 1u64 << edge_slots(k), format!(
                    "building level {k} before searching {}",
                    self.n
                )));
                DriverState::Building { k, mask: 0 }
            }
            None => DriverState::ProductPrecompute,
        };
    }

    fn finish_level<S: EigenSolver, P: Persistence>(&mut self, ctx: &mut SearchContext<'_, S, P>, k: usize) {
        ctx.db.mark_complete(k);
        ctx.save();
        self.stats.levels_built.push(k);
        info!(k, target = self.n, "level built");
        self.advance_level(ctx);
    }

    /// Scan masks from `start` on level `k`. Returns the next mask if the
    /// budget ran out first, `None` when the level is exhausted or the run
    /// stopped.
    fn scan<S: EigenSolver, P: Persistence>(
        &mut self,
        ctx: &mut SearchContext<'_, S, P>,
        k: usize,
        start: u64,
        remaining: &mut usize,
    ) -> Option<u64> {
        let total = 1u64 << edge_slots(k);
        let target = k == self.n;
        let phase = if target { Phase::Searching } else { Phase::Building };
        let interval = self.options.progress_interval.max(1);
        let mut mask = start;
        while mask < total {
            if *remaining == 0 {
                return Some(mask);
            }
            if self.options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                info!(k, mask, "search cancelled");
                self.cancelled = true;
                self.state = DriverState::Cancelled;
                return None;
            }
            *remaining -= 1;
            self.stats.masks_scanned += 1;
            self.visit(ctx, k, mask, target);
            mask += 1;
            if mask % interval == 0 {
                ctx.emit(self.event(phase, k, mask, total, format!(
                    "level {k}: {mask}/{total} masks, {} unique",
                    self.seen.len()
                )));
            }
            if self.truncated {
                warn!(limit = self.options.max_unique_graphs, "unique-graph cap reached");
                ctx.save();
                self.state = DriverState::Completed;
                return None;
            }
        }
        None
    }

    fn visit<S: EigenSolver, P: Persistence>(
        &mut self,
        ctx: &mut SearchContext<'_, S, P>,
        k: usize,
        mask: u64,
        target: bool,
    ) {
        let edges = mask.count_ones() as usize;
        if target
            && (self.options.min_edges.is_some_and(|lo| edges < lo)
                || self.options.max_edges.is_some_and(|hi| edges > hi))
        {
            self.stats.filtered += 1;
            return;
        }
        let graph = Graph::from_mask(k, mask);
        let connected = graph.is_connected();
        if (!target || self.options.connected_only) && !connected {
            self.stats.filtered += 1;
            return;
        }
        if target && self.options.regular_only && !graph.is_regular() {
            self.stats.filtered += 1;
            return;
        }

        let form = canonical_form(&graph);
        let hash = form.hash(k);
        if !self.seen.insert(hash.clone()) {
            self.stats.duplicates += 1;
            return;
        }
        self.stats.unique_graphs += 1;
        if self.stats.unique_graphs > self.options.max_unique_graphs {
            self.truncated = true;
            return;
        }
        if !target {
            self.resolve(ctx, &graph, &form, hash, None);
            return;
        }

        let prepared = ctx.classifier.prepare(&graph, ctx.db.kind());
        let phash = prepared.polynomial_hash();
        *self.cospectral.entry(phash.clone()).or_insert(0) += 1;
        let found = self.graphs.len();
        self.resolve(ctx, &graph, &form, hash.clone(), Some(&prepared));
        if self.graphs.len() > found {
            let text = Polynomial::from_descending(&prepared.poly).to_string();
            self.target_polys.insert(hash, (phash, text));
        }
    }

    /// Resolution cascade; every level is an early exit on a hit.
    fn resolve<S: EigenSolver, P: Persistence>(
        &mut self,
        ctx: &mut SearchContext<'_, S, P>,
        graph: &Graph,
        form: &CanonicalForm,
        hash: CanonicalHash,
        prepared: Option<&PreparedGraph>,
    ) {
        let n = graph.n();
        let target = prepared.is_some();
        if let Some(entry) = ctx.db.entry(n, &hash) {
            self.stats.from_database += 1;
            if target && entry.analytic {
                self.graphs.push(entry.clone());
            }
            return;
        }
        if ctx.db.rejection(n, &hash).is_some() {
            self.stats.from_database += 1;
            return;
        }

        if let Some(record) = ctx.db.check_product_graph(n, &hash) {
            self.stats.from_products += 1;
            let c = Classification::analytic(record.eigenvalues.clone(), Method::Product);
            self.store(ctx, graph, form, c, Provenance::Product, target);
            return;
        }

        if !graph.is_connected() {
            if let Some(c) = ctx.db.resolve_disconnected_graph(graph) {
                self.stats.from_disconnected += 1;
                self.store(ctx, graph, form, c, Provenance::Disconnected, target);
                return;
            }
        }

        let owned;
        let prepared = match prepared {
            Some(prepared) => prepared,
            None => {
                owned = ctx.classifier.prepare(graph, ctx.db.kind());
                &owned
            }
        };
        let phash = prepared.polynomial_hash();
        if let Some(c) = self.session_poly.get(&(n, phash.clone())).cloned() {
            self.stats.from_session_poly += 1;
            self.store(ctx, graph, form, c, Provenance::PolyCache, target);
            return;
        }
        if let Some(c) = ctx.db.check_polynomial_cache(n, &phash).cloned() {
            self.stats.from_durable_poly += 1;
            self.session_poly.insert((n, phash), c.clone());
            self.store(ctx, graph, form, c, Provenance::PolyCache, target);
            return;
        }

        match ctx.classifier.classify_prepared(prepared) {
            Ok(c) => {
                self.stats.fresh += 1;
                self.session_poly.insert((n, phash.clone()), c.clone());
                ctx.db.cache_polynomial_result(n, phash, c.clone());
                self.store(ctx, graph, form, c, Provenance::Fresh, target);
            }
            Err(e) => {
                debug!(graph = %graph, error = %e, "classification failed");
                self.stats.failures += 1;
                self.stats.rejected += 1;
                ctx.db.reject(
                    n,
                    hash,
                    Rejection {
                        edges: graph.relabel(&form.labeling).edges().to_vec(),
                        reason: format!("classification failed: {e}"),
                    },
                );
            }
        }
    }

    fn store<S: EigenSolver, P: Persistence>(
        &mut self,
        ctx: &mut SearchContext<'_, S, P>,
        graph: &Graph,
        form: &CanonicalForm,
        c: Classification,
        provenance: Provenance,
        target: bool,
    ) {
        if c.analytic || c.is_partial() {
            let entry = AnalyticGraphEntry::new(graph, form, c, provenance);
            if entry.analytic {
                self.stats.analytic += 1;
                if target {
                    self.graphs.push(entry.clone());
                }
            } else {
                self.stats.rejected += 1;
            }
            ctx.db.insert_entry(entry);
        } else {
            self.stats.rejected += 1;
            let reason = c
                .reason
                .unwrap_or_else(|| format!("{} classification is not analytic", c.method));
            ctx.db.reject(
                graph.n(),
                form.hash(graph.n()),
                Rejection {
                    edges: graph.relabel(&form.labeling).edges().to_vec(),
                    reason,
                },
            );
        }
    }

    fn event(&self, phase: Phase, n: usize, masks_done: u64, masks_total: u64, message: String) -> ProgressEvent {
        ProgressEvent {
            phase,
            n,
            target: self.n,
            masks_done,
            masks_total,
            unique_graphs: self.stats.unique_graphs,
            analytic_found: self.graphs.len(),
            message,
        }
    }

    fn result(&self, kind: MatrixKind, graphs: Vec<AnalyticGraphEntry>) -> SearchResult {
        let polynomials: BTreeMap<CanonicalHash, GraphPolynomial> = graphs
            .iter()
            .filter_map(|g| {
                let (phash, text) = self.target_polys.get(&g.hash)?;
                let record = GraphPolynomial {
                    polynomial: text.clone(),
                    isomorphism_class_size: self.cospectral.get(phash).copied().unwrap_or(1),
                };
                Some((g.hash.clone(), record))
            })
            .collect();
        let poly_of = |g: &AnalyticGraphEntry| polynomials.get(&g.hash).map(|p| p.polynomial.as_str());
        let mut graphs = graphs;
        graphs.sort_by(|a, b| {
            a.edges
                .len()
                .cmp(&b.edges.len())
                .then_with(|| poly_of(a).cmp(&poly_of(b)))
                .then_with(|| a.hash.cmp(&b.hash))
        });
        SearchResult {
            n: self.n,
            kind,
            graphs,
            polynomials,
            stats: self.stats.clone(),
            cancelled: self.cancelled,
            truncated: self.truncated,
        }
    }

    /// Snapshot of what has been found so far.
    pub fn partial_results(&self, kind: MatrixKind) -> SearchResult {
        self.result(kind, self.graphs.clone())
    }

    pub fn into_result(mut self, kind: MatrixKind) -> SearchResult {
        let graphs = std::mem::take(&mut self.graphs);
        self.result(kind, graphs)
    }
}

/// Run a search to completion (or cancellation) synchronously.
pub fn find_analytic_graphs<S: EigenSolver, P: Persistence>(
    n: usize,
    options: SearchOptions,
    ctx: &mut SearchContext<'_, S, P>,
) -> Result<SearchResult, SearchError> {
    let mut driver = SearchDriver::new(n, options)?;
    while driver.step(ctx, DEFAULT_BATCH_SIZE) {}
    Ok(driver.into_result(ctx.db.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NoPersistence;

    fn run(db: &mut GraphDatabase, n: usize, options: SearchOptions) -> SearchResult {
        let classifier = Classifier::default();
        let mut sink = NoPersistence;
        let mut ctx = SearchContext::new(db, &classifier, &mut sink);
        find_analytic_graphs(n, options, &mut ctx).unwrap()
    }

    #[test]
    fn test_rejects_oversized_and_bad_options() {
        assert!(matches!(
            SearchDriver::new(12, SearchOptions::default()),
            Err(SearchError::TooLarge { n: 12, max: 11 })
        ));
        let bad = SearchOptions {
            min_edges: Some(4),
            max_edges: Some(2),
            ..Default::default()
        };
        assert!(matches!(SearchDriver::new(5, bad), Err(SearchError::InvalidOptions(_))));
    }

    #[test]
    fn test_three_vertices_every_graph() {
        // E3, K2 ⊔ K1, P3, K3: all analytic for the skew matrix.
        let mut db = GraphDatabase::new(MatrixKind::Skew);
        let options = SearchOptions {
            seed_families: false,
            ..Default::default()
        };
        let result = run(&mut db, 3, options);
        assert!(!result.cancelled && !result.truncated);
        assert_eq!(result.graphs.len(), 4);
        assert_eq!(result.stats.levels_built, vec![2]);
        assert_eq!(result.stats.masks_scanned, 2 + 8);
        assert!(db.is_complete(3));
        assert!(db.is_complete(2));
    }

    #[test]
    fn test_connected_only_filter() {
        let mut db = GraphDatabase::new(MatrixKind::Symmetric);
        let options = SearchOptions {
            connected_only: true,
            ..Default::default()
        };
        let result = run(&mut db, 4, options);
        assert!(result.graphs.len() <= 6);
        assert!(result.graphs.iter().all(|g| g.graph().unwrap().is_connected()));
    }

    #[test]
    fn test_edge_bounds_skip_completion() {
        let mut db = GraphDatabase::new(MatrixKind::Skew);
        let options = SearchOptions {
            min_edges: Some(2),
            max_edges: Some(2),
            build_incremental: false,
            seed_families: false,
            ..Default::default()
        };
        let result = run(&mut db, 4, options);
        // P3 ⊔ K1 and 2K2
        assert_eq!(result.graphs.len(), 2);
        assert!(result.graphs.iter().all(|g| g.edges.len() == 2));
        assert!(!db.is_complete(4));
    }

    #[test]
    fn test_unique_cap_truncates() {
        let mut db = GraphDatabase::new(MatrixKind::Skew);
        let options = SearchOptions {
            max_unique_graphs: 3,
            build_incremental: false,
            seed_families: false,
            ..Default::default()
        };
        let result = run(&mut db, 5, options);
        assert!(result.truncated);
        assert!(!result.cancelled);
        assert!(result.graphs.len() <= 3);
        assert!(!db.is_complete(5));
    }

    #[test]
    fn test_step_budget_is_resumable() {
        let mut db = GraphDatabase::new(MatrixKind::Skew);
        let classifier = Classifier::default();
        let mut sink = NoPersistence;
        let mut ctx = SearchContext::new(&mut db, &classifier, &mut sink);
        let options = SearchOptions {
            seed_families: false,
            ..Default::default()
        };
        let mut driver = SearchDriver::new(4, options).unwrap();
        let mut steps = 0;
        while driver.step(&mut ctx, 5) {
            steps += 1;
            assert!(driver.stats().masks_scanned <= 5 * steps as u64);
        }
        assert_eq!(driver.state(), DriverState::Completed);
        let result = driver.into_result(MatrixKind::Skew);
        assert_eq!(result.stats.masks_scanned, 2 + 8 + 64);
        assert_eq!(result.graphs.len() + result.stats.rejected, 11);
    }

    #[test]
    fn test_cospectral_graphs_share_polynomial() {
        let mut db = GraphDatabase::new(MatrixKind::Symmetric);
        let result = run(&mut db, 5, SearchOptions::default());
        assert_eq!(result.polynomials.len(), result.graphs.len());

        let star = canonical_form(&crate::families::star(5)).hash(5);
        let c4_k1 = Graph::new(5, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let c4_k1 = canonical_form(&c4_k1).hash(5);
        let a = &result.polynomials[&star];
        let b = &result.polynomials[&c4_k1];
        assert_eq!(a.polynomial, "x^5 - 4x^3");
        assert_eq!(a, b);
        assert!(a.isomorphism_class_size >= 2);

        // Sorted by edge count then polynomial, so the pair is adjacent.
        let pos = |h: &CanonicalHash| result.graphs.iter().position(|g| &g.hash == h).unwrap();
        assert_eq!(pos(&star).abs_diff(pos(&c4_k1)), 1);
        let keys: Vec<(usize, &str)> = result
            .graphs
            .iter()
            .map(|g| (g.edges.len(), result.polynomials[&g.hash].polynomial.as_str()))
            .collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pre_cancelled_run() {
        let mut db = GraphDatabase::new(MatrixKind::Skew);
        let token = CancelToken::new();
        token.cancel();
        let options = SearchOptions {
            cancel: Some(token),
            ..Default::default()
        };
        let result = run(&mut db, 5, options);
        assert!(result.cancelled);
        assert_eq!(result.stats.masks_scanned, 0);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let o: SearchOptions = serde_json::from_str(r#"{"connected_only": true}"#).unwrap();
        assert!(o.connected_only);
        assert!(o.build_incremental);
        assert_eq!(o.max_unique_graphs, DEFAULT_MAX_UNIQUE_GRAPHS);
        assert!(o.cancel.is_none());
    }
}
