//! In-memory graph database: the single record of which graphs have been
//! decided, per vertex count and matrix kind.
//!
//! Every shortcut the search takes (product tables, component resolution,
//! polynomial cache) is an early exit against this store. Durable storage is
//! injected through [`Persistence`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::canonical::{
    CanonicalForm, CanonicalHash, PolynomialHash, canonical_form, canonical_hash,
    canonical_orientation,
};
use crate::charpoly::char_poly_exact;
use crate::classify::{Classification, Classifier, Method};
use crate::constants::{PRODUCT_CHECK_TOLERANCE, expected_connected};
use crate::eigen::EigenSolver;
use crate::families::{identify_family, seed_graphs};
use crate::graph::{Edge, Graph, GraphError, MatrixKind};
use crate::spectrum::{EigenvalueRecord, direct_sum, merge, tensor_combine, union};

/// Where an entry's classification came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Fresh,
    Product,
    Disconnected,
    PolyCache,
    Seed,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Product => "product",
            Self::Disconnected => "disconnected",
            Self::PolyCache => "poly_cache",
            Self::Seed => "seed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "fresh" => Self::Fresh,
            "product" => Self::Product,
            "disconnected" => Self::Disconnected,
            "poly_cache" => Self::PolyCache,
            "seed" => Self::Seed,
            _ => return None,
        })
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored graph with a (fully or mostly) closed-form spectrum.
///
/// `edges` are those of the canonical representative. Entries are immutable
/// once stored, except that a missing family label may be filled in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticGraphEntry {
    pub n: usize,
    pub hash: CanonicalHash,
    pub edges: Vec<Edge>,
    pub eigenvalues: Vec<EigenvalueRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    pub provenance: Provenance,
    pub analytic: bool,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AnalyticGraphEntry {
    pub fn new(
        graph: &Graph,
        form: &CanonicalForm,
        classification: Classification,
        provenance: Provenance,
    ) -> Self {
        Self {
            n: graph.n(),
            hash: form.hash(graph.n()),
            edges: graph.relabel(&form.labeling).edges().to_vec(),
            eigenvalues: classification.eigenvalues,
            family: identify_family(graph),
            provenance,
            analytic: classification.analytic,
            method: classification.method,
            reason: classification.reason,
        }
    }

    pub fn graph(&self) -> Result<Graph, GraphError> {
        Graph::new(self.n, self.edges.iter().map(|e| (e.0, e.1)))
    }

    pub fn classification(&self) -> Classification {
        Classification {
            analytic: self.analytic,
            eigenvalues: self.eigenvalues.clone(),
            method: self.method,
            reason: self.reason.clone(),
        }
    }
}

/// A graph decided non-analytic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub edges: Vec<Edge>,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Level {
    pub entries: BTreeMap<CanonicalHash, AnalyticGraphEntry>,
    pub rejections: BTreeMap<CanonicalHash, Rejection>,
    pub poly_cache: BTreeMap<PolynomialHash, Classification>,
    /// Set once every connected graph on n has been decided.
    pub complete: bool,
}

impl Level {
    /// Connected graphs on n vertices already decided either way.
    pub fn decided_connected(&self, n: usize) -> usize {
        let connected = |edges: &[Edge]| {
            Graph::new(n, edges.iter().map(|e| (e.0, e.1))).is_ok_and(|g| g.is_connected())
        };
        self.entries.values().filter(|e| connected(&e.edges)).count()
            + self.rejections.values().filter(|r| connected(&r.edges)).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Cartesian,
    Tensor,
}

/// A graph expressible as a product of two stored analytic graphs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub kind: ProductKind,
    pub left: CanonicalHash,
    pub right: CanonicalHash,
    pub edges: Vec<Edge>,
    pub eigenvalues: Vec<EigenvalueRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LevelStats {
    pub n: usize,
    pub entries: usize,
    pub analytic: usize,
    pub rejections: usize,
    pub poly_cache: usize,
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub kind: MatrixKind,
    pub levels: Vec<LevelStats>,
    pub total_entries: usize,
    pub total_analytic: usize,
    pub total_rejections: usize,
    pub products: usize,
    pub seeded_up_to: usize,
}

/// Durable sink the search saves into after each completed level.
pub trait Persistence {
    type Error: fmt::Display;

    fn save_database(&mut self, db: &GraphDatabase) -> Result<(), Self::Error>;
}

/// Keeps everything in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPersistence;

impl Persistence for NoPersistence {
    type Error = std::convert::Infallible;

    fn save_database(&mut self, _db: &GraphDatabase) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphDatabase {
    kind: MatrixKind,
    levels: BTreeMap<usize, Level>,
    products: BTreeMap<usize, BTreeMap<CanonicalHash, ProductRecord>>,
    product_levels: BTreeSet<usize>,
    seeded_up_to: usize,
    seed_families: BTreeSet<String>,
}

impl GraphDatabase {
    pub fn new(kind: MatrixKind) -> Self {
        Self {
            kind,
            levels: BTreeMap::new(),
            products: BTreeMap::new(),
            product_levels: BTreeSet::new(),
            seeded_up_to: 0,
            seed_families: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    pub fn level(&self, n: usize) -> Option<&Level> {
        self.levels.get(&n)
    }

    pub fn level_mut(&mut self, n: usize) -> &mut Level {
        self.levels.entry(n).or_default()
    }

    pub fn levels(&self) -> impl Iterator<Item = (usize, &Level)> {
        self.levels.iter().map(|(&n, level)| (n, level))
    }

    pub fn entry(&self, n: usize, hash: &CanonicalHash) -> Option<&AnalyticGraphEntry> {
        self.levels.get(&n)?.entries.get(hash)
    }

    pub fn rejection(&self, n: usize, hash: &CanonicalHash) -> Option<&Rejection> {
        self.levels.get(&n)?.rejections.get(hash)
    }

    /// Analytic entries on n vertices, in hash order.
    pub fn analytic_entries(&self, n: usize) -> Vec<&AnalyticGraphEntry> {
        self.levels
            .get(&n)
            .map(|l| l.entries.values().filter(|e| e.analytic).collect())
            .unwrap_or_default()
    }

    /// Store an entry. Returns false if one already existed for the hash, in
    /// which case only a missing family label is taken from `entry`.
    pub fn insert_entry(&mut self, entry: AnalyticGraphEntry) -> bool {
        let level = self.level_mut(entry.n);
        if let Some(existing) = level.entries.get_mut(&entry.hash) {
            if existing.family.is_none() && entry.family.is_some() {
                existing.family = entry.family;
            }
            return false;
        }
        level.rejections.remove(&entry.hash);
        level.entries.insert(entry.hash.clone(), entry);
        true
    }

    /// Record a non-analytic decision. Ignored if the hash has an entry.
    pub fn reject(&mut self, n: usize, hash: CanonicalHash, rejection: Rejection) -> bool {
        let level = self.level_mut(n);
        if level.entries.contains_key(&hash) || level.rejections.contains_key(&hash) {
            return false;
        }
        level.rejections.insert(hash, rejection);
        true
    }

    pub fn mark_complete(&mut self, n: usize) {
        self.level_mut(n).complete = true;
    }

    pub fn is_complete(&self, n: usize) -> bool {
        self.levels.get(&n).is_some_and(|l| l.complete)
    }

    /// True unless level n was fully scanned or already holds as many decided
    /// connected graphs as exist on n vertices.
    pub fn is_under_populated(&self, n: usize) -> bool {
        let Some(level) = self.levels.get(&n) else {
            return true;
        };
        if level.complete {
            return false;
        }
        match expected_connected(n) {
            Some(expected) => (level.decided_connected(n) as u64) < expected,
            None => true,
        }
    }

    pub fn check_product_graph(&self, n: usize, hash: &CanonicalHash) -> Option<&ProductRecord> {
        self.products.get(&n)?.get(hash)
    }

    pub fn products(&self) -> impl Iterator<Item = (usize, &CanonicalHash, &ProductRecord)> {
        self.products
            .iter()
            .flat_map(|(&n, table)| table.iter().map(move |(h, r)| (n, h, r)))
    }

    pub fn product_levels(&self) -> &BTreeSet<usize> {
        &self.product_levels
    }

    /// Restore a product record read back from storage.
    pub fn insert_product(&mut self, n: usize, hash: CanonicalHash, record: ProductRecord) {
        self.products.entry(n).or_default().entry(hash).or_insert(record);
    }

    pub fn mark_products_computed(&mut self, n: usize) {
        self.product_levels.insert(n);
    }

    /// Build the product table for n from stored analytic factors on n₁·n₂ = n
    /// vertices (both ≥ 2). Computed once per n; returns the records added.
    pub fn precompute_product_graphs(&mut self, n: usize) -> usize {
        if !self.product_levels.insert(n) {
            return 0;
        }
        let mut table: BTreeMap<CanonicalHash, ProductRecord> = BTreeMap::new();
        for n1 in 2..=n.isqrt() {
            if n % n1 != 0 {
                continue;
            }
            let n2 = n / n1;
            let left = self.factor_graphs(n1);
            let right = self.factor_graphs(n2);
            for (i, (lh, lg, lspec)) in left.iter().enumerate() {
                for (j, (rh, rg, rspec)) in right.iter().enumerate() {
                    if n1 == n2 && j < i {
                        continue;
                    }
                    let mut candidates = vec![(ProductKind::Cartesian, lg.cartesian_product(rg))];
                    if self.kind == MatrixKind::Symmetric {
                        candidates.push((ProductKind::Tensor, lg.tensor_product(rg)));
                    }
                    for (kind, product) in candidates {
                        let form = canonical_form(&product);
                        let hash = form.hash(n);
                        if table.contains_key(&hash) {
                            continue;
                        }
                        let eigenvalues = match kind {
                            ProductKind::Cartesian => direct_sum(lspec, rspec),
                            ProductKind::Tensor => tensor_combine(lspec, rspec),
                        };
                        // The Kronecker sum fixes one orientation of the product's
                        // edges; the classifier orients by canonical rank instead.
                        if self.kind == MatrixKind::Skew {
                            let oriented =
                                product.skew_adjacency_oriented(&canonical_orientation(&product));
                            if !roots_match_polynomial(&eigenvalues, &char_poly_exact(&oriented)) {
                                debug!(n, %hash, "product spectrum differs under canonical orientation");
                                continue;
                            }
                        }
                        table.insert(
                            hash,
                            ProductRecord {
                                kind,
                                left: lh.clone(),
                                right: rh.clone(),
                                edges: product.relabel(&form.labeling).edges().to_vec(),
                                eigenvalues,
                            },
                        );
                    }
                }
            }
        }
        let added = table.len();
        let slot = self.products.entry(n).or_default();
        for (hash, record) in table {
            slot.entry(hash).or_insert(record);
        }
        info!(n, added, "product table computed");
        added
    }

    fn factor_graphs(&self, n: usize) -> Vec<(CanonicalHash, Graph, Vec<EigenvalueRecord>)> {
        self.analytic_entries(n)
            .into_iter()
            .filter_map(|e| {
                e.graph()
                    .ok()
                    .map(|g| (e.hash.clone(), g, e.eigenvalues.clone()))
            })
            .collect()
    }

    /// Spectrum of a disconnected graph from its stored components. Returns
    /// `None` for connected graphs or when any component is undecided.
    /// Isolated vertices contribute a zero eigenvalue each.
    pub fn resolve_disconnected_graph(&self, graph: &Graph) -> Option<Classification> {
        if graph.n() == 0 || graph.is_connected() {
            return None;
        }
        let mut records = Vec::new();
        let mut analytic = true;
        let mut spectrum_known = true;
        let mut reasons = Vec::new();
        let mut isolated = 0;
        for component in graph.components() {
            if component.len() == 1 {
                isolated += 1;
                continue;
            }
            let sub = graph.induced(&component);
            let k = sub.n();
            let hash = canonical_hash(&sub);
            if let Some(entry) = self.entry(k, &hash) {
                records = union(&records, &entry.eigenvalues);
                if !entry.analytic {
                    analytic = false;
                    reasons.push(
                        entry
                            .reason
                            .clone()
                            .unwrap_or_else(|| format!("component {hash} is not analytic")),
                    );
                    spectrum_known &= !entry.eigenvalues.is_empty();
                }
            } else if let Some(rejection) = self.rejection(k, &hash) {
                analytic = false;
                spectrum_known = false;
                reasons.push(format!("component {hash}: {}", rejection.reason));
            } else {
                return None;
            }
        }
        if isolated > 0 {
            records.push(EigenvalueRecord::zero(isolated));
        }
        let eigenvalues = if spectrum_known { merge(records) } else { Vec::new() };
        Some(if analytic {
            Classification::analytic(eigenvalues, Method::Disconnected)
        } else {
            Classification::rejected(eigenvalues, Method::Disconnected, reasons.join("; "))
        })
    }

    pub fn check_polynomial_cache(&self, n: usize, hash: &PolynomialHash) -> Option<&Classification> {
        self.levels.get(&n)?.poly_cache.get(hash)
    }

    pub fn cache_polynomial_result(&mut self, n: usize, hash: PolynomialHash, result: Classification) {
        self.level_mut(n).poly_cache.entry(hash).or_insert(result);
    }

    pub fn seeded_up_to(&self) -> usize {
        self.seeded_up_to
    }

    pub fn seed_families(&self) -> &BTreeSet<String> {
        &self.seed_families
    }

    /// Restore the seed record read back from storage.
    pub fn set_seed_record(&mut self, up_to: usize, families: impl IntoIterator<Item = String>) {
        self.seeded_up_to = up_to;
        self.seed_families.extend(families);
    }

    /// Classify and store the catalogued families on 1..=max_n vertices.
    /// Sizes already seeded are skipped. Returns the number of new entries.
    pub fn seed_known_families<S: EigenSolver>(
        &mut self,
        max_n: usize,
        classifier: &Classifier<S>,
    ) -> usize {
        let mut added = 0;
        for n in (self.seeded_up_to + 1)..=max_n {
            for (family, graph) in seed_graphs(n) {
                self.seed_families.insert(family.to_string());
                let form = canonical_form(&graph);
                if self.entry(n, &form.hash(n)).is_some() {
                    continue;
                }
                let prepared = classifier.prepare(&graph, self.kind);
                match classifier.classify_prepared(&prepared) {
                    Ok(c) if c.analytic => {
                        self.cache_polynomial_result(n, prepared.polynomial_hash(), c.clone());
                        if self.insert_entry(AnalyticGraphEntry::new(&graph, &form, c, Provenance::Seed)) {
                            added += 1;
                        }
                    }
                    Ok(c) => debug!(n, family, reason = ?c.reason, "seed graph not analytic"),
                    Err(e) => debug!(n, family, error = %e, "seed graph failed to classify"),
                }
            }
        }
        self.seeded_up_to = self.seeded_up_to.max(max_n);
        info!(max_n, added, kind = %self.kind, "seeded known families");
        added
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.kind);
    }

    pub fn stats(&self) -> DatabaseStats {
        let levels: Vec<LevelStats> = self
            .levels
            .iter()
            .map(|(&n, l)| LevelStats {
                n,
                entries: l.entries.len(),
                analytic: l.entries.values().filter(|e| e.analytic).count(),
                rejections: l.rejections.len(),
                poly_cache: l.poly_cache.len(),
                complete: l.complete,
            })
            .collect();
        DatabaseStats {
            kind: self.kind,
            total_entries: levels.iter().map(|l| l.entries).sum(),
            total_analytic: levels.iter().map(|l| l.analytic).sum(),
            total_rejections: levels.iter().map(|l| l.rejections).sum(),
            levels,
            products: self.products.values().map(BTreeMap::len).sum(),
            seeded_up_to: self.seeded_up_to,
        }
    }
}

/// True when `records`, counted with multiplicity, are exactly the roots of
/// `poly` (highest power first).
fn roots_match_polynomial(records: &[EigenvalueRecord], poly: &[i128]) -> bool {
    let mut expanded = vec![Complex64::new(1.0, 0.0)];
    for record in records {
        let root = Complex64::new(record.re, record.im);
        for _ in 0..record.multiplicity {
            let mut next = vec![Complex64::new(0.0, 0.0); expanded.len() + 1];
            for (i, &c) in expanded.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c * root;
            }
            expanded = next;
        }
    }
    expanded.len() == poly.len()
        && expanded.iter().zip(poly).all(|(e, &p)| {
            let p = p as f64;
            let tol = PRODUCT_CHECK_TOLERANCE * p.abs().max(1.0);
            (e.re - p).abs() <= tol && e.im.abs() <= tol
        })
}
