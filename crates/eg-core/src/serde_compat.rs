//! JSON serde for the versioned database wire format.
//!
//! The wire format uses camelCase field names and keys levels by vertex count:
//! `{version, matrixKind, perN: {"n": {analyticEntries, rejected, polyCache,
//! complete}}, productCache, seedFamilies}`. Version 1 documents (no
//! provenance or matrix kind, eigenvalues as bare numbers or `{value, form,
//! multiplicity}` objects) are migrated on import. Canonical hashes are always
//! recomputed from the edges, so stale or foreign hashes never enter the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::canonical::{CanonicalHash, PolynomialHash, canonical_form};
use crate::classify::{Classification, Method};
use crate::constants::MAX_CANONICAL_N;
use crate::database::{AnalyticGraphEntry, GraphDatabase, ProductKind, ProductRecord, Provenance, Rejection};
use crate::graph::{Edge, Graph, MatrixKind};
use crate::spectrum::EigenvalueRecord;

pub const CURRENT_VERSION: u32 = 2;

// --- Wire format types ---

#[derive(Serialize, Deserialize, Debug)]
pub struct WireDatabase {
    pub version: u32,
    #[serde(rename = "matrixKind", default)]
    pub matrix_kind: MatrixKind,
    #[serde(rename = "perN", default)]
    pub per_n: BTreeMap<usize, WireLevel>,
    #[serde(rename = "productCache", default)]
    pub product_cache: BTreeMap<usize, Vec<WireProduct>>,
    #[serde(rename = "productLevels", default)]
    pub product_levels: Vec<usize>,
    #[serde(rename = "seedFamilies", default)]
    pub seed_families: Vec<String>,
    #[serde(rename = "seededUpTo", default)]
    pub seeded_up_to: usize,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct WireLevel {
    #[serde(rename = "analyticEntries", default)]
    pub analytic_entries: Vec<WireEntry>,
    #[serde(default)]
    pub rejected: Vec<WireRejection>,
    #[serde(rename = "polyCache", default)]
    pub poly_cache: BTreeMap<String, WireClassification>,
    #[serde(default)]
    pub complete: bool,
}

fn default_true() -> bool {
    true
}

fn default_multiplicity() -> usize {
    1
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireEntry {
    /// Informational; recomputed on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub edges: Vec<(usize, usize)>,
    #[serde(default)]
    pub eigenvalues: Vec<WireEigenvalue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    #[serde(default = "default_true")]
    pub analytic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireRejection {
    pub edges: Vec<(usize, usize)>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireClassification {
    #[serde(default = "default_true")]
    pub analytic: bool,
    #[serde(default)]
    pub eigenvalues: Vec<WireEigenvalue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireProduct {
    pub kind: ProductKind,
    pub left: String,
    pub right: String,
    pub edges: Vec<(usize, usize)>,
    #[serde(default)]
    pub eigenvalues: Vec<WireEigenvalue>,
}

/// Version 2 writes full records; version 1 also stored bare axis values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WireEigenvalue {
    Bare(f64),
    Record {
        #[serde(default)]
        re: f64,
        #[serde(default)]
        im: f64,
        /// Version 1: signed position along the kind's axis.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        form: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<bool>,
        #[serde(default = "default_multiplicity")]
        multiplicity: usize,
    },
}

// --- Conversion: Wire → Domain ---

fn on_axis(kind: MatrixKind, value: f64) -> (f64, f64) {
    match kind {
        MatrixKind::Skew => (0.0, value),
        MatrixKind::Symmetric => (value, 0.0),
    }
}

fn wire_eigenvalue_to_domain(kind: MatrixKind, wire: WireEigenvalue) -> EigenvalueRecord {
    match wire {
        WireEigenvalue::Bare(v) => {
            let (re, im) = on_axis(kind, v);
            EigenvalueRecord {
                re,
                im,
                form: None,
                exact: false,
                multiplicity: 1,
            }
        }
        WireEigenvalue::Record {
            re,
            im,
            value,
            form,
            exact,
            multiplicity,
        } => {
            let (re, im) = value.map_or((re, im), |v| on_axis(kind, v));
            EigenvalueRecord {
                re,
                im,
                exact: exact.unwrap_or(form.is_some()),
                form,
                multiplicity,
            }
        }
    }
}

fn wire_spectrum(kind: MatrixKind, wire: Vec<WireEigenvalue>) -> Vec<EigenvalueRecord> {
    wire.into_iter()
        .map(|w| wire_eigenvalue_to_domain(kind, w))
        .collect()
}

fn wire_classification_to_domain(kind: MatrixKind, wire: WireClassification) -> Classification {
    Classification {
        analytic: wire.analytic,
        eigenvalues: wire_spectrum(kind, wire.eigenvalues),
        method: wire
            .method
            .as_deref()
            .and_then(Method::parse)
            .unwrap_or(Method::Unclassified),
        reason: wire.reason,
    }
}

impl WireDatabase {
    /// Convert to the domain database, migrating older versions. Entries with
    /// invalid edge lists are skipped with a warning.
    pub fn into_database(self) -> GraphDatabase {
        if self.version != CURRENT_VERSION {
            info!(from = self.version, to = CURRENT_VERSION, "migrating database document");
        }
        let kind = self.matrix_kind;
        let mut db = GraphDatabase::new(kind);

        for (n, level) in self.per_n {
            if n > MAX_CANONICAL_N {
                warn!(n, "skipping level beyond canonical labelling range");
                continue;
            }
            db.level_mut(n);
            for wire in level.analytic_entries {
                let graph = match Graph::new(n, wire.edges.iter().copied()) {
                    Ok(g) => g,
                    Err(e) => {
                        warn!(n, error = %e, "skipping entry with invalid edges");
                        continue;
                    }
                };
                let form = canonical_form(&graph);
                let classification = Classification {
                    analytic: wire.analytic,
                    eigenvalues: wire_spectrum(kind, wire.eigenvalues),
                    method: wire
                        .method
                        .as_deref()
                        .and_then(Method::parse)
                        .unwrap_or(Method::Unclassified),
                    reason: wire.reason,
                };
                let provenance = wire
                    .provenance
                    .as_deref()
                    .and_then(Provenance::parse)
                    .unwrap_or(Provenance::Fresh);
                let mut entry = AnalyticGraphEntry::new(&graph, &form, classification, provenance);
                if wire.family.is_some() {
                    entry.family = wire.family;
                }
                db.insert_entry(entry);
            }
            for wire in level.rejected {
                let Ok(graph) = Graph::new(n, wire.edges.iter().copied()) else {
                    warn!(n, "skipping rejection with invalid edges");
                    continue;
                };
                let form = canonical_form(&graph);
                db.reject(
                    n,
                    form.hash(n),
                    Rejection {
                        edges: graph.relabel(&form.labeling).edges().to_vec(),
                        reason: wire.reason,
                    },
                );
            }
            for (hash, wire) in level.poly_cache {
                db.cache_polynomial_result(
                    n,
                    PolynomialHash::from_raw(hash),
                    wire_classification_to_domain(kind, wire),
                );
            }
            if level.complete {
                db.mark_complete(n);
            }
        }

        for (n, records) in self.product_cache {
            if n > MAX_CANONICAL_N {
                continue;
            }
            for wire in records {
                let Ok(graph) = Graph::new(n, wire.edges.iter().copied()) else {
                    warn!(n, "skipping product record with invalid edges");
                    continue;
                };
                let form = canonical_form(&graph);
                db.insert_product(
                    n,
                    form.hash(n),
                    ProductRecord {
                        kind: wire.kind,
                        left: CanonicalHash::from_raw(wire.left),
                        right: CanonicalHash::from_raw(wire.right),
                        edges: graph.relabel(&form.labeling).edges().to_vec(),
                        eigenvalues: wire_spectrum(kind, wire.eigenvalues),
                    },
                );
            }
        }
        for n in self.product_levels {
            db.mark_products_computed(n);
        }
        db.set_seed_record(self.seeded_up_to, self.seed_families);
        db
    }

    /// Create the current-version document from a domain database.
    pub fn from_database(db: &GraphDatabase) -> Self {
        let mut per_n = BTreeMap::new();
        for (n, level) in db.levels() {
            per_n.insert(
                n,
                WireLevel {
                    analytic_entries: level.entries.values().map(domain_entry_to_wire).collect(),
                    rejected: level
                        .rejections
                        .values()
                        .map(|r| WireRejection {
                            edges: edge_pairs(&r.edges),
                            reason: r.reason.clone(),
                        })
                        .collect(),
                    poly_cache: level
                        .poly_cache
                        .iter()
                        .map(|(h, c)| (h.as_str().to_string(), domain_classification_to_wire(c)))
                        .collect(),
                    complete: level.complete,
                },
            );
        }
        let mut product_cache: BTreeMap<usize, Vec<WireProduct>> = BTreeMap::new();
        for (n, _, record) in db.products() {
            product_cache.entry(n).or_default().push(WireProduct {
                kind: record.kind,
                left: record.left.as_str().to_string(),
                right: record.right.as_str().to_string(),
                edges: edge_pairs(&record.edges),
                eigenvalues: record.eigenvalues.iter().map(domain_eigenvalue_to_wire).collect(),
            });
        }
        WireDatabase {
            version: CURRENT_VERSION,
            matrix_kind: db.kind(),
            per_n,
            product_cache,
            product_levels: db.product_levels().iter().copied().collect(),
            seed_families: db.seed_families().iter().cloned().collect(),
            seeded_up_to: db.seeded_up_to(),
        }
    }
}

fn edge_pairs(edges: &[Edge]) -> Vec<(usize, usize)> {
    edges.iter().map(|e| (e.0, e.1)).collect()
}

fn domain_eigenvalue_to_wire(r: &EigenvalueRecord) -> WireEigenvalue {
    WireEigenvalue::Record {
        re: r.re,
        im: r.im,
        value: None,
        form: r.form.clone(),
        exact: Some(r.exact),
        multiplicity: r.multiplicity,
    }
}

fn domain_classification_to_wire(c: &Classification) -> WireClassification {
    WireClassification {
        analytic: c.analytic,
        eigenvalues: c.eigenvalues.iter().map(domain_eigenvalue_to_wire).collect(),
        method: Some(c.method.as_str().to_string()),
        reason: c.reason.clone(),
    }
}

fn domain_entry_to_wire(e: &AnalyticGraphEntry) -> WireEntry {
    WireEntry {
        hash: Some(e.hash.as_str().to_string()),
        edges: edge_pairs(&e.edges),
        eigenvalues: e.eigenvalues.iter().map(domain_eigenvalue_to_wire).collect(),
        family: e.family.clone(),
        provenance: Some(e.provenance.as_str().to_string()),
        analytic: e.analytic,
        method: Some(e.method.as_str().to_string()),
        reason: e.reason.clone(),
    }
}

/// Deserialize a database document of any known version.
pub fn import_json(json: &str) -> Result<GraphDatabase, serde_json::Error> {
    let wire: WireDatabase = serde_json::from_str(json)?;
    Ok(wire.into_database())
}

/// Serialize a database to the current wire format.
pub fn export_json(db: &GraphDatabase) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&WireDatabase::from_database(db))
}
