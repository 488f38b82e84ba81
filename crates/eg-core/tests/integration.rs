//! Integration tests exercising the full pipeline:
//! enumerate → canonicalize → classify → store → export, across modules.

use approx::assert_abs_diff_eq;
use eg_core::bounds::{Topology, compute_direct_sum, compute_spectrum, detect_topology};
use eg_core::collaborator::{EditableGraph, materialize, read_graph};
use eg_core::database::NoPersistence;
use eg_core::families::{complete, cycle, path, star, wheel};
use eg_core::spectrum::{EigenvalueRecord, axis_values, direct_sum};
use eg_core::{
    CancelToken, Classifier, ClassifierConfig, DirectSolver, EigenSolver, Graph, GraphDatabase,
    MatrixKind, Method, Phase, ProgressEvent, SearchContext, SearchOptions, SearchResult,
    TieredSolver, canonical_hash, char_poly, char_poly_exact, export_json, find_analytic_graphs,
    import_json,
};
use std::collections::BTreeMap;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

fn search(db: &mut GraphDatabase, n: usize, options: SearchOptions) -> SearchResult {
    let classifier = Classifier::default();
    let mut sink = NoPersistence;
    let mut ctx = SearchContext::new(db, &classifier, &mut sink);
    find_analytic_graphs(n, options, &mut ctx).unwrap()
}

fn assert_same_values(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-9);
    }
}

fn imag_parts(points: &[eg_core::SpectrumPoint]) -> Vec<f64> {
    let mut out: Vec<f64> = points
        .iter()
        .flat_map(|p| std::iter::repeat_n(p.im, p.multiplicity))
        .collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Connected graphs on three vertices.
#[test]
fn three_vertex_connected_search() {
    let mut db = GraphDatabase::new(MatrixKind::Skew);
    let options = SearchOptions {
        connected_only: true,
        ..Default::default()
    };
    let result = search(&mut db, 3, options);
    assert!(!result.cancelled);
    assert_eq!(result.graphs.len(), 2);

    let hashes: Vec<_> = result.graphs.iter().map(|g| g.hash.clone()).collect();
    assert!(hashes.contains(&canonical_hash(&path(3))));
    assert!(hashes.contains(&canonical_hash(&complete(3))));
    for g in &result.graphs {
        assert!(g.analytic);
        assert!(g.eigenvalues.iter().all(|r| r.exact));
    }

    let p3 = result
        .graphs
        .iter()
        .find(|g| g.hash == canonical_hash(&path(3)))
        .unwrap();
    let values = axis_values(&p3.eigenvalues, MatrixKind::Skew);
    let s = 2f64.sqrt();
    assert_same_values(&values, &[-s, 0.0, s]);
    let forms: Vec<&str> = p3.eigenvalues.iter().filter_map(|r| r.form.as_deref()).collect();
    assert_eq!(forms, vec!["-i√2", "0", "i√2"]);
}

/// K4 through the factorization tier and the bound engine.
#[test]
fn complete_four_matches_bound_engine() {
    let k4 = complete(4);
    let c = Classifier::default().classify(&k4, MatrixKind::Skew).unwrap();
    assert!(c.analytic);
    assert_eq!(c.method, Method::Algebraic);

    let topology = detect_topology(&k4);
    assert_eq!(topology, Topology::Complete { n: 4 });
    let bound = compute_spectrum(&topology, 1.0, 1.0);
    assert!(bound.exact_spectrum);
    assert!(bound.eigenvalues.iter().all(|p| p.re == -1.0));
    assert_same_values(
        &axis_values(&c.eigenvalues, MatrixKind::Skew),
        &imag_parts(&bound.eigenvalues),
    );
}

/// The star agrees between classifier and bound engine.
#[test]
fn star_five_agrees() {
    let s5 = star(5);
    let c = Classifier::default().classify(&s5, MatrixKind::Skew).unwrap();
    assert!(c.analytic);
    let zero = c.eigenvalues.iter().find(|r| r.im == 0.0).unwrap();
    assert_eq!(zero.multiplicity, 3);
    assert!(
        c.eigenvalues
            .iter()
            .filter(|r| r.im != 0.0)
            .all(|r| (r.im.abs() - 2.0).abs() < 1e-12)
    );

    let bound = compute_spectrum(&detect_topology(&s5), 0.5, 1.0);
    assert_same_values(
        &axis_values(&c.eigenvalues, MatrixKind::Skew),
        &imag_parts(&bound.eigenvalues),
    );
}

/// A disjoint union resolves from its stored components.
#[test]
fn disjoint_union_resolves_from_components() {
    let mut db = GraphDatabase::new(MatrixKind::Skew);
    search(&mut db, 3, SearchOptions::default());

    let g = path(3).disjoint_union(&complete(3));
    let resolved = db.resolve_disconnected_graph(&g).unwrap();
    assert!(resolved.analytic);
    assert_eq!(resolved.method, Method::Disconnected);
    assert_eq!(resolved.multiplicity(), 6);

    let direct = Classifier::default().classify(&g, MatrixKind::Skew).unwrap();
    assert_same_values(
        &axis_values(&resolved.eigenvalues, MatrixKind::Skew),
        &axis_values(&direct.eigenvalues, MatrixKind::Skew),
    );
}

/// Cancellation from the progress callback mid-enumeration.
#[test]
fn cancel_mid_enumeration() {
    let mut db = GraphDatabase::new(MatrixKind::Skew);
    let classifier = Classifier::default();
    let mut sink = NoPersistence;
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut events = 0usize;
    let mut on_progress = |event: &ProgressEvent| {
        events += 1;
        if event.phase == Phase::Searching && event.masks_done > 0 {
            trigger.cancel();
        }
    };
    let options = SearchOptions {
        build_incremental: false,
        cancel: Some(token),
        ..Default::default()
    };
    let result = {
        let mut ctx =
            SearchContext::new(&mut db, &classifier, &mut sink).with_progress(&mut on_progress);
        find_analytic_graphs(7, options, &mut ctx).unwrap()
    };
    assert!(events > 0);
    assert!(result.cancelled);
    assert!(!result.truncated);
    assert!(!result.graphs.is_empty());
    // 1044 isomorphism classes exist on seven vertices.
    assert!(result.graphs.len() < 1044);
    assert!(result.stats.masks_scanned < 1 << 21);
    assert!(!db.is_complete(7));
}

#[test]
fn canonical_hash_survives_relabelling() {
    let mut rng = rng();
    let g = wheel(7).disjoint_union(&path(2));
    let reference = canonical_hash(&g);
    for _ in 0..20 {
        let mut perm: Vec<usize> = (0..g.n()).collect();
        perm.shuffle(&mut rng);
        assert_eq!(canonical_hash(&g.relabel(&perm)), reference);
    }
    assert_ne!(canonical_hash(&cycle(9)), reference);
}

#[test]
fn polynomial_paths_agree() {
    let g = wheel(6);
    let exact = char_poly_exact(&g.skew_adjacency());
    let float_matrix: Vec<Vec<f64>> = g
        .skew_adjacency()
        .iter()
        .map(|row| row.iter().map(|&v| v as f64).collect())
        .collect();
    let float = char_poly(&float_matrix);
    assert_eq!(exact[0], 1);
    assert_eq!(float, char_poly(&float_matrix));
    for (e, f) in exact.iter().zip(&float) {
        assert_abs_diff_eq!(*e as f64, *f, epsilon = 1e-9);
    }
}

#[test]
fn analytic_results_sum_to_n() {
    let classifier = Classifier::default();
    for kind in [MatrixKind::Skew, MatrixKind::Symmetric] {
        for mask in 0..(1u64 << 10) {
            let g = Graph::from_mask(5, mask);
            let c = classifier.classify(&g, kind).unwrap();
            if c.analytic {
                assert_eq!(c.multiplicity(), 5, "{g} ({kind})");
            }
        }
    }
}

#[test]
fn cartesian_product_spectrum_is_pairwise_sum() {
    let classifier = Classifier::default();
    let (a, b) = (path(2), path(3));
    let ca = classifier.classify(&a, MatrixKind::Symmetric).unwrap();
    let cb = classifier.classify(&b, MatrixKind::Symmetric).unwrap();
    let product = a.cartesian_product(&b);
    let cp = classifier.classify(&product, MatrixKind::Symmetric).unwrap();
    assert!(ca.analytic && cb.analytic && cp.analytic);

    let summed: Vec<EigenvalueRecord> = direct_sum(&ca.eigenvalues, &cb.eigenvalues);
    let expected = axis_values(&summed, MatrixKind::Symmetric);
    assert_same_values(&axis_values(&cp.eigenvalues, MatrixKind::Symmetric), &expected);

    let bound = compute_direct_sum(
        &compute_spectrum(&Topology::Path { n: 2 }, 0.0, 1.0),
        &compute_spectrum(&Topology::Path { n: 3 }, 0.0, 1.0),
    );
    assert_same_values(&imag_parts(&bound.eigenvalues), &expected);
}

#[test]
fn search_is_idempotent() {
    let mut db = GraphDatabase::new(MatrixKind::Symmetric);
    let first = search(&mut db, 5, SearchOptions::default());
    assert!(first.stats.fresh > 0);
    let second = search(&mut db, 5, SearchOptions::default());
    assert_eq!(second.stats.fresh, 0);
    assert!(second.stats.levels_built.is_empty());
    let hashes = |r: &SearchResult| r.graphs.iter().map(|g| g.hash.clone()).collect::<Vec<_>>();
    assert_eq!(hashes(&first), hashes(&second));
}

#[test]
fn export_import_reproduces_large_database() {
    let mut db = GraphDatabase::new(MatrixKind::Symmetric);
    search(&mut db, 6, SearchOptions::default());
    let stats = db.stats();
    assert!(stats.total_entries + stats.total_rejections >= 100);
    assert!(stats.levels.len() >= 3);

    let back = import_json(&export_json(&db).unwrap()).unwrap();
    assert_eq!(back, db);
    for (n, level) in db.levels() {
        for hash in level.entries.keys() {
            assert!(back.entry(n, hash).is_some());
        }
    }
}

#[test]
fn tiered_solver_matches_direct() {
    let direct = Classifier::default();
    let tiered = Classifier::new(TieredSolver::new(4), ClassifierConfig::default());
    for g in [wheel(6), cycle(8), complete(5), path(9)] {
        for kind in [MatrixKind::Skew, MatrixKind::Symmetric] {
            assert_eq!(
                direct.classify(&g, kind).unwrap(),
                tiered.classify(&g, kind).unwrap()
            );
        }
    }
}

#[test]
fn search_result_materializes_into_host() {
    let mut db = GraphDatabase::new(MatrixKind::Skew);
    let result = search(&mut db, 4, SearchOptions::default());
    let entry = result.graphs.last().unwrap();
    let graph = entry.graph().unwrap();

    let mut host = EditableGraph::default();
    materialize(&mut host, &graph, 1.0);
    let read_back = read_graph(&host).unwrap();
    assert_eq!(read_back, graph);
    assert_eq!(canonical_hash(&read_back), entry.hash);
}

/// Every stored product spectrum is the spectrum the classifier would see
/// for the same graph.
#[test]
fn product_records_match_fresh_classification() {
    for kind in [MatrixKind::Skew, MatrixKind::Symmetric] {
        let classifier = Classifier::default();
        let mut db = GraphDatabase::new(kind);
        db.seed_known_families(4, &classifier);
        db.precompute_product_graphs(6);
        db.precompute_product_graphs(8);

        let mut checked = 0;
        for (n, hash, record) in db.products() {
            let graph = Graph::new(n, record.edges.iter().map(|e| (e.0, e.1))).unwrap();
            assert_eq!(&canonical_hash(&graph), hash);

            let prepared = classifier.prepare(&graph, kind);
            let mut fresh = DirectSolver.solve(&prepared.matrix, kind).unwrap();
            fresh.sort_by(f64::total_cmp);
            let stored = axis_values(&record.eigenvalues, kind);
            assert_eq!(stored.len(), fresh.len(), "{kind:?} {hash}");
            for (a, b) in stored.iter().zip(&fresh) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
            }
            checked += 1;
        }
        assert!(checked > 0, "no {kind:?} products on 6 or 8 vertices");
    }
}

/// The product table is a shortcut only: a skew search finds the same
/// spectra with it disabled.
#[test]
fn skew_search_ignores_product_cache() {
    let options = || SearchOptions {
        connected_only: true,
        ..Default::default()
    };
    let spectra = |result: &SearchResult| -> BTreeMap<String, Vec<f64>> {
        result
            .graphs
            .iter()
            .map(|g| (g.hash.to_string(), axis_values(&g.eigenvalues, MatrixKind::Skew)))
            .collect()
    };

    let mut with_products = GraphDatabase::new(MatrixKind::Skew);
    let a = search(&mut with_products, 6, options());

    let mut without = GraphDatabase::new(MatrixKind::Skew);
    without.mark_products_computed(6);
    let b = search(&mut without, 6, options());
    assert_eq!(b.stats.from_products, 0);

    let (a, b) = (spectra(&a), spectra(&b));
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (hash, values) in &a {
        let other = &b[hash];
        assert_eq!(values.len(), other.len(), "{hash}");
        for (x, y) in values.iter().zip(other) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-6);
        }
    }
}
