//! Tier A: exact factorization over the integers.
//!
//! The characteristic polynomial is stripped of its λʳ factor and, when only
//! even powers remain (always for skew matrices, for symmetric matrices of
//! bipartite graphs), reduced through μ = λ² to half the degree. The numeric
//! roots are then grouped into integer factors of degree ≤ 4, each confirmed
//! by exact division and solved by radicals.

use tracing::trace;

use crate::classify::{Classification, ClassifierConfig, Method, numeric};
use crate::constants::MAX_RADICAL_DEGREE;
use crate::forms::{factor_root_forms, neg_form, recognize};
use crate::graph::MatrixKind;
use crate::polynomial::{Polynomial, group_roots};
use crate::spectrum::{EigenvalueRecord, merge, total_multiplicity};

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * (1.0 + a.abs().max(b.abs()))
}

/// Classify from the exact polynomial and the solver's axis values. Returns
/// `None` unless every eigenvalue received a closed form.
pub fn classify(
    poly: &Polynomial,
    values: &[f64],
    kind: MatrixKind,
    config: &ClassifierConfig,
) -> Option<Classification> {
    let n = poly.degree();
    if values.len() != n {
        return None;
    }
    let max_den = config.max_denominator(n);

    let (zeros, rest_poly) = poly.strip_zero_roots();
    let mut records = Vec::new();
    if zeros > 0 {
        records.push(EigenvalueRecord::zero(zeros));
    }
    let mut by_magnitude = values.to_vec();
    by_magnitude.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    let rest = by_magnitude.split_off(zeros);
    if rest_poly.degree() == 0 {
        return Some(Classification::analytic(merge(records), Method::Algebraic));
    }

    let (work, domain, reduced) = match rest_poly.even_reduction() {
        Some(q) => {
            let positive: Vec<f64> = rest.iter().copied().filter(|&v| v > 0.0).collect();
            if positive.len() != q.degree() {
                return None;
            }
            let mu = positive
                .iter()
                .map(|&v| match kind {
                    MatrixKind::Skew => -v * v,
                    MatrixKind::Symmetric => v * v,
                })
                .collect();
            (q, mu, true)
        }
        None => (rest_poly, rest, false),
    };

    let grouping = group_roots(&work, &domain, MAX_RADICAL_DEGREE);
    let mut residue = grouping.residue;
    for (factor, numeric_roots) in &grouping.factors {
        let mut formulas = factor_root_forms(factor);
        for &x in numeric_roots {
            let Some(pos) = formulas
                .iter()
                .position(|(v, _)| close(*v, x, config.tolerance))
            else {
                residue.push(x);
                continue;
            };
            let (value, form) = formulas.swap_remove(pos);

            if !reduced {
                let rendered = if form.is_text() {
                    recognize(value, config.pattern_tolerance, max_den)
                        .map(|r| r.form)
                        .unwrap_or_else(|| form.to_string())
                } else {
                    form.to_string()
                };
                records.push(EigenvalueRecord::axis(kind, value, Some(rendered)));
                continue;
            }

            // λ = ±√μ (symmetric) or λ = ±i√(−μ) (skew); anything else is
            // off the axis and stays out of the count.
            let on_axis = match kind {
                MatrixKind::Skew => value <= config.tolerance,
                MatrixKind::Symmetric => value >= -config.tolerance,
            };
            if !on_axis {
                trace!(value, "factor root off the spectral axis");
                continue;
            }
            let magnitude = value.abs().sqrt();
            let pretty = form
                .is_text()
                .then(|| recognize(magnitude, config.pattern_tolerance, max_den))
                .flatten()
                .map(|r| r.form);
            let Some(mag_form) = pretty.or_else(|| form.sqrt(kind == MatrixKind::Skew)) else {
                residue.push(x);
                continue;
            };
            records.push(EigenvalueRecord::axis(kind, magnitude, Some(mag_form.clone())));
            records.push(EigenvalueRecord::axis(kind, -magnitude, Some(neg_form(&mag_form))));
        }
    }

    let mut method = Method::Algebraic;
    if !residue.is_empty() {
        let axis: Vec<f64> = if reduced {
            residue
                .iter()
                .flat_map(|&mu| {
                    let m = mu.abs().sqrt();
                    [m, -m]
                })
                .collect()
        } else {
            residue
        };
        if axis.len() > config.residue_limit {
            trace!(residue = axis.len(), "irreducible residue too large");
            return None;
        }
        records.extend(numeric::pattern_records(&axis, kind, config, n)?);
        method = Method::AlgebraicPattern;
    }

    let records = merge(records);
    (total_multiplicity(&records) == n).then(|| Classification::analytic(records, method))
}
