//! Tier B: eigenvalues of the form 2cos(kπ/m).

use std::f64::consts::PI;

use crate::classify::{Classification, ClassifierConfig, Method};
use crate::forms::{cos_form, neg_form};
use crate::graph::MatrixKind;
use crate::spectrum::{EigenvalueRecord, merge};

#[derive(Clone, Debug, PartialEq)]
pub enum ChebyshevOutcome {
    /// Every eigenvalue matched.
    Full(Classification),
    /// At least the configured fraction matched; reported with `analytic = false`.
    Partial(Classification),
    Miss,
}

/// Best (k, m) with |2cos(kπ/m) − magnitude| ≤ tol and m ≤ max_m.
pub fn match_cos(magnitude: f64, tol: f64, max_m: usize) -> Option<(i64, i64)> {
    if magnitude > 2.0 + tol {
        return None;
    }
    let angle = (magnitude / 2.0).clamp(-1.0, 1.0).acos() / PI;
    (1..=max_m as i64).find_map(|m| {
        let k = (angle * m as f64).round() as i64;
        let candidate = 2.0 * (k as f64 * PI / m as f64).cos();
        ((candidate - magnitude).abs() <= tol).then_some((k, m))
    })
}

pub fn classify(values: &[f64], kind: MatrixKind, config: &ClassifierConfig) -> ChebyshevOutcome {
    let n = values.len();
    if n == 0 {
        return ChebyshevOutcome::Miss;
    }
    let max_m = config.max_denominator(n) as usize;

    let mut matched = 0usize;
    let mut records = Vec::with_capacity(n);
    for &v in values {
        let magnitude = v.abs();
        if magnitude <= config.tolerance {
            matched += 1;
            records.push(EigenvalueRecord::zero(1));
            continue;
        }
        match match_cos(magnitude, config.tolerance, max_m) {
            Some((k, m)) => {
                matched += 1;
                let exact = 2.0 * (k as f64 * PI / m as f64).cos();
                let form = cos_form(k, m);
                let (value, form) = if v < 0.0 { (-exact, neg_form(&form)) } else { (exact, form) };
                records.push(EigenvalueRecord::axis(kind, value, Some(form)));
            }
            None => records.push(EigenvalueRecord::axis(kind, v, None)),
        }
    }

    let records = merge(records);
    if matched == n {
        ChebyshevOutcome::Full(Classification::analytic(records, Method::Chebyshev))
    } else if matched as f64 >= config.chebyshev_threshold * n as f64 {
        ChebyshevOutcome::Partial(Classification::rejected(
            records,
            Method::Chebyshev,
            format!("{matched} of {n} eigenvalues match 2cos(kπ/m)"),
        ))
    } else {
        ChebyshevOutcome::Miss
    }
}
