//! Tier C: numeric eigenvalues matched against the closed-form catalogue.

use crate::classify::{Classification, ClassifierConfig, Method};
use crate::forms::recognize;
use crate::graph::MatrixKind;
use crate::spectrum::{EigenvalueRecord, merge};

/// Records for `values` if every one of them is recognized.
pub fn pattern_records(
    values: &[f64],
    kind: MatrixKind,
    config: &ClassifierConfig,
    n: usize,
) -> Option<Vec<EigenvalueRecord>> {
    let max_den = config.max_denominator(n);
    values
        .iter()
        .map(|&v| {
            recognize(v, config.pattern_tolerance, max_den)
                .map(|hit| EigenvalueRecord::axis(kind, hit.value, Some(hit.form)))
        })
        .collect()
}

pub fn classify(values: &[f64], kind: MatrixKind, config: &ClassifierConfig) -> Classification {
    let n = values.len();
    let max_den = config.max_denominator(n);
    let mut unknown: Option<f64> = None;
    let records: Vec<EigenvalueRecord> = values
        .iter()
        .map(|&v| match recognize(v, config.pattern_tolerance, max_den) {
            Some(hit) => EigenvalueRecord::axis(kind, hit.value, Some(hit.form)),
            None => {
                unknown.get_or_insert(v);
                EigenvalueRecord::axis(kind, v, None)
            }
        })
        .collect();
    let records = merge(records);
    match unknown {
        None => Classification::analytic(records, Method::Numeric),
        Some(v) => Classification::rejected(
            records,
            Method::Numeric,
            format!("eigenvalue {v:.6} has no recognized closed form"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cotangent_spectrum_recognized() {
        // Skew K5 under a transitive orientation: ±cot(π/10), ±cot(3π/10), 0
        let cot = |k: f64| 1.0 / (k * std::f64::consts::PI / 10.0).tan();
        let values = [-cot(1.0), -cot(3.0), 0.0, cot(3.0), cot(1.0)];
        let c = classify(&values, MatrixKind::Skew, &ClassifierConfig::default());
        assert!(c.analytic, "{:?}", c.reason);
        assert_eq!(c.method, Method::Numeric);
        assert_eq!(c.multiplicity(), 5);
    }

    #[test]
    fn test_unrecognized_value() {
        let c = classify(&[0.0, 1.234_567_891], MatrixKind::Symmetric, &ClassifierConfig::default());
        assert!(!c.analytic);
        assert_eq!(c.reason.as_deref(), Some("eigenvalue 1.234568 has no recognized closed form"));
        assert_eq!(c.eigenvalues.iter().filter(|r| !r.exact).count(), 1);
    }

    #[test]
    fn test_pattern_records_all_or_nothing() {
        let cfg = ClassifierConfig::default();
        let s = 3f64.sqrt();
        let some = pattern_records(&[s, -s], MatrixKind::Skew, &cfg, 4).unwrap();
        assert_eq!(some[0].form.as_deref(), Some("i√3"));
        assert_eq!(some[1].form.as_deref(), Some("-i√3"));
        assert!(pattern_records(&[s, 1.234_567_891], MatrixKind::Skew, &cfg, 4).is_none());
    }
}
