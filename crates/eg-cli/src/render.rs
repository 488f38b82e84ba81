//! Plain-text and JSON rendering shared by the CLI and the MCP tools.

use eg_core::{AnalyticGraphEntry, EigenvalueRecord, GraphPolynomial, SearchResult, SpectrumPoint};

fn number(re: f64, im: f64) -> String {
    match (re == 0.0, im == 0.0) {
        (_, true) => format!("{re:.6}"),
        (true, false) => format!("{im:.6}i"),
        (false, false) if im < 0.0 => format!("{re:.6}-{:.6}i", -im),
        (false, false) => format!("{re:.6}+{im:.6}i"),
    }
}

pub fn eigenvalue(record: &EigenvalueRecord) -> String {
    let value = record
        .form
        .clone()
        .unwrap_or_else(|| format!("≈{}", number(record.re, record.im)));
    if record.multiplicity > 1 {
        format!("{value} (×{})", record.multiplicity)
    } else {
        value
    }
}

pub fn spectrum(records: &[EigenvalueRecord]) -> String {
    if records.is_empty() {
        return "(empty)".to_string();
    }
    records.iter().map(eigenvalue).collect::<Vec<_>>().join(", ")
}

pub fn point(point: &SpectrumPoint) -> String {
    let prefix = if point.approx { "bound " } else { "" };
    let value = number(point.re, point.im);
    if point.multiplicity > 1 {
        format!("{prefix}{value} (×{})", point.multiplicity)
    } else {
        format!("{prefix}{value}")
    }
}

pub fn edge_list(entry: &AnalyticGraphEntry) -> String {
    entry
        .edges
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn entry_line(entry: &AnalyticGraphEntry, poly: Option<&GraphPolynomial>) -> String {
    let family = entry.family.as_deref().unwrap_or("-");
    let mut line = format!(
        "{}  [{}]  {}  {}",
        entry.hash,
        edge_list(entry),
        family,
        spectrum(&entry.eigenvalues)
    );
    if let Some(poly) = poly {
        line.push_str(&format!(
            "  p(x) = {} (class size {})",
            poly.polynomial, poly.isomorphism_class_size
        ));
    }
    line
}

fn insert_polynomial(value: &mut serde_json::Value, poly: Option<&GraphPolynomial>) {
    if let (Some(obj), Some(poly)) = (value.as_object_mut(), poly) {
        obj.insert("polynomial".into(), poly.polynomial.clone().into());
        obj.insert("isomorphism_class_size".into(), poly.isomorphism_class_size.into());
    }
}

pub fn entry_json(entry: &AnalyticGraphEntry, poly: Option<&GraphPolynomial>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "hash": entry.hash,
        "n": entry.n,
        "edges": edge_list(entry),
        "family": entry.family,
        "method": entry.method,
        "provenance": entry.provenance,
        "spectrum": spectrum(&entry.eigenvalues),
        "eigenvalues": entry.eigenvalues,
    });
    insert_polynomial(&mut value, poly);
    value
}

/// Full search result with each graph carrying its polynomial.
pub fn search_json(result: &SearchResult) -> serde_json::Result<serde_json::Value> {
    let mut value = serde_json::to_value(result)?;
    if let Some(graphs) = value.get_mut("graphs").and_then(|g| g.as_array_mut()) {
        for (graph, entry) in graphs.iter_mut().zip(&result.graphs) {
            insert_polynomial(graph, result.polynomials.get(&entry.hash));
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eg_core::{Classification, MatrixKind, Method, Provenance, canonical_form, families};

    #[test]
    fn test_eigenvalue_rendering() {
        assert_eq!(eigenvalue(&EigenvalueRecord::zero(3)), "0 (×3)");
        let approx = EigenvalueRecord::axis(MatrixKind::Skew, -1.25, None);
        assert_eq!(eigenvalue(&approx), "≈-1.250000i");
        let exact = EigenvalueRecord::axis(MatrixKind::Symmetric, 2.0, Some("2".into()));
        assert_eq!(eigenvalue(&exact), "2");
    }

    #[test]
    fn test_entry_polynomial_fields() {
        let graph = families::star(5);
        let entry = AnalyticGraphEntry::new(
            &graph,
            &canonical_form(&graph),
            Classification::analytic(Vec::new(), Method::Product),
            Provenance::Product,
        );
        let poly = GraphPolynomial {
            polynomial: "x^5 - 4x^3".into(),
            isomorphism_class_size: 2,
        };
        let json = entry_json(&entry, Some(&poly));
        assert_eq!(json["polynomial"], "x^5 - 4x^3");
        assert_eq!(json["isomorphism_class_size"], 2);
        assert!(entry_json(&entry, None).get("polynomial").is_none());
        assert!(entry_line(&entry, Some(&poly)).ends_with("p(x) = x^5 - 4x^3 (class size 2)"));
    }

    #[test]
    fn test_point_rendering() {
        let p = SpectrumPoint {
            re: -1.0,
            im: -2.0,
            multiplicity: 2,
            approx: true,
        };
        assert_eq!(point(&p), "bound -1.000000-2.000000i (×2)");
    }
}
