use serde::{Deserialize, Serialize};

use crate::forms::{imaginary_form, neg_form};
use crate::graph::MatrixKind;

/// One eigenvalue with its closed form, if known.
///
/// Skew spectra live on the imaginary axis (`re = 0`), symmetric spectra on
/// the real axis (`im = 0`). `exact` is set iff `form` holds a closed form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigenvalueRecord {
    pub re: f64,
    pub im: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    pub exact: bool,
    pub multiplicity: usize,
}

impl EigenvalueRecord {
    /// Eigenvalue at signed position `value` along the kind's axis. `form`
    /// is the signed real form of `value`; skew forms gain the `i`.
    pub fn axis(kind: MatrixKind, value: f64, form: Option<String>) -> Self {
        let exact = form.is_some();
        let form = form.map(|f| match kind {
            MatrixKind::Symmetric => f,
            MatrixKind::Skew if value < 0.0 => imaginary_form(&neg_form(&f), true),
            MatrixKind::Skew => imaginary_form(&f, false),
        });
        let (re, im) = match kind {
            MatrixKind::Skew => (0.0, value),
            MatrixKind::Symmetric => (value, 0.0),
        };
        Self {
            re,
            im,
            form,
            exact,
            multiplicity: 1,
        }
    }

    pub fn zero(multiplicity: usize) -> Self {
        Self {
            re: 0.0,
            im: 0.0,
            form: Some("0".to_string()),
            exact: true,
            multiplicity,
        }
    }

    pub fn with_multiplicity(mut self, multiplicity: usize) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn magnitude(&self) -> f64 {
        self.re.hypot(self.im)
    }

    fn same_point(&self, other: &Self) -> bool {
        let scale = 1.0 + self.magnitude().max(other.magnitude());
        (self.re - other.re).abs() <= 1e-9 * scale && (self.im - other.im).abs() <= 1e-9 * scale
    }
}

pub fn total_multiplicity(records: &[EigenvalueRecord]) -> usize {
    records.iter().map(|r| r.multiplicity).sum()
}

/// Combine records at the same point, summing multiplicities, ordered by
/// imaginary then real part. The first form seen at a point wins.
pub fn merge(records: Vec<EigenvalueRecord>) -> Vec<EigenvalueRecord> {
    let mut out: Vec<EigenvalueRecord> = Vec::with_capacity(records.len());
    for r in records {
        match out.iter_mut().find(|o| o.same_point(&r)) {
            Some(o) => {
                o.multiplicity += r.multiplicity;
                if o.form.is_none() && r.form.is_some() {
                    o.form = r.form;
                    o.exact = r.exact;
                }
            }
            None => out.push(r),
        }
    }
    out.sort_by(|a, b| a.im.total_cmp(&b.im).then(a.re.total_cmp(&b.re)));
    out
}

/// Multiset union of two spectra.
pub fn union(a: &[EigenvalueRecord], b: &[EigenvalueRecord]) -> Vec<EigenvalueRecord> {
    merge(a.iter().chain(b).cloned().collect())
}

fn join_forms(a: &Option<String>, b: &Option<String>, op: char) -> Option<String> {
    let (a, b) = (a.as_deref()?, b.as_deref()?);
    Some(match op {
        '+' if a == "0" => b.to_string(),
        '+' if b == "0" => a.to_string(),
        '+' if b.starts_with('-') => format!("{a}{b}"),
        '+' => format!("{a}+{b}"),
        _ if a == "0" || b == "0" => "0".to_string(),
        _ if a == "1" => b.to_string(),
        _ if b == "1" => a.to_string(),
        _ => format!("({a})·({b})"),
    })
}

/// Pairwise sums: the spectrum of A ⊗ I + I ⊗ B, i.e. of a Cartesian product.
pub fn direct_sum(a: &[EigenvalueRecord], b: &[EigenvalueRecord]) -> Vec<EigenvalueRecord> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for x in a {
        for y in b {
            let (re, im) = (x.re + y.re, x.im + y.im);
            let at_zero = re.abs() < 1e-12 && im.abs() < 1e-12;
            let form = if at_zero && x.exact && y.exact {
                Some("0".to_string())
            } else {
                join_forms(&x.form, &y.form, '+')
            };
            out.push(EigenvalueRecord {
                re: if at_zero { 0.0 } else { re },
                im: if at_zero { 0.0 } else { im },
                exact: form.is_some(),
                form,
                multiplicity: x.multiplicity * y.multiplicity,
            });
        }
    }
    merge(out)
}

/// Pairwise products of two real spectra: the spectrum of A ⊗ B, i.e. of a
/// tensor product of symmetric adjacency matrices.
pub fn tensor_combine(a: &[EigenvalueRecord], b: &[EigenvalueRecord]) -> Vec<EigenvalueRecord> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for x in a {
        for y in b {
            let re = x.re * y.re - x.im * y.im;
            let im = x.re * y.im + x.im * y.re;
            let form = join_forms(&x.form, &y.form, '·');
            out.push(EigenvalueRecord {
                re: if re.abs() < 1e-12 { 0.0 } else { re },
                im: if im.abs() < 1e-12 { 0.0 } else { im },
                exact: form.is_some(),
                form,
                multiplicity: x.multiplicity * y.multiplicity,
            });
        }
    }
    merge(out)
}

/// Eigenvalues along the kind's axis, repeated by multiplicity, ascending.
pub fn axis_values(records: &[EigenvalueRecord], kind: MatrixKind) -> Vec<f64> {
    let mut out: Vec<f64> = records
        .iter()
        .flat_map(|r| {
            let v = match kind {
                MatrixKind::Skew => r.im,
                MatrixKind::Symmetric => r.re,
            };
            std::iter::repeat_n(v, r.multiplicity)
        })
        .collect();
    out.sort_by(f64::total_cmp);
    out
}
