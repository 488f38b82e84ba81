//! Closed forms: exact rendering of roots of small integer polynomials, and a
//! catalogue that recognizes a numeric value as one of a few known shapes.
//!
//! Everything rendered here is a real number. Skew spectra are rendered by
//! wrapping the magnitude with [`imaginary_form`].

use std::f64::consts::PI;
use std::fmt;

use num_rational::Ratio;
use num_traits::{Signed, Zero};

use crate::polynomial::Polynomial;

pub type Rational = Ratio<i128>;

pub fn rational_to_f64(r: &Rational) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn int(v: i128) -> Rational {
    Rational::from_integer(v)
}

pub fn perfect_square(k: i128) -> Option<i128> {
    if k < 0 {
        return None;
    }
    let r = k.isqrt();
    (r * r == k).then_some(r)
}

/// Split k ≥ 0 as c²·f with f squarefree.
pub fn squarefree_split(k: i128) -> (i128, i128) {
    if k == 0 {
        return (0, 1);
    }
    let mut c = 1;
    let mut f = k;
    let mut d = 2;
    while d * d <= f {
        while f % (d * d) == 0 {
            f /= d * d;
            c *= d;
        }
        d += 1;
    }
    (c, f)
}

fn is_simple(form: &str) -> bool {
    !form.chars().skip(1).any(|c| c == '+' || c == '-')
}

/// Negate a rendered form.
pub fn neg_form(form: &str) -> String {
    if form == "0" {
        form.to_string()
    } else if !is_simple(form) {
        format!("-({form})")
    } else if let Some(rest) = form.strip_prefix('-') {
        rest.to_string()
    } else {
        format!("-{form}")
    }
}

/// Render `sign · i · magnitude` for a point on the imaginary axis.
pub fn imaginary_form(magnitude: &str, negative: bool) -> String {
    if magnitude == "0" {
        return "0".to_string();
    }
    let sign = if negative { "-" } else { "" };
    if magnitude == "1" {
        format!("{sign}i")
    } else if magnitude.starts_with(|c: char| c.is_ascii_digit()) && is_simple(magnitude) {
        format!("{sign}i·{magnitude}")
    } else if is_simple(magnitude) && !magnitude.starts_with('-') {
        format!("{sign}i{magnitude}")
    } else {
        format!("{sign}i({magnitude})")
    }
}

fn add_shift(shift: &Rational, form: &str) -> String {
    if shift.is_zero() {
        form.to_string()
    } else if form.starts_with('-') {
        format!("{shift}{form}")
    } else {
        format!("{shift}+{form}")
    }
}

/// c·√f with f squarefree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surd {
    pub coef: Rational,
    pub radicand: i128,
}

impl Surd {
    /// √r for a non-negative rational.
    pub fn sqrt_of(r: &Rational) -> Option<Surd> {
        if r.is_negative() {
            return None;
        }
        let (num, den) = (*r.numer(), *r.denom());
        let (c, f) = squarefree_split(num.checked_mul(den)?);
        Some(Surd {
            coef: Rational::new(c, den),
            radicand: f,
        })
    }

    pub fn value(&self) -> f64 {
        rational_to_f64(&self.coef) * (self.radicand as f64).sqrt()
    }

    pub fn scale(&self, by: &Rational) -> Surd {
        Surd {
            coef: self.coef * by,
            radicand: self.radicand,
        }
    }
}

impl fmt::Display for Surd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.radicand == 1 || self.coef.is_zero() {
            return write!(f, "{}", self.coef);
        }
        let num = *self.coef.numer();
        let den = *self.coef.denom();
        let sign = if num < 0 { "-" } else { "" };
        let mag = num.abs();
        let head = if mag == 1 { String::new() } else { mag.to_string() };
        write!(f, "{sign}{head}√{}", self.radicand)?;
        if den != 1 {
            write!(f, "/{den}")?;
        }
        Ok(())
    }
}

/// a + b·√f.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadraticSurd {
    pub a: Rational,
    pub b: Rational,
    pub f: i128,
}

impl QuadraticSurd {
    pub fn rational(a: Rational) -> Self {
        Self {
            a,
            b: Rational::zero(),
            f: 1,
        }
    }

    pub fn value(&self) -> f64 {
        rational_to_f64(&self.a) + rational_to_f64(&self.b) * (self.f as f64).sqrt()
    }

    pub fn is_rational(&self) -> bool {
        self.b.is_zero() || self.f == 1
    }

    pub fn negated(&self) -> Self {
        Self {
            a: -self.a,
            b: -self.b,
            f: self.f,
        }
    }
}

impl fmt::Display for QuadraticSurd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_rational() {
            let r = if self.f == 1 { self.a + self.b } else { self.a };
            return write!(f, "{r}");
        }
        if self.a.is_zero() {
            let surd = Surd {
                coef: self.b,
                radicand: self.f,
            };
            return write!(f, "{surd}");
        }
        let (da, db) = (*self.a.denom(), *self.b.denom());
        let l = da / gcd(da, db) * db;
        let big_a = (self.a * int(l)).to_integer();
        let big_b = (self.b * int(l)).to_integer();
        let sign = if big_b < 0 { "-" } else { "+" };
        let mag = big_b.abs();
        let head = if mag == 1 { String::new() } else { mag.to_string() };
        let inner = format!("{big_a}{sign}{head}√{}", self.f);
        if l == 1 {
            write!(f, "{inner}")
        } else {
            write!(f, "({inner})/{l}")
        }
    }
}

/// Real roots of x² + bx + c in exact form, smaller root first.
pub fn quadratic_roots(b: &Rational, c: &Rational) -> Vec<QuadraticSurd> {
    let disc = b * b - c * int(4);
    if disc.is_negative() {
        return Vec::new();
    }
    let half = -b / int(2);
    let Some(root) = Surd::sqrt_of(&disc) else {
        return Vec::new();
    };
    let offset = root.coef / int(2);
    if root.radicand == 1 {
        return vec![
            QuadraticSurd::rational(half - offset),
            QuadraticSurd::rational(half + offset),
        ];
    }
    vec![
        QuadraticSurd {
            a: half,
            b: -offset,
            f: root.radicand,
        },
        QuadraticSurd {
            a: half,
            b: offset,
            f: root.radicand,
        },
    ]
}

fn render_sum(terms: &[Surd]) -> String {
    let mut sorted: Vec<&Surd> = terms.iter().filter(|t| !t.coef.is_zero()).collect();
    sorted.sort_by_key(|t| (t.coef.is_negative(), t.radicand));
    if sorted.is_empty() {
        return "0".to_string();
    }
    // Pull a shared denominator out front: (1+√5)/2 rather than 1/2+√5/2.
    let l = sorted
        .iter()
        .fold(1i128, |l, t| l / gcd(l, *t.coef.denom()) * t.coef.denom());
    let mut out = String::new();
    for (i, t) in sorted.iter().enumerate() {
        let s = t.scale(&int(l)).to_string();
        if i > 0 && !s.starts_with('-') {
            out.push('+');
        }
        out.push_str(&s);
    }
    if l == 1 || sorted.len() == 1 {
        if sorted.len() == 1 {
            return sorted[0].to_string();
        }
        out
    } else {
        format!("({out})/{l}")
    }
}

/// √q for q ≥ 0, denested when √(x + y√f) = √u ± √v with rational u, v.
pub fn sqrt_form(q: &QuadraticSurd) -> Option<String> {
    if q.value() < -1e-12 {
        return None;
    }
    if q.is_rational() {
        let r = if q.f == 1 { q.a + q.b } else { q.a };
        return Surd::sqrt_of(&r).map(|s| s.to_string());
    }
    // d² = x² − y²f must be a rational square.
    let d2 = q.a * q.a - q.b * q.b * int(q.f);
    let d = match (perfect_square(*d2.numer()), perfect_square(*d2.denom())) {
        (Some(n), Some(m)) if !d2.is_negative() => Some(Rational::new(n, m)),
        _ => None,
    };
    if let Some(d) = d {
        let u = (q.a + d) / int(2);
        let v = (q.a - d) / int(2);
        if let (Some(su), Some(sv)) = (Surd::sqrt_of(&u), Surd::sqrt_of(&v)) {
            let sv = if q.b.is_negative() { sv.scale(&int(-1)) } else { sv };
            return Some(render_sum(&[su, sv]));
        }
    }
    Some(format!("√({q})"))
}

pub fn cos_form(k: i64, m: i64) -> String {
    let g = gcd(k as i128, m as i128).max(1) as i64;
    let (k, m) = (k / g, m / g);
    let num = if k == 1 { "π".to_string() } else { format!("{k}π") };
    if m == 1 {
        format!("2cos({num})")
    } else {
        format!("2cos({num}/{m})")
    }
}

pub fn cot_form(k: i64, m: i64) -> String {
    let g = gcd(k as i128, m as i128).max(1) as i64;
    let (k, m) = (k / g, m / g);
    let num = if k == 1 { "π".to_string() } else { format!("{k}π") };
    format!("cot({num}/{m})")
}

/// Real roots of x³ + a x² + b x + c with exact forms: trigonometric when
/// three roots are real, Cardano otherwise.
pub fn cubic_root_forms(a: &Rational, b: &Rational, c: &Rational) -> Vec<(f64, String)> {
    let shift = -a / int(3);
    let p = b - a * a / int(3);
    let q = a * a * a * int(2) / int(27) - a * b / int(3) + c;
    let shift_f = rational_to_f64(&shift);

    if p.is_zero() {
        if q.is_zero() {
            return vec![(shift_f, shift.to_string()); 3];
        }
        let value = (-rational_to_f64(&q)).cbrt() + shift_f;
        return vec![(value, add_shift(&shift, &format!("∛({})", -q)))];
    }

    let disc = q * q / int(4) + p * p * p / int(27);
    if !disc.is_positive() {
        // t_k = 2√P·cos(arccos(X)/3 − 2πk/3), P = −p/3, X = (−q/2)·P^(−3/2)
        let big_p = -p / int(3);
        let Some(root_p) = Surd::sqrt_of(&big_p) else {
            return Vec::new();
        };
        let Some(inv_root) = Surd::sqrt_of(&big_p.recip()) else {
            return Vec::new();
        };
        let x = inv_root.scale(&(-q / int(2) / big_p));
        let amplitude = root_p.scale(&int(2));
        let theta = x.value().clamp(-1.0, 1.0).acos() / 3.0;
        return (0..3)
            .map(|k| {
                let value = amplitude.value() * (theta - 2.0 * PI * k as f64 / 3.0).cos() + shift_f;
                let turn = match k {
                    0 => String::new(),
                    1 => " - 2π/3".to_string(),
                    _ => " - 4π/3".to_string(),
                };
                let form = format!("{amplitude}·cos(arccos({x})/3{turn})");
                (value, add_shift(&shift, &form))
            })
            .collect();
    }

    let half = -q / int(2);
    let Some(root_d) = Surd::sqrt_of(&disc) else {
        return Vec::new();
    };
    let h = rational_to_f64(&half);
    let value = (h + root_d.value()).cbrt() + (h - root_d.value()).cbrt() + shift_f;
    let form = format!("∛({half}+{root_d})+∛({half}-{root_d})");
    vec![(value, add_shift(&shift, &form))]
}

/// Real roots of a monic integer quartic with exact forms (Ferrari).
pub fn quartic_root_forms(poly: &Polynomial) -> Vec<(f64, String)> {
    let c = poly.coeffs();
    if poly.degree() != 4 {
        return Vec::new();
    }
    let (a, b, cc, d) = (int(c[3]), int(c[2]), int(c[1]), int(c[0]));
    let shift = -a / int(4);
    let p = b - a * a * int(3) / int(8);
    let q = cc - a * b / int(2) + a * a * a / int(8);
    let r = d - a * cc / int(4) + a * a * b / int(16) - a * a * a * a * int(3) / int(256);
    let shift_f = rational_to_f64(&shift);

    let mut out = Vec::new();
    if q.is_zero() {
        for z in quadratic_roots(&p, &r) {
            if z.value() < -1e-12 {
                continue;
            }
            let Some(form) = sqrt_form(&z) else { continue };
            let y = z.value().max(0.0).sqrt();
            out.push((shift_f - y, add_shift(&shift, &neg_form(&form))));
            out.push((shift_f + y, add_shift(&shift, &form)));
        }
        return out;
    }

    let resolvent = cubic_root_forms(&p, &(p * p / int(4) - r), &(-q * q / int(8)));
    let Some((m, m_form)) = resolvent
        .into_iter()
        .max_by(|x, y| x.0.total_cmp(&y.0))
    else {
        return out;
    };
    if m <= 0.0 {
        return out;
    }
    let s2m = (2.0 * m).sqrt();
    let (pf, qf) = (rational_to_f64(&p), rational_to_f64(&q));
    for s in [1i128, -1] {
        // y² − s√(2m)·y + (p/2 + m + s·q/(2√(2m))) = 0
        let disc = -2.0 * m - 2.0 * pf - s as f64 * 2.0 * qf / s2m;
        if disc < -1e-9 {
            continue;
        }
        let root = disc.max(0.0).sqrt();
        let lead = if s > 0 { "" } else { "-" };
        let inner = format!(
            "-2m{}{}/√(2m)",
            signed(&(-p * int(2))),
            signed(&(-q * int(2 * s)))
        );
        for t in [-1.0f64, 1.0] {
            let value = (s as f64 * s2m + t * root) / 2.0 + shift_f;
            let t_sign = if t > 0.0 { "+" } else { "-" };
            let form = format!("({lead}√(2m){t_sign}√({inner}))/2, m = {m_form}");
            out.push((value, add_shift(&shift, &form)));
        }
    }
    out
}

fn signed(r: &Rational) -> String {
    if r.is_zero() {
        String::new()
    } else if r.is_negative() {
        r.to_string()
    } else {
        format!("+{r}")
    }
}

/// Exact form of a root: structured for rationals and quadratic surds, text
/// for the cubic and quartic formulas.
#[derive(Clone, Debug, PartialEq)]
pub enum RootForm {
    Quadratic(QuadraticSurd),
    Text(String),
}

impl RootForm {
    /// Form of √x, or of √(−x) when `negate` is set.
    pub fn sqrt(&self, negate: bool) -> Option<String> {
        match self {
            RootForm::Quadratic(q) => {
                let q = if negate { q.negated() } else { q.clone() };
                sqrt_form(&q)
            }
            RootForm::Text(t) if negate => Some(format!("√({})", neg_form(t))),
            RootForm::Text(t) => Some(format!("√({t})")),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, RootForm::Text(_))
    }
}

impl fmt::Display for RootForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootForm::Quadratic(q) => write!(f, "{q}"),
            RootForm::Text(t) => f.write_str(t),
        }
    }
}

/// Exact real roots of a monic integer factor of degree ≤ 4.
pub fn factor_root_forms(poly: &Polynomial) -> Vec<(f64, RootForm)> {
    let c = poly.coeffs();
    let text = |roots: Vec<(f64, String)>| -> Vec<(f64, RootForm)> {
        roots
            .into_iter()
            .map(|(v, t)| (v, RootForm::Text(t)))
            .collect()
    };
    match poly.degree() {
        1 => vec![(
            -(c[0] as f64),
            RootForm::Quadratic(QuadraticSurd::rational(int(-c[0]))),
        )],
        2 => quadratic_roots(&int(c[1]), &int(c[0]))
            .into_iter()
            .map(|r| (r.value(), RootForm::Quadratic(r)))
            .collect(),
        3 => text(cubic_root_forms(&int(c[2]), &int(c[1]), &int(c[0]))),
        4 => text(quartic_root_forms(poly)),
        _ => Vec::new(),
    }
}

/// A numeric value matched to a catalogue form.
#[derive(Clone, Debug, PartialEq)]
pub struct Recognized {
    pub value: f64,
    pub form: String,
}

const MAX_SURD_SQUARE: i128 = 10_000;
const QUADRATIC_RADICANDS: [i128; 18] = [2, 3, 5, 6, 7, 10, 11, 13, 14, 15, 17, 19, 21, 22, 23, 26, 29, 30];

/// Match `value` against integers, rationals, surds, quadratic surds,
/// 2cos(kπ/m) and cot(kπ/m), with denominators up to `max_den`.
pub fn recognize(value: f64, tol: f64, max_den: i64) -> Option<Recognized> {
    if !value.is_finite() {
        return None;
    }
    let mag = value.abs();
    let hit = recognize_magnitude(mag, tol, max_den.max(2))?;
    if value < 0.0 && hit.value != 0.0 {
        Some(Recognized {
            value: -hit.value,
            form: neg_form(&hit.form),
        })
    } else {
        Some(hit)
    }
}

fn recognize_magnitude(v: f64, tol: f64, max_den: i64) -> Option<Recognized> {
    let near = |x: f64| (x - v).abs() <= tol * (1.0 + v);

    let rounded = v.round();
    if near(rounded) {
        return Some(Recognized {
            value: rounded,
            form: format!("{}", rounded as i64),
        });
    }

    for den in 2..=max_den.min(12) {
        let num = (v * den as f64).round();
        if near(num / den as f64) {
            let r = Rational::new(num as i128, den as i128);
            return Some(Recognized {
                value: rational_to_f64(&r),
                form: r.to_string(),
            });
        }
    }

    let sq = (v * v).round();
    if sq > 0.0 && (sq as i128) <= MAX_SURD_SQUARE && near(sq.sqrt()) {
        if let Some(s) = Surd::sqrt_of(&int(sq as i128)) {
            return Some(Recognized {
                value: s.value(),
                form: s.to_string(),
            });
        }
    }

    for &f in &QUADRATIC_RADICANDS {
        let root = (f as f64).sqrt();
        for c in 1..=4i128 {
            for b in (1..=6i128).flat_map(|b| [b, -b]) {
                let a = v * c as f64 - b as f64 * root;
                let ar = a.round();
                let candidate = QuadraticSurd {
                    a: Rational::new(ar as i128, c),
                    b: Rational::new(b, c),
                    f,
                };
                if near(candidate.value()) {
                    return Some(Recognized {
                        value: candidate.value(),
                        form: candidate.to_string(),
                    });
                }
            }
        }
    }

    if v <= 2.0 + tol {
        let angle = (v / 2.0).clamp(-1.0, 1.0).acos() / PI;
        for m in 1..=max_den {
            let k = (angle * m as f64).round() as i64;
            let candidate = 2.0 * (k as f64 * PI / m as f64).cos();
            if near(candidate) {
                return Some(Recognized {
                    value: candidate,
                    form: cos_form(k, m),
                });
            }
        }
    }

    let angle = (0.5 - v.atan() / PI).clamp(0.0, 1.0);
    for m in 2..=max_den {
        let k = (angle * m as f64).round() as i64;
        if k <= 0 || k >= m {
            continue;
        }
        let candidate = 1.0 / (k as f64 * PI / m as f64).tan();
        if near(candidate) {
            return Some(Recognized {
                value: candidate,
                form: cot_form(k, m),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_squarefree_split() {
        assert_eq!(squarefree_split(12), (2, 3));
        assert_eq!(squarefree_split(72), (6, 2));
        assert_eq!(squarefree_split(7), (1, 7));
        assert_eq!(squarefree_split(16), (4, 1));
    }

    #[test]
    fn test_surd_display() {
        assert_eq!(Surd::sqrt_of(&int(2)).unwrap().to_string(), "√2");
        assert_eq!(Surd::sqrt_of(&int(12)).unwrap().to_string(), "2√3");
        assert_eq!(Surd::sqrt_of(&Rational::new(3, 4)).unwrap().to_string(), "√3/2");
        assert_eq!(Surd::sqrt_of(&int(9)).unwrap().to_string(), "3");
        assert!(Surd::sqrt_of(&int(-1)).is_none());
    }

    #[test]
    fn test_quadratic_roots() {
        // μ² + 6μ + 1
        let roots = quadratic_roots(&int(6), &int(1));
        let forms: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        assert_eq!(forms, vec!["-3-2√2", "-3+2√2"]);
        // x² − x − 1: golden ratio
        let roots = quadratic_roots(&int(-1), &int(-1));
        assert_eq!(roots[1].to_string(), "(1+√5)/2");
        assert_abs_diff_eq!(roots[1].value(), 1.618_033_988_749_895, epsilon = 1e-12);
        // x² − 3x + 2 is rational
        let roots = quadratic_roots(&int(-3), &int(2));
        assert_eq!(roots[0].to_string(), "1");
        assert_eq!(roots[1].to_string(), "2");
    }

    #[test]
    fn test_denesting() {
        let q = QuadraticSurd {
            a: int(3),
            b: int(2),
            f: 2,
        };
        assert_eq!(sqrt_form(&q).unwrap(), "1+√2");
        let q = QuadraticSurd {
            a: int(3),
            b: int(-2),
            f: 2,
        };
        assert_eq!(sqrt_form(&q).unwrap(), "√2-1");
        // √(2+√2) does not denest
        let q = QuadraticSurd {
            a: int(2),
            b: int(1),
            f: 2,
        };
        assert_eq!(sqrt_form(&q).unwrap(), "√(2+√2)");
        // −μ for the path on four vertices: (3+√5)/2 = ((1+√5)/2)²
        let q = QuadraticSurd {
            a: Rational::new(3, 2),
            b: Rational::new(1, 2),
            f: 5,
        };
        assert_eq!(sqrt_form(&q).unwrap(), "(1+√5)/2");
    }

    #[test]
    fn test_imaginary_and_negated_forms() {
        assert_eq!(imaginary_form("√2", false), "i√2");
        assert_eq!(imaginary_form("√2", true), "-i√2");
        assert_eq!(imaginary_form("1+√2", false), "i(1+√2)");
        assert_eq!(imaginary_form("1", true), "-i");
        assert_eq!(imaginary_form("2cos(π/5)", false), "i·2cos(π/5)");
        assert_eq!(neg_form("√3"), "-√3");
        assert_eq!(neg_form("-√3"), "√3");
        assert_eq!(neg_form("1+√2"), "-(1+√2)");
    }

    #[test]
    fn test_cubic_trig_forms_match_values() {
        // x³ + x² − 2x − 1
        let roots = cubic_root_forms(&int(1), &int(-2), &int(-1));
        assert_eq!(roots.len(), 3);
        let mut values: Vec<f64> = roots.iter().map(|r| r.0).collect();
        values.sort_by(f64::total_cmp);
        let mut expected: Vec<f64> = (1..=3)
            .map(|k| 2.0 * (2.0 * PI * k as f64 / 7.0).cos())
            .collect();
        expected.sort_by(f64::total_cmp);
        for (v, e) in values.iter().zip(&expected) {
            assert_abs_diff_eq!(v, e, epsilon = 1e-12);
        }
        assert!(roots.iter().all(|r| r.1.contains("cos(arccos(")));
    }

    #[test]
    fn test_quartic_forms_match_values() {
        // (x − 1)(x − 2)(x² − 2) = x⁴ − 3x³ + 6x − 4
        let p = Polynomial::from_ascending(vec![-4, 6, 0, -3, 1]);
        let mut values: Vec<f64> = quartic_root_forms(&p).iter().map(|r| r.0).collect();
        values.sort_by(f64::total_cmp);
        let s = 2f64.sqrt();
        let expected = [-s, 1.0, s, 2.0];
        assert_eq!(values.len(), 4);
        for (v, e) in values.iter().zip(expected) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_biquadratic_forms() {
        // x⁴ − 5x² + 4
        let p = Polynomial::from_ascending(vec![4, 0, -5, 0, 1]);
        let forms: Vec<String> = quartic_root_forms(&p).into_iter().map(|r| r.1).collect();
        assert!(forms.contains(&"2".to_string()));
        assert!(forms.contains(&"-1".to_string()));
    }

    #[test]
    fn test_recognize_catalogue() {
        let tol = 1e-9;
        assert_eq!(recognize(3.0, tol, 12).unwrap().form, "3");
        assert_eq!(recognize(-(2f64.sqrt()), tol, 12).unwrap().form, "-√2");
        assert_eq!(recognize(1.0 + 2f64.sqrt(), tol, 12).unwrap().form, "1+√2");
        let c = 2.0 * (PI / 7.0).cos();
        assert_eq!(recognize(c, tol, 16).unwrap().form, "2cos(π/7)");
        let t = 1.0 / (PI / 9.0).tan();
        assert_eq!(recognize(t, tol, 18).unwrap().form, "cot(π/9)");
        assert!(recognize(1.234_567_891_234, tol, 12).is_none());
    }

    #[test]
    fn test_root_form_sqrt_of_negated() {
        // μ = −3 − 2√2 for the skew K4: θ = √(−μ) = 1 + √2
        let roots = factor_root_forms(&Polynomial::from_ascending(vec![1, 6, 1]));
        assert_eq!(roots.len(), 2);
        let (mu, form) = &roots[0];
        assert!(*mu < 0.0);
        assert_eq!(form.sqrt(true).unwrap(), "1+√2");
        assert_eq!(roots[1].1.sqrt(true).unwrap(), "√2-1");
    }

    #[test]
    fn test_cos_form_reduces() {
        assert_eq!(cos_form(2, 8), "2cos(π/4)");
        assert_eq!(cos_form(3, 7), "2cos(3π/7)");
        assert_eq!(cot_form(3, 8), "cot(3π/8)");
    }
}
