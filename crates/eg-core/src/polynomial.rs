//! Monic integer polynomials, their real roots by radicals, and the grouping
//! of numeric roots into exact integer factors.

use std::f64::consts::PI;
use std::fmt;

/// Monic polynomial with integer coefficients, lowest power first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Polynomial {
    coeffs: Vec<i128>,
}

impl Polynomial {
    /// The constant polynomial 1.
    pub fn one() -> Self {
        Self { coeffs: vec![1] }
    }

    /// From coefficients lowest power first. Trailing zeros are dropped.
    pub fn from_ascending(mut coeffs: Vec<i128>) -> Self {
        while coeffs.len() > 1 && coeffs.last() == Some(&0) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(0);
        }
        Self { coeffs }
    }

    /// From coefficients highest power first, as produced by `char_poly_exact`.
    pub fn from_descending(coeffs: &[i128]) -> Self {
        Self::from_ascending(coeffs.iter().rev().copied().collect())
    }

    pub fn coeffs(&self) -> &[i128] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_monic(&self) -> bool {
        self.coeffs.last() == Some(&1)
    }

    /// Coefficients highest power first, as floats.
    pub fn to_descending_f64(&self) -> Vec<f64> {
        self.coeffs.iter().rev().map(|&c| c as f64).collect()
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c as f64)
    }

    /// Quotient by a monic divisor, or `None` when the remainder is non-zero.
    pub fn div_exact(&self, divisor: &Polynomial) -> Option<Polynomial> {
        if !divisor.is_monic() || divisor.degree() > self.degree() {
            return None;
        }
        let dd = divisor.degree();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![0i128; self.degree() - dd + 1];
        for i in (0..quot.len()).rev() {
            let q = rem[i + dd];
            quot[i] = q;
            if q == 0 {
                continue;
            }
            for (j, &d) in divisor.coeffs.iter().enumerate() {
                rem[i + j] = rem[i + j].checked_sub(q.checked_mul(d)?)?;
            }
        }
        rem[..dd].iter().all(|&r| r == 0).then(|| Polynomial::from_ascending(quot))
    }

    /// Split off the factor λʳ: returns r and the cofactor.
    pub fn strip_zero_roots(&self) -> (usize, Polynomial) {
        let r = self.coeffs.iter().take_while(|&&c| c == 0).count();
        if r == self.coeffs.len() {
            return (0, self.clone());
        }
        (r, Polynomial::from_ascending(self.coeffs[r..].to_vec()))
    }

    /// If only even powers occur, the polynomial q with p(λ) = q(λ²).
    pub fn even_reduction(&self) -> Option<Polynomial> {
        if self.degree() == 0 || self.degree() % 2 == 1 {
            return None;
        }
        if self.coeffs.iter().skip(1).step_by(2).any(|&c| c != 0) {
            return None;
        }
        Some(Polynomial::from_ascending(
            self.coeffs.iter().step_by(2).copied().collect(),
        ))
    }

    /// ∏(x − rᵢ) rounded to integers, if every coefficient is near-integral.
    pub fn from_real_roots(roots: &[f64]) -> Option<Polynomial> {
        let mut acc = vec![1.0f64];
        for &r in roots {
            let mut next = vec![0.0; acc.len() + 1];
            for (i, &c) in acc.iter().enumerate() {
                next[i + 1] += c;
                next[i] -= r * c;
            }
            acc = next;
        }
        let mut coeffs = Vec::with_capacity(acc.len());
        for c in acc {
            let rounded = c.round();
            if (c - rounded).abs() > 1e-6 * (1.0 + c.abs()) || rounded.abs() > 1e30 {
                return None;
            }
            coeffs.push(rounded as i128);
        }
        Some(Polynomial::from_ascending(coeffs))
    }

    /// Real roots by radicals for degree ≤ 4, computed from the formulas.
    pub fn real_roots_by_radicals(&self) -> Option<Vec<f64>> {
        let c: Vec<f64> = self.coeffs.iter().map(|&c| c as f64).collect();
        match self.degree() {
            0 => Some(Vec::new()),
            1 => Some(vec![-c[0]]),
            2 => Some(solve_quadratic(c[1], c[0])),
            3 => Some(solve_cubic(c[2], c[1], c[0])),
            4 => Some(solve_quartic(c[3], c[2], c[1], c[0])),
            _ => None,
        }
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (power, &c) in self.coeffs.iter().enumerate().rev() {
            if c == 0 && !(power == 0 && first) {
                continue;
            }
            let sign = if c < 0 { "-" } else { "+" };
            let mag = c.abs();
            if first {
                if c < 0 {
                    f.write_str("-")?;
                }
            } else {
                write!(f, " {sign} ")?;
            }
            first = false;
            let coef = if mag == 1 && power > 0 { String::new() } else { mag.to_string() };
            match power {
                0 => write!(f, "{mag}")?,
                1 => write!(f, "{coef}x")?,
                _ => write!(f, "{coef}x^{power}")?,
            }
        }
        Ok(())
    }
}

/// Real roots of x² + bx + c.
pub fn solve_quadratic(b: f64, c: f64) -> Vec<f64> {
    let disc = b * b - 4.0 * c;
    if disc < -1e-9 * (1.0 + b * b) {
        return Vec::new();
    }
    let s = disc.max(0.0).sqrt();
    // Stable form: avoid cancellation between −b and s.
    let q = -0.5 * (b + b.signum() * s);
    if q == 0.0 {
        return vec![0.0, 0.0];
    }
    let mut roots = vec![q, c / q];
    roots.sort_by(f64::total_cmp);
    roots
}

/// Real roots of x³ + a x² + b x + c: trigonometric form when all three roots
/// are real, Cardano otherwise.
pub fn solve_cubic(a: f64, b: f64, c: f64) -> Vec<f64> {
    let shift = a / 3.0;
    let p = b - a * a / 3.0;
    let q = 2.0 * a * a * a / 27.0 - a * b / 3.0 + c;
    let mut roots = if p.abs() < 1e-14 {
        if q.abs() < 1e-14 { vec![0.0; 3] } else { vec![(-q).cbrt()] }
    } else {
        let disc = q * q / 4.0 + p * p * p / 27.0;
        if disc <= 1e-14 * (1.0 + q * q) && p < 0.0 {
            let r = 2.0 * (-p / 3.0).sqrt();
            let arg = (3.0 * q / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0);
            let theta = arg.acos() / 3.0;
            (0..3)
                .map(|k| r * (theta - 2.0 * PI * k as f64 / 3.0).cos())
                .collect()
        } else {
            let s = disc.max(0.0).sqrt();
            vec![(-q / 2.0 + s).cbrt() + (-q / 2.0 - s).cbrt()]
        }
    };
    for r in &mut roots {
        *r -= shift;
    }
    roots.sort_by(f64::total_cmp);
    roots
}

/// Real roots of x⁴ + a x³ + b x² + c x + d by Ferrari's method.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let shift = a / 4.0;
    let p = b - 3.0 * a * a / 8.0;
    let q = c - a * b / 2.0 + a * a * a / 8.0;
    let r = d - a * c / 4.0 + a * a * b / 16.0 - 3.0 * a.powi(4) / 256.0;

    let mut roots = Vec::with_capacity(4);
    if q.abs() < 1e-12 * (1.0 + p.abs() + r.abs()) {
        for z in solve_quadratic(p, r) {
            if z >= -1e-12 {
                let y = z.max(0.0).sqrt();
                roots.push(y);
                roots.push(-y);
            }
        }
    } else {
        let m = ferrari_resolvent_root(p, q, r);
        let s2m = (2.0 * m).sqrt();
        for sign in [1.0, -1.0] {
            // y² − s√(2m)·y + (p/2 + m + s·q/(2√(2m))) = 0
            roots.extend(solve_quadratic(-sign * s2m, p / 2.0 + m + sign * q / (2.0 * s2m)));
        }
    }
    for y in &mut roots {
        *y -= shift;
    }
    roots.sort_by(f64::total_cmp);
    roots
}

/// Largest real root of the resolvent m³ + p m² + (p²/4 − r) m − q²/8, which is
/// positive whenever q ≠ 0.
pub fn ferrari_resolvent_root(p: f64, q: f64, r: f64) -> f64 {
    solve_cubic(p, p * p / 4.0 - r, -q * q / 8.0)
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Exact factors recovered from numeric roots.
#[derive(Clone, Debug)]
pub struct RootGrouping {
    /// Integer factors with the numeric roots they account for.
    pub factors: Vec<(Polynomial, Vec<f64>)>,
    /// Roots that belong to no factor of degree ≤ `max_degree`.
    pub residue: Vec<f64>,
}

/// Group numeric roots of `poly` into monic integer factors of degree at most
/// `max_degree`, smallest factors first. Every factor is confirmed by exact
/// division, so the product of the factors and the residue's minimal
/// polynomial is `poly` itself.
pub fn group_roots(poly: &Polynomial, roots: &[f64], max_degree: usize) -> RootGrouping {
    let mut remaining: Vec<f64> = roots.to_vec();
    remaining.sort_by(f64::total_cmp);
    let mut rest = poly.clone();
    let mut factors = Vec::new();

    'outer: while !remaining.is_empty() {
        for size in 1..=max_degree.min(remaining.len()) {
            let mut idx: Vec<usize> = (0..size).collect();
            loop {
                let chosen: Vec<f64> = idx.iter().map(|&i| remaining[i]).collect();
                let found = Polynomial::from_real_roots(&chosen)
                    .and_then(|factor| rest.div_exact(&factor).map(|q| (factor, q)));
                if let Some((factor, quotient)) = found {
                    for &i in idx.iter().rev() {
                        remaining.remove(i);
                    }
                    factors.push((factor, chosen));
                    rest = quotient;
                    continue 'outer;
                }
                if !next_combination(&mut idx, remaining.len()) {
                    break;
                }
            }
        }
        break;
    }

    RootGrouping {
        factors,
        residue: remaining,
    }
}

/// Advance `idx` to the next k-combination of 0..n in lexicographic order.
fn next_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in (i + 1)..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn poly(asc: &[i128]) -> Polynomial {
        Polynomial::from_ascending(asc.to_vec())
    }

    #[test]
    fn test_strip_and_reduce() {
        // λ⁴ + 2λ² = λ²(λ² + 2)
        let p = Polynomial::from_descending(&[1, 0, 2, 0, 0]);
        let (r, q) = p.strip_zero_roots();
        assert_eq!(r, 2);
        assert_eq!(q, poly(&[2, 0, 1]));
        assert_eq!(q.even_reduction(), Some(poly(&[2, 1])));
        assert_eq!(poly(&[1, 1, 1]).even_reduction(), None);
    }

    #[test]
    fn test_exact_division() {
        // (x − 1)(x + 2) = x² + x − 2
        let p = poly(&[-2, 1, 1]);
        assert_eq!(p.div_exact(&poly(&[-1, 1])), Some(poly(&[2, 1])));
        assert_eq!(p.div_exact(&poly(&[1, 1])), None);
    }

    #[test]
    fn test_from_real_roots() {
        let s = 2f64.sqrt();
        assert_eq!(Polynomial::from_real_roots(&[s, -s]), Some(poly(&[-2, 0, 1])));
        assert_eq!(Polynomial::from_real_roots(&[s]), None);
    }

    #[test]
    fn test_quadratic_and_cubic() {
        let q = solve_quadratic(6.0, 1.0);
        assert_abs_diff_eq!(q[0], -3.0 - 2.0 * 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(q[1], -3.0 + 2.0 * 2f64.sqrt(), epsilon = 1e-12);

        // x³ + x² − 2x − 1: roots 2cos(2kπ/7)
        let roots = solve_cubic(1.0, -2.0, -1.0);
        let mut expected: Vec<f64> = (1..=3)
            .map(|k| 2.0 * (2.0 * PI * k as f64 / 7.0).cos())
            .collect();
        expected.sort_by(f64::total_cmp);
        for (r, e) in roots.iter().zip(&expected) {
            assert_abs_diff_eq!(r, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_quartic_ferrari() {
        // (x + 1)(x − 1)(x − 2)(x − 3) = x⁴ − 5x³ + 5x² + 5x − 6
        let roots = solve_quartic(-5.0, 5.0, 5.0, -6.0);
        assert_eq!(roots.len(), 4);
        for (r, e) in roots.iter().zip([-1.0, 1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*r, e, epsilon = 1e-9);
        }
        // biquadratic x⁴ − 5x² + 4
        let roots = solve_quartic(0.0, -5.0, 0.0, 4.0);
        for (r, e) in roots.iter().zip([-2.0, -1.0, 1.0, 2.0]) {
            assert_abs_diff_eq!(*r, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_group_roots_finds_factors() {
        // (x² − 2)(x − 3)(x³ + x² − 2x − 1)
        let quad = poly(&[-2, 0, 1]);
        let lin = poly(&[-3, 1]);
        let cubic = poly(&[-1, -2, 1, 1]);
        let full = [&quad, &lin, &cubic]
            .iter()
            .fold(Polynomial::one(), |acc, f| multiply(&acc, f));
        let mut roots = vec![2f64.sqrt(), -(2f64.sqrt()), 3.0];
        roots.extend(solve_cubic(1.0, -2.0, -1.0));

        let grouping = group_roots(&full, &roots, 4);
        assert!(grouping.residue.is_empty());
        let degrees: Vec<usize> = grouping.factors.iter().map(|(f, _)| f.degree()).collect();
        assert_eq!(degrees, vec![1, 2, 3]);
    }

    #[test]
    fn test_group_roots_leaves_quintic_residue() {
        // x⁵ − x − 1 is irreducible with one real root; feed it alone.
        let p = poly(&[-1, -1, 0, 0, 0, 1]);
        let grouping = group_roots(&p, &[1.1673039782614187], 4);
        assert!(grouping.factors.is_empty());
        assert_eq!(grouping.residue.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(poly(&[-1, -2, 1, 1]).to_string(), "x^3 + x^2 - 2x - 1");
        assert_eq!(poly(&[0, 1]).to_string(), "x");
        assert_eq!(Polynomial::one().to_string(), "1");
    }

    fn multiply(a: &Polynomial, b: &Polynomial) -> Polynomial {
        let mut out = vec![0i128; a.degree() + b.degree() + 1];
        for (i, &x) in a.coeffs().iter().enumerate() {
            for (j, &y) in b.coeffs().iter().enumerate() {
                out[i + j] += x * y;
            }
        }
        Polynomial::from_ascending(out)
    }
}
