//! Characteristic polynomials by the Faddeev–LeVerrier recurrence.
//!
//! Coefficients are returned highest power first: det(λI − M) = Σ cₖ λⁿ⁻ᵏ with
//! c₀ = 1. The recurrence keeps an auxiliary matrix Mₖ and reads each
//! coefficient off its trace:
//!
//!   M₁ = M,              c₁ = −tr(M₁)
//!   Mₖ = M·(Mₖ₋₁ + cₖ₋₁I), cₖ = −tr(Mₖ)/k
//!
//! O(n⁴) overall, with no determinant expansion.

/// Characteristic polynomial of a real n×n matrix. `n = 0` gives `[1]`.
pub fn char_poly(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let mut coeffs = Vec::with_capacity(n + 1);
    coeffs.push(1.0);
    if n == 0 {
        return coeffs;
    }

    let mut mk: Vec<Vec<f64>> = matrix.to_vec();
    for k in 1..=n {
        let trace: f64 = (0..n).map(|i| mk[i][i]).sum();
        let ck = -trace / k as f64;
        coeffs.push(ck);
        if k == n {
            break;
        }
        for (i, row) in mk.iter_mut().enumerate() {
            row[i] += ck;
        }
        mk = mat_mul_f64(matrix, &mk);
    }
    coeffs
}

/// Exact characteristic polynomial of an integer matrix.
///
/// Every Mₖ stays integral and every trace is divisible by k, so the
/// recurrence runs in exact integer arithmetic.
pub fn char_poly_exact(matrix: &[Vec<i64>]) -> Vec<i128> {
    let n = matrix.len();
    let mut coeffs = Vec::with_capacity(n + 1);
    coeffs.push(1i128);
    if n == 0 {
        return coeffs;
    }

    let base: Vec<Vec<i128>> = matrix
        .iter()
        .map(|row| row.iter().map(|&x| x as i128).collect())
        .collect();
    let mut mk = base.clone();
    for k in 1..=n {
        let trace: i128 = (0..n).map(|i| mk[i][i]).sum();
        debug_assert_eq!(trace % k as i128, 0, "non-integral trace quotient");
        let ck = -trace / k as i128;
        coeffs.push(ck);
        if k == n {
            break;
        }
        for (i, row) in mk.iter_mut().enumerate() {
            row[i] += ck;
        }
        mk = mat_mul_i128(&base, &mk);
    }
    coeffs
}

/// Convert an integer matrix to floating point.
pub fn to_f64_matrix(matrix: &[Vec<i64>]) -> Vec<Vec<f64>> {
    matrix
        .iter()
        .map(|row| row.iter().map(|&x| x as f64).collect())
        .collect()
}

/// Integer view of a matrix whose entries are all (numerically) integral.
pub fn to_integer_matrix(matrix: &[Vec<f64>]) -> Option<Vec<Vec<i64>>> {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|&x| {
                    let r = x.round();
                    ((x - r).abs() < 1e-12 && r.abs() < 1e15).then_some(r as i64)
                })
                .collect()
        })
        .collect()
}

fn mat_mul_f64(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let mut out = vec![vec![0.0; n]; n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

fn mat_mul_i128(a: &[Vec<i128>], b: &[Vec<i128>]) -> Vec<Vec<i128>> {
    let n = a.len();
    let mut out = vec![vec![0i128; n]; n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i][k];
            if aik == 0 {
                continue;
            }
            for j in 0..n {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}
