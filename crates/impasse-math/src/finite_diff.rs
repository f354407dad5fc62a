//! Central finite differences.
//!
//! Used to validate analytic derivatives and to differentiate
//! quantities (such as contact distances) that have no closed-form
//! gradient in pose space.

use crate::dense::DenseMatrix;
use crate::sparse::CsrMatrix;

/// Central-difference gradient of a scalar function.
pub fn finite_gradient<F>(x: &[f64], f: F, h: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut xp = x.to_vec();
    (0..x.len())
        .map(|i| {
            xp[i] = x[i] + h;
            let fp = f(&xp);
            xp[i] = x[i] - h;
            let fm = f(&xp);
            xp[i] = x[i];
            (fp - fm) / (2.0 * h)
        })
        .collect()
}

/// Central-difference jacobian of a vector function.
///
/// Row `i` holds the derivatives of output `i`.
pub fn finite_jacobian<F>(x: &[f64], f: F, h: f64) -> DenseMatrix
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let m = f(x).len();
    let mut jac = DenseMatrix::zeros(m, x.len());
    let mut xp = x.to_vec();
    for j in 0..x.len() {
        xp[j] = x[j] + h;
        let fp = f(&xp);
        xp[j] = x[j] - h;
        let fm = f(&xp);
        xp[j] = x[j];
        for i in 0..m {
            jac.set(i, j, (fp[i] - fm[i]) / (2.0 * h));
        }
    }
    jac
}

/// Hessian by central differences of an analytic gradient.
///
/// The result is symmetrized and entries with magnitude at or below
/// `f64::EPSILON` are dropped from the sparse pattern.
pub fn finite_hessian<G>(x: &[f64], grad: G, h: f64) -> CsrMatrix
where
    G: Fn(&[f64]) -> Vec<f64>,
{
    let n = x.len();
    let jac = finite_jacobian(x, grad, h);
    let mut triplets = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let v = 0.5 * (jac.get(i, j) + jac.get(j, i));
            if v.abs() > f64::EPSILON {
                triplets.push((i, j, v));
            }
        }
    }
    CsrMatrix::from_triplets(n, n, &triplets)
}
