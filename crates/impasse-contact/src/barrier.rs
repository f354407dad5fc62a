//! Barrier functions that grow to infinity as `x → 0⁺`.
//!
//! Each family `b(x; s)` is zero for `x ≥ s` (the activation distance)
//! and diverges as the separation `x` goes to zero. They are used to
//! turn the inequality "stay apart" into a smooth penalty.
//!
//! | Family | `b(x)` |
//! |---|---|
//! | [`BarrierType::Ipc`] | `-(x - s)² ln(x / s)` |
//! | [`BarrierType::PolyLog`] | `-(1 - 3t² + 2t³) ln(x / s)`, `t = x / s` |
//! | [`BarrierType::Spline`] | `1 / g(t) - 1`, `g(t) = t³ - 3t² + 3t` |
//!
//! ## Domain
//! - `x ≥ s`: value, gradient and hessian are exactly zero.
//! - `x ≤ 0`: gradient and hessian are zero, the value is `+∞`.

use serde::{Deserialize, Serialize};

/// Barrier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierType {
    /// Clamped log barrier from Incremental Potential Contact.
    #[default]
    Ipc,
    /// Log barrier blended by a cubic that is C¹ at `s`.
    PolyLog,
    /// Rational spline barrier.
    Spline,
}

impl BarrierType {
    /// All families, in declaration order.
    pub const ALL: [BarrierType; 3] = [Self::Ipc, Self::PolyLog, Self::Spline];

    /// The configuration name of this family.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ipc => "ipc",
            Self::PolyLog => "poly_log",
            Self::Spline => "spline",
        }
    }
}

impl std::fmt::Display for BarrierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BarrierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipc" => Ok(Self::Ipc),
            "poly_log" => Ok(Self::PolyLog),
            "spline" => Ok(Self::Spline),
            other => Err(format!(
                "unknown barrier type '{other}' (expected ipc, poly_log or spline)"
            )),
        }
    }
}

/// Barrier value `b(x; s)`.
pub fn barrier(x: f64, s: f64, barrier_type: BarrierType) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x >= s {
        return 0.0;
    }
    match barrier_type {
        BarrierType::Ipc => ipc_barrier(x, s),
        BarrierType::PolyLog => poly_log_barrier(x, s),
        BarrierType::Spline => spline_barrier(x, s),
    }
}

/// First derivative `b'(x; s)`.
pub fn barrier_gradient(x: f64, s: f64, barrier_type: BarrierType) -> f64 {
    if x <= 0.0 || x >= s {
        return 0.0;
    }
    match barrier_type {
        BarrierType::Ipc => ipc_barrier_gradient(x, s),
        BarrierType::PolyLog => poly_log_barrier_gradient(x, s),
        BarrierType::Spline => spline_barrier_gradient(x, s),
    }
}

/// Second derivative `b''(x; s)`.
pub fn barrier_hessian(x: f64, s: f64, barrier_type: BarrierType) -> f64 {
    if x <= 0.0 || x >= s {
        return 0.0;
    }
    match barrier_type {
        BarrierType::Ipc => ipc_barrier_hessian(x, s),
        BarrierType::PolyLog => poly_log_barrier_hessian(x, s),
        BarrierType::Spline => spline_barrier_hessian(x, s),
    }
}

// ─── IPC ─────────────────────────────────────────────────────

fn ipc_barrier(x: f64, s: f64) -> f64 {
    let d = x - s;
    -d * d * (x / s).ln()
}

fn ipc_barrier_gradient(x: f64, s: f64) -> f64 {
    let d = x - s;
    -2.0 * d * (x / s).ln() - d * d / x
}

fn ipc_barrier_hessian(x: f64, s: f64) -> f64 {
    let d = x - s;
    let r = d / x;
    -2.0 * (x / s).ln() - 4.0 * r + r * r
}

// ─── Poly-log ────────────────────────────────────────────────

fn poly_log_barrier(x: f64, s: f64) -> f64 {
    let t = x / s;
    -(1.0 + t * t * (-3.0 + 2.0 * t)) * t.ln()
}

fn poly_log_barrier_gradient(x: f64, s: f64) -> f64 {
    let t = x / s;
    let p = 1.0 + t * t * (-3.0 + 2.0 * t);
    let dp = 6.0 * t * (t - 1.0) / s;
    -dp * t.ln() - p / x
}

fn poly_log_barrier_hessian(x: f64, s: f64) -> f64 {
    let t = x / s;
    let p = 1.0 + t * t * (-3.0 + 2.0 * t);
    let dp = 6.0 * t * (t - 1.0) / s;
    let ddp = (12.0 * t - 6.0) / (s * s);
    -ddp * t.ln() - 2.0 * dp / x + p / (x * x)
}

// ─── Spline ──────────────────────────────────────────────────

/// `1/g(t) - 1`, written as `(1 - t)³ / g(t)` so it reaches zero
/// exactly at `t = 1` without cancellation.
fn spline_barrier(x: f64, s: f64) -> f64 {
    let t = x / s;
    let u = 1.0 - t;
    u * u * u / compensated_horner(&[1.0, -3.0, 3.0, 0.0], t)
}

fn spline_barrier_gradient(x: f64, s: f64) -> f64 {
    let t = x / s;
    let g = t * (3.0 + t * (-3.0 + t));
    let dg = (3.0 + t * (-6.0 + 3.0 * t)) / s;
    -dg / (g * g)
}

fn spline_barrier_hessian(x: f64, s: f64) -> f64 {
    let t = x / s;
    let g = t * (3.0 + t * (-3.0 + t));
    let dg = (3.0 + t * (-6.0 + 3.0 * t)) / s;
    let ddg = (6.0 * t - 6.0) / (s * s);
    (2.0 / g * dg * dg - ddg) / (g * g)
}

/// Horner evaluation with error-free transformations.
///
/// `coeffs` are ordered from the highest degree down. The result is as
/// accurate as if computed in twice the working precision.
fn compensated_horner(coeffs: &[f64], t: f64) -> f64 {
    let Some((&first, rest)) = coeffs.split_first() else {
        return 0.0;
    };
    let mut value = first;
    let mut correction = 0.0;
    for &c in rest {
        let (p, pi) = two_product(value, t);
        let (s, sigma) = two_sum(p, c);
        value = s;
        correction = correction * t + (pi + sigma);
    }
    value + correction
}

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let z = s - a;
    (s, (a - (s - z)) + (b - z))
}

#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}
