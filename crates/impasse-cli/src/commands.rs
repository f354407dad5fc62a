//! CLI command implementations.

use std::path::Path;

use impasse_contact::{barrier, barrier_gradient, barrier_hessian, BarrierType};
use impasse_debug::ImpactSnapshot;
use impasse_io::{load_settings, SettingsFormat, SimulationSettings};

/// Largest accepted difference between analytic and numeric derivatives.
const DERIVATIVE_TOLERANCE: f64 = 1e-5;

/// Relative finite-difference step.
const FD_STEP: f64 = 1e-6;

/// Print a table of `b`, `b'` and `b''` at evenly spaced distances.
pub fn barrier_table(
    barrier_type: BarrierType,
    dhat: f64,
    samples: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(dhat > 0.0 && dhat.is_finite()) {
        return Err(format!("dhat must be positive, got {dhat}").into());
    }
    if samples == 0 {
        return Err("samples must be at least 1".into());
    }

    println!("Impasse Barrier: {barrier_type} (dhat = {dhat:e})");
    println!("──────────────────────────────────────────");
    println!("{:>14} {:>14} {:>14} {:>14}", "d", "b", "b'", "b''");

    for i in 1..=samples {
        let d = dhat * i as f64 / samples as f64;
        println!(
            "{:>14.6e} {:>14.6e} {:>14.6e} {:>14.6e}",
            d,
            barrier(d, dhat, barrier_type),
            barrier_gradient(d, dhat, barrier_type),
            barrier_hessian(d, dhat, barrier_type),
        );
    }
    Ok(())
}

/// Check `b'` and `b''` against central differences of `b` and `b'`.
pub fn check_derivatives(
    families: &[BarrierType],
    dhat: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(dhat > 0.0 && dhat.is_finite()) {
        return Err(format!("dhat must be positive, got {dhat}").into());
    }

    println!("Impasse Derivative Check (dhat = {dhat:e})");
    println!("──────────────────────────────────────────");

    let h = FD_STEP * dhat;
    let mut failures = 0;
    for &ty in families {
        let mut worst_grad: f64 = 0.0;
        let mut worst_hess: f64 = 0.0;
        for t in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let d = t * dhat;
            let fd_grad = (barrier(d + h, dhat, ty) - barrier(d - h, dhat, ty)) / (2.0 * h);
            let fd_hess =
                (barrier_gradient(d + h, dhat, ty) - barrier_gradient(d - h, dhat, ty)) / (2.0 * h);
            worst_grad = worst_grad.max(scaled_error(barrier_gradient(d, dhat, ty), fd_grad));
            worst_hess = worst_hess.max(scaled_error(barrier_hessian(d, dhat, ty), fd_hess));
        }

        let ok = worst_grad <= DERIVATIVE_TOLERANCE && worst_hess <= DERIVATIVE_TOLERANCE;
        if !ok {
            failures += 1;
        }
        println!(
            "{} {:<10} gradient err {:.3e}  hessian err {:.3e}",
            if ok { "✅" } else { "❌" },
            ty.name(),
            worst_grad,
            worst_hess
        );
    }

    if failures > 0 {
        let noun = if failures == 1 { "family" } else { "families" };
        return Err(format!("{failures} barrier {noun} failed the derivative check").into());
    }
    Ok(())
}

/// Absolute error, relative once the magnitude exceeds one.
fn scaled_error(analytic: f64, numeric: f64) -> f64 {
    (analytic - numeric).abs() / analytic.abs().max(1.0)
}

/// Validate a settings file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Impasse Validator");
    println!("─────────────────");
    println!();
    println!("Validating settings: {path}");

    tracing::debug!(path, "Loading settings");
    let settings = load_settings(path)?;
    let constraint = &settings.distance_barrier_constraint;
    let problem = &settings.barrier_problem;
    println!("✅ Settings are valid.");
    println!("  dhat:            {:e}", constraint.initial_barrier_activation_distance);
    println!("  dmin:            {:e}", constraint.minimum_separation_distance);
    println!("  barrier:         {}", constraint.barrier_type);
    println!("  trajectory:      {:?}", constraint.trajectory_type);
    println!("  broad phase:     {:?}", constraint.detection_method);
    println!("  kappa:           {:e}", problem.barrier_stiffness);
    println!("  termination:     {:e}", problem.termination_threshold);
    Ok(())
}

/// Print the default settings document.
pub fn defaults(format: SettingsFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", impasse_io::settings::to_string(&SimulationSettings::default(), format)?);
    Ok(())
}

/// Inspect a zero-TOI impact dump.
pub fn inspect(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Impasse Impact Inspector");
    println!("────────────────────────");
    println!();

    tracing::debug!(path, "Reading impact dump");
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let snapshot = if is_json {
        ImpactSnapshot::from_json(&std::fs::read_to_string(path)?)?
    } else {
        ImpactSnapshot::from_bytes(&std::fs::read(path)?)?
    };

    println!("Type:        {}", snapshot.kind.label());
    println!("Primitives:  {}", snapshot.primitives.len());
    for primitive in &snapshot.primitives {
        println!();
        println!("[{}]", primitive.role);
        for v in &primitive.vertices {
            println!("  vertex    ({:.6e}, {:.6e}, {:.6e})", v.x, v.y, v.z);
        }
        let (p0, p1) = (primitive.pose_t0, primitive.pose_t1);
        println!(
            "  t0        position {:?} rotation {:?}",
            p0.position.to_array(),
            p0.rotation.to_array(),
        );
        println!(
            "  t1        position {:?} rotation {:?}",
            p1.position.to_array(),
            p1.rotation.to_array(),
        );
    }
    Ok(())
}
