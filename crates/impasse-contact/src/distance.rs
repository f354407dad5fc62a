//! Closed-form squared distances between primitives.
//!
//! All functions return squared distances to avoid square roots in
//! the constraint filter. Degenerate primitives (zero-length edges,
//! zero-area triangles) fall back to the nearest lower-dimensional
//! feature.

use impasse_math::DVec3;
use impasse_types::constants::DEGENERATE_EPSILON;

/// Squared distance from point `p` to segment `[a, b]`.
pub fn point_edge_distance_squared(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < DEGENERATE_EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Squared distance between segments `[a0, a1]` and `[b0, b1]`.
pub fn edge_edge_distance_squared(a0: DVec3, a1: DVec3, b0: DVec3, b1: DVec3) -> f64 {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a < DEGENERATE_EPSILON && e < DEGENERATE_EPSILON {
        return a0.distance_squared(b0);
    }
    if a < DEGENERATE_EPSILON {
        return point_edge_distance_squared(a0, b0, b1);
    }
    if e < DEGENERATE_EPSILON {
        return point_edge_distance_squared(b0, a0, a1);
    }

    let c = d1.dot(r);
    let b = d1.dot(d2);
    let denom = a * e - b * b;

    // Parallel segments: any s works, pick the start.
    let mut s = if denom > DEGENERATE_EPSILON * a * e {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;

    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }

    (a0 + d1 * s).distance_squared(b0 + d2 * t)
}

/// Squared distance from point `p` to triangle `(a, b, c)`.
///
/// Region classification by barycentric coordinates of the projection,
/// as in Ericson's closest-point-on-triangle test.
pub fn point_triangle_distance_squared(p: DVec3, a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(ac).length_squared() < DEGENERATE_EPSILON {
        return point_edge_distance_squared(p, a, b)
            .min(point_edge_distance_squared(p, b, c))
            .min(point_edge_distance_squared(p, c, a));
    }

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return p.distance_squared(a);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return p.distance_squared(b);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return p.distance_squared(a + ab * v);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return p.distance_squared(c);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return p.distance_squared(a + ac * w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return p.distance_squared(b + (c - b) * w);
    }

    // Inside the face region: project onto the plane.
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    p.distance_squared(a + ab * v + ac * w)
}
