//! Rigid body poses and their degree-of-freedom layout.
//!
//! A pose is a translation plus a rotation vector (axis times angle).
//! Planar bodies live in the XY plane and only use the z component of
//! the rotation vector.
//!
//! ## Dof layout
//! - 2D: `[x, y, θ]` per body
//! - 3D: `[x, y, z, rx, ry, rz]` per body

use glam::{DMat3, DQuat, DVec3};
use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

/// Position and orientation of one rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Translation of the body frame origin.
    pub position: DVec3,
    /// Rotation vector (axis scaled by angle, radians).
    pub rotation: DVec3,
}

impl Pose {
    pub fn new(position: DVec3, rotation: DVec3) -> Self {
        Self { position, rotation }
    }

    /// Identity pose.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Planar pose: translation in XY and rotation `theta` about Z.
    pub fn planar(x: f64, y: f64, theta: f64) -> Self {
        Self {
            position: DVec3::new(x, y, 0.0),
            rotation: DVec3::new(0.0, 0.0, theta),
        }
    }

    /// Componentwise linear interpolation between two poses.
    ///
    /// This is the pose path used by linear trajectories. It is not a
    /// geodesic on SO(3).
    pub fn lerp(&self, other: &Pose, t: f64) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.lerp(other.rotation, t),
        }
    }

    /// Rotation matrix of this pose.
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(DQuat::from_scaled_axis(self.rotation))
    }

    /// Maps a body-frame point into world space.
    #[inline]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.rotation_matrix() * p + self.position
    }

    /// Returns true if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

/// Degrees of freedom per body for the given dimension.
pub fn dofs_per_body(dim: usize) -> ImpasseResult<usize> {
    match dim {
        2 => Ok(3),
        3 => Ok(6),
        _ => Err(ImpasseError::InvalidConfig(format!(
            "Dimension must be 2 or 3, got {dim}"
        ))),
    }
}

/// Unpacks a flat dof vector into one pose per body.
pub fn poses_from_dofs(x: &[f64], dim: usize) -> ImpasseResult<Vec<Pose>> {
    let ndof = dofs_per_body(dim)?;
    if x.len() % ndof != 0 {
        return Err(ImpasseError::InvalidConfig(format!(
            "Dof vector length {} is not a multiple of {ndof}",
            x.len()
        )));
    }

    let poses = x
        .chunks_exact(ndof)
        .map(|q| match dim {
            2 => Pose::planar(q[0], q[1], q[2]),
            _ => Pose::new(DVec3::new(q[0], q[1], q[2]), DVec3::new(q[3], q[4], q[5])),
        })
        .collect();
    Ok(poses)
}

/// Packs poses into a flat dof vector.
pub fn poses_to_dofs(poses: &[Pose], dim: usize) -> ImpasseResult<Vec<f64>> {
    let ndof = dofs_per_body(dim)?;
    let mut x = Vec::with_capacity(poses.len() * ndof);
    for pose in poses {
        match dim {
            2 => x.extend_from_slice(&[pose.position.x, pose.position.y, pose.rotation.z]),
            _ => {
                x.extend_from_slice(&pose.position.to_array());
                x.extend_from_slice(&pose.rotation.to_array());
            }
        }
    }
    Ok(x)
}
