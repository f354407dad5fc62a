//! Contact barrier as an objective term.
//!
//! Maps a dof vector to body poses, collects the active constraint set
//! and sums the barrier over the constraint distances. Distances have
//! no closed-form gradient in pose space, so `∇dₖ` is taken by central
//! differences over the dofs of the bodies constraint `k` touches.

use impasse_body::{dofs_per_body, poses_from_dofs, Pose, RigidBodyAssembler};
use impasse_contact::{ContactConstraint, DistanceBarrierConstraint};
use impasse_math::sparse::CsrMatrix;
use impasse_math::DVec3;
use impasse_types::constants::DEFAULT_FINITE_DIFFERENCE_STEP;
use impasse_types::{ImpasseError, ImpasseResult, VertexId};

use crate::term::{ObjectiveTerm, TermEvaluation};

/// `Σₖ b(dₖ - d_min; d̂)` over the active contact constraints.
pub struct DistanceBarrierTerm {
    constraint: DistanceBarrierConstraint,
    bodies: RigidBodyAssembler,
    finite_difference_step: f64,
}

impl DistanceBarrierTerm {
    pub fn new(constraint: DistanceBarrierConstraint, bodies: RigidBodyAssembler) -> Self {
        Self {
            constraint,
            bodies,
            finite_difference_step: DEFAULT_FINITE_DIFFERENCE_STEP,
        }
    }

    pub fn with_finite_difference_step(mut self, step: f64) -> Self {
        self.finite_difference_step = step;
        self
    }

    /// Seeds d̂ on the wrapped constraint.
    pub fn initialize(&mut self) {
        self.constraint.initialize();
    }

    pub fn constraint(&self) -> &DistanceBarrierConstraint {
        &self.constraint
    }

    pub fn constraint_mut(&mut self) -> &mut DistanceBarrierConstraint {
        &mut self.constraint
    }

    pub fn bodies(&self) -> &RigidBodyAssembler {
        &self.bodies
    }

    /// One pose per body from a flat dof vector.
    pub fn poses(&self, x: &[f64]) -> ImpasseResult<Vec<Pose>> {
        if x.len() != self.bodies.ndof() {
            return Err(ImpasseError::DimensionMismatch {
                what: "dofs",
                expected: self.bodies.ndof(),
                found: x.len(),
            });
        }
        poses_from_dofs(x, self.bodies.dim())
    }

    /// True if moving from `x_i` to `x_j` collides.
    pub fn has_collisions(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<bool> {
        let (poses_i, poses_j) = (self.poses(x_i)?, self.poses(x_j)?);
        self.constraint
            .has_active_collisions(&self.bodies, &poses_i, &poses_j)
    }

    /// Earliest time of impact moving from `x_i` to `x_j`.
    pub fn earliest_toi(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<f64> {
        let (poses_i, poses_j) = (self.poses(x_i)?, self.poses(x_j)?);
        self.constraint
            .compute_earliest_toi(&self.bodies, &poses_i, &poses_j)
    }

    /// Smallest active constraint distance at `x`, `+∞` if none.
    pub fn min_distance(&self, x: &[f64]) -> ImpasseResult<f64> {
        let poses = self.poses(x)?;
        self.constraint.compute_minimum_distance(&self.bodies, &poses)
    }

    /// Evaluates the barrier and reports how many constraints are active.
    pub fn evaluate_counted(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<(TermEvaluation, usize)> {
        let poses = self.poses(x)?;
        let constraint_set = self.constraint.construct_constraint_set(&self.bodies, &poses)?;
        let world = self.bodies.world_vertices(&poses)?;
        let (edges, faces) = (self.bodies.edges(), self.bodies.faces());

        let n = x.len();
        let mut result = TermEvaluation::zero(n, want_grad, want_hess);
        let mut triplets = Vec::new();
        let mut scratch = world.clone();
        let mut perturbed = poses.clone();

        for c in constraint_set.iter() {
            let d = c.distance_squared(&world, edges, faces).sqrt();
            result.value += self.constraint.barrier_at(d);
            if !(want_grad || want_hess) {
                continue;
            }

            let db = self.constraint.barrier_gradient_at(d);
            let d2b = self.constraint.barrier_hessian_at(d);
            if db == 0.0 && d2b == 0.0 {
                continue;
            }

            let vertices = c.vertex_ids(edges, faces);
            let dofs = self.touched_dofs(&vertices);
            let mut sample = DistanceSample {
                constraint: c,
                vertices: &vertices,
                world: &world,
                scratch: &mut scratch,
                poses: &poses,
                perturbed: &mut perturbed,
            };
            let grad_d = self.distance_gradient(&mut sample, x, &dofs)?;

            if let Some(gradient) = result.gradient.as_mut() {
                for (&i, &gi) in dofs.iter().zip(&grad_d) {
                    gradient[i] += db * gi;
                }
            }
            if want_hess {
                for (&i, &gi) in dofs.iter().zip(&grad_d) {
                    for (&j, &gj) in dofs.iter().zip(&grad_d) {
                        triplets.push((i, j, d2b * gi * gj));
                    }
                }
            }
        }

        if want_hess {
            result.hessian = Some(CsrMatrix::from_triplets(n, n, &triplets));
        }
        Ok((result, constraint_set.len()))
    }

    /// Sorted dof indices of the bodies owning `vertices`.
    fn touched_dofs(&self, vertices: &[VertexId]) -> Vec<usize> {
        let mut bodies: Vec<_> = vertices.iter().map(|&v| self.bodies.vertex_body(v)).collect();
        bodies.sort();
        bodies.dedup();
        bodies
            .into_iter()
            .flat_map(|b| self.bodies.body_dof_range(b))
            .collect()
    }

    fn distance_gradient(
        &self,
        sample: &mut DistanceSample<'_>,
        x: &[f64],
        dofs: &[usize],
    ) -> ImpasseResult<Vec<f64>> {
        let h = self.finite_difference_step;
        let ndof = dofs_per_body(self.bodies.dim())?;
        let mut local = vec![0.0; ndof];
        let mut grad = Vec::with_capacity(dofs.len());

        for &j in dofs {
            let body = j / ndof;
            let start = body * ndof;
            local.copy_from_slice(&x[start..start + ndof]);

            local[j - start] = x[j] + h;
            let dp = self.perturbed_distance(sample, body, &local)?;
            local[j - start] = x[j] - h;
            let dm = self.perturbed_distance(sample, body, &local)?;
            sample.restore(body);

            grad.push((dp - dm) / (2.0 * h));
        }
        Ok(grad)
    }

    /// Distance of the sampled constraint with body `body` moved to the
    /// pose given by `dofs`.
    fn perturbed_distance(
        &self,
        sample: &mut DistanceSample<'_>,
        body: usize,
        dofs: &[f64],
    ) -> ImpasseResult<f64> {
        let pose = poses_from_dofs(dofs, self.bodies.dim())?
            .into_iter()
            .next()
            .unwrap_or(sample.poses[body]);
        sample.perturbed[body] = pose;
        for &v in sample.vertices {
            if self.bodies.vertex_body(v).index() == body {
                sample.scratch[v.index()] =
                    self.bodies.world_vertex(sample.perturbed.as_slice(), v);
            }
        }
        Ok(sample
            .constraint
            .distance_squared(sample.scratch.as_slice(), self.bodies.edges(), self.bodies.faces())
            .sqrt())
    }
}

/// Working buffers for differentiating one constraint distance.
struct DistanceSample<'a> {
    constraint: &'a ContactConstraint,
    vertices: &'a [VertexId],
    world: &'a [DVec3],
    scratch: &'a mut Vec<DVec3>,
    poses: &'a [Pose],
    perturbed: &'a mut Vec<Pose>,
}

impl DistanceSample<'_> {
    fn restore(&mut self, body: usize) {
        self.perturbed[body] = self.poses[body];
        for &v in self.vertices {
            self.scratch[v.index()] = self.world[v.index()];
        }
    }
}

impl ObjectiveTerm for DistanceBarrierTerm {
    fn evaluate(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<TermEvaluation> {
        Ok(self.evaluate_counted(x, want_grad, want_hess)?.0)
    }

    fn name(&self) -> &str {
        self.constraint.name()
    }
}
