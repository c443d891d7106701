use crate::error::FlowError;
use crate::linearize::LinearSystem;

use super::{check_unknowns, FlowSolver, SolveReport};

/// Successive over-relaxation solver.
///
/// Each iteration is one Gauss-Seidel sweep over the pixels in row-major order,
/// updating `du` and then `dv` at every pixel with the fixed relaxation factor 1.8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuccessiveOverRelaxation {
    // in (0, 2) for convergence
    pub(crate) omega: f64,
}

impl Default for SuccessiveOverRelaxation {
    fn default() -> Self {
        Self { omega: 1.8 }
    }
}

impl SuccessiveOverRelaxation {
    fn sweep(&self, system: &LinearSystem, du: &mut [f64], dv: &mut [f64]) {
        let size = system.size();
        let (width, height) = (size.width, size.height);
        let alpha = system.alpha();
        let omega = self.omega;
        let phi = &system.phi;

        for r in 0..height {
            for c in 0..width {
                let o = r * width + c;

                // weighted sums over the already updated and pending neighbours
                let (mut sum_u, mut sum_v, mut weight) = (0.0, 0.0, 0.0);
                let mut visit = |n: usize, w: f64| {
                    sum_u += w * du[n];
                    sum_v += w * dv[n];
                    weight += w;
                };
                if c > 0 {
                    visit(o - 1, phi[o - 1]);
                }
                if c + 1 < width {
                    visit(o + 1, phi[o]);
                }
                if r > 0 {
                    visit(o - width, phi[o - width]);
                }
                if r + 1 < height {
                    visit(o + width, phi[o]);
                }

                let coupling = alpha * weight;
                let target_u = (system.b1[o] + alpha * sum_u - system.a12[o] * dv[o])
                    / (system.a11[o] + coupling);
                du[o] = (1.0 - omega) * du[o] + omega * target_u;

                let target_v = (system.b2[o] + alpha * sum_v - system.a12[o] * du[o])
                    / (system.a22[o] + coupling);
                dv[o] = (1.0 - omega) * dv[o] + omega * target_v;
            }
        }
    }
}

impl FlowSolver for SuccessiveOverRelaxation {
    fn name(&self) -> &'static str {
        "sor"
    }

    fn solve(
        &self,
        system: &LinearSystem,
        iterations: usize,
        du: &mut [f64],
        dv: &mut [f64],
    ) -> Result<SolveReport, FlowError> {
        check_unknowns(system, du, dv)?;

        for _ in 0..iterations {
            self.sweep(system, du, dv);
        }

        Ok(SolveReport {
            iterations,
            residual_norm_sq: system.residual_norm_sq(du, dv)?,
        })
    }
}
