use crate::error::{zeroed_buffer, FlowError};
use crate::linearize::{dot, LinearSystem};

use super::{check_unknowns, FlowSolver, SolveReport};

/// Conjugate gradient solver.
///
/// Stops after the requested number of iterations or as soon as the squared residual
/// norm falls below `1e-10`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConjugateGradient {
    // squared residual norm below which the iteration stops
    pub(crate) tolerance: f64,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self { tolerance: 1e-10 }
    }
}

// y += a * x
fn axpy(y: &mut [f64], a: f64, x: &[f64]) {
    y.iter_mut().zip(x).for_each(|(y, &x)| *y += a * x);
}

impl FlowSolver for ConjugateGradient {
    fn name(&self) -> &'static str {
        "cg"
    }

    fn solve(
        &self,
        system: &LinearSystem,
        iterations: usize,
        du: &mut [f64],
        dv: &mut [f64],
    ) -> Result<SolveReport, FlowError> {
        check_unknowns(system, du, dv)?;
        let n = system.len();

        let mut r1 = zeroed_buffer(n)?;
        let mut r2 = zeroed_buffer(n)?;
        system.residual(du, dv, &mut r1, &mut r2);

        let mut p1 = r1.clone();
        let mut p2 = r2.clone();
        let mut q1 = zeroed_buffer(n)?;
        let mut q2 = zeroed_buffer(n)?;

        let mut rho = dot(&r1, &r1) + dot(&r2, &r2);
        let mut performed = 0;

        while performed < iterations && rho >= self.tolerance {
            system.apply(&p1, &p2, &mut q1, &mut q2);
            let curvature = dot(&p1, &q1) + dot(&p2, &q2);
            if !curvature.is_finite() || curvature <= 0.0 {
                log::warn!("conjugate gradient stopped on a non positive curvature {curvature}");
                break;
            }

            let step = rho / curvature;
            axpy(du, step, &p1);
            axpy(dv, step, &p2);
            axpy(&mut r1, -step, &q1);
            axpy(&mut r2, -step, &q2);

            let rho_next = dot(&r1, &r1) + dot(&r2, &r2);
            let beta = rho_next / rho;
            p1.iter_mut().zip(&r1).for_each(|(p, &r)| *p = r + beta * *p);
            p2.iter_mut().zip(&r2).for_each(|(p, &r)| *p = r + beta * *p);

            rho = rho_next;
            performed += 1;
        }

        Ok(SolveReport {
            iterations: performed,
            residual_norm_sq: rho,
        })
    }
}
