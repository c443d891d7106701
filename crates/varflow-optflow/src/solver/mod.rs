//! Linear solvers for the flow increment.
//!
//! Both solvers work on the same [`LinearSystem`] and converge to the same solution;
//! they differ in cost per iteration and in how fast they get there.

mod cg;
mod sor;

pub use cg::ConjugateGradient;
pub use sor::SuccessiveOverRelaxation;

use crate::error::FlowError;
use crate::linearize::LinearSystem;

/// Outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Iterations actually performed.
    pub iterations: usize,
    /// Squared norm of the final residual `b - A x`.
    pub residual_norm_sq: f64,
}

/// A strategy that solves the linearized flow system for `(du, dv)`.
pub trait FlowSolver: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Run at most `iterations` iterations starting from the values in `du` and `dv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment lengths do not match the system or a work
    /// buffer cannot be allocated.
    fn solve(
        &self,
        system: &LinearSystem,
        iterations: usize,
        du: &mut [f64],
        dv: &mut [f64],
    ) -> Result<SolveReport, FlowError>;
}

pub(crate) fn check_unknowns(
    system: &LinearSystem,
    du: &[f64],
    dv: &[f64],
) -> Result<(), FlowError> {
    if du.len() != system.len() || dv.len() != system.len() {
        return Err(FlowError::InvalidParameter {
            name: "increment",
            reason: format!(
                "expected {} unknowns per component, got {} and {}",
                system.len(),
                du.len(),
                dv.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::tests::random_system;

    fn solve_with(
        solver: &dyn FlowSolver,
        system: &LinearSystem,
        iterations: usize,
    ) -> Result<(Vec<f64>, Vec<f64>), FlowError> {
        let mut du = vec![0.0; system.len()];
        let mut dv = vec![0.0; system.len()];
        solver.solve(system, iterations, &mut du, &mut dv)?;
        Ok((du, dv))
    }

    fn distance(a: &(Vec<f64>, Vec<f64>), b: &(Vec<f64>, Vec<f64>)) -> f64 {
        a.0.iter()
            .zip(&b.0)
            .chain(a.1.iter().zip(&b.1))
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }

    // tight enough that the stopping rule does not limit the comparison
    const EXACT: ConjugateGradient = ConjugateGradient { tolerance: 1e-26 };

    #[test]
    fn solvers_agree_at_convergence() -> Result<(), FlowError> {
        let system = random_system(12, 10, 7);
        let cg = solve_with(&EXACT, &system, 400)?;
        let sor = solve_with(&SuccessiveOverRelaxation::default(), &system, 400)?;

        assert!(distance(&cg, &sor) < 1e-6);
        let residual = system.residual_norm_sq(&cg.0, &cg.1)?;
        assert!(residual < 1e-10);
        Ok(())
    }

    #[test]
    fn error_shrinks_with_iterations() -> Result<(), FlowError> {
        let system = random_system(16, 12, 21);
        let solvers: [&dyn FlowSolver; 2] = [
            &ConjugateGradient::default(),
            &SuccessiveOverRelaxation::default(),
        ];
        let exact = solve_with(&EXACT, &system, 1000)?;

        for solver in solvers {
            let few = solve_with(solver, &system, 2)?;
            let many = solve_with(solver, &system, 60)?;
            assert!(
                distance(&many, &exact) < distance(&few, &exact),
                "{} did not improve",
                solver.name()
            );
        }
        Ok(())
    }

    #[test]
    fn zero_iterations_keep_the_start() -> Result<(), FlowError> {
        let system = random_system(5, 4, 1);
        let mut du = vec![0.25; system.len()];
        let mut dv = vec![-0.25; system.len()];
        for solver in [
            &ConjugateGradient::default() as &dyn FlowSolver,
            &SuccessiveOverRelaxation::default(),
        ] {
            let report = solver.solve(&system, 0, &mut du, &mut dv)?;
            assert_eq!(report.iterations, 0);
            assert!(du.iter().all(|&x| x == 0.25));
            assert!(dv.iter().all(|&x| x == -0.25));
        }
        Ok(())
    }

    #[test]
    fn wrong_unknown_count() {
        let system = random_system(5, 4, 1);
        let mut du = vec![0.0; 3];
        let mut dv = vec![0.0; system.len()];
        assert!(ConjugateGradient::default()
            .solve(&system, 10, &mut du, &mut dv)
            .is_err());
        assert!(SuccessiveOverRelaxation::default()
            .solve(&system, 10, &mut du, &mut dv)
            .is_err());
    }
}
