//! Dense assembly and the QR least-squares solve.
//!
//! The equation system carries one redundant KCL row per connected
//! component, so the assembled matrix is rectangular (rows >= columns) and
//! is solved in the least-squares sense: `x = R^-1 * Q^T * z`. For a
//! consistent circuit the residual is zero and the least-squares solution is
//! exact.
//!
//! A rank-deficient or numerically degenerate system must not take down the
//! interactive loop: [`solve_or_zero`] degrades to the all-zero vector and
//! reports on the `log` channel.

use nalgebra::{DMatrix, DVector};

use crate::error::{GalvaniError, Result};

use super::equations::EquationSystem;

/// Diagonal entries of `R` smaller than this (relative to the largest)
/// indicate rank deficiency.
const RANK_TOLERANCE: f64 = 1e-12;

/// Assemble the sparse equations into a dense matrix and RHS vector.
/// Rows are equations, columns are unknowns (node voltages first, branch
/// currents after).
fn assemble(system: &EquationSystem) -> (DMatrix<f64>, DVector<f64>) {
    let rows = system.equations.len();
    let cols = system.num_unknowns();
    let mut a = DMatrix::zeros(rows, cols);
    let mut z = DVector::zeros(rows);

    for (row, equation) in system.equations.iter().enumerate() {
        for term in &equation.terms {
            a[(row, term.unknown.column(system.num_nodes))] += term.coefficient;
        }
        z[row] = equation.rhs;
    }

    (a, z)
}

/// Solve the system, returning an error on rank deficiency or a non-finite
/// result.
fn solve_least_squares(system: &EquationSystem) -> Result<DVector<f64>> {
    let cols = system.num_unknowns();
    if cols == 0 {
        return Ok(DVector::zeros(0));
    }

    let (a, z) = assemble(system);
    let qr = a.qr();
    let r = qr.r();

    let max_diag = (0..cols).map(|i| r[(i, i)].abs()).fold(0.0, f64::max);
    let min_diag = (0..cols).map(|i| r[(i, i)].abs()).fold(f64::INFINITY, f64::min);
    if max_diag == 0.0 || min_diag < RANK_TOLERANCE * max_diag {
        return Err(GalvaniError::singular(format!(
            "rank-deficient system ({} equations, {cols} unknowns)",
            system.equations.len()
        )));
    }

    let qtz = qr.q().transpose() * z;
    let x = r
        .solve_upper_triangular(&qtz)
        .ok_or_else(|| GalvaniError::singular("back substitution failed".to_string()))?;

    if x.iter().any(|v| !v.is_finite()) {
        return Err(GalvaniError::singular(
            "non-finite entries in solution vector".to_string(),
        ));
    }

    Ok(x)
}

/// Solve the system, degrading to the all-zero vector on failure so the
/// caller's tick loop keeps running. The failure is logged, not surfaced.
pub fn solve_or_zero(system: &EquationSystem) -> DVector<f64> {
    match solve_least_squares(system) {
        Ok(x) => x,
        Err(error) => {
            log::warn!("linear solve failed, returning zero solution: {error}");
            DVector::zeros(system.num_unknowns())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Unknown;
    use crate::solver::equations::{Equation, Term};
    use approx::assert_relative_eq;

    fn system_of(equations: Vec<Equation>, num_nodes: usize) -> EquationSystem {
        EquationSystem {
            equations,
            num_nodes,
            branches: Vec::new(),
        }
    }

    #[test]
    fn solves_a_square_system() {
        // x0 = 1, x0 + x1 = 3
        let system = system_of(
            vec![
                Equation::new(vec![Term::new(1.0, Unknown::Voltage(0))], 1.0),
                Equation::new(
                    vec![
                        Term::new(1.0, Unknown::Voltage(0)),
                        Term::new(1.0, Unknown::Voltage(1)),
                    ],
                    3.0,
                ),
            ],
            2,
        );
        let x = solve_or_zero(&system);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn consistent_overdetermined_system_solves_exactly() {
        // x0 = 2 stated twice plus x0 + x1 = 5.
        let system = system_of(
            vec![
                Equation::new(vec![Term::new(1.0, Unknown::Voltage(0))], 2.0),
                Equation::new(vec![Term::new(1.0, Unknown::Voltage(0))], 2.0),
                Equation::new(
                    vec![
                        Term::new(1.0, Unknown::Voltage(0)),
                        Term::new(1.0, Unknown::Voltage(1)),
                    ],
                    5.0,
                ),
            ],
            2,
        );
        let x = solve_or_zero(&system);
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rank_deficient_system_falls_back_to_zeros() {
        // x1 is unconstrained.
        let system = system_of(
            vec![
                Equation::new(vec![Term::new(1.0, Unknown::Voltage(0))], 1.0),
                Equation::new(vec![Term::new(2.0, Unknown::Voltage(0))], 2.0),
            ],
            2,
        );
        let x = solve_or_zero(&system);
        assert_eq!(x.len(), 2);
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_system_yields_empty_vector() {
        let system = system_of(Vec::new(), 0);
        assert_eq!(solve_or_zero(&system).len(), 0);
    }
}
