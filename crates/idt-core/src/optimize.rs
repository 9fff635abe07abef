//! Levenberg-Marquardt nonlinear least squares.
//!
//! Minimizes `0.5 * sum(r_i(p)^2)` for a residual function `r` over a small
//! parameter vector (6 or 9 for an IDT fit). The Jacobian is estimated by
//! central differences; damping follows Nielsen's gain-ratio update with
//! Marquardt's diagonal scaling.
//!
//! # Termination
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | largest gradient component <= `gradient_tolerance` | converged |
//! | step norm <= `parameter_tolerance * (‖p‖ + parameter_tolerance)` | converged |
//! | accepted cost decrease <= `function_tolerance * cost` | converged |
//! | `max_iterations` reached | error |
//! | non-finite parameters or residuals | error |
//! | singular normal equations | error |

use std::fmt;

use tracing::info;

use crate::error::{IdtError, IdtResult};

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LmConfig {
    /// Iteration cap. Reaching it is a failure.
    pub max_iterations: usize,
    /// Relative cost decrease treated as converged.
    pub function_tolerance: f64,
    /// Gradient magnitude treated as converged.
    pub gradient_tolerance: f64,
    /// Relative step size treated as converged.
    pub parameter_tolerance: f64,
    /// Starting damping factor.
    pub initial_damping: f64,
    /// Log cost and damping after every iteration.
    pub log_progress: bool,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            function_tolerance: 1e-10,
            gradient_tolerance: 1e-10,
            parameter_tolerance: 1e-10,
            initial_damping: 1e-4,
            log_progress: false,
        }
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Cost stopped decreasing.
    FunctionTolerance,
    /// Gradient vanished.
    GradientTolerance,
    /// Steps became negligible.
    ParameterTolerance,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FunctionTolerance => "function tolerance reached",
            Self::GradientTolerance => "gradient tolerance reached",
            Self::ParameterTolerance => "parameter tolerance reached",
        })
    }
}

/// Result of a converged fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    /// Fitted parameters.
    pub params: Vec<f64>,
    /// Iterations run.
    pub iterations: usize,
    /// Cost at the starting point.
    pub initial_cost: f64,
    /// Cost at the solution.
    pub final_cost: f64,
    /// Stopping condition.
    pub termination: Termination,
}

/// Fits `residuals` starting from `initial`.
///
/// # Errors
///
/// [`IdtError::Optimization`] if the iteration cap is reached, a non-finite
/// value appears, or the damped normal equations are singular.
pub fn least_squares<F>(residuals: F, initial: &[f64], config: &LmConfig) -> IdtResult<LmReport>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut params = initial.to_vec();
    if !all_finite(&params) {
        return Err(non_finite("initial parameters"));
    }
    let mut r = residuals(&params);
    if !all_finite(&r) {
        return Err(non_finite("residuals"));
    }

    let n = params.len();
    let mut cost = half_squared_norm(&r);
    let initial_cost = cost;
    let mut damping = config.initial_damping;
    let mut nu = 2.0;

    let report = |params: Vec<f64>, iterations, final_cost, termination| LmReport {
        params,
        iterations,
        initial_cost,
        final_cost,
        termination,
    };

    for iteration in 1..=config.max_iterations {
        let jac = jacobian(&residuals, &params)?;

        // Normal equations: (JtJ + mu * diag) step = -Jt r
        let mut jtj = vec![vec![0.0; n]; n];
        let mut gradient = vec![0.0; n];
        for a in 0..n {
            gradient[a] = dot(&jac[a], &r);
            for b in a..n {
                let v = dot(&jac[a], &jac[b]);
                jtj[a][b] = v;
                jtj[b][a] = v;
            }
        }

        if gradient.iter().all(|g| g.abs() <= config.gradient_tolerance) {
            return Ok(report(params, iteration, cost, Termination::GradientTolerance));
        }

        let mut damped = jtj.clone();
        for (i, row) in damped.iter_mut().enumerate() {
            row[i] += damping * jtj[i][i].max(1e-6);
        }
        let neg_gradient: Vec<f64> = gradient.iter().map(|g| -g).collect();
        let step = solve_linear(damped, neg_gradient).ok_or_else(|| {
            IdtError::Optimization("Optimization failed: singular normal equations".into())
        })?;

        let tol = config.parameter_tolerance;
        if norm(&step) <= tol * (norm(&params) + tol) {
            return Ok(report(params, iteration, cost, Termination::ParameterTolerance));
        }

        let candidate: Vec<f64> = params.iter().zip(&step).map(|(p, s)| p + s).collect();
        let r_candidate = residuals(&candidate);
        if !all_finite(&r_candidate) {
            return Err(non_finite("residuals"));
        }
        let cost_candidate = half_squared_norm(&r_candidate);

        let mut quadratic = 0.0;
        for a in 0..n {
            for b in 0..n {
                quadratic += step[a] * jtj[a][b] * step[b];
            }
        }
        let predicted = -(dot(&step, &gradient) + 0.5 * quadratic);
        let rho = if predicted > 0.0 {
            (cost - cost_candidate) / predicted
        } else {
            -1.0
        };

        if rho > 0.0 {
            let decrease = cost - cost_candidate;
            params = candidate;
            r = r_candidate;
            cost = cost_candidate;
            damping *= (1.0_f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
            nu = 2.0;

            if config.log_progress {
                info!("{iteration:4}: cost = {cost:.6e}, damping = {damping:.3e}");
            }
            if decrease <= config.function_tolerance * cost {
                return Ok(report(params, iteration, cost, Termination::FunctionTolerance));
            }
        } else {
            damping *= nu;
            nu *= 2.0;
            if config.log_progress {
                info!("{iteration:4}: step rejected, damping = {damping:.3e}");
            }
        }
    }

    Err(IdtError::Optimization(format!(
        "Optimization did not converge after {} iterations",
        config.max_iterations
    )))
}

/// Central-difference Jacobian, one column per parameter.
fn jacobian<F>(residuals: &F, params: &[f64]) -> IdtResult<Vec<Vec<f64>>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut columns = Vec::with_capacity(params.len());
    let mut probe = params.to_vec();
    for j in 0..params.len() {
        let h = 1e-6 * params[j].abs().max(1.0);
        probe[j] = params[j] + h;
        let plus = residuals(&probe);
        probe[j] = params[j] - h;
        let minus = residuals(&probe);
        probe[j] = params[j];

        let column: Vec<f64> = plus
            .iter()
            .zip(&minus)
            .map(|(p, m)| (p - m) / (2.0 * h))
            .collect();
        if !all_finite(&column) {
            return Err(non_finite("Jacobian"));
        }
        columns.push(column);
    }
    Ok(columns)
}

/// Solves `a x = b` by Gaussian elimination with partial pivoting.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    all_finite(&x).then_some(x)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn half_squared_norm(v: &[f64]) -> f64 {
    0.5 * dot(v, v)
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn non_finite(what: &str) -> IdtError {
    IdtError::Optimization(format!("Optimization failed: non-finite {what}"))
}
