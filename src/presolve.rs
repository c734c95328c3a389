// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the presolve: an algebraic simplification of the
//! model that runs before any tableau is built. It alternates two rewrites
//! until a fixed point is reached:
//!
//! 1. *zero inference*, which inspects sign-homogeneous rows. Over
//!    non-negative variables, a row whose coefficients all share a sign can
//!    force every one of its variables to zero, prove the model infeasible,
//!    or turn out to be trivially satisfied and disappear;
//! 2. *equality reduction*, which packs the equality rows into a dense
//!    matrix, runs the ordered Gaussian elimination over it, and records one
//!    substitution per pivot row. The substitutions are applied to the `<=`
//!    rows and to both arms of every disjunction.
//!
//! Every rewrite preserves the solution set: a variable is only eliminated
//! with a known value, a removed row is trivially satisfied, and anything
//! else is a proof of infeasibility.

use tracing::{debug_span, trace};

use crate::linalg::gaussian_elimination_ordered;
use crate::matrix::Matrix;
use crate::model::{LinearEquation, LinearProblem, Substitution};
use crate::{SolverError, Variable};

/// Runs the presolve to its fixed point. On success the model has no
/// equality row left; infeasibility is reported as
/// [`SolverError::UnsolvableProblem`].
pub(crate) fn run(problem: &mut LinearProblem) -> Result<(), SolverError> {
    let _span = debug_span!("presolve").entered();
    loop {
        let mut progress = infer_zeros(problem)?;
        progress |= reduce_equalities(problem)?;
        if !progress {
            return Ok(());
        }
    }
}

/// The sign pattern of one row: `positive` when every coefficient is >= 0,
/// `negative` when every coefficient is <= 0. A row with no term at all is
/// both.
fn homogeneity(equation: &LinearEquation) -> (bool, bool) {
    let mut positive = true;
    let mut negative = true;
    for (_, coef) in equation.iter() {
        positive &= coef > 0.0;
        negative &= coef < 0.0;
    }
    (positive, negative)
}

/// One pass of zero inference, looped until it stops discovering anything.
/// Returns whether any rewrite happened.
fn infer_zeros(problem: &mut LinearProblem) -> Result<bool, SolverError> {
    let mut progress = false;
    loop {
        let mut fixed: Vec<Variable> = Vec::new();
        let mut drop_eq: Vec<usize> = Vec::new();
        let mut drop_le: Vec<usize> = Vec::new();

        for (i, row) in problem.equalities.iter().enumerate() {
            let (positive, negative) = homogeneity(&row.equation);
            let b = row.constant;
            if positive && negative {
                if b == 0.0 {
                    drop_eq.push(i);
                } else {
                    return Err(SolverError::UnsolvableProblem);
                }
            } else if positive {
                if b == 0.0 {
                    fixed.extend(row.equation.iter().map(|(v, _)| v));
                    drop_eq.push(i);
                } else if b < 0.0 {
                    return Err(SolverError::UnsolvableProblem);
                }
            } else if negative {
                if b == 0.0 {
                    fixed.extend(row.equation.iter().map(|(v, _)| v));
                    drop_eq.push(i);
                } else if b > 0.0 {
                    return Err(SolverError::UnsolvableProblem);
                }
            }
        }

        for (i, row) in problem.constraints.iter().enumerate() {
            let (positive, negative) = homogeneity(&row.equation);
            let b = row.constant;
            if positive && negative {
                if b < 0.0 {
                    return Err(SolverError::UnsolvableProblem);
                }
                drop_le.push(i);
            } else if positive {
                if b < 0.0 {
                    return Err(SolverError::UnsolvableProblem);
                } else if b == 0.0 {
                    fixed.extend(row.equation.iter().map(|(v, _)| v));
                    drop_le.push(i);
                }
            } else if negative && b >= 0.0 {
                drop_le.push(i);
            }
        }

        if fixed.is_empty() && drop_eq.is_empty() && drop_le.is_empty() {
            return Ok(progress);
        }
        progress = true;

        for i in drop_eq.into_iter().rev() {
            problem.equalities.remove(i);
        }
        for i in drop_le.into_iter().rev() {
            problem.constraints.remove(i);
        }
        for var in fixed {
            fix_to_zero(problem, var);
        }
    }
}

/// Eliminates `var` with the known value zero: its column is zeroed in every
/// stored row and an empty substitution is recorded for the reconstruction.
fn fix_to_zero(problem: &mut LinearProblem, var: Variable) {
    if problem.is_substituted(var) {
        return;
    }
    trace!(var = var.id(), "variable fixed to zero");
    for row in problem.equalities.iter_mut() {
        row.equation.zero_out(var);
    }
    for row in problem.constraints.iter_mut() {
        row.equation.zero_out(var);
    }
    for dis in problem.disjunctions.iter_mut() {
        dis.lhs.equation.zero_out(var);
        dis.rhs.equation.zero_out(var);
    }
    problem.record_substitution(Substitution {
        variable: var,
        equation: LinearEquation::new(),
        constant: 0.0,
    });
}

/// Reduces the current equality rows into substitution records and applies
/// them to the rest of the model. Returns whether anything was reduced.
fn reduce_equalities(problem: &mut LinearProblem) -> Result<bool, SolverError> {
    if problem.equalities.is_empty() {
        return Ok(false);
    }
    let n = problem.num_variables();
    let mut m = Matrix::new(n + 1, problem.equalities.len());
    for (r, row) in problem.equalities.iter().enumerate() {
        for (var, coef) in row.equation.iter() {
            m.set(r, var.id(), coef);
        }
        m.set(r, n, row.constant);
    }
    gaussian_elimination_ordered(&mut m);

    let mut subs = Vec::new();
    for r in 0..m.height() {
        let Some(k) = (0..=n).find(|c| m.get(r, *c) != 0.0) else {
            // all-zero row: the equality was redundant
            continue;
        };
        if k == n {
            // 0 = c with c != 0
            return Err(SolverError::UnsolvableProblem);
        }
        // the pivot was normalized to 1: x_k = -sum_{j>k} m[j] x_j + m[last]
        let mut equation = LinearEquation::new();
        for j in k + 1..n {
            let coef = m.get(r, j);
            if coef != 0.0 {
                equation.add(Variable(j), -coef);
            }
        }
        subs.push(Substitution { variable: Variable(k), equation, constant: m.get(r, n) });
    }
    problem.equalities.clear();

    trace!(n_substitutions = subs.len(), "equalities reduced");
    for sub in subs {
        for row in problem.constraints.iter_mut() {
            let displaced = row.equation.substitute(&sub);
            row.constant -= displaced;
        }
        for dis in problem.disjunctions.iter_mut() {
            let displaced = dis.lhs.equation.substitute(&sub);
            dis.lhs.constant -= displaced;
            let displaced = dis.rhs.equation.substitute(&sub);
            dis.rhs.constant -= displaced;
        }
        problem.record_substitution(sub);
    }
    Ok(true)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
