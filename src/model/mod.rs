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

//! This module provides the linear problem model: variables, equations,
//! relational constraints, two-armed disjunctions, and the `maximize` entry
//! point which chains the presolve, the branch-and-bound search and the
//! final solution verification.

mod constraint;
mod equation;

pub use constraint::{LinearConstraint, OrConstraint, Relation, Substitution};
pub use equation::LinearEquation;

use tracing::{debug, trace};

use crate::cutoff::Cutoff;
use crate::{branch_bound, presolve, SolverError, Variable, VariableRange, SOLUTION_TOLERANCE};

/// A maximization problem over non-negative variables. Constraints are
/// standardized on the way in: equalities are stored apart (the presolve
/// turns them into substitutions), inequalities are put in a uniform `<=`
/// form, and every disjunction allocates a fresh binary choice variable.
#[derive(Debug, Default)]
pub struct LinearProblem {
    n_vars: usize,
    /// The standardized `<=` rows. The presolve rewrites these in place.
    pub(crate) constraints: Vec<LinearConstraint>,
    /// The equality rows, consumed by the presolve.
    pub(crate) equalities: Vec<LinearConstraint>,
    /// The disjunctions, branched upon by the search.
    pub(crate) disjunctions: Vec<OrConstraint>,
    /// The substitutions recorded by the presolve, in discovery order.
    pub(crate) substitutions: Vec<Substitution>,
    /// Flags the variables eliminated by a substitution.
    pub(crate) substituted: Vec<bool>,
    /// Pristine copies of every standardized `<=` row, kept for the final
    /// solution verification.
    originals: Vec<LinearConstraint>,
}

impl LinearProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of variables created so far (including eliminated ones).
    pub fn num_variables(&self) -> usize {
        self.n_vars
    }

    /// Creates one fresh variable.
    pub fn create_variable(&mut self) -> Variable {
        let var = Variable(self.n_vars);
        self.n_vars += 1;
        var
    }

    /// Creates `n` fresh variables with contiguous indices.
    pub fn create_variables(&mut self, n: usize) -> VariableRange {
        let range = VariableRange::new(self.n_vars, self.n_vars + n);
        self.n_vars += n;
        range
    }

    /// Adds a constraint to the problem, standardizing it on the way in.
    ///
    /// A constraint without any variable is decided immediately: it is either
    /// dropped (trivially satisfied) or reported as an infeasibility.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) -> Result<(), SolverError> {
        Self::check_finite(&constraint)?;
        let constraint = constraint.standardized();
        if let Some(verdict) = constraint.constant_verdict() {
            return if verdict { Ok(()) } else { Err(SolverError::UnsolvableProblem) };
        }
        match constraint.relation {
            Relation::Equal => self.equalities.push(constraint),
            Relation::LessEqual => {
                self.originals.push(constraint.clone());
                self.constraints.push(constraint);
            }
            Relation::GreaterEqual => unreachable!("standardization leaves no >= constraint"),
        }
        Ok(())
    }

    /// Adds the disjunction `lhs OR rhs` to the problem. Both arms are
    /// standardized to a `<=` form and a fresh binary choice variable is
    /// allocated for the search to branch on. Arms must be inequalities.
    pub fn add_or_constraint(
        &mut self,
        lhs: LinearConstraint,
        rhs: LinearConstraint,
    ) -> Result<Variable, SolverError> {
        Self::check_finite(&lhs)?;
        Self::check_finite(&rhs)?;
        debug_assert!(lhs.relation != Relation::Equal && rhs.relation != Relation::Equal);
        let lhs = lhs.standardized();
        let rhs = rhs.standardized();
        let choice = self.create_variable();
        self.disjunctions.push(OrConstraint { lhs, rhs, choice });
        Ok(choice)
    }

    /// Maximizes the given objective over the current constraints and returns
    /// the best feasible assignment. The model is presolved in place, solved
    /// by branch-and-bound over the disjunction choices, and the resulting
    /// assignment is verified against every pristine `<=` row before being
    /// accepted.
    pub fn maximize(
        &mut self,
        objective: LinearEquation,
        cutoff: &dyn Cutoff,
    ) -> Result<LinearSolution, SolverError> {
        if let Some(value) = objective.first_non_finite() {
            return Err(SolverError::invalid(value));
        }
        presolve::run(self)?;

        let mut objective = objective;
        for sub in self.substitutions.iter() {
            objective.substitute(sub);
        }
        debug!(
            n_vars = self.n_vars,
            n_rows = self.constraints.len(),
            n_disjunctions = self.disjunctions.len(),
            n_substitutions = self.substitutions.len(),
            "solving presolved model"
        );

        let solution = branch_bound::search(self, &objective, cutoff)?;
        self.verify(&solution)?;
        Ok(solution)
    }

    /// Checks the candidate assignment against every pristine standardized
    /// `<=` row. Rejecting a violating assignment here catches solver bugs
    /// before they can leak absurd rates to the caller.
    fn verify(&self, solution: &LinearSolution) -> Result<(), SolverError> {
        for (index, row) in self.originals.iter().enumerate() {
            let lhs = row.equation.evaluate(solution.values());
            if lhs > row.constant + SOLUTION_TOLERANCE {
                trace!(index, lhs, constant = row.constant, "constraint violated by solution");
                return Err(SolverError::UnsolvableProblem);
            }
        }
        Ok(())
    }

    /// Records a substitution discovered by the presolve.
    pub(crate) fn record_substitution(&mut self, sub: Substitution) {
        if sub.variable.id() >= self.substituted.len() {
            self.substituted.resize(sub.variable.id() + 1, false);
        }
        self.substituted[sub.variable.id()] = true;
        self.substitutions.push(sub);
    }

    /// Tells whether the given variable was eliminated by the presolve.
    pub(crate) fn is_substituted(&self, var: Variable) -> bool {
        self.substituted.get(var.id()).copied().unwrap_or(false)
    }

    fn check_finite(constraint: &LinearConstraint) -> Result<(), SolverError> {
        if let Some(value) = constraint.equation.first_non_finite() {
            return Err(SolverError::invalid(value));
        }
        if !constraint.constant.is_finite() {
            return Err(SolverError::invalid(constraint.constant));
        }
        Ok(())
    }
}

/// The assignment computed for a linear problem: one value per variable, in
/// variable id order, substituted and choice variables included.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSolution {
    values: Vec<f64>,
}

impl LinearSolution {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// The value assigned to the given variable.
    pub fn value(&self, var: Variable) -> f64 {
        self.values[var.id()]
    }

    /// The full assignment, indexed by variable id.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
