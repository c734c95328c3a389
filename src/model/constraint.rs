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

//! This module defines the constraints of the linear problem model: plain
//! relational constraints, the two-armed disjunctions used by the routing
//! semantics, and the substitution records produced by the presolve.

use crate::Variable;

use super::LinearEquation;

/// The relation between a linear equation and its constant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

/// A linear constraint `equation <relation> constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub equation: LinearEquation,
    pub relation: Relation,
    pub constant: f64,
}

impl LinearConstraint {
    /// `equation <= constant`
    pub fn less_equal(equation: LinearEquation, constant: f64) -> Self {
        LinearConstraint { equation, relation: Relation::LessEqual, constant }
    }
    /// `equation >= constant`
    pub fn greater_equal(equation: LinearEquation, constant: f64) -> Self {
        LinearConstraint { equation, relation: Relation::GreaterEqual, constant }
    }
    /// `equation == constant`
    pub fn equal(equation: LinearEquation, constant: f64) -> Self {
        LinearConstraint { equation, relation: Relation::Equal, constant }
    }

    /// Rewrites the constraint into its uniform `<=` form (equalities are
    /// left untouched, they live in a list of their own).
    pub fn standardized(mut self) -> Self {
        if self.relation == Relation::GreaterEqual {
            self.equation.negate();
            self.constant = -self.constant;
            self.relation = Relation::LessEqual;
        }
        self
    }

    /// A constraint without any variable is decided by its constant alone.
    /// Returns `Some(verdict)` in that case, `None` when variables remain.
    pub fn constant_verdict(&self) -> Option<bool> {
        if !self.equation.is_empty() {
            return None;
        }
        Some(match self.relation {
            Relation::LessEqual => 0.0 <= self.constant,
            Relation::Equal => self.constant == 0.0,
            Relation::GreaterEqual => 0.0 >= self.constant,
        })
    }
}

/// A disjunction between two standardized `<=` constraints, together with the
/// fresh binary variable that selects the active arm (0 picks the left one,
/// 1 picks the right one).
#[derive(Debug, Clone)]
pub struct OrConstraint {
    pub lhs: LinearConstraint,
    pub rhs: LinearConstraint,
    pub choice: Variable,
}

/// A substitution record `variable = equation + constant`, produced when the
/// presolve eliminates a variable. Substituted variables have no column in
/// the tableaux; their value is recovered by evaluating the record against
/// the reconstructed solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub variable: Variable,
    pub equation: LinearEquation,
    pub constant: f64,
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_constraint {
    use crate::Variable;
    use crate::model::{LinearConstraint, LinearEquation, Relation};

    #[test]
    fn standardizing_a_ge_negates_equation_and_constant() {
        let c = LinearConstraint::greater_equal(LinearEquation::term(Variable(0), 2.0), 4.0)
            .standardized();
        assert_eq!(Relation::LessEqual, c.relation);
        assert_eq!(-2.0, c.equation.coefficient(Variable(0)));
        assert_eq!(-4.0, c.constant);
    }

    #[test]
    fn standardizing_a_le_is_a_noop() {
        let c = LinearConstraint::less_equal(LinearEquation::term(Variable(0), 2.0), 4.0)
            .standardized();
        assert_eq!(Relation::LessEqual, c.relation);
        assert_eq!(2.0, c.equation.coefficient(Variable(0)));
        assert_eq!(4.0, c.constant);
    }

    #[test]
    fn empty_constraints_are_decided_by_their_constant() {
        let sat = LinearConstraint::less_equal(LinearEquation::new(), 0.0);
        let unsat = LinearConstraint::less_equal(LinearEquation::new(), -1.0);
        let eq_unsat = LinearConstraint::equal(LinearEquation::new(), 2.0);
        assert_eq!(Some(true), sat.constant_verdict());
        assert_eq!(Some(false), unsat.constant_verdict());
        assert_eq!(Some(false), eq_unsat.constant_verdict());
    }

    #[test]
    fn constraints_with_variables_have_no_constant_verdict() {
        let c = LinearConstraint::less_equal(LinearEquation::term(Variable(0), 1.0), -1.0);
        assert_eq!(None, c.constant_verdict());
    }
}
