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

//! This module defines the linear equations that constraints and objectives
//! are made of. The coefficient storage is dense by variable index: problems
//! stay small and the row operations of the solver are plain loops, so a
//! dense vector beats any map-based sparse encoding here.

use crate::Variable;

use super::Substitution;

/// A linear combination of problem variables. The vector of coefficients is
/// indexed by variable id and behaves as a sparse mapping by treating every
/// zero entry (including entries past the end of the vector) as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearEquation {
    coefs: Vec<f64>,
}

impl LinearEquation {
    /// Creates the empty equation (every coefficient zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an equation with a single term `coef * var`.
    pub fn term(var: Variable, coef: f64) -> Self {
        let mut eq = Self::new();
        eq.add(var, coef);
        eq
    }

    /// Adds `coef` to the coefficient of `var`, growing the storage on demand.
    pub fn add(&mut self, var: Variable, coef: f64) {
        if var.id() >= self.coefs.len() {
            self.coefs.resize(var.id() + 1, 0.0);
        }
        self.coefs[var.id()] += coef;
    }

    /// Adds `scale * other` to this equation, term wise.
    pub fn add_scaled(&mut self, other: &LinearEquation, scale: f64) {
        for (var, coef) in other.iter() {
            self.add(var, coef * scale);
        }
    }

    /// The coefficient of `var` (zero when the variable does not occur).
    pub fn coefficient(&self, var: Variable) -> f64 {
        self.coefs.get(var.id()).copied().unwrap_or(0.0)
    }

    /// Multiplies every coefficient by `scale`.
    pub fn scale(&mut self, scale: f64) {
        for c in self.coefs.iter_mut() {
            *c *= scale;
        }
    }

    /// Flips the sign of every coefficient.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// Forces the coefficient of `var` to zero.
    pub fn zero_out(&mut self, var: Variable) {
        if var.id() < self.coefs.len() {
            self.coefs[var.id()] = 0.0;
        }
    }

    /// Tells whether the equation has no term at all.
    pub fn is_empty(&self) -> bool {
        self.coefs.iter().all(|c| *c == 0.0)
    }

    /// Tells whether every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.coefs.iter().all(|c| c.is_finite())
    }

    /// The first non-finite coefficient, if any.
    pub fn first_non_finite(&self) -> Option<f64> {
        self.coefs.iter().copied().find(|c| !c.is_finite())
    }

    /// Iterates over the non-zero terms in ascending variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.coefs
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(i, c)| (Variable(i), *c))
    }

    /// Evaluates the equation against a full assignment of variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.iter().map(|(var, coef)| coef * values[var.id()]).sum()
    }

    /// Replaces every occurrence of the substituted variable by its equation
    /// form. The returned value is the constant displaced by the rewrite
    /// (`coef * substitution constant`); the caller is in charge of absorbing
    /// it into the right-hand side it maintains.
    pub fn substitute(&mut self, sub: &Substitution) -> f64 {
        let coef = self.coefficient(sub.variable);
        if coef == 0.0 {
            return 0.0;
        }
        self.zero_out(sub.variable);
        self.add_scaled(&sub.equation, coef);
        coef * sub.constant
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_equation {
    use crate::Variable;
    use crate::model::{LinearEquation, Substitution};

    #[test]
    fn add_accumulates_coefficients() {
        let mut eq = LinearEquation::new();
        eq.add(Variable(2), 1.5);
        eq.add(Variable(2), 0.5);
        assert_eq!(2.0, eq.coefficient(Variable(2)));
        assert_eq!(0.0, eq.coefficient(Variable(7)));
    }

    #[test]
    fn iter_skips_zero_entries() {
        let mut eq = LinearEquation::new();
        eq.add(Variable(0), 1.0);
        eq.add(Variable(3), -2.0);
        eq.add(Variable(1), 4.0);
        eq.add(Variable(1), -4.0);
        let terms = eq.iter().collect::<Vec<_>>();
        assert_eq!(vec![(Variable(0), 1.0), (Variable(3), -2.0)], terms);
    }

    #[test]
    fn evaluate_is_the_dot_product() {
        let mut eq = LinearEquation::new();
        eq.add(Variable(0), 2.0);
        eq.add(Variable(2), -1.0);
        assert_eq!(5.0, eq.evaluate(&[3.0, 100.0, 1.0]));
    }

    #[test]
    fn negate_flips_every_term() {
        let mut eq = LinearEquation::term(Variable(1), 3.0);
        eq.negate();
        assert_eq!(-3.0, eq.coefficient(Variable(1)));
    }

    #[test]
    fn substitute_rewrites_and_displaces_the_constant() {
        // eq: 2*x0 + 3*x1 ; substitution: x1 = -x2 + 5
        let mut eq = LinearEquation::new();
        eq.add(Variable(0), 2.0);
        eq.add(Variable(1), 3.0);
        let sub = Substitution {
            variable: Variable(1),
            equation: LinearEquation::term(Variable(2), -1.0),
            constant: 5.0,
        };
        let displaced = eq.substitute(&sub);
        assert_eq!(15.0, displaced);
        assert_eq!(0.0, eq.coefficient(Variable(1)));
        assert_eq!(-3.0, eq.coefficient(Variable(2)));
        assert_eq!(2.0, eq.coefficient(Variable(0)));
    }

    #[test]
    fn substitute_without_occurrence_is_a_noop() {
        let mut eq = LinearEquation::term(Variable(0), 1.0);
        let sub = Substitution {
            variable: Variable(5),
            equation: LinearEquation::new(),
            constant: 7.0,
        };
        assert_eq!(0.0, eq.substitute(&sub));
        assert_eq!(1.0, eq.coefficient(Variable(0)));
    }
}
