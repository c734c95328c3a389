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

//! This module defines the most basic data types that are used throughout all
//! the code of the solver, along with the numerical policy constants shared
//! by the pipeline stages.

// ----------------------------------------------------------------------------
// --- VARIABLE ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a variable from the linear problem at hand. Each variable
/// is identified with an integer ranging from 0 until the number of variables
/// that have been created on the problem, in creation order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Variable(pub usize);
impl Variable {
    #[inline]
    /// This function returns the id (numeric value) of the variable.
    ///
    /// # Examples:
    /// ```
    /// # use resflow::Variable;
    /// assert_eq!(0, Variable(0).id());
    /// assert_eq!(3, Variable(3).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- VARIABLE RANGE ---------------------------------------------------------
// ----------------------------------------------------------------------------
/// A contiguous range of variables, as returned by the bulk variable creation
/// on a linear problem. Flow-share variables for a multi-inventory route are
/// always allocated as one such range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VariableRange {
    start: usize,
    end: usize,
}
impl VariableRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }
    /// The number of variables in the range.
    pub fn len(self) -> usize {
        self.end - self.start
    }
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
    /// The i-th variable of the range.
    pub fn at(self, i: usize) -> Variable {
        debug_assert!(self.start + i < self.end);
        Variable(self.start + i)
    }
    /// Iterates over the variables of the range in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = Variable> {
        (self.start..self.end).map(Variable)
    }
}

// ----------------------------------------------------------------------------
// --- NUMERICAL POLICY -------------------------------------------------------
// ----------------------------------------------------------------------------
/// Hard cap on the number of pivots performed by one simplex run. Reaching it
/// is treated as best effort; the final solution is verified regardless.
pub const MAX_SIMPLEX_ITERATIONS: usize = 1000;

/// The coefficient used to relax a disjunction into linear rows. Large enough
/// to dominate every legitimate rate, small enough that the cancellation rule
/// of the dense matrix can still clean up after it.
pub const BIG_M: f64 = 1e9;

/// Base of the converter priority weighting. `WEIGHT_BASE^10` is about `1e6`,
/// which keeps the simplex tableau conditioned over the whole priority range.
pub const WEIGHT_BASE: f64 = 3.98107;

/// A candidate solution is accepted only if every standardized constraint is
/// violated by no more than this tolerance.
pub const SOLUTION_TOLERANCE: f64 = 1e-6;

/// Threshold of the cancellation-truncation rule applied by the fused
/// scale-subtract row operation.
pub const CANCELLATION_EPSILON: f64 = 1e-9;

/// Rates smaller than this are always dropped when distributing logical rates
/// back to physical inventories.
pub const DISAGGREGATION_ABSOLUTE_EPSILON: f64 = 1e-9;

/// Rates below `1e-6` are dropped as round-off noise only when they are also
/// this small relative to the overall magnitude of the solution.
pub const DISAGGREGATION_RELATIVE_EPSILON: f64 = 1e-6;

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_variable_range {
    use crate::{Variable, VariableRange};

    #[test]
    fn range_iterates_in_creation_order() {
        let range = VariableRange::new(3, 6);
        let vars = range.iter().collect::<Vec<_>>();
        assert_eq!(vars, vec![Variable(3), Variable(4), Variable(5)]);
    }

    #[test]
    fn empty_range_has_no_items() {
        let range = VariableRange::new(2, 2);
        assert!(range.is_empty());
        assert_eq!(0, range.iter().count());
    }

    #[test]
    fn at_returns_the_ith_variable() {
        let range = VariableRange::new(10, 14);
        assert_eq!(Variable(10), range.at(0));
        assert_eq!(Variable(13), range.at(3));
        assert_eq!(4, range.len());
    }
}
