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

//! This module defines the error type shared by every fallible operation of
//! the solver pipeline.

use thiserror::Error;

/// The reasons why a solve can fail. Every error aborts the current solve
/// immediately: no partial result is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// A NaN or infinite rate/coefficient reached the model emission. The
    /// snapshot is rejected before any search work is done.
    #[error("non-finite rate or coefficient: {value}")]
    InvalidCoefficient { value: f64 },

    /// Presolve proved the model infeasible, or the branch-and-bound search
    /// exhausted its tree without finding a feasible integral solution.
    /// Callers typically treat this as "no converter can run" and zero all
    /// rates. Within the branch-and-bound loop this error is recovered
    /// locally: the offending branch is pruned and the search goes on.
    #[error("the problem admits no feasible solution")]
    UnsolvableProblem,

    /// The standardized model has more constraint rows than tableau columns.
    #[error("overconstrained problem: {constraints} constraints for {columns} columns")]
    Overconstrained { constraints: usize, columns: usize },

    /// An internal invariant was violated while merging graph nodes. This is
    /// a bug in the emission, not a user error.
    #[error("invalid merge: {reason}")]
    InvalidMerge { reason: String },
}

impl SolverError {
    /// Builds an [`SolverError::InvalidCoefficient`] for the given offending
    /// value.
    pub fn invalid(value: f64) -> Self {
        SolverError::InvalidCoefficient { value }
    }
}
