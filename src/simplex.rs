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

//! This module provides the dense-tableau simplex used to solve each linear
//! relaxation of the search. The tableau is laid out with one column per
//! structural variable, one slack column per row forming the initial basis,
//! and the right-hand side in the last column; row 0 holds the negated
//! objective so that driving its entries non-negative maximizes the original
//! objective.

use bitset_fixed::BitSet;
use tracing::trace;

use crate::matrix::Matrix;
use crate::{SolverError, MAX_SIMPLEX_ITERATIONS};

/// A simplex tableau over standardized `<=` rows.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    matrix: Matrix,
    n_structural: usize,
    /// Columns that have been chosen as pivot at least once.
    selected: BitSet,
}

impl Tableau {
    /// Assembles the tableau from a dense objective (one coefficient per
    /// structural column) and the standardized rows `equation <= constant`.
    /// Every row gets its own slack column, so the slack block forms an
    /// identity and the all-zero point is the initial basic solution.
    pub fn build(objective: &[f64], rows: Vec<(Vec<f64>, f64)>) -> Result<Tableau, SolverError> {
        let n_structural = objective.len();
        let n_rows = rows.len();
        let columns = n_structural + n_rows;
        if n_rows > columns {
            // a tableau with more rows than columns cannot hold a basis
            return Err(SolverError::Overconstrained { constraints: n_rows, columns });
        }
        let width = columns + 1;
        let height = n_rows + 1;
        let mut matrix = Matrix::new(width, height);
        for (c, coef) in objective.iter().enumerate() {
            matrix.set(0, c, -coef);
        }
        for (r, (equation, constant)) in rows.into_iter().enumerate() {
            debug_assert_eq!(n_structural, equation.len());
            for (c, coef) in equation.into_iter().enumerate() {
                matrix.set(r + 1, c, coef);
            }
            matrix.set(r + 1, n_structural + r, 1.0);
            matrix.set(r + 1, width - 1, constant);
        }
        Ok(Tableau { matrix, n_structural, selected: BitSet::new(columns) })
    }

    /// The maximized objective value (right-hand side of the objective row).
    pub fn objective_value(&self) -> f64 {
        self.matrix.get(0, self.matrix.width() - 1)
    }

    /// Reads the value of every structural column out of the final tableau.
    /// A column holds a basic variable when it is a singleton 1 over the
    /// constraint rows (and zero in the objective row); its value then is the
    /// right-hand side of that row. Every other column is non-basic and
    /// reads as zero. A structural column can only have entered the basis by
    /// being selected as pivot, so unselected columns are skipped outright.
    pub fn extract(&self) -> Vec<f64> {
        let rhs = self.matrix.width() - 1;
        let mut values = vec![0.0; self.n_structural];
        for (col, value) in values.iter_mut().enumerate() {
            if !self.selected[col] {
                continue;
            }
            let mut basic_row = None;
            let mut singleton = true;
            for row in 0..self.matrix.height() {
                let v = self.matrix.get(row, col);
                if v == 0.0 {
                    continue;
                }
                if v == 1.0 && row > 0 && basic_row.is_none() {
                    basic_row = Some(row);
                } else {
                    singleton = false;
                    break;
                }
            }
            if let (true, Some(row)) = (singleton, basic_row) {
                *value = self.matrix.get(row, rhs);
            }
        }
        values
    }
}

/// Runs the bounded pivot loop on the given tableau.
///
/// The rows are expected to admit the all-zero point as a feasible start: a
/// negative right-hand side means the relaxation is infeasible as posed and
/// is reported as [`SolverError::UnsolvableProblem`] (the search prunes that
/// branch). Hitting the iteration cap is not an error; the caller verifies
/// whatever solution comes out.
pub(crate) fn run(t: &mut Tableau) -> Result<(), SolverError> {
    let width = t.matrix.width();
    let height = t.matrix.height();
    let rhs = width - 1;

    for row in 1..height {
        let b = t.matrix.get(row, rhs);
        if b < 0.0 || !b.is_finite() {
            return Err(SolverError::UnsolvableProblem);
        }
    }

    for iteration in 0..MAX_SIMPLEX_ITERATIONS {
        // Dantzig rule: the column with the most negative reduced cost
        let mut pivot_col = None;
        let mut most_negative = 0.0;
        for col in 0..rhs {
            let v = t.matrix.get(0, col);
            if v < most_negative {
                most_negative = v;
                pivot_col = Some(col);
            }
        }
        let Some(pivot_col) = pivot_col else {
            trace!(iteration, "simplex optimal");
            return Ok(());
        };

        // smallest positive ratio, ties to the lowest row index
        let mut pivot_row = None;
        let mut best_ratio = f64::INFINITY;
        for row in 1..height {
            let a = t.matrix.get(row, pivot_col);
            if a > 0.0 {
                let ratio = t.matrix.get(row, rhs) / a;
                if ratio < best_ratio {
                    best_ratio = ratio;
                    pivot_row = Some(row);
                }
            }
        }
        let Some(pivot_row) = pivot_row else {
            // no row limits the entering column: nothing left to improve on
            trace!(iteration, "simplex has no limiting row");
            return Ok(());
        };

        let pivot = t.matrix.get(pivot_row, pivot_col);
        if !pivot.is_finite() {
            return Err(SolverError::UnsolvableProblem);
        }
        t.matrix.inv_scale_row(pivot_row, pivot);
        for row in 0..height {
            if row != pivot_row && t.matrix.get(row, pivot_col) != 0.0 {
                t.matrix.scale_reduce(row, pivot_row, pivot_col);
            }
        }
        t.selected.set(pivot_col, true);
    }
    trace!("simplex iteration cap reached");
    Ok(())
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_simplex {
    use super::*;

    #[test]
    fn solves_a_two_variable_lp() {
        // max 2x + y  s.t.  x <= 3, y <= 2, x + y <= 4
        let rows = vec![
            (vec![1.0, 0.0], 3.0),
            (vec![0.0, 1.0], 2.0),
            (vec![1.0, 1.0], 4.0),
        ];
        let mut t = Tableau::build(&[2.0, 1.0], rows).unwrap();
        run(&mut t).unwrap();
        assert!((t.objective_value() - 7.0).abs() < 1e-9);
        let values = t.extract();
        assert!((values[0] - 3.0).abs() < 1e-9);
        assert!((values[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn already_optimal_tableau_stops_immediately() {
        // max -x: no column ever has a negative reduced cost
        let mut t = Tableau::build(&[-1.0], vec![(vec![1.0], 5.0)]).unwrap();
        run(&mut t).unwrap();
        assert_eq!(0.0, t.objective_value());
        assert_eq!(vec![0.0], t.extract());
    }

    #[test]
    fn unlimited_column_stops_without_error() {
        // max x with only -x <= 1: no limiting row exists
        let mut t = Tableau::build(&[1.0], vec![(vec![-1.0], 1.0)]).unwrap();
        run(&mut t).unwrap();
        assert_eq!(vec![0.0], t.extract());
    }

    #[test]
    fn negative_right_hand_side_is_unsolvable() {
        let mut t = Tableau::build(&[1.0], vec![(vec![-1.0], -1.0)]).unwrap();
        assert_eq!(Err(SolverError::UnsolvableProblem), run(&mut t));
    }

    #[test]
    fn ratio_ties_break_to_the_lowest_row() {
        // both rows limit x at 2; the first one must leave the basis
        let rows = vec![(vec![1.0], 2.0), (vec![1.0], 2.0)];
        let mut t = Tableau::build(&[1.0], rows).unwrap();
        run(&mut t).unwrap();
        let values = t.extract();
        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((t.objective_value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_objective_with_no_rows_is_fine() {
        let mut t = Tableau::build(&[-1.0, -2.0], vec![]).unwrap();
        run(&mut t).unwrap();
        assert_eq!(vec![0.0, 0.0], t.extract());
        assert_eq!(0.0, t.objective_value());
    }
}
