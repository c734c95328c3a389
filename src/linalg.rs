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

//! This module provides the ordered Gaussian elimination used to reduce the
//! equality rows of a model into substitution records.

use crate::matrix::Matrix;

/// Brings the matrix into an upper-staircase form with strictly increasing
/// pivot columns. For each row in order, the first non-zero entry at or after
/// a running start-column cursor becomes the pivot: the row is normalized by
/// dividing through the pivot, and the pivot column is eliminated from every
/// other row. There are no row swaps; a row with no eligible pivot is simply
/// skipped and left as is.
///
/// The last column is never chosen as a pivot: the caller packs the equality
/// constants there and inspects them afterwards (a leftover row whose first
/// non-zero entry sits in the last column is a degenerate `0 = c` equality).
pub fn gaussian_elimination_ordered(m: &mut Matrix) {
    let width = m.width();
    let height = m.height();
    let mut start_col = 0;
    for row in 0..height {
        let pivot_col = (start_col..width - 1).find(|c| m.get(row, *c) != 0.0);
        let Some(pivot_col) = pivot_col else { continue };
        m.inv_scale_row(row, m.get(row, pivot_col));
        for other in 0..height {
            if other != row {
                m.scale_reduce(other, row, pivot_col);
            }
        }
        start_col = pivot_col + 1;
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_gaussian_elimination {
    use super::gaussian_elimination_ordered;
    use crate::matrix::Matrix;

    fn from_rows(rows: &[&[f64]]) -> Matrix {
        let mut m = Matrix::new(rows[0].len(), rows.len());
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m.set(r, c, *v);
            }
        }
        m
    }

    #[test]
    fn reduces_to_staircase_with_unit_pivots() {
        // x + y = 3 ; x - y = 1  =>  x = 2 ; y = 1
        let mut m = from_rows(&[&[1.0, 1.0, 3.0], &[1.0, -1.0, 1.0]]);
        gaussian_elimination_ordered(&mut m);
        assert_eq!(&[1.0, 0.0, 2.0], m.row(0));
        assert_eq!(&[0.0, 1.0, 1.0], m.row(1));
    }

    #[test]
    fn redundant_rows_collapse_to_zero() {
        let mut m = from_rows(&[&[1.0, 1.0, 3.0], &[2.0, 2.0, 6.0]]);
        gaussian_elimination_ordered(&mut m);
        assert_eq!(&[1.0, 1.0, 3.0], m.row(0));
        assert_eq!(&[0.0, 0.0, 0.0], m.row(1));
    }

    #[test]
    fn contradictory_rows_leave_a_constant_only_row() {
        let mut m = from_rows(&[&[1.0, 1.0, 1.0], &[1.0, 1.0, 2.0]]);
        gaussian_elimination_ordered(&mut m);
        assert_eq!(&[1.0, 1.0, 1.0], m.row(0));
        assert_eq!(&[0.0, 0.0, 1.0], m.row(1));
    }

    #[test]
    fn pivot_columns_strictly_increase() {
        // second row only involves the later variable
        let mut m = from_rows(&[&[0.0, 2.0, 4.0], &[0.0, 1.0, 2.0], &[3.0, 0.0, 6.0]]);
        gaussian_elimination_ordered(&mut m);
        // row 0 pivots on column 1; row 1 collapses; row 2 has no column
        // after the cursor left to pivot on and is skipped untouched
        assert_eq!(&[0.0, 1.0, 2.0], m.row(0));
        assert_eq!(&[0.0, 0.0, 0.0], m.row(1));
        assert_eq!(&[3.0, 0.0, 6.0], m.row(2));
    }

    #[test]
    fn underdetermined_systems_keep_free_columns() {
        // x + y + z = 4 with three unknowns: one pivot, two free columns
        let mut m = from_rows(&[&[2.0, 2.0, 2.0, 8.0]]);
        gaussian_elimination_ordered(&mut m);
        assert_eq!(&[1.0, 1.0, 1.0, 4.0], m.row(0));
    }
}
