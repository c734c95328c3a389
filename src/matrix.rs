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

//! This module provides the dense row-major matrix which backs both the
//! equality elimination of the presolve and the simplex tableaux. Problems
//! are small (dozens to low hundreds of variables), so the storage is a flat
//! vector of doubles and every row operation is a straight loop over a
//! contiguous slice.

use crate::CANCELLATION_EPSILON;

/// A dense `width x height` matrix of doubles, stored row major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a zero-filled matrix with the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Matrix {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reads the cell at `(row, col)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.height && col < self.width, "matrix index out of bounds");
        self.data[row * self.width + col]
    }

    /// Writes the cell at `(row, col)`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.height && col < self.width, "matrix index out of bounds");
        self.data[row * self.width + col] = value;
    }

    /// A view on one row, as a contiguous slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.height, "matrix row out of bounds");
        &self.data[row * self.width..(row + 1) * self.width]
    }

    #[inline]
    fn row_mut(&mut self, row: usize) -> &mut [f64] {
        assert!(row < self.height, "matrix row out of bounds");
        &mut self.data[row * self.width..(row + 1) * self.width]
    }

    /// Exchanges rows `a` and `b`.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (a, b) = (a.min(b), a.max(b));
        let (lo, hi) = self.data.split_at_mut(b * self.width);
        lo[a * self.width..(a + 1) * self.width].swap_with_slice(&mut hi[..self.width]);
    }

    /// Multiplies row `row` by `scale`. A scale of exactly 1 is a no-op.
    pub fn scale_row(&mut self, row: usize, scale: f64) {
        if scale == 1.0 {
            return;
        }
        for x in self.row_mut(row) {
            *x *= scale;
        }
    }

    /// Divides row `row` by `divisor`. Division is used rather than a
    /// multiplication by the reciprocal: the quotients are what the pivot
    /// normalization must be exact on.
    pub fn inv_scale_row(&mut self, row: usize, divisor: f64) {
        if divisor == 1.0 {
            return;
        }
        for x in self.row_mut(row) {
            *x /= divisor;
        }
    }

    /// `dst += src * scale`, element wise.
    pub fn reduce(&mut self, dst: usize, src: usize, scale: f64) {
        assert!(dst != src, "reduce requires two distinct rows");
        assert!(dst < self.height && src < self.height, "matrix row out of bounds");
        let src_at = src * self.width;
        let dst_at = dst * self.width;
        for c in 0..self.width {
            self.data[dst_at + c] += self.data[src_at + c] * scale;
        }
    }

    /// `dst -= src * dst[pivot_col]`, element wise, with the cancellation
    /// truncation applied to every difference. `src[pivot_col]` is expected
    /// to be 1, so the pivot column of `dst` comes out exactly zero.
    pub fn scale_reduce(&mut self, dst: usize, src: usize, pivot_col: usize) {
        assert!(dst != src, "scale_reduce requires two distinct rows");
        assert!(dst < self.height && src < self.height, "matrix row out of bounds");
        let factor = self.get(dst, pivot_col);
        if factor == 0.0 {
            return;
        }
        let src_at = src * self.width;
        let dst_at = dst * self.width;
        for c in 0..self.width {
            let d = self.data[dst_at + c];
            let s = self.data[src_at + c] * factor;
            self.data[dst_at + c] = cancel_sub(d, s);
        }
    }
}

/// Computes `d - s`, truncating the result to an exact zero when it is both
/// absolutely and relatively below [`CANCELLATION_EPSILON`]. Without the
/// truncation, big-M mass leaves residuals in pivoted rows and those poison
/// every subsequent pivot.
#[inline]
pub fn cancel_sub(d: f64, s: f64) -> f64 {
    let r = d - s;
    if r.abs() < CANCELLATION_EPSILON && r.abs() / (d.abs() + s.abs()) < CANCELLATION_EPSILON {
        0.0
    } else {
        r
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
