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

//! # RESFLOW
//! Resflow is the resource-flow solver of a background resource-processing
//! system for vessel simulations. Given a frozen snapshot of a vessel -- its
//! inventories (resource containers with amounts and boundary flags) and its
//! converters (devices consuming and producing resources at configured
//! rates) -- it computes a utilization in `[0, 1]` for every converter and a
//! net rate of change for every inventory, maximizing a priority-weighted
//! throughput objective.
//!
//! The solve obeys:
//! * **conservation**: per resource and logical inventory, what flows in is
//!   what flows out;
//! * **container boundaries**: an empty inventory cannot drain further, a
//!   full one cannot fill further unless its producers may dump excess;
//! * **required resources**: a converter only runs while a predicate on the
//!   net rate of a connected resource holds;
//! * **disjunctive routing**: when an input or output is connected to
//!   several inventories, the solver chooses the split.
//!
//! Internally the pipeline builds a bipartite converter/inventory graph,
//! collapses structurally equivalent nodes, emits a linear problem with one
//! two-armed disjunction per required-resource predicate, presolves it, and
//! solves it by branch-and-bound over the disjunction choices with a dense
//! simplex on every relaxation.
//!
//! ## Quick example
//! A fuel cell burning `LF` and `Ox` to produce `EC`:
//! ```
//! use resflow::*;
//!
//! let mut cell = ConverterSnapshot::default();
//! cell.inputs.insert("LF".to_string(), InputRate { rate: 0.9 });
//! cell.inputs.insert("Ox".to_string(), InputRate { rate: 1.1 });
//! cell.outputs.insert("EC".to_string(), OutputRate { rate: 18.0, dump_excess: false });
//! cell.pull.extend([0, 1]);
//! cell.push.insert(2);
//!
//! let snapshot = ProcessorSnapshot {
//!     inventories: vec![
//!         InventorySnapshot::new("LF", 100.0, 100.0),
//!         InventorySnapshot::new("Ox", 50.0, 50.0),
//!         InventorySnapshot::new("EC", 0.0, 100.0),
//!     ],
//!     converters: vec![cell],
//! };
//!
//! let solution = compute_rates(&snapshot).unwrap();
//! assert_eq!(vec![1.0], solution.converter_rates);
//! assert_eq!(vec![-0.9, -1.1, 18.0], solution.inventory_rates);
//! ```
//!
//! A solve is self-contained: it owns all the memory it allocates, performs
//! no I/O and never suspends. Solves of independent snapshots may run on as
//! many threads as you like. To bound the latency of one solve, hand a
//! [`TimeBudget`] (or any [`Cutoff`] of your own) to
//! [`compute_rates_with_cutoff`].

mod adjacency;
mod branch_bound;
mod common;
mod cutoff;
mod error;
mod graph;
mod linalg;
mod matrix;
mod model;
mod presolve;
mod simplex;
mod solver;

pub use adjacency::{AdjacencyMatrix, BitSetIter};
pub use common::*;
pub use cutoff::*;
pub use error::*;
pub use graph::snapshot::*;
pub use matrix::Matrix;
pub use model::*;
pub use solver::*;
