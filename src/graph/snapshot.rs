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

//! This module defines the plain-data boundary of the solver: the snapshot a
//! host hands over for one solve, and the per-id rates it gets back. None of
//! these types keeps any reference into the host's world; inventories are
//! designated by their position in the snapshot's inventory array.

use std::collections::BTreeSet;

use derive_builder::Builder;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One resource container: a single resource with a current and a maximum
/// amount, plus the two boundary flags the solver must respect. A zero-sized
/// inventory is both full and empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub resource_name: String,
    pub amount: f64,
    pub max_amount: f64,
    pub full: bool,
    pub empty: bool,
}

impl InventorySnapshot {
    /// Builds an inventory with boundary flags derived from the amounts.
    pub fn new(resource_name: impl Into<String>, amount: f64, max_amount: f64) -> Self {
        InventorySnapshot {
            resource_name: resource_name.into(),
            amount,
            max_amount,
            full: amount >= max_amount,
            empty: amount <= 0.0,
        }
    }
}

/// One consumed resource of a converter, in amount per unit of time at full
/// utilization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRate {
    pub rate: f64,
}

impl From<f64> for InputRate {
    fn from(rate: f64) -> Self {
        InputRate { rate }
    }
}

/// One produced resource of a converter. When `dump_excess` is set, the
/// produced mass may vanish instead of accumulating in a connected inventory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRate {
    pub rate: f64,
    pub dump_excess: bool,
}

/// The direction of a required-resource predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    AtLeast,
    AtMost,
}

/// The state of a required-resource entry, as evaluated by the host against
/// the current inventory totals. A `Disabled` entry keeps its converter from
/// running at all; a `Boundary` entry sits exactly on its threshold and
/// constrains the net rate of the resource; an `Enabled` entry is satisfied
/// with margin and adds nothing to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredState {
    Disabled,
    Boundary,
    Enabled,
}

/// One required-resource entry of a converter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequiredResource {
    pub amount: f64,
    pub kind: ConstraintKind,
    pub state: RequiredState,
}

/// One converter: a device that consumes its inputs and produces its outputs
/// at rates scaled by the utilization the solver computes for it. The
/// `pull`, `push` and `constraint` sets designate the inventories it may
/// draw from, deposit to, and is required-constrained against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default)]
pub struct ConverterSnapshot {
    /// Priority in `[-10, 10]`; converters with a higher priority win the
    /// competition for scarce resources.
    pub priority: i32,
    pub inputs: FxHashMap<String, InputRate>,
    pub outputs: FxHashMap<String, OutputRate>,
    pub required: FxHashMap<String, RequiredResource>,
    pub pull: BTreeSet<usize>,
    pub push: BTreeSet<usize>,
    pub constraint: BTreeSet<usize>,
}

/// The input of one solve: every inventory and converter of a vessel, frozen
/// at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    pub inventories: Vec<InventorySnapshot>,
    pub converters: Vec<ConverterSnapshot>,
}

/// The output of one solve: a net rate of change per physical inventory and
/// a utilization in `[0, 1]` per physical converter, both indexed like the
/// snapshot arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverSolution {
    pub inventory_rates: Vec<f64>,
    pub converter_rates: Vec<f64>,
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
