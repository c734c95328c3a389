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

//! This module provides the resource graph: the bipartite structure linking
//! logical converters to logical inventories through the pull, push and
//! constraint edges. The graph starts as a one-to-one image of the snapshot
//! and is then reduced by collapsing structurally equivalent nodes, which
//! routinely shrinks the emitted problem by orders of magnitude on vessels
//! built from many identical parts.

pub mod snapshot;

use bitset_fixed::BitSet;
use fxhash::FxHashMap;
use tracing::{debug, debug_span, trace};

use crate::adjacency::{tail_set, AdjacencyMatrix, BitSetIter};
use crate::{SolverError, WEIGHT_BASE};

use snapshot::{OutputRate, ProcessorSnapshot, RequiredResource, RequiredState};

/// A merger of physical inventories holding the same resource through
/// identical edge sets. Until the merge sweep runs, every logical inventory
/// is a singleton.
#[derive(Debug, Clone)]
pub(crate) struct LogicalInventory {
    pub resource_name: String,
    pub amount: f64,
    pub max_amount: f64,
    /// Boundary flags; merging AND-combines them, so a merged inventory is
    /// only full (resp. empty) when every member is.
    pub full: bool,
    pub empty: bool,
    /// The physical inventory ids this logical node stands for.
    pub members: Vec<usize>,
    pub alive: bool,
}

impl LogicalInventory {
    pub fn zero_sized(&self) -> bool {
        self.max_amount == 0.0
    }
}

/// A merger of physical converters with identical edge sets and mergeable
/// contents. Rates and weights add up; the utilization computed for the
/// logical converter is shared by every member.
#[derive(Debug, Clone)]
pub(crate) struct LogicalConverter {
    /// Objective weight, `WEIGHT_BASE^priority` summed over the members.
    pub weight: f64,
    /// Consumed resource -> rate at full utilization (summed over members).
    pub inputs: FxHashMap<String, f64>,
    /// Produced resource -> rate and dump flag (rates summed over members).
    pub outputs: FxHashMap<String, OutputRate>,
    /// The full required-resource map; only `Boundary` entries constrain the
    /// model, but merging compares the maps in their entirety.
    pub required: FxHashMap<String, RequiredResource>,
    /// The physical converter ids this logical node stands for.
    pub members: Vec<usize>,
    pub alive: bool,
}

/// The reduced bipartite converter/inventory graph of one snapshot.
pub(crate) struct ResourceGraph {
    pub inventories: Vec<LogicalInventory>,
    pub converters: Vec<LogicalConverter>,
    pub pull: AdjacencyMatrix,
    pub push: AdjacencyMatrix,
    pub constraint: AdjacencyMatrix,
}

impl ResourceGraph {
    /// Builds the graph from a snapshot. Every inventory becomes a singleton
    /// logical inventory. A converter with a `Disabled` required entry can
    /// never run and is dropped here; one with a `Boundary` entry gets its
    /// constraint edges recorded as active; `Enabled` entries need no edge.
    pub fn build(snapshot: &ProcessorSnapshot) -> Result<Self, SolverError> {
        let _span = debug_span!("build_graph").entered();
        validate(snapshot)?;

        let n_inv = snapshot.inventories.len();
        let inventories = snapshot
            .inventories
            .iter()
            .enumerate()
            .map(|(id, inv)| LogicalInventory {
                resource_name: inv.resource_name.clone(),
                amount: inv.amount,
                max_amount: inv.max_amount,
                full: inv.full,
                empty: inv.empty,
                members: vec![id],
                alive: true,
            })
            .collect::<Vec<_>>();

        let mut converters = Vec::new();
        let mut kept = Vec::new();
        for (id, conv) in snapshot.converters.iter().enumerate() {
            if conv.required.values().any(|r| r.state == RequiredState::Disabled) {
                trace!(converter = id, "dropped: disabled required resource");
                continue;
            }
            converters.push(LogicalConverter {
                weight: priority_weight(conv.priority),
                inputs: conv.inputs.iter().map(|(k, v)| (k.clone(), v.rate)).collect(),
                outputs: conv.outputs.clone(),
                required: conv.required.clone(),
                members: vec![id],
                alive: true,
            });
            kept.push(id);
        }

        let n_conv = converters.len();
        let mut pull = AdjacencyMatrix::new(n_conv, n_inv);
        let mut push = AdjacencyMatrix::new(n_conv, n_inv);
        let mut constraint = AdjacencyMatrix::new(n_conv, n_inv);
        for (row, id) in kept.into_iter().enumerate() {
            let conv = &snapshot.converters[id];
            for &i in conv.pull.iter() {
                debug_assert!(i < n_inv, "pull edge out of range");
                if i < n_inv {
                    pull.set(row, i);
                }
            }
            for &i in conv.push.iter() {
                debug_assert!(i < n_inv, "push edge out of range");
                if i < n_inv {
                    push.set(row, i);
                }
            }
            let active = conv.required.values().any(|r| r.state == RequiredState::Boundary);
            if active {
                for &i in conv.constraint.iter() {
                    debug_assert!(i < n_inv, "constraint edge out of range");
                    if i < n_inv {
                        constraint.set(row, i);
                    }
                }
            }
        }

        Ok(ResourceGraph { inventories, converters, pull, push, constraint })
    }

    /// Collapses the inventories holding the same resource through identical
    /// pull, push and constraint columns. Amounts add up, boundary flags
    /// AND-combine, and the columns of every absorbed inventory are cleared
    /// from all three matrices once the sweep is over.
    pub fn merge_equivalent_inventories(&mut self) {
        let _span = debug_span!("merge_inventories").entered();
        let n = self.inventories.len();
        let mut removed = BitSet::new(n);
        for i in 0..n {
            if removed[i] {
                continue;
            }
            let mut candidates = tail_set(n, i + 1);
            for j in BitSetIter::new(&removed).collect::<Vec<_>>() {
                candidates.set(j, false);
            }
            self.pull.remove_unequal_columns(&mut candidates, i);
            self.push.remove_unequal_columns(&mut candidates, i);
            self.constraint.remove_unequal_columns(&mut candidates, i);

            for j in BitSetIter::new(&candidates).collect::<Vec<_>>() {
                if self.inventories[j].resource_name != self.inventories[i].resource_name {
                    continue;
                }
                trace!(kept = i, absorbed = j, "inventories merged");
                let (head, tail) = self.inventories.split_at_mut(j);
                let kept = &mut head[i];
                let gone = &mut tail[0];
                kept.amount += gone.amount;
                kept.max_amount += gone.max_amount;
                kept.full &= gone.full;
                kept.empty &= gone.empty;
                kept.members.append(&mut gone.members);
                gone.alive = false;
                removed.set(j, true);
            }
        }
        self.pull.remove_columns(&removed);
        self.push.remove_columns(&removed);
        self.constraint.remove_columns(&removed);
        debug!(
            physical = n,
            logical = self.inventories.iter().filter(|i| i.alive).count(),
            "inventory merge done"
        );
    }

    /// Collapses the converters with identical rows in all three matrices
    /// and mergeable contents: matching input/output key sets (with matching
    /// dump flags) and element-wise equal required maps. Rates add pair
    /// wise; the rows of every absorbed converter are zeroed.
    pub fn merge_equivalent_converters(&mut self) -> Result<(), SolverError> {
        let _span = debug_span!("merge_converters").entered();
        let n = self.converters.len();
        for c in 0..n {
            if !self.converters[c].alive {
                continue;
            }
            for d in c + 1..n {
                if !self.converters[d].alive {
                    continue;
                }
                if !self.pull.rows_equal(c, d)
                    || !self.push.rows_equal(c, d)
                    || !self.constraint.rows_equal(c, d)
                {
                    continue;
                }
                let (head, tail) = self.converters.split_at_mut(d);
                let kept = &mut head[c];
                let gone = &mut tail[0];
                if !can_merge(kept, gone) {
                    continue;
                }
                trace!(kept = c, absorbed = d, "converters merged");
                merge_into(kept, gone)?;
                gone.alive = false;
                self.pull.clear_row(d);
                self.push.clear_row(d);
                self.constraint.clear_row(d);
            }
        }
        debug!(
            physical = n,
            logical = self.converters.iter().filter(|c| c.alive).count(),
            "converter merge done"
        );
        Ok(())
    }
}

/// The objective weight of one converter, `WEIGHT_BASE^priority` clamped to
/// `[1e-6, 1e6]` so a rogue priority cannot wreck the tableau conditioning.
fn priority_weight(priority: i32) -> f64 {
    WEIGHT_BASE.powi(priority).clamp(1e-6, 1e6)
}

/// Two converters may merge when their input/output key sets coincide (with
/// identical dump flags on the outputs) and their required maps are equal
/// element wise.
fn can_merge(a: &LogicalConverter, b: &LogicalConverter) -> bool {
    a.inputs.len() == b.inputs.len()
        && a.inputs.keys().all(|k| b.inputs.contains_key(k))
        && a.outputs.len() == b.outputs.len()
        && a.outputs.iter().all(|(k, out)| {
            b.outputs.get(k).map_or(false, |other| other.dump_excess == out.dump_excess)
        })
        && a.required == b.required
}

fn merge_into(kept: &mut LogicalConverter, gone: &LogicalConverter) -> Result<(), SolverError> {
    kept.weight += gone.weight;
    for (resource, rate) in gone.inputs.iter() {
        let slot = kept.inputs.get_mut(resource).ok_or_else(|| SolverError::InvalidMerge {
            reason: format!("no matching input for {resource}"),
        })?;
        *slot += rate;
    }
    for (resource, out) in gone.outputs.iter() {
        let slot = kept.outputs.get_mut(resource).ok_or_else(|| SolverError::InvalidMerge {
            reason: format!("no matching output for {resource}"),
        })?;
        if slot.dump_excess != out.dump_excess {
            return Err(SolverError::InvalidMerge {
                reason: format!("conflicting dump flags on {resource}"),
            });
        }
        slot.rate += out.rate;
    }
    kept.members.extend(gone.members.iter().copied());
    Ok(())
}

fn validate(snapshot: &ProcessorSnapshot) -> Result<(), SolverError> {
    for inv in snapshot.inventories.iter() {
        for value in [inv.amount, inv.max_amount] {
            if !value.is_finite() {
                return Err(SolverError::invalid(value));
            }
        }
    }
    for conv in snapshot.converters.iter() {
        for rate in conv
            .inputs
            .values()
            .map(|i| i.rate)
            .chain(conv.outputs.values().map(|o| o.rate))
            .chain(conv.required.values().map(|r| r.amount))
        {
            if !rate.is_finite() {
                return Err(SolverError::invalid(rate));
            }
        }
    }
    Ok(())
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
