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

//! This module provides the solver driver: it turns the reduced resource
//! graph into a linear problem, maximizes the operator-weighted throughput,
//! and distributes the logical rates back onto the physical inventories and
//! converters of the snapshot.
//!
//! The emitted variables are the utilization of each logical converter (in
//! `[0, 1]`), one non-negative flow share per inventory of a multi-inventory
//! route, and the binary choice variable behind every required-resource
//! disjunction. Inventory rates are never variables of their own: each
//! logical inventory accumulates two equations over the converter variables,
//! its net rate and the net rate excluding dumpable production, and the
//! boundary constraints are expressed directly on those.

use tracing::debug_span;

use crate::adjacency::BitSetIter;
use crate::cutoff::{Cutoff, NoCutoff};
use crate::graph::snapshot::{ConstraintKind, ProcessorSnapshot, RequiredState, SolverSolution};
use crate::graph::{LogicalInventory, ResourceGraph};
use crate::model::{LinearConstraint, LinearEquation, LinearProblem, LinearSolution};
use crate::{
    SolverError, Variable, DISAGGREGATION_ABSOLUTE_EPSILON, DISAGGREGATION_RELATIVE_EPSILON,
};

/// Computes the utilization of every converter and the net rate of every
/// inventory of the snapshot, maximizing the priority-weighted throughput
/// of the vessel. The solve is self-contained and CPU-bound; two solves on
/// the same snapshot produce the same solution.
pub fn compute_rates(snapshot: &ProcessorSnapshot) -> Result<SolverSolution, SolverError> {
    compute_rates_with_cutoff(snapshot, &NoCutoff)
}

/// Same as [`compute_rates`], with a cancellation token polled between
/// branch-and-bound iterations. When the cutoff trips, the best solution
/// found so far is returned; if none was found yet the problem is reported
/// unsolvable.
pub fn compute_rates_with_cutoff(
    snapshot: &ProcessorSnapshot,
    cutoff: &dyn Cutoff,
) -> Result<SolverSolution, SolverError> {
    let _span = debug_span!("compute_rates").entered();
    let mut graph = ResourceGraph::build(snapshot)?;
    graph.merge_equivalent_inventories();
    graph.merge_equivalent_converters()?;

    let (mut emission, objective) = Emission::emit(&graph)?;
    let solution = emission.problem.maximize(objective, cutoff)?;
    Ok(disaggregate(snapshot, &graph, &emission, &solution))
}

/// The linear problem emitted for one reduced graph, along with everything
/// needed to read rates back out of its solution.
struct Emission {
    problem: LinearProblem,
    /// Utilization variable per logical converter (alive converters only).
    alphas: Vec<Option<Variable>>,
    /// Net-rate equation per logical inventory.
    i_rates: Vec<LinearEquation>,
    /// Net rate excluding dumpable production, used by the full-inventory
    /// constraint.
    d_rates: Vec<LinearEquation>,
    /// Whether any dumpable output routes into the inventory.
    has_dump_producer: Vec<bool>,
}

impl Emission {
    fn emit(graph: &ResourceGraph) -> Result<(Emission, LinearEquation), SolverError> {
        let _span = debug_span!("emit").entered();
        let n_inv = graph.inventories.len();
        let mut emission = Emission {
            problem: LinearProblem::new(),
            alphas: vec![None; graph.converters.len()],
            i_rates: vec![LinearEquation::new(); n_inv],
            d_rates: vec![LinearEquation::new(); n_inv],
            has_dump_producer: vec![false; n_inv],
        };
        let mut objective = LinearEquation::new();

        // first pass: utilizations and routing; this fully accumulates the
        // per-inventory rate equations
        for (c, conv) in graph.converters.iter().enumerate() {
            if !conv.alive {
                continue;
            }
            let alpha = emission.problem.create_variable();
            emission.alphas[c] = Some(alpha);
            emission
                .problem
                .add_constraint(LinearConstraint::less_equal(LinearEquation::term(alpha, 1.0), 1.0))?;
            objective.add(alpha, conv.weight);

            for (resource, rate) in sorted(conv.inputs.iter().map(|(k, v)| (k, *v))) {
                emission.route_input(graph, c, alpha, resource, rate)?;
            }
            for (resource, out) in sorted(conv.outputs.iter().map(|(k, v)| (k, *v))) {
                emission.route_output(graph, c, alpha, resource, out.rate, out.dump_excess)?;
            }
        }

        // second pass: required-resource disjunctions, over the completed
        // rate equations
        for (c, conv) in graph.converters.iter().enumerate() {
            let Some(alpha) = emission.alphas[c] else { continue };
            let boundary = conv
                .required
                .iter()
                .filter(|(_, r)| r.state == RequiredState::Boundary)
                .map(|(k, v)| (k, *v));
            for (resource, req) in sorted(boundary) {
                let connected = connected(graph, &graph.constraint, c, resource);
                if connected.is_empty() {
                    // nothing reachable holds the resource: the predicate is
                    // trivially a sum over nothing
                    continue;
                }
                let mut total = LinearEquation::new();
                for i in connected {
                    total.add_scaled(&emission.i_rates[i], 1.0);
                }
                let sign = match req.kind {
                    ConstraintKind::AtLeast => 1.0,
                    ConstraintKind::AtMost => -1.0,
                };
                total.scale(sign);
                let idle = LinearConstraint::less_equal(LinearEquation::term(alpha, 1.0), 0.0);
                let holding = LinearConstraint::greater_equal(total, 0.0);
                emission.problem.add_or_constraint(idle, holding)?;
            }
        }

        // third pass: container boundaries
        for (i, inv) in graph.inventories.iter().enumerate() {
            if !inv.alive {
                continue;
            }
            if inv.zero_sized() && !emission.has_dump_producer[i] {
                let rate = emission.i_rates[i].clone();
                emission.problem.add_constraint(LinearConstraint::equal(rate, 0.0))?;
                continue;
            }
            if inv.full {
                let rate = emission.d_rates[i].clone();
                emission.problem.add_constraint(LinearConstraint::less_equal(rate, 0.0))?;
            }
            if inv.empty {
                let rate = emission.i_rates[i].clone();
                emission.problem.add_constraint(LinearConstraint::greater_equal(rate, 0.0))?;
            }
        }

        Ok((emission, objective))
    }

    /// Routes one consumed resource: the draw is split over the pull-connected
    /// inventories holding it, or the converter is starved when there is none.
    fn route_input(
        &mut self,
        graph: &ResourceGraph,
        c: usize,
        alpha: Variable,
        resource: &str,
        rate: f64,
    ) -> Result<(), SolverError> {
        let connected = connected(graph, &graph.pull, c, resource);
        match connected.len() {
            0 => self
                .problem
                .add_constraint(LinearConstraint::equal(LinearEquation::term(alpha, 1.0), 0.0)),
            1 => {
                let i = connected[0];
                self.i_rates[i].add(alpha, -rate);
                self.d_rates[i].add(alpha, -rate);
                Ok(())
            }
            _ => {
                let flows = self.problem.create_variables(connected.len());
                let mut sum = LinearEquation::new();
                for f in flows.iter() {
                    sum.add(f, 1.0);
                }
                sum.add(alpha, -rate);
                self.problem.add_constraint(LinearConstraint::equal(sum, 0.0))?;
                for (f, i) in flows.iter().zip(connected) {
                    self.i_rates[i].add(f, -1.0);
                    self.d_rates[i].add(f, -1.0);
                }
                Ok(())
            }
        }
    }

    /// Routes one produced resource, the mirror image of [`route_input`]. A
    /// production with nowhere to go either pins the converter (the mass may
    /// not vanish) or is dumped.
    fn route_output(
        &mut self,
        graph: &ResourceGraph,
        c: usize,
        alpha: Variable,
        resource: &str,
        rate: f64,
        dump_excess: bool,
    ) -> Result<(), SolverError> {
        let connected = connected(graph, &graph.push, c, resource);
        match connected.len() {
            0 => {
                if dump_excess {
                    return Ok(());
                }
                self.problem
                    .add_constraint(LinearConstraint::equal(LinearEquation::term(alpha, rate), 0.0))
            }
            1 => {
                let i = connected[0];
                self.i_rates[i].add(alpha, rate);
                if dump_excess {
                    self.has_dump_producer[i] = true;
                } else {
                    self.d_rates[i].add(alpha, rate);
                }
                Ok(())
            }
            _ => {
                let flows = self.problem.create_variables(connected.len());
                let mut sum = LinearEquation::new();
                for f in flows.iter() {
                    sum.add(f, 1.0);
                }
                sum.add(alpha, -rate);
                self.problem.add_constraint(LinearConstraint::equal(sum, 0.0))?;
                for (f, i) in flows.iter().zip(connected) {
                    self.i_rates[i].add(f, 1.0);
                    if dump_excess {
                        self.has_dump_producer[i] = true;
                    } else {
                        self.d_rates[i].add(f, 1.0);
                    }
                }
                Ok(())
            }
        }
    }

}

/// The logical inventories holding `resource` that are linked to converter
/// `c` through the given edge kind, in ascending id order.
fn connected(
    graph: &ResourceGraph,
    edges: &crate::adjacency::AdjacencyMatrix,
    c: usize,
    resource: &str,
) -> Vec<usize> {
    BitSetIter::new(edges.row(c))
        .filter(|&i| graph.inventories[i].alive && graph.inventories[i].resource_name == resource)
        .collect()
}

fn sorted<'a, T>(entries: impl Iterator<Item = (&'a String, T)>) -> Vec<(&'a str, T)> {
    let mut entries = entries.map(|(k, v)| (k.as_str(), v)).collect::<Vec<_>>();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Distributes the logical solution back onto the physical ids of the
/// snapshot. Inventory rates are shared among the members of each logical
/// inventory in proportion to what they can actually absorb or provide;
/// converter utilizations are shared identically by every member.
fn disaggregate(
    snapshot: &ProcessorSnapshot,
    graph: &ResourceGraph,
    emission: &Emission,
    solution: &LinearSolution,
) -> SolverSolution {
    let _span = debug_span!("disaggregate").entered();
    let values = solution.values();
    let magnitude: f64 = values.iter().map(|v| v.abs()).sum();

    let mut inventory_rates = vec![0.0; snapshot.inventories.len()];
    for (i, inv) in graph.inventories.iter().enumerate() {
        if !inv.alive {
            continue;
        }
        let rate = truncate(emission.i_rates[i].evaluate(values), magnitude);
        distribute(rate, inv, snapshot, &mut inventory_rates);
    }

    let mut converter_rates = vec![0.0; snapshot.converters.len()];
    for (c, conv) in graph.converters.iter().enumerate() {
        let Some(alpha) = emission.alphas[c] else { continue };
        let utilization = solution.value(alpha);
        for &member in conv.members.iter() {
            converter_rates[member] = utilization;
        }
    }

    SolverSolution { inventory_rates, converter_rates }
}

/// Drops round-off noise from a logical rate: anything below the absolute
/// epsilon goes, and rates below the relative epsilon go too unless they are
/// a genuine small flow (large relative to the overall solution magnitude).
fn truncate(rate: f64, magnitude: f64) -> f64 {
    if rate.abs() < DISAGGREGATION_ABSOLUTE_EPSILON {
        return 0.0;
    }
    if rate.abs() < DISAGGREGATION_RELATIVE_EPSILON
        && (magnitude == 0.0 || rate.abs() / magnitude < DISAGGREGATION_RELATIVE_EPSILON)
    {
        return 0.0;
    }
    rate
}

/// Splits one logical rate over the member inventories: a draw is weighted
/// by each member's current amount, a fill by its remaining headroom. Empty
/// members take no part of a draw and full members take no part of a fill;
/// when nobody can take anything the rate vanishes entirely (that mass was
/// dumped).
fn distribute(rate: f64, inv: &LogicalInventory, snapshot: &ProcessorSnapshot, out: &mut [f64]) {
    if rate == 0.0 {
        return;
    }
    let weights = inv
        .members
        .iter()
        .map(|&m| {
            let phys = &snapshot.inventories[m];
            if rate < 0.0 {
                if phys.empty {
                    0.0
                } else {
                    phys.amount
                }
            } else if phys.full {
                0.0
            } else {
                phys.max_amount - phys.amount
            }
        })
        .collect::<Vec<_>>();
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return;
    }
    for (&m, weight) in inv.members.iter().zip(weights) {
        out[m] = rate * weight / total;
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_solver {
    use crate::graph::snapshot::*;
    use crate::{compute_rates, SolverError};

    fn single(resource: &str, amount: f64, max_amount: f64) -> InventorySnapshot {
        InventorySnapshot::new(resource, amount, max_amount)
    }

    fn producer(resource: &str, rate: f64, dump_excess: bool, push: &[usize]) -> ConverterSnapshot {
        let mut conv = ConverterSnapshot::default();
        conv.outputs.insert(resource.to_string(), OutputRate { rate, dump_excess });
        conv.push = push.iter().copied().collect();
        conv
    }

    #[test]
    fn producer_into_open_inventory_runs_flat_out() {
        let snapshot = ProcessorSnapshot {
            inventories: vec![single("EC", 50.0, 100.0)],
            converters: vec![producer("EC", 1.0, false, &[0])],
        };
        let solution = compute_rates(&snapshot).unwrap();
        assert_eq!(vec![1.0], solution.converter_rates);
        assert_eq!(vec![1.0], solution.inventory_rates);
    }

    #[test]
    fn starved_input_pins_the_converter_to_zero() {
        let mut conv = ConverterSnapshot::default();
        conv.inputs.insert("LF".to_string(), InputRate { rate: 1.0 });
        conv.outputs.insert("EC".to_string(), OutputRate { rate: 5.0, dump_excess: false });
        conv.push.insert(0);
        // no pull edge at all: the LF draw cannot be routed
        let snapshot = ProcessorSnapshot {
            inventories: vec![single("EC", 0.0, 100.0)],
            converters: vec![conv],
        };
        let solution = compute_rates(&snapshot).unwrap();
        assert_eq!(vec![0.0], solution.converter_rates);
        assert_eq!(vec![0.0], solution.inventory_rates);
    }

    #[test]
    fn output_with_nowhere_to_go_pins_the_converter_unless_dumped() {
        let pinned = ProcessorSnapshot {
            inventories: vec![],
            converters: vec![producer("EC", 1.0, false, &[])],
        };
        let solution = compute_rates(&pinned).unwrap();
        assert_eq!(vec![0.0], solution.converter_rates);

        let dumping = ProcessorSnapshot {
            inventories: vec![],
            converters: vec![producer("EC", 1.0, true, &[])],
        };
        let solution = compute_rates(&dumping).unwrap();
        assert_eq!(vec![1.0], solution.converter_rates);
    }

    #[test]
    fn draw_is_split_between_two_sources_by_amount() {
        // one consumer pulling 1.0 LF from two half-full tanks of different
        // sizes: the logical draw splits 2:1 along the current amounts
        let mut conv = ConverterSnapshot::default();
        conv.inputs.insert("LF".to_string(), InputRate { rate: 1.0 });
        conv.pull.extend([0, 1]);
        let snapshot = ProcessorSnapshot {
            inventories: vec![single("LF", 100.0, 200.0), single("LF", 50.0, 100.0)],
            converters: vec![conv],
        };
        let solution = compute_rates(&snapshot).unwrap();
        assert_eq!(vec![1.0], solution.converter_rates);
        let rates = &solution.inventory_rates;
        assert!((rates[0] + rates[1] + 1.0).abs() < 1e-6, "conservation: {rates:?}");
        assert!((rates[0] - 2.0 * rates[1]).abs() < 1e-6, "2:1 split: {rates:?}");
    }

    #[test]
    fn disabled_converters_contribute_nothing() {
        let mut conv = producer("EC", 1.0, false, &[0]);
        conv.required.insert(
            "LF".to_string(),
            RequiredResource {
                amount: 10.0,
                kind: ConstraintKind::AtLeast,
                state: RequiredState::Disabled,
            },
        );
        let snapshot = ProcessorSnapshot {
            inventories: vec![single("EC", 50.0, 100.0)],
            converters: vec![conv],
        };
        let solution = compute_rates(&snapshot).unwrap();
        assert_eq!(vec![0.0], solution.converter_rates);
        assert_eq!(vec![0.0], solution.inventory_rates);
    }

    #[test]
    fn nan_rates_are_rejected() {
        let snapshot = ProcessorSnapshot {
            inventories: vec![single("EC", 50.0, 100.0)],
            converters: vec![producer("EC", f64::NAN, false, &[0])],
        };
        assert!(matches!(
            compute_rates(&snapshot),
            Err(SolverError::InvalidCoefficient { .. })
        ));
    }

    #[test]
    fn empty_snapshot_solves_to_nothing() {
        let solution = compute_rates(&ProcessorSnapshot::default()).unwrap();
        assert!(solution.inventory_rates.is_empty());
        assert!(solution.converter_rates.is_empty());
    }
}
