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

//! End-to-end scenarios: literal snapshots with known expected rates.

use resflow::*;

fn inventory(resource: &str, amount: f64, max_amount: f64) -> InventorySnapshot {
    InventorySnapshot::new(resource, amount, max_amount)
}

fn producer(resource: &str, rate: f64, dump_excess: bool, push: &[usize]) -> ConverterSnapshot {
    let mut conv = ConverterSnapshot::default();
    conv.outputs.insert(resource.to_string(), OutputRate { rate, dump_excess });
    conv.push = push.iter().copied().collect();
    conv
}

fn consumer(resource: &str, rate: f64, pull: &[usize]) -> ConverterSnapshot {
    let mut conv = ConverterSnapshot::default();
    conv.inputs.insert(resource.to_string(), InputRate { rate });
    conv.pull = pull.iter().copied().collect();
    conv
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn solar_panel_charges_a_half_full_battery() {
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 50.0, 100.0)],
        converters: vec![producer("ElectricCharge", 1.0, false, &[0])],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
    assert_eq!(vec![1.0], solution.inventory_rates);
}

#[test]
fn full_battery_with_dumping_keeps_the_panel_running() {
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 100.0, 100.0)],
        converters: vec![producer("ElectricCharge", 1.0, true, &[0])],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
    assert_eq!(vec![0.0], solution.inventory_rates);
}

#[test]
fn full_battery_without_dumping_stops_the_panel() {
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 100.0, 100.0)],
        converters: vec![producer("ElectricCharge", 1.0, false, &[0])],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![0.0], solution.converter_rates);
    assert_eq!(vec![0.0], solution.inventory_rates);
}

#[test]
fn fuel_cell_burns_both_propellants_to_charge() {
    let mut cell = ConverterSnapshot::default();
    cell.inputs.insert("LiquidFuel".to_string(), InputRate { rate: 0.9 });
    cell.inputs.insert("Oxidizer".to_string(), InputRate { rate: 1.1 });
    cell.outputs
        .insert("ElectricCharge".to_string(), OutputRate { rate: 18.0, dump_excess: false });
    cell.pull.extend([0, 1]);
    cell.push.insert(2);
    let snapshot = ProcessorSnapshot {
        inventories: vec![
            inventory("LiquidFuel", 100.0, 100.0),
            inventory("Oxidizer", 50.0, 50.0),
            inventory("ElectricCharge", 0.0, 100.0),
        ],
        converters: vec![cell],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
    assert_eq!(vec![-0.9, -1.1, 18.0], solution.inventory_rates);
}

#[test]
fn twin_batteries_split_the_charge_evenly() {
    let snapshot = ProcessorSnapshot {
        inventories: vec![
            inventory("ElectricCharge", 50.0, 100.0),
            inventory("ElectricCharge", 50.0, 100.0),
        ],
        converters: vec![producer("ElectricCharge", 1.0, false, &[0, 1])],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
    assert_eq!(vec![0.5, 0.5], solution.inventory_rates);
}

#[test]
fn required_resource_without_producer_forces_idle() {
    let mut cell = consumer("LiquidFuel", 1.0, &[0]);
    cell.outputs
        .insert("ElectricCharge".to_string(), OutputRate { rate: 10.0, dump_excess: false });
    cell.push.insert(1);
    cell.constraint.insert(0);
    cell.required.insert(
        "LiquidFuel".to_string(),
        RequiredResource {
            amount: 0.0,
            kind: ConstraintKind::AtLeast,
            state: RequiredState::Boundary,
        },
    );
    let snapshot = ProcessorSnapshot {
        inventories: vec![
            inventory("LiquidFuel", 50.0, 100.0),
            inventory("ElectricCharge", 0.0, 100.0),
        ],
        converters: vec![cell],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![0.0], solution.converter_rates);
    assert_eq!(vec![0.0, 0.0], solution.inventory_rates);
}

#[test]
fn required_resource_with_a_producer_keeps_running() {
    // a refinery replenishes LiquidFuel faster than the cell burns it, so
    // the net-rate predicate holds with both devices at full utilization
    let refinery = producer("LiquidFuel", 2.0, false, &[0]);
    let mut cell = consumer("LiquidFuel", 1.0, &[0]);
    cell.outputs
        .insert("ElectricCharge".to_string(), OutputRate { rate: 10.0, dump_excess: false });
    cell.push.insert(1);
    cell.constraint.insert(0);
    cell.required.insert(
        "LiquidFuel".to_string(),
        RequiredResource {
            amount: 0.0,
            kind: ConstraintKind::AtLeast,
            state: RequiredState::Boundary,
        },
    );
    let snapshot = ProcessorSnapshot {
        inventories: vec![
            inventory("LiquidFuel", 50.0, 100.0),
            inventory("ElectricCharge", 0.0, 100.0),
        ],
        converters: vec![refinery, cell],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0, 1.0], solution.converter_rates);
    assert!(close(solution.inventory_rates[0], 1.0), "{:?}", solution.inventory_rates);
    assert!(close(solution.inventory_rates[1], 10.0), "{:?}", solution.inventory_rates);
}

#[test]
fn at_most_predicate_mirrors_at_least() {
    // a scrubber may only run while the tank's net rate is non-positive;
    // nothing produces into the tank, so draining is fine
    let mut scrubber = consumer("CarbonDioxide", 1.0, &[0]);
    scrubber.constraint.insert(0);
    scrubber.required.insert(
        "CarbonDioxide".to_string(),
        RequiredResource {
            amount: 0.0,
            kind: ConstraintKind::AtMost,
            state: RequiredState::Boundary,
        },
    );
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("CarbonDioxide", 50.0, 100.0)],
        converters: vec![scrubber],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
    assert_eq!(vec![-1.0], solution.inventory_rates);
}

#[test]
fn unreachable_required_resource_is_no_constraint() {
    // the required entry names a resource no constraint edge can reach: the
    // predicate is a sum over nothing and must not hold the converter back
    let mut panel = producer("ElectricCharge", 1.0, false, &[0]);
    panel.required.insert(
        "Sunlight".to_string(),
        RequiredResource {
            amount: 0.0,
            kind: ConstraintKind::AtLeast,
            state: RequiredState::Boundary,
        },
    );
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 50.0, 100.0)],
        converters: vec![panel],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0], solution.converter_rates);
}

#[test]
fn zero_sized_inventory_without_dumping_blocks_flow() {
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 0.0, 0.0)],
        converters: vec![producer("ElectricCharge", 1.0, false, &[0])],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![0.0], solution.converter_rates);
    assert_eq!(vec![0.0], solution.inventory_rates);
}

#[test]
fn empty_tank_limits_consumption_to_production() {
    // the battery is empty: consumers can only draw what the panel feeds in
    let panel = producer("ElectricCharge", 1.0, false, &[0]);
    let light = consumer("ElectricCharge", 4.0, &[0]);
    let snapshot = ProcessorSnapshot {
        inventories: vec![inventory("ElectricCharge", 0.0, 100.0)],
        converters: vec![panel, light],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(1.0, solution.converter_rates[0]);
    assert!(close(solution.converter_rates[1], 0.25), "{:?}", solution.converter_rates);
    assert!(close(solution.inventory_rates[0], 0.0), "{:?}", solution.inventory_rates);
}

#[test]
fn draw_splits_across_distinct_tanks_through_flow_shares() {
    // the two tanks have different edge sets (a transfer pump touches only
    // the second), so they stay distinct and the draw is split by the solver
    let mut engine = ConverterSnapshot::default();
    engine.inputs.insert("LiquidFuel".to_string(), InputRate { rate: 2.0 });
    engine.pull.extend([0, 1]);
    let pump = consumer("LiquidFuel", 0.0, &[1]);
    let snapshot = ProcessorSnapshot {
        inventories: vec![
            inventory("LiquidFuel", 100.0, 100.0),
            inventory("LiquidFuel", 100.0, 100.0),
        ],
        converters: vec![engine, pump],
    };
    let solution = compute_rates(&snapshot).unwrap();
    assert_eq!(vec![1.0, 1.0], solution.converter_rates);
    let rates = &solution.inventory_rates;
    assert!(close(rates[0] + rates[1], -2.0), "conservation: {rates:?}");
    assert!(rates[0] <= 1e-6 && rates[1] <= 1e-6, "no tank may fill: {rates:?}");
}
