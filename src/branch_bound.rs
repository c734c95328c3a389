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

//! This module provides the branch-and-bound search over the disjunction
//! choices of a linear problem. Every node of the tree carries one choice
//! per disjunction (unknown, left arm or right arm); the open nodes sit in a
//! priority queue ordered by the score of their parent relaxation (ties are
//! broken towards the deepest node, which gives the exploration its
//! depth-first flavor under a best-bound policy). An unknown disjunction is
//! relaxed into big-M rows; a fixed one contributes its chosen arm as a
//! plain row.

use std::cmp::Ordering;

use binary_heap_plus::BinaryHeap;
use compare::Compare;
use ordered_float::OrderedFloat;
use tracing::{debug_span, trace};

use crate::cutoff::Cutoff;
use crate::model::{LinearEquation, LinearProblem, LinearSolution};
use crate::simplex::{self, Tableau};
use crate::{SolverError, Variable, BIG_M};

/// The branching state of one disjunction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Choice {
    Unknown,
    Left,
    Right,
}

/// An open node of the search tree.
struct Node {
    /// Upper bound inherited from the relaxation of the parent node.
    score: f64,
    /// Index of the next disjunction to branch on.
    depth: usize,
    choices: Vec<Choice>,
}

/// Orders the queue by best bound first, then by greatest depth.
struct NodeOrder;
impl Compare<Node> for NodeOrder {
    fn compare(&self, l: &Node, r: &Node) -> Ordering {
        OrderedFloat(l.score)
            .cmp(&OrderedFloat(r.score))
            .then(l.depth.cmp(&r.depth))
    }
}

/// Searches for the integral assignment of the disjunction choices which
/// maximizes the objective, and reconstructs the full variable assignment of
/// the best one found. When the cutoff trips mid-search, the best incumbent
/// found so far is returned; without any incumbent the problem is reported
/// unsolvable.
pub(crate) fn search(
    problem: &LinearProblem,
    objective: &LinearEquation,
    cutoff: &dyn Cutoff,
) -> Result<LinearSolution, SolverError> {
    let _span = debug_span!("branch_and_bound").entered();
    let n_disjunctions = problem.disjunctions.len();

    let mut queue = BinaryHeap::from_vec_cmp(Vec::new(), NodeOrder);
    queue.push(Node {
        score: f64::NEG_INFINITY,
        depth: 0,
        choices: vec![Choice::Unknown; n_disjunctions],
    });
    let mut best_score: Option<f64> = None;
    let mut best: Option<Vec<f64>> = None;

    while let Some(node) = queue.pop() {
        if cutoff.must_stop() {
            trace!("search interrupted by cutoff");
            break;
        }
        if best_score.is_some_and(|b| node.score <= b) {
            continue;
        }
        // skip over disjunctions that were already fixed by an exact
        // relaxation value
        if node.depth < n_disjunctions && node.choices[node.depth] != Choice::Unknown {
            queue.push(Node { score: node.score, depth: node.depth + 1, choices: node.choices });
            continue;
        }

        let (map, columns) = variable_map(problem, &node.choices);
        let rows = relaxation_rows(problem, &node.choices, &map, columns);
        let objective_row = map_equation(objective, &map, columns);
        let mut tableau = Tableau::build(&objective_row, rows)?;
        match simplex::run(&mut tableau) {
            Ok(()) => (),
            Err(SolverError::UnsolvableProblem) => continue,
            Err(other) => return Err(other),
        }
        let score = tableau.objective_value();
        if best_score.is_some_and(|b| score <= b) {
            continue;
        }
        let values = tableau.extract();

        // a choice variable that relaxed to an exact 0 or 1 costs nothing
        // to fix right away
        let mut choices = node.choices;
        for (i, dis) in problem.disjunctions.iter().enumerate() {
            if choices[i] != Choice::Unknown {
                continue;
            }
            if let Some(col) = map[dis.choice.id()] {
                if values[col] == 0.0 {
                    choices[i] = Choice::Left;
                } else if values[col] == 1.0 {
                    choices[i] = Choice::Right;
                }
            }
        }

        if choices.iter().all(|c| *c != Choice::Unknown) {
            if best_score.map_or(true, |b| score > b) {
                trace!(score, "new incumbent");
                best_score = Some(score);
                best = Some(reconstruct(problem, &map, &values, &choices));
            }
            continue;
        }

        let mut depth = node.depth;
        while depth < n_disjunctions && choices[depth] != Choice::Unknown {
            depth += 1;
        }
        debug_assert!(depth < n_disjunctions);
        let mut left = choices.clone();
        left[depth] = Choice::Left;
        let mut right = choices;
        right[depth] = Choice::Right;
        queue.push(Node { score, depth: depth + 1, choices: left });
        queue.push(Node { score, depth: depth + 1, choices: right });
    }

    match best {
        Some(values) => Ok(LinearSolution::new(values)),
        None => Err(SolverError::UnsolvableProblem),
    }
}

/// Assigns one tableau column to every live variable: presolve-substituted
/// variables have no column, and neither does the choice variable of a fixed
/// disjunction. Columns follow ascending variable id order.
fn variable_map(problem: &LinearProblem, choices: &[Choice]) -> (Vec<Option<usize>>, usize) {
    let n_vars = problem.num_variables();
    let mut excluded = vec![false; n_vars];
    for (i, dis) in problem.disjunctions.iter().enumerate() {
        if choices[i] != Choice::Unknown {
            excluded[dis.choice.id()] = true;
        }
    }
    let mut map = vec![None; n_vars];
    let mut columns = 0;
    for (id, slot) in map.iter_mut().enumerate() {
        if !excluded[id] && !problem.is_substituted(Variable(id)) {
            *slot = Some(columns);
            columns += 1;
        }
    }
    (map, columns)
}

/// Projects an equation onto the tableau columns of the current node.
fn map_equation(equation: &LinearEquation, map: &[Option<usize>], columns: usize) -> Vec<f64> {
    let mut row = vec![0.0; columns];
    for (var, coef) in equation.iter() {
        match map[var.id()] {
            Some(col) => row[col] += coef,
            None => debug_assert!(false, "eliminated variable with a live coefficient"),
        }
    }
    row
}

/// Collects the standardized rows of the relaxation at the given node: the
/// plain `<=` rows, one row per fixed arm, and the big-M triple for every
/// disjunction that is still open.
fn relaxation_rows(
    problem: &LinearProblem,
    choices: &[Choice],
    map: &[Option<usize>],
    columns: usize,
) -> Vec<(Vec<f64>, f64)> {
    let mut rows = Vec::with_capacity(problem.constraints.len() + 3 * choices.len());
    for row in problem.constraints.iter() {
        rows.push((map_equation(&row.equation, map, columns), row.constant));
    }
    for (i, dis) in problem.disjunctions.iter().enumerate() {
        match choices[i] {
            Choice::Left => {
                rows.push((map_equation(&dis.lhs.equation, map, columns), dis.lhs.constant));
            }
            Choice::Right => {
                rows.push((map_equation(&dis.rhs.equation, map, columns), dis.rhs.constant));
            }
            Choice::Unknown => {
                let z = map[dis.choice.id()].expect("open disjunction without a choice column");
                let mut lhs = map_equation(&dis.lhs.equation, map, columns);
                lhs[z] -= BIG_M;
                rows.push((lhs, dis.lhs.constant));
                let mut rhs = map_equation(&dis.rhs.equation, map, columns);
                rhs[z] += BIG_M;
                rows.push((rhs, dis.rhs.constant + BIG_M));
                let mut bound = vec![0.0; columns];
                bound[z] = 1.0;
                rows.push((bound, 1.0));
            }
        }
    }
    rows
}

/// Rebuilds the assignment of every problem variable from the tableau values
/// of one node: mapped columns are read directly, choice variables take the
/// value dictated by their final choice, and substituted variables are
/// recovered by evaluating their substitution records.
fn reconstruct(
    problem: &LinearProblem,
    map: &[Option<usize>],
    tableau_values: &[f64],
    choices: &[Choice],
) -> Vec<f64> {
    let mut values = vec![0.0; problem.num_variables()];
    for (id, col) in map.iter().enumerate() {
        if let Some(col) = col {
            values[id] = tableau_values[*col];
        }
    }
    for (i, dis) in problem.disjunctions.iter().enumerate() {
        values[dis.choice.id()] = match choices[i] {
            Choice::Left => 0.0,
            Choice::Right => 1.0,
            Choice::Unknown => unreachable!("incumbent with an open disjunction"),
        };
    }
    for sub in problem.substitutions.iter() {
        values[sub.variable.id()] = sub.equation.evaluate(&values) + sub.constant;
    }
    values
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_branch_bound {
    use crate::cutoff::NoCutoff;
    use crate::model::{LinearConstraint, LinearEquation, LinearProblem};
    use crate::SolverError;

    #[test]
    fn without_disjunction_the_root_relaxation_decides() {
        let mut pb = LinearProblem::new();
        let x = pb.create_variable();
        pb.add_constraint(LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 2.0))
            .unwrap();
        let solution = pb.maximize(LinearEquation::term(x, 3.0), &NoCutoff).unwrap();
        assert!((solution.value(x) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn all_branches_infeasible_is_unsolvable() {
        // x >= 1 conflicts with both arms forcing x <= 0
        let mut pb = LinearProblem::new();
        let x = pb.create_variable();
        pb.add_constraint(LinearConstraint::greater_equal(LinearEquation::term(x, 1.0), 1.0))
            .unwrap();
        pb.add_or_constraint(
            LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 0.0),
            LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 0.0),
        )
        .unwrap();
        let err = pb.maximize(LinearEquation::term(x, 1.0), &NoCutoff);
        assert_eq!(Err(SolverError::UnsolvableProblem), err);
    }

    #[test]
    fn nested_disjunctions_pick_the_best_combination() {
        // max x + y, x <= 2, y <= 2,
        // (x <= 0 OR y <= 1) and (x <= 1 OR y <= 0)
        // best: pick "y <= 1" and "x <= 1": objective 2
        let mut pb = LinearProblem::new();
        let x = pb.create_variable();
        let y = pb.create_variable();
        pb.add_constraint(LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 2.0))
            .unwrap();
        pb.add_constraint(LinearConstraint::less_equal(LinearEquation::term(y, 1.0), 2.0))
            .unwrap();
        pb.add_or_constraint(
            LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 0.0),
            LinearConstraint::less_equal(LinearEquation::term(y, 1.0), 1.0),
        )
        .unwrap();
        pb.add_or_constraint(
            LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 1.0),
            LinearConstraint::less_equal(LinearEquation::term(y, 1.0), 0.0),
        )
        .unwrap();
        let mut objective = LinearEquation::term(x, 1.0);
        objective.add(y, 1.0);
        let solution = pb.maximize(objective, &NoCutoff).unwrap();
        let total = solution.value(x) + solution.value(y);
        assert!((total - 2.0).abs() < 1e-6, "got {total}");
    }

    #[test]
    fn choice_variables_take_their_final_value() {
        // force the right arm: the choice variable must come out as 1
        let mut pb = LinearProblem::new();
        let x = pb.create_variable();
        pb.add_constraint(LinearConstraint::greater_equal(LinearEquation::term(x, 1.0), 0.0))
            .unwrap();
        pb.add_constraint(LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 5.0))
            .unwrap();
        let choice = pb
            .add_or_constraint(
                LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 0.0),
                LinearConstraint::less_equal(LinearEquation::term(x, 1.0), 5.0),
            )
            .unwrap();
        let solution = pb.maximize(LinearEquation::term(x, 1.0), &NoCutoff).unwrap();
        assert!((solution.value(x) - 5.0).abs() < 1e-6);
        assert_eq!(1.0, solution.value(choice));
    }
}
