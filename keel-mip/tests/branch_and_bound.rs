//! End-to-end tests for the branch-and-bound driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keel_core::{convex, mps, ConvexData, Expression, Model, SolverOptions, Status, Variable};
use keel_mip::{solve, solve_with_stats, MipSettings};

/// min -(5 x1 + 4 x2 + 3 x3) over binaries with 2 x1 + 3 x2 + x3 <= 2.
/// The relaxation is fractional (-5.5); the integer optimum is x = (1, 0, 0)
/// at -5.
fn knapsack() -> Model {
    let mut model = Model::new("knapsack");
    for name in ["x1", "x2", "x3"] {
        model.add_variable(Variable::binary(name));
    }

    let mut obj = Expression::new("obj").as_objective();
    obj.set_linear(0, -5.0);
    obj.set_linear(1, -4.0);
    obj.set_linear(2, -3.0);
    model.add_expression(obj);

    let mut cap = Expression::new("cap").with_upper(2.0);
    cap.set_linear(0, 2.0);
    cap.set_linear(1, 3.0);
    cap.set_linear(2, 1.0);
    model.add_expression(cap);
    model
}

/// min -sum(x) over ten binaries with sum(x) <= 9.5. Any nine variables
/// at one give the integer optimum -9; the relaxation bound stays at
/// -9.5 until the tree is exhausted.
fn nine_of_ten() -> Model {
    let mut model = Model::new("nine-of-ten");
    let mut obj = Expression::new("obj").as_objective();
    let mut cap = Expression::new("cap").with_upper(9.5);
    for i in 0..10 {
        let v = model.add_variable(Variable::binary(format!("x{i}")));
        obj.set_linear(v, -1.0);
        cap.set_linear(v, 1.0);
    }
    model.add_expression(obj);
    model.add_expression(cap);
    model
}

#[test]
fn knapsack_finds_the_integer_optimum() {
    let (result, stats) = solve_with_stats(&knapsack(), &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!((result.value - (-5.0)).abs() < 1e-6);
    assert!((result[0] - 1.0).abs() < 1e-6);
    assert!(result[1].abs() < 1e-6);
    assert!(result[2].abs() < 1e-6);
    assert!(stats.nodes_explored >= 1);
}

#[test]
fn branching_beats_the_fractional_relaxation() {
    // The relaxation value -5.5 is a strict lower bound; the integer
    // optimum must be worse (higher) and still integral.
    let result = solve(&knapsack(), &MipSettings::default()).unwrap();
    assert!(result.value > -5.5);
    for v in &result.x {
        assert!((v - v.round()).abs() < 1e-6);
    }
}

#[test]
fn integral_relaxation_needs_no_branching() {
    // min -3x - 4y with x + y <= 1: the relaxation optimum (0, 1) is
    // already integral.
    let mut model = Model::new("easy");
    model.add_variable(Variable::binary("x"));
    model.add_variable(Variable::binary("y"));
    let mut obj = Expression::new("obj").as_objective();
    obj.set_linear(0, -3.0);
    obj.set_linear(1, -4.0);
    model.add_expression(obj);
    let mut cap = Expression::new("cap").with_upper(1.0);
    cap.set_linear(0, 1.0);
    cap.set_linear(1, 1.0);
    model.add_expression(cap);

    let (result, stats) = solve_with_stats(&model, &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!((result.value - (-4.0)).abs() < 1e-6);
    assert_eq!(stats.nodes_explored, 1);
    assert_eq!(stats.incumbent_updates, 1);
}

/// min x^2 - 1.2x over a binary x: the relaxation lands at 0.6 and both
/// children are fixed-variable subproblems.
fn binary_qp() -> Model {
    let mut model = Model::new("binary-qp");
    model.add_variable(Variable::binary("x"));
    let mut obj = Expression::new("obj").as_objective();
    obj.set_quadratic(0, 0, 1.0);
    obj.set_linear(0, -1.2);
    model.add_expression(obj);
    model
}

#[test]
fn quadratic_children_reuse_the_parent_point() {
    // The parent point 0.6 clamps onto the child bounds 0 and 1, which
    // are exactly the child optima, so each child solve starts optimal.
    let (result, stats) = solve_with_stats(&binary_qp(), &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!((result.value - (-0.2)).abs() < 1e-6);
    assert!((result[0] - 1.0).abs() < 1e-6);
    assert_eq!(stats.nodes_explored, 3);
}

#[test]
fn start_values_seed_the_root_relaxation() {
    let mut model = binary_qp();
    model.variable_mut(0).value = Some(1.0);

    let result = solve(&model, &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!((result.value - (-0.2)).abs() < 1e-6);
    assert!((result[0] - 1.0).abs() < 1e-6);
}

#[test]
fn child_relaxations_never_beat_their_parent() {
    let model = knapsack();
    let (lower, upper) = model.bound_vectors();
    let options = SolverOptions::default();

    let parent_data = ConvexData::build_bounded(&model, &lower, &upper).unwrap();
    let parent = convex::solve(&parent_data, &options);
    assert_eq!(parent.status, Status::Optimal);

    let frac = (0..parent.x.len())
        .find(|&i| (parent.x[i] - parent.x[i].round()).abs() > 1e-6)
        .unwrap();

    let mut down_upper = upper.clone();
    down_upper[frac] = parent.x[frac].floor();
    let mut up_lower = lower.clone();
    up_lower[frac] = parent.x[frac].ceil();

    for (lo, hi) in [(&lower, &down_upper), (&up_lower, &upper)] {
        let data = ConvexData::build_bounded(&model, lo, hi).unwrap();
        let child = convex::solve(&data, &options);
        assert_eq!(child.status, Status::Optimal);
        assert!(child.value >= parent.value - 1e-9);
    }
}

#[test]
fn pruning_never_hides_a_better_solution() {
    let model = knapsack();
    let result = solve(&model, &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);

    // Enumerate every binary assignment and keep the best feasible one.
    let mut best = f64::INFINITY;
    for mask in 0u32..8 {
        let x: Vec<f64> = (0..3).map(|i| f64::from(mask >> i & 1)).collect();
        let feasible = model.constraints().all(|e| {
            let v = e.evaluate(&x);
            e.lower.is_none_or(|l| v >= l - 1e-9) && e.upper.is_none_or(|u| v <= u + 1e-9)
        });
        if feasible {
            best = best.min(model.objective().map(|o| o.evaluate(&x)).unwrap_or(0.0));
        }
    }
    assert!((result.value - best).abs() < 1e-6);
}

#[test]
fn integer_infeasibility_is_proven() {
    // 0.25 <= x <= 0.75 admits no integer point even though the
    // relaxation is feasible.
    let mut model = Model::new("gap");
    model.add_variable(Variable::binary("x"));
    let mut obj = Expression::new("obj").as_objective();
    obj.set_linear(0, 1.0);
    model.add_expression(obj);
    let mut band = Expression::new("band").with_lower(0.25).with_upper(0.75);
    band.set_linear(0, 1.0);
    model.add_expression(band);

    let result = solve(&model, &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Infeasible);
    assert!(result.x.is_empty());
}

#[test]
fn node_limit_returns_the_incumbent_as_feasible() {
    let model = nine_of_ten();

    let limited = solve(&model, &MipSettings::default().with_node_limit(4)).unwrap();
    assert_eq!(limited.status, Status::Feasible);
    assert!((limited.value - (-9.0)).abs() < 1e-6);

    let full = solve(&model, &MipSettings::default()).unwrap();
    assert_eq!(full.status, Status::Optimal);
    assert!((full.value - (-9.0)).abs() < 1e-6);
}

#[test]
fn cancellation_without_an_incumbent_fails() {
    let flag = Arc::new(AtomicBool::new(true));
    flag.store(true, Ordering::Relaxed);
    let settings = MipSettings::default().with_cancel(flag);

    let result = solve(&nine_of_ten(), &settings).unwrap();
    assert_eq!(result.status, Status::Failed);
    assert!(result.x.is_empty());
}

#[test]
fn search_is_deterministic() {
    let settings = MipSettings::default();
    let (r1, s1) = solve_with_stats(&knapsack(), &settings).unwrap();
    let (r2, s2) = solve_with_stats(&knapsack(), &settings).unwrap();
    assert_eq!(r1, r2);
    assert_eq!(s1.nodes_explored, s2.nodes_explored);
    assert_eq!(s1.incumbent_updates, s2.incumbent_updates);
}

#[test]
fn exhausted_search_closes_the_bound() {
    let (result, stats) = solve_with_stats(&knapsack(), &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!(stats.best_bound <= result.value + 1e-9);
}

const KNAPSACK_MPS: &str = "\
NAME KNAP
ROWS
 N  OBJ
 L  CAP
COLUMNS
    MARKER                 'MARKER'                 'INTORG'
    X1        OBJ             -5.0   CAP              2.0
    X2        OBJ             -4.0   CAP              3.0
    X3        OBJ             -3.0   CAP              1.0
    MARKER                 'MARKER'                 'INTEND'
RHS
    RHS       CAP              2.0
BOUNDS
 BV BND       X1
 BV BND       X2
 BV BND       X3
ENDATA
";

#[test]
fn mps_integer_model_solves_end_to_end() {
    let model = mps::parse_str(KNAPSACK_MPS).unwrap();
    assert_eq!(model.integer_variables(), vec![0, 1, 2]);

    let result = solve(&model, &MipSettings::default()).unwrap();
    assert_eq!(result.status, Status::Optimal);
    assert!((result.value - (-5.0)).abs() < 1e-6);
    assert!((result[0] - 1.0).abs() < 1e-6);
}
