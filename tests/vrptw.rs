#![cfg(feature = "highs")]

mod common;

use common::EPS;
use mip_formulations::formulations::AugmentedNode;
use mip_formulations::{
    solve_instance, HighsSolver, Outcome, VrptwFormulation, VrptwInstance, VrptwSolution,
};

fn assert_routes_respect_limits(instance: &VrptwInstance, result: &VrptwSolution) {
    assert!(result.vehicles_used() <= instance.fleet_size);

    let mut served: Vec<usize> = result.routes.iter().flat_map(|r| r.customers.clone()).collect();
    served.sort_unstable();
    assert_eq!(served, (1..=instance.num_customers).collect::<Vec<_>>());

    for route in &result.routes {
        let mut load = 0;
        for &c in &route.customers {
            load += instance.demands[c];
            assert!(load <= instance.vehicle_capacity, "capacity exceeded at {}", c);
        }
        assert_eq!(load, route.load);

        let mut previous = 0;
        let mut ready = 0.0;
        for (&c, &start) in route.customers.iter().zip(&route.service_starts) {
            let window = instance.time_windows[c];
            assert!(
                start >= window.earliest - EPS && start <= window.latest + EPS,
                "service at {} starts at {} outside {:?}",
                c,
                start,
                window
            );
            assert!(start + EPS >= ready + instance.travel_time(previous, c));
            previous = c;
            ready = start;
        }
    }

    let routed: u64 = result.routes.iter().map(|r| r.distance(instance)).sum();
    assert_eq!(routed, result.total_distance);
}

#[test]
fn four_customers_optimal_routes() {
    let instance = common::vrptw_four_customers();
    let outcome =
        solve_instance::<VrptwFormulation>(&HighsSolver::new(), &instance, &common::config())
            .unwrap();
    let result = match outcome {
        Outcome::Optimal(result) => result,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(result.total_distance, 44);
    assert_eq!(result.vehicles_used(), 2);
    assert_routes_respect_limits(&instance, &result);

    let departures = result
        .arcs
        .iter()
        .filter(|(from, _)| *from == AugmentedNode::Source)
        .count();
    assert_eq!(departures, result.vehicles_used());
}

#[test]
fn fixture_file_solves_like_hand_built_instance() {
    let instance =
        mip_formulations::instances::vrptw::load_vrprep(&common::fixture("small.xml")).unwrap();
    let result = solve_instance::<VrptwFormulation>(&HighsSolver::new(), &instance, &common::config())
        .unwrap()
        .into_optimal()
        .unwrap();
    assert_eq!(result.total_distance, 44);
    assert_routes_respect_limits(&instance, &result);
}

#[test]
fn tight_window_forces_separate_routes() {
    let mut instance = common::vrptw_four_customers();
    // customer 4 must now be served before anyone else could reach it
    instance.time_windows[4] = mip_formulations::instances::TimeWindow::new(0.0, 8.0);
    instance.time_windows[3] = mip_formulations::instances::TimeWindow::new(0.0, 10.0);
    let result = solve_instance::<VrptwFormulation>(&HighsSolver::new(), &instance, &common::config())
        .unwrap()
        .into_optimal()
        .unwrap();
    assert_routes_respect_limits(&instance, &result);
    assert!(result
        .routes
        .iter()
        .all(|route| !(route.customers.contains(&3) && route.customers.contains(&4))));
}
