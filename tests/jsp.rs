#![cfg(feature = "highs")]

mod common;

use mip_formulations::{
    solve_instance, HighsSolver, JspFormulation, JspSolution, JsplibInstance, Outcome,
};

fn assert_valid_schedule(instance: &JsplibInstance, schedule: &JspSolution) {
    assert!(schedule.makespan >= instance.makespan_lower_bound());

    for job in 0..instance.num_jobs {
        let route = &instance.precedences[job];
        for step in route.windows(2) {
            assert!(
                schedule.start_times[job][step[1]] >= schedule.completion_time(instance, job, step[0]),
                "job {} starts on machine {} before leaving machine {}",
                job,
                step[1],
                step[0]
            );
        }
        let last = route[instance.num_machines - 1];
        assert!(schedule.completion_time(instance, job, last) <= schedule.makespan);
    }

    for machine in 0..instance.num_machines {
        let order = schedule.machine_sequence(machine);
        for pair in order.windows(2) {
            assert!(
                schedule.completion_time(instance, pair[0], machine)
                    <= schedule.start_times[pair[1]][machine],
                "jobs {} and {} overlap on machine {}",
                pair[0],
                pair[1],
                machine
            );
        }
    }
}

#[test]
fn tiny_instance_is_solved_to_optimality() {
    let instance = common::jsp_tiny();
    let outcome =
        solve_instance::<JspFormulation>(&HighsSolver::new(), &instance, &common::config())
            .unwrap();
    assert!(outcome.is_optimal());
    let schedule = outcome.into_optimal().unwrap();
    assert_eq!(schedule.makespan, 5);
    assert_valid_schedule(&instance, &schedule);
}

#[test]
fn three_by_three_schedule_is_consistent() {
    let instance = common::jsp_three_by_three();
    let outcome =
        solve_instance::<JspFormulation>(&HighsSolver::new(), &instance, &common::config())
            .unwrap();
    match outcome {
        Outcome::Optimal(schedule) => assert_valid_schedule(&instance, &schedule),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn single_job_runs_back_to_back() {
    let instance = JsplibInstance::from_routes("chain", &[vec![(1, 4), (0, 2), (2, 3)]]);
    let schedule = solve_instance::<JspFormulation>(&HighsSolver::new(), &instance, &common::config())
        .unwrap()
        .into_optimal()
        .unwrap();
    assert_eq!(schedule.makespan, 9);
    assert_eq!(schedule.start_times[0][1], 0);
    assert_valid_schedule(&instance, &schedule);
}
