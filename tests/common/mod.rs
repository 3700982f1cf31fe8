#![allow(dead_code)]

use std::path::PathBuf;

use mip_formulations::instances::TimeWindow;
use mip_formulations::{CspInstance, GrInstance, JsplibInstance, SolverConfig, VrptwInstance};

pub const EPS: f64 = 1e-6;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn config() -> SolverConfig {
    SolverConfig::default().with_time_limit(120.0)
}

/// Five length-10 DNA strings; optimal radius 2
pub fn csp_dna() -> CspInstance {
    CspInstance::new(
        "ATGC".chars(),
        &[
            "ATATGGCGCA",
            "GTATGGCGCC",
            "ATATGGCGCG",
            "CTATGGCGCG",
            "GTATGGCGCG",
        ],
    )
}

/// One transposition (3, 4, 7) apart
pub fn gr_single_move() -> GrInstance {
    GrInstance::new(vec![0, 1, 2, 3, 5, 6, 4], vec![0, 1, 2, 5, 6, 4, 3])
}

/// Reversal of three elements; distance 2
pub fn gr_reversal() -> GrInstance {
    GrInstance::new(vec![2, 1, 0], vec![0, 1, 2])
}

/// Two jobs, two machines; optimal makespan 5
pub fn jsp_tiny() -> JsplibInstance {
    JsplibInstance::from_routes("tiny", &[vec![(0, 3), (1, 2)], vec![(1, 2), (0, 1)]])
}

pub fn jsp_three_by_three() -> JsplibInstance {
    JsplibInstance::from_routes(
        "3x3",
        &[
            vec![(0, 3), (1, 2), (2, 2)],
            vec![(0, 2), (2, 1), (1, 4)],
            vec![(1, 4), (2, 3), (0, 1)],
        ],
    )
}

/// Four customers, three vehicles of capacity 20; optimal distance 44
pub fn vrptw_four_customers() -> VrptwInstance {
    VrptwInstance::from_coordinates(
        "four",
        &[(10.0, 10.0), (13.0, 14.0), (16.0, 18.0), (4.0, 2.0), (10.0, 2.0)],
        20,
        3,
        vec![0, 8, 7, 6, 9],
        vec![0, 2, 2, 2, 2],
        vec![
            TimeWindow::unbounded(),
            TimeWindow::new(0.0, 30.0),
            TimeWindow::new(10.0, 40.0),
            TimeWindow::new(5.0, 50.0),
            TimeWindow::new(0.0, 25.0),
        ],
    )
}

/// Customers with positive demand and no vehicle to serve them
pub fn vrptw_without_fleet() -> VrptwInstance {
    VrptwInstance::from_coordinates(
        "grounded",
        &[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)],
        10,
        0,
        vec![0, 4, 5],
        vec![0, 1, 1],
        vec![
            TimeWindow::unbounded(),
            TimeWindow::new(0.0, 100.0),
            TimeWindow::new(0.0, 100.0),
        ],
    )
}
