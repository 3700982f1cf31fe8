#![cfg(feature = "highs")]

mod common;

use std::collections::BTreeSet;

use mip_formulations::instances::csp::hamming_distance;
use mip_formulations::{solve_instance, CspFormulation, CspInstance, HighsSolver, Outcome};

/// Smallest radius over all centers built from symbols present in each
/// column; any other symbol can be swapped for a present one without
/// increasing a distance.
fn brute_force_radius(instance: &CspInstance) -> usize {
    let columns: Vec<Vec<char>> = (0..instance.string_length())
        .map(|i| {
            let present: BTreeSet<char> = instance
                .strings
                .iter()
                .filter_map(|s| s.chars().nth(i))
                .collect();
            present.into_iter().collect()
        })
        .collect();

    let mut best = usize::MAX;
    let mut choice = vec![0usize; columns.len()];
    loop {
        let center: String = choice.iter().zip(&columns).map(|(&c, col)| col[c]).collect();
        let radius = instance
            .strings
            .iter()
            .map(|s| hamming_distance(s, &center))
            .max()
            .unwrap_or(0);
        best = best.min(radius);

        let mut pos = 0;
        loop {
            if pos == choice.len() {
                return best;
            }
            choice[pos] += 1;
            if choice[pos] < columns[pos].len() {
                break;
            }
            choice[pos] = 0;
            pos += 1;
        }
    }
}

#[test]
fn dna_fixture_reaches_the_true_minimum_radius() {
    let instance = common::csp_dna();
    let outcome =
        solve_instance::<CspFormulation>(&HighsSolver::new(), &instance, &common::config())
            .unwrap();
    let result = outcome.into_optimal().expect("optimal solution");

    assert_eq!(brute_force_radius(&instance), 2);
    assert_eq!(result.radius, 2);
    assert_eq!(result.center.len(), 10);
    assert!(result.center.chars().all(|c| instance.alphabet.contains(&c)));
    for s in &instance.strings {
        assert!(hamming_distance(s, &result.center) <= result.radius as usize);
    }
    assert_eq!(result.max_distance(&instance), 2);
}

#[test]
fn identical_strings_have_radius_zero() {
    let instance = CspInstance::new("AC".chars(), &["ACCA", "ACCA"]);
    let outcome =
        solve_instance::<CspFormulation>(&HighsSolver::new(), &instance, &common::config())
            .unwrap();
    match outcome {
        Outcome::Optimal(result) => {
            assert_eq!(result.center, "ACCA");
            assert_eq!(result.radius, 0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn unknown_symbol_is_rejected() {
    let instance = CspInstance::new("AC".chars(), &["ACGA", "ACCA"]);
    let err = solve_instance::<CspFormulation>(&HighsSolver::new(), &instance, &common::config())
        .unwrap_err();
    assert!(err.is_malformed_instance());
}
