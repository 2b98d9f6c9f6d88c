mod util;
use hydro_network::discretization::generate_from_chainages;
use hydro_network::prelude::*;
use proptest::prelude::*;
use util::*;

fn chainages(coverage: &NetworkCoverage<usize>) -> Vec<f64> {
    coverage.locations().iter().map(|l| l.chainage).collect()
}

/// Adjacent points closer than `min` where at least one of the two may be
/// moved or dropped.
fn spacing_violations(points: &[f64], protected: &[f64], min: f64) -> Vec<(f64, f64)> {
    let is_protected = |c: f64| protected.iter().any(|p| (p - c).abs() < EPS);
    points
        .windows(2)
        .filter(|pair| !(is_protected(pair[0]) && is_protected(pair[1])))
        .filter(|pair| pair[1] - pair[0] < min - EPS)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

fn coverage_on(branch: BranchId, length: f64, fractions: &[f64]) -> NetworkCoverage<usize> {
    let mut coverage = NetworkCoverage::new("index", 0);
    let locations = fractions
        .iter()
        .map(|f| NetworkLocation::new(branch, f * length))
        .collect();
    coverage
        .set_locations(locations, (0..fractions.len()).collect())
        .unwrap();
    coverage
}

proptest! {
    #[test]
    fn split_then_merge_is_identity(
        length in 10.0f64..500.0,
        at in 0.01f64..0.99,
        fractions in prop::collection::vec(0.0f64..=1.0, 0..20),
    ) {
        let (mut net, b) = straight(length);
        let mut coverage = coverage_on(b, length, &fractions);
        let before = chainages(&coverage);
        let values_before = coverage.values().to_vec();

        let action = BranchTopologyEditor::new(&mut net)
            .with_data(&mut coverage)
            .split_branch(b, SplitAt::Chainage(at * length))
            .unwrap();
        prop_assume!(action.is_some());
        let node = action.and_then(|a| a.new_node()).unwrap();
        BranchTopologyEditor::new(&mut net)
            .with_data(&mut coverage)
            .merge_at_node(node)
            .unwrap();

        let after = chainages(&coverage);
        prop_assert_eq!(after.len(), before.len());
        for (a, e) in after.iter().zip(&before) {
            prop_assert!((a - e).abs() < EPS, "{} vs {}", a, e);
        }
        prop_assert_eq!(coverage.values(), values_before.as_slice());
        let merged = net.branch(b).unwrap().effective_length();
        prop_assert!((merged - length).abs() < EPS);
    }

    #[test]
    fn even_reversals_restore_exact_bits(
        length in 1.0f64..1000.0,
        fractions in prop::collection::vec(0.0f64..=1.0, 1..20),
        times in 1usize..4,
    ) {
        let (mut net, b) = straight(length);
        let mut coverage = coverage_on(b, length, &fractions);
        let before: Vec<u64> = chainages(&coverage).iter().map(|c| c.to_bits()).collect();
        for _ in 0..2 * times {
            BranchTopologyEditor::new(&mut net)
                .with_data(&mut coverage)
                .reverse_branch(b)
                .unwrap();
        }
        let after: Vec<u64> = chainages(&coverage).iter().map(|c| c.to_bits()).collect();
        prop_assert_eq!(after, before);
    }

    #[test]
    fn grid_spans_the_branch_and_keeps_its_spacing(
        seed in 0u64..1000,
        min in 0.0f64..5.0,
        step in 5.0f64..80.0,
        subdivide in any::<bool>(),
        distance in 0.1f64..10.0,
        structures in prop::collection::vec(0.0f64..=1.0, 0..5),
        sections in prop::collection::vec(0.0f64..=1.0, 0..12),
        laterals in prop::collection::vec(0.0f64..=1.0, 0..6),
        pinned in prop::collection::vec(0.0f64..=1.0, 0..4),
    ) {
        let mut net = random_snake(seed, 3);
        let b = first_branch(&net);
        let length = net.branch(b).unwrap().effective_length();
        for f in &structures {
            structure_at(&mut net, b, f * length);
        }
        for f in &sections {
            cross_section_at(&mut net, b, f * length);
        }
        for f in &laterals {
            lateral_at(&mut net, b, f * length);
        }

        let mut grid = Discretization::default();
        generate_from_chainages(&net, &mut grid, b, pinned.iter().map(|f| f * length)).unwrap();
        for location in grid.locations_on(b).to_vec() {
            grid.toggle_fixed_point(&location).unwrap();
        }
        let fixed = grid.fixed_chainages_on(b);

        let policy = if subdivide {
            FixedLengthPolicy::SubdivideSegments
        } else {
            FixedLengthPolicy::Multiples
        };
        let options = DiscretizationOptions::default()
            .with_minimum_distance(min)
            .with_structures(distance)
            .with_cross_sections()
            .with_laterals()
            .with_fixed_length(step, policy);
        DiscretizationGenerator::new(&net, &options)
            .unwrap()
            .generate(&mut grid, b)
            .unwrap();

        let points = grid.chainages_on(b);
        prop_assert_eq!(points.first().copied(), Some(0.0));
        prop_assert!((points.last().copied().unwrap() - length).abs() < EPS);
        prop_assert!(points.windows(2).all(|p| p[0] < p[1]));
        prop_assert_eq!(grid.fixed_chainages_on(b), fixed.clone());

        let mut protected = vec![0.0, length];
        protected.extend(&fixed);
        let violations = spacing_violations(&points, &protected, min);
        prop_assert!(violations.is_empty(), "{:?} closer than {}", violations, min);
        if subdivide && 2.0 * min <= step {
            for pair in points.windows(2) {
                prop_assert!(pair[1] - pair[0] <= step + EPS, "gap {:?} longer than {}", pair, step);
            }
        }
    }

    #[test]
    fn structure_windows_stay_inside_the_branch(
        length in 20.0f64..400.0,
        distance in 0.5f64..30.0,
        min in 0.0f64..2.0,
        at in prop::collection::vec(0.0f64..=1.0, 1..6),
    ) {
        let (mut net, b) = straight(length);
        for f in &at {
            structure_at(&mut net, b, f * length);
        }
        let options = DiscretizationOptions::default()
            .with_minimum_distance(min)
            .with_structures(distance);
        let points = DiscretizationGenerator::new(&net, &options)
            .unwrap()
            .chainages(b, &[])
            .unwrap();
        prop_assert_eq!(points.first().copied(), Some(0.0));
        prop_assert!((points.last().copied().unwrap() - length).abs() < EPS);
        prop_assert!(points.windows(2).all(|p| p[0] < p[1]));
        let violations = spacing_violations(&points, &[0.0, length], min);
        prop_assert!(violations.is_empty(), "{:?} closer than {}", violations, min);
    }
}
