mod util;
use hydro_network::prelude::*;
use util::*;

fn reverse(net: &mut HydroNetwork, branch: BranchId, data: &mut dyn LocationAddressed) {
    BranchTopologyEditor::new(net)
        .with_data(data)
        .reverse_branch(branch)
        .unwrap()
        .expect("reverse always applies");
}

#[test]
fn repeated_reversal_restores_exact_bits() {
    let (mut net, branches) = snake(&[(0.0, 0.0), (33.3, 17.1), (71.9, 5.7)]);
    let b = branches[1];
    let odd = vec![0.1, 3.3, 12.345_678_9, 29.999_999];
    let ids: Vec<FeatureId> = odd.iter().map(|&c| lateral_at(&mut net, b, c)).collect();
    let mut level = NetworkCoverage::new("water level", 0.0);
    for (i, &c) in odd.iter().enumerate() {
        level.set_value(NetworkLocation::new(b, c), i as f64).unwrap();
    }
    let before: Vec<u64> = level.locations().iter().map(|l| l.chainage.to_bits()).collect();

    for _ in 0..6 {
        reverse(&mut net, b, &mut level);
    }

    let after: Vec<u64> = level.locations().iter().map(|l| l.chainage.to_bits()).collect();
    assert_eq!(after, before);
    for (&id, &c) in ids.iter().zip(&odd) {
        assert_eq!(net.features().get(id).unwrap().chainage().to_bits(), c.to_bits());
    }
    assert_eq!(level.values(), &[0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn odd_reversal_mirrors_values_and_keeps_order() {
    let (mut net, b) = straight(100.0);
    let mut level = NetworkCoverage::new("water level", 0.0);
    level
        .set_locations(
            [10.0, 40.0, 95.0].map(|c| NetworkLocation::new(b, c)).to_vec(),
            vec![1.0, 4.0, 9.5],
        )
        .unwrap();
    reverse(&mut net, b, &mut level);

    let chainages: Vec<f64> = level.locations().iter().map(|l| l.chainage).collect();
    assert_chainages(&chainages, &[5.0, 60.0, 90.0]);
    assert_eq!(level.values(), &[9.5, 4.0, 1.0]);
    let branch = net.branch(b).unwrap();
    assert_eq!(branch.geometry().start(), Coordinate::new(100.0, 0.0));
}

#[test]
fn calculation_points_keep_their_fixed_flags() {
    let (mut net, b) = straight(100.0);
    let mut grid = Discretization::default();
    generate_network_discretization(
        &net,
        &mut grid,
        &NetworkGenerationOptions::new(
            DiscretizationOptions::default().with_fixed_length(20.0, FixedLengthPolicy::Multiples),
        ),
    )
    .unwrap();
    grid.toggle_fixed_point(&NetworkLocation::new(b, 20.0)).unwrap();

    reverse(&mut net, b, &mut grid);
    assert_chainages(&grid.chainages_on(b), &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    assert_chainages(&grid.fixed_chainages_on(b), &[80.0]);

    reverse(&mut net, b, &mut grid);
    assert_chainages(&grid.fixed_chainages_on(b), &[20.0]);
}

#[test]
fn reversing_after_a_resize_starts_a_fresh_record() {
    let (mut net, b) = straight(90.0);
    let id = lateral_at(&mut net, b, 30.0);
    let editor_net = |net: &mut HydroNetwork| {
        BranchTopologyEditor::new(net).reverse_branch(b).unwrap();
    };
    editor_net(&mut net);
    assert_chainages(&feature_chainages(&net, b), &[60.0]);

    BranchTopologyEditor::new(&mut net)
        .set_branch_length(b, Some(180.0))
        .unwrap()
        .expect("length changed");
    assert_chainages(&feature_chainages(&net, b), &[120.0]);

    editor_net(&mut net);
    let lateral = net.features().get(id).unwrap();
    assert!((lateral.chainage() - 60.0).abs() < EPS);
}

#[test]
fn structures_stay_with_their_composite() {
    let (mut net, b) = straight(100.0);
    let weir = structure_at(&mut net, b, 25.0);
    let composite = net
        .features()
        .get(weir)
        .and_then(|f| f.as_structure())
        .and_then(|s| s.composite())
        .unwrap();

    BranchTopologyEditor::new(&mut net).reverse_branch(b).unwrap();

    let weir = net.features().get(weir).unwrap();
    let composite = net.features().get(composite).unwrap();
    assert_chainages(&[weir.chainage(), composite.chainage()], &[75.0, 75.0]);
    assert_eq!(net.features().structures_on(b).count(), 1);
}

#[test]
fn features_with_a_length_restore_exact_bits() {
    let (mut net, branches) = snake(&[(0.0, 0.0), (33.3, 17.1), (71.9, 5.7)]);
    let b = branches[1];
    let inflow = BranchFeature::lateral_source("diffuse inflow", 0.3).with_length(7.123_456_7);
    let id = net.add_branch_feature(b, inflow, 2.345_678_9).unwrap();
    let mut none = NetworkCoverage::new("unused", 0.0);

    reverse(&mut net, b, &mut none);
    let length = net.branch(b).unwrap().effective_length();
    let mirrored = net.features().get(id).unwrap().chainage();
    assert!((mirrored - (length - 2.345_678_9 - 7.123_456_7)).abs() < EPS);

    for _ in 0..5 {
        reverse(&mut net, b, &mut none);
    }
    let back = net.features().get(id).unwrap().chainage();
    assert_eq!(back.to_bits(), 2.345_678_9f64.to_bits());
}
