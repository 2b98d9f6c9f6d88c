#![allow(dead_code)]
use hydro_network::cross_section::XyzProfile;
use hydro_network::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const EPS: f64 = 1e-7;

/// One straight channel from (0, 0) to (length, 0).
pub fn straight(length: f64) -> (HydroNetwork, BranchId) {
    let net = HydroNetwork::snake(&[Coordinate::new(0.0, 0.0), Coordinate::new(length, 0.0)])
        .expect("valid snake");
    let branch = first_branch(&net);
    (net, branch)
}

/// Chain of straight channels through `xy`.
pub fn snake(xy: &[(f64, f64)]) -> (HydroNetwork, Vec<BranchId>) {
    let points: Vec<Coordinate> = xy.iter().map(|&(x, y)| Coordinate::new(x, y)).collect();
    let net = HydroNetwork::snake(&points).expect("valid snake");
    let branches = net.graph().branches().map(|b| b.id()).collect();
    (net, branches)
}

/// Random chain of `branches` channels with segment lengths between 10 and
/// 200, reproducible from `seed`.
pub fn random_snake(seed: u64, branches: usize) -> HydroNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = vec![Coordinate::new(0.0, 0.0)];
    let mut x = 0.0;
    for _ in 0..branches {
        x += rng.gen_range(10.0..200.0);
        let y = rng.gen_range(-50.0..50.0);
        points.push(Coordinate::new(x, y));
    }
    HydroNetwork::snake(&points).expect("valid random snake")
}

pub fn first_branch(net: &HydroNetwork) -> BranchId {
    net.graph().branches().next().expect("network has a branch").id()
}

/// Weir in its own composite (or joining the one there).
pub fn structure_at(net: &mut HydroNetwork, branch: BranchId, chainage: f64) -> FeatureId {
    net.add_branch_feature(branch, BranchFeature::structure("weir", StructureType::Weir), chainage)
        .expect("structure placed")
}

pub fn cross_section_at(net: &mut HydroNetwork, branch: BranchId, chainage: f64) -> FeatureId {
    let definition = CrossSectionDefinition::Xyz(XyzProfile {
        points: vec![(chainage - 1.0, 0.0, 0.0), (chainage + 1.0, 0.0, 0.0)],
        sections: Vec::new(),
    });
    net.add_cross_section_definition(branch, definition, chainage)
        .expect("cross section placed")
}

pub fn lateral_at(net: &mut HydroNetwork, branch: BranchId, chainage: f64) -> FeatureId {
    net.add_branch_feature(branch, BranchFeature::lateral_source("lateral", 1.0), chainage)
        .expect("lateral placed")
}

/// Element-wise comparison within [`EPS`].
pub fn assert_chainages(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "length differs\n got={actual:?}\nwant={expected:?}"
    );
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() < EPS,
            "chainages differ\n got={actual:?}\nwant={expected:?}"
        );
    }
}

/// Chainages of every feature on `branch`, in registry order.
pub fn feature_chainages(net: &HydroNetwork, branch: BranchId) -> Vec<f64> {
    net.features().on_branch(branch).map(|f| f.chainage()).collect()
}
