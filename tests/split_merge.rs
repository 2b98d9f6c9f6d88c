mod util;
use hydro_network::prelude::*;
use util::*;

#[test]
fn split_moves_features_and_coverage_onto_the_new_branch() {
    let (mut net, b) = straight(100.0);
    let near = lateral_at(&mut net, b, 20.0);
    let far = cross_section_at(&mut net, b, 80.0);
    let mut depth = NetworkCoverage::new("depth", 0.0);
    depth.set_value(NetworkLocation::new(b, 10.0), 1.0).unwrap();
    depth.set_value(NetworkLocation::new(b, 90.0), 9.0).unwrap();

    let mut seen = Vec::new();
    let mut listener = |a: &EditAction| seen.push(a.clone());
    let action = BranchTopologyEditor::new(&mut net)
        .with_data(&mut depth)
        .with_listener(&mut listener)
        .split_branch(b, SplitAt::Chainage(60.0))
        .unwrap()
        .expect("split applies");
    let EditAction::Split { new_branch, .. } = action else {
        panic!("unexpected action {action:?}");
    };
    assert_eq!(seen, vec![action.clone()]);

    let near = net.features().get(near).unwrap();
    assert_eq!((near.branch(), near.chainage()), (Some(b), 20.0));
    let far = net.features().get(far).unwrap();
    assert_eq!(far.branch(), Some(new_branch));
    assert_chainages(&[far.chainage()], &[20.0]);

    assert_eq!(depth.value(&NetworkLocation::new(b, 10.0)), Some(&1.0));
    assert_eq!(depth.value(&NetworkLocation::new(new_branch, 30.0)), Some(&9.0));
    assert_eq!(net.graph().channel_count(), 2);
}

#[test]
fn splitting_at_the_ends_changes_nothing() {
    let (mut net, b) = straight(100.0);
    for at in [SplitAt::Chainage(0.0), SplitAt::Chainage(100.0)] {
        let outcome = BranchTopologyEditor::new(&mut net).split_branch(b, at).unwrap();
        assert_eq!(outcome, None);
    }
    let outcome = BranchTopologyEditor::new(&mut net)
        .split_branch(b, SplitAt::Coordinate(Coordinate::new(0.0, 0.0)))
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(net.graph().channel_count(), 1);
    assert_eq!(net.graph().node_count(), 2);
}

#[test]
fn split_then_merge_restores_chainages_and_length() {
    let (mut net, b) = straight(250.0);
    let ids: Vec<FeatureId> = [12.5, 99.0, 180.0, 249.0]
        .into_iter()
        .map(|c| lateral_at(&mut net, b, c))
        .collect();
    net.set_branch_length(b, Some(500.0)).unwrap();
    let before: Vec<f64> = ids
        .iter()
        .map(|&id| net.features().get(id).unwrap().chainage())
        .collect();

    let action = BranchTopologyEditor::new(&mut net)
        .split_branch(b, SplitAt::Chainage(210.0))
        .unwrap()
        .unwrap();
    let node = action.new_node().unwrap();
    BranchTopologyEditor::new(&mut net).merge_at_node(node).unwrap().unwrap();

    let after: Vec<f64> = ids
        .iter()
        .map(|&id| net.features().get(id).unwrap().chainage())
        .collect();
    assert_chainages(&after, &before);
    let merged = net.branch(b).unwrap();
    assert!((merged.effective_length() - 500.0).abs() < EPS);
    assert!(ids.iter().all(|&id| net.features().get(id).unwrap().branch() == Some(b)));
}

#[test]
fn merge_at_a_junction_is_rejected() {
    let (mut net, branches) = snake(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)]);
    let middle = net.branch(branches[0]).unwrap().target();
    let spur_end = net.add_node("spur", Coordinate::new(50.0, 40.0)).unwrap();
    let line = LineString::from_xy(&[(50.0, 0.0), (50.0, 40.0)]).unwrap();
    net.connect("spur", middle, spur_end, line, BranchKind::Channel)
        .unwrap();

    let mut notified = 0;
    let mut count = |_: &EditAction| notified += 1;
    let outcome = BranchTopologyEditor::new(&mut net)
        .with_listener(&mut count)
        .merge_at_node(middle)
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(notified, 0);
    assert_eq!(net.graph().branch_count(), 3);
    assert!(net.graph().is_connected_to_multiple_branches(middle));
}

#[test]
fn merge_carries_the_downstream_coverage() {
    let (mut net, branches) = snake(&[(0.0, 0.0), (30.0, 40.0), (30.0, 100.0)]);
    let node = net.branch(branches[0]).unwrap().target();
    let mut q = NetworkCoverage::with_shape("discharge", 0.0, &[2], &[]);
    q.set_locations(
        vec![
            NetworkLocation::new(branches[0], 25.0),
            NetworkLocation::new(branches[1], 10.0),
        ],
        vec![1.0, 2.0, 10.0, 20.0],
    )
    .unwrap();

    BranchTopologyEditor::new(&mut net)
        .with_data(&mut q)
        .merge_at_node(node)
        .unwrap()
        .unwrap();
    let chainages: Vec<f64> = q.locations().iter().map(|l| l.chainage).collect();
    assert_chainages(&chainages, &[25.0, 60.0]);
    assert!(q.locations().iter().all(|l| l.branch == branches[0]));
    assert_eq!(q.values(), &[1.0, 2.0, 10.0, 20.0]);
    assert!(net.node(node).is_none());
}

#[test]
fn split_grid_and_then_regenerate() {
    let (mut net, b) = straight(100.0);
    let mut grid = Discretization::default();
    let options = DiscretizationOptions::default()
        .with_fixed_length(25.0, FixedLengthPolicy::Multiples);
    DiscretizationGenerator::new(&net, &options)
        .unwrap()
        .generate(&mut grid, b)
        .unwrap();
    grid.toggle_fixed_point(&NetworkLocation::new(b, 75.0)).unwrap();

    let action = BranchTopologyEditor::new(&mut net)
        .with_data(&mut grid)
        .split_branch(b, SplitAt::Chainage(40.0))
        .unwrap()
        .unwrap();
    let tail = action.branches()[1];
    assert_chainages(&grid.chainages_on(b), &[0.0, 25.0]);
    assert_chainages(&grid.chainages_on(tail), &[10.0, 35.0, 60.0]);
    assert!(grid.is_fixed(&NetworkLocation::new(tail, 35.0)));
}

#[test]
fn merging_generated_branches_keeps_one_point_at_the_old_node() {
    let (mut net, branches) = snake(&[(0.0, 0.0), (40.0, 0.0), (100.0, 0.0), (150.0, 0.0)]);
    let options = DiscretizationOptions::default();
    let mut grid = Discretization::default();
    for &b in &branches {
        DiscretizationGenerator::new(&net, &options)
            .unwrap()
            .generate(&mut grid, b)
            .unwrap();
    }
    grid.toggle_fixed_point(&NetworkLocation::new(branches[1], 0.0))
        .unwrap();
    let node = net.branch(branches[0]).unwrap().target();

    BranchTopologyEditor::new(&mut net)
        .with_data(&mut grid)
        .merge_at_node(node)
        .unwrap()
        .expect("merge applies");

    assert_chainages(&grid.chainages_on(branches[0]), &[0.0, 40.0, 100.0]);
    assert!(grid.is_fixed(&NetworkLocation::new(branches[0], 40.0)));
    assert!(grid.locations_on(branches[1]).is_empty());
    grid.validate_invariants().unwrap();

    // the grid stays usable for the other branches
    DiscretizationGenerator::new(&net, &options.with_fixed_length(10.0, FixedLengthPolicy::Multiples))
        .unwrap()
        .generate(&mut grid, branches[2])
        .unwrap();
    assert_eq!(grid.locations_on(branches[2]).len(), 6);
    assert_eq!(grid.len(), 3 + 6);
}
