use cleave3d::data_structure::PFace;
use cleave3d::na::{Point3, Vector3};
use cleave3d::{Error, KineticPartition3, Parameters, Partition};

type Real = f64;

fn unit_cube_parameters(k: u32) -> Parameters {
    Parameters {
        k,
        bbox: Some([Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5)]),
        ..Default::default()
    }
}

/// An axis-aligned square at `y = y0`, spanning `[-half, half]` on x and z.
fn square_y(y0: Real, half: Real) -> Vec<Point3<Real>> {
    vec![
        Point3::new(-half, y0, -half),
        Point3::new(half, y0, -half),
        Point3::new(half, y0, half),
        Point3::new(-half, y0, half),
    ]
}

/// An axis-aligned square at `x = x0`, spanning `[-half, half]` on y and z.
fn square_x(x0: Real, half: Real) -> Vec<Point3<Real>> {
    vec![
        Point3::new(x0, -half, -half),
        Point3::new(x0, half, -half),
        Point3::new(x0, half, half),
        Point3::new(x0, -half, half),
    ]
}

fn offset_square_y(center: (Real, Real), half: Real) -> Vec<Point3<Real>> {
    let (cx, cz) = center;
    vec![
        Point3::new(cx - half, 0.0, cz - half),
        Point3::new(cx + half, 0.0, cz - half),
        Point3::new(cx + half, 0.0, cz + half),
        Point3::new(cx - half, 0.0, cz + half),
    ]
}

fn face_area(partition: &Partition, pface: PFace) -> Real {
    let polygon = partition.polygon_of_pface(pface);
    let c = polygon[0];
    let mut doubled = Vector3::zeros();
    for i in 1..polygon.len() - 1 {
        doubled += (polygon[i] - c).cross(&(polygon[i + 1] - c));
    }
    doubled.norm() * 0.5
}

fn total_area(partition: &Partition, plane: usize) -> Real {
    partition
        .pfaces(plane)
        .into_iter()
        .map(|pface| face_area(partition, pface))
        .sum()
}

fn all_frozen(partition: &Partition) -> bool {
    (0..partition.number_of_support_planes()).all(|plane| {
        partition
            .data()
            .pvertices(plane)
            .into_iter()
            .all(|pv| partition.data().is_frozen(pv))
    })
}

#[test]
fn empty_cube_is_a_single_cell() {
    let mut parameters = unit_cube_parameters(1);
    parameters.debug = true;
    let engine = KineticPartition3::new(parameters);
    let partition = engine.partition(&[]).unwrap();

    assert_eq!(partition.number_of_support_planes(), 6);
    assert_eq!(partition.data().igraph().num_vertices(), 8);
    assert_eq!(partition.data().igraph().num_edges(), 12);
    for plane in 0..6 {
        assert_eq!(partition.pfaces(plane).len(), 1);
    }
    assert_eq!(partition.stats().num_events, 0);

    partition.data().check_bbox().unwrap();
    partition.data().check_vertices().unwrap();
    partition.data().check_edge_planes().unwrap();
}

#[test]
fn one_cross_section_splits_the_cube() {
    let mut parameters = unit_cube_parameters(1);
    parameters.debug = true;
    let engine = KineticPartition3::new(parameters);
    let partition = engine.partition(&[square_y(0.0, 0.5)]).unwrap();

    assert_eq!(partition.number_of_support_planes(), 7);
    // The square already spans the full cross-section: nothing moves.
    assert_eq!(partition.stats().num_events, 0);

    // Every box face crossed by the section plane is split in two; the two
    // faces parallel to it are not.
    assert_eq!(partition.pfaces(0).len(), 2); // z = min
    assert_eq!(partition.pfaces(1).len(), 1); // y = min
    assert_eq!(partition.pfaces(2).len(), 2); // x = max
    assert_eq!(partition.pfaces(3).len(), 1); // y = max
    assert_eq!(partition.pfaces(4).len(), 2); // x = min
    assert_eq!(partition.pfaces(5).len(), 2); // z = max
    assert_eq!(partition.pfaces(6).len(), 1);

    assert_close(total_area(&partition, 6), 1.0, 1.0e-6);
    partition.data().check_bbox().unwrap();
    partition.data().check_interior().unwrap();
    partition.data().check_vertices().unwrap();
}

#[test]
fn two_cross_sections_share_one_interior_arc() {
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let partition = engine
        .partition(&[square_y(0.0, 0.5), square_x(0.0, 0.5)])
        .unwrap();

    assert_eq!(partition.number_of_support_planes(), 8);

    // Exactly one intersection arc carries both input planes: the segment of
    // the line (y = 0, x = 0) inside the cube.
    let igraph = partition.data().igraph();
    let shared: Vec<_> = igraph
        .active_edges()
        .filter(|&e| {
            let planes = igraph.intersected_planes(e);
            planes.contains(&6) && planes.contains(&7)
        })
        .collect();
    assert_eq!(shared.len(), 1);

    // Both sections and the four box faces crossed twice are subdivided.
    assert_eq!(partition.pfaces(6).len(), 2);
    assert_eq!(partition.pfaces(7).len(), 2);
    assert_eq!(partition.pfaces(0).len(), 4); // z = min, crossed by both
    assert_eq!(partition.pfaces(5).len(), 4); // z = max, crossed by both
    assert_eq!(partition.pfaces(1).len(), 2);
    assert_eq!(partition.pfaces(2).len(), 2);
    assert_eq!(partition.pfaces(3).len(), 2);
    assert_eq!(partition.pfaces(4).len(), 2);

    // The limit-line memo never exceeds two ordered pairs per line, with
    // distinct plane indices.
    for pairs in partition.data().limit_lines() {
        assert!(pairs.len() <= 2);
        for ((first, second), _) in pairs {
            assert_ne!(first, second);
        }
    }

    partition.data().check_bbox().unwrap();
    partition.data().check_vertices().unwrap();
}

#[test]
fn crossing_budget_two_keeps_the_same_topology() {
    let run = |k: u32| {
        KineticPartition3::new(unit_cube_parameters(k))
            .partition(&[square_y(0.0, 0.5), square_x(0.0, 0.5)])
            .unwrap()
    };
    let p1 = run(1);
    let p2 = run(2);

    for plane in 0..8 {
        assert_eq!(p1.pfaces(plane).len(), p2.pfaces(plane).len());
    }

    // With k = 2 no traversal may be recorded as blocking.
    for pairs in p2.data().limit_lines() {
        for (_, is_limit) in pairs {
            assert!(!*is_limit);
        }
    }

    p2.data().check_bbox().unwrap();
    p2.data().check_vertices().unwrap();
}

#[test]
fn three_planes_sharing_one_line_are_unsupported() {
    // The sections at y = 0, x = 0 and x = 2y all contain the line
    // (x = 0, y = 0): the per-line memo holds at most two ordered plane
    // pairs, so a third plane traversing the same line must be refused.
    let diagonal = vec![
        Point3::new(-0.5, -0.25, -0.5),
        Point3::new(0.5, 0.25, -0.5),
        Point3::new(0.5, 0.25, 0.5),
        Point3::new(-0.5, -0.25, 0.5),
    ];
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let status = engine.partition(&[square_y(0.0, 0.5), square_x(0.0, 0.5), diagonal]);
    assert!(
        matches!(status, Err(Error::Unsupported(_))),
        "a third plane on one line must be rejected, got {status:?}"
    );
}

#[test]
fn flat_input_thickens_the_degenerate_axis() {
    // No explicit box: all input points lie at y = 0, so the computed box is
    // flat on y and must be spread apart instead of failing.
    let engine = KineticPartition3::new(Parameters::default());
    let partition = engine.partition(&[square_y(0.0, 0.5)]).unwrap();

    assert_eq!(partition.number_of_support_planes(), 7);
    partition.data().check_bbox().unwrap();
}

#[test]
fn coplanar_polygons_are_refused() {
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let status = engine.partition(&[square_y(0.0, 0.4), square_y(1.0e-12, 0.3)]);
    assert_eq!(status.unwrap_err(), Error::CoplanarPolygons(0, 1));
}

#[test]
fn growing_square_fills_its_cross_section() {
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let partition = engine.partition(&[square_y(0.0, 0.2)]).unwrap();

    // The four corners expand, reach the four box edges, and freeze there;
    // the section ends up covering the full cross-section of the cube.
    assert!(partition.stats().num_events >= 4);
    assert!(all_frozen(&partition));
    assert_eq!(partition.pfaces(6).len(), 1);
    assert_close(total_area(&partition, 6), 1.0, 1.0e-6);

    partition.data().check_bbox().unwrap();
    partition.data().check_interior().unwrap();
    partition.data().check_vertices().unwrap();
}

#[test]
fn off_center_square_still_fills_its_cross_section() {
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let partition = engine
        .partition(&[offset_square_y((-0.05, 0.1), 0.2)])
        .unwrap();

    assert!(partition.stats().num_events > 0);
    assert!(all_frozen(&partition));
    assert_eq!(partition.pfaces(6).len(), 1);
    assert_close(total_area(&partition, 6), 1.0, 1.0e-6);

    partition.data().check_bbox().unwrap();
    partition.data().check_vertices().unwrap();
}

#[test]
fn occupied_line_exhausts_the_crossing_budget() {
    // A full section at x = 0.3 occupies the line its plane shares with the
    // growing square; with k = 1, the square must freeze on it.
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let partition = engine
        .partition(&[offset_square_y((-0.05, 0.0), 0.2), square_x(0.3, 0.5)])
        .unwrap();

    assert!(all_frozen(&partition));

    let blocked = partition
        .data()
        .limit_lines()
        .iter()
        .flatten()
        .any(|((first, second), is_limit)| *first == 6 && *second == 7 && *is_limit);
    assert!(blocked, "the occupied line must be recorded as a limit line");

    // The frozen contacts leave the section short of the full slab left of
    // the occupied line.
    let area = total_area(&partition, 6);
    assert!(area > 0.3 && area < 0.81, "unexpected area {area}");
}

#[test]
fn crossing_budget_two_absorbs_an_occupied_line() {
    let engine = KineticPartition3::new(unit_cube_parameters(2));
    let partition = engine
        .partition(&[offset_square_y((-0.05, 0.0), 0.2), square_x(0.3, 0.5)])
        .unwrap();

    assert!(all_frozen(&partition));

    // The traversal spent one budget unit instead of blocking the line.
    assert_eq!(partition.data().k(6), 1);
    let blocked = partition
        .data()
        .limit_lines()
        .iter()
        .flatten()
        .any(|(_, is_limit)| *is_limit);
    assert!(!blocked);

    // The section covers the whole slab on its side of the occupied line.
    assert_close(total_area(&partition, 6), 0.8, 1.0e-5);
}

#[test]
fn initialization_is_deterministic() {
    let run = || {
        KineticPartition3::new(unit_cube_parameters(1))
            .partition(&[square_y(0.0, 0.5), square_x(0.0, 0.5)])
            .unwrap()
    };
    let p1 = run();
    let p2 = run();

    assert_eq!(
        p1.data().igraph().num_vertices(),
        p2.data().igraph().num_vertices()
    );
    assert_eq!(p1.data().igraph().num_edges(), p2.data().igraph().num_edges());
    for plane in 0..p1.number_of_support_planes() {
        assert_eq!(p1.pfaces(plane).len(), p2.pfaces(plane).len());
    }
}

#[test]
fn collinear_corners_are_merged_before_insertion() {
    // The square carries two redundant collinear corners; the initial
    // subdivision must reduce it to a simple quad.
    let polygon = vec![
        Point3::new(-0.2, 0.0, -0.2),
        Point3::new(0.0, 0.0, -0.2),
        Point3::new(0.1, 0.0, -0.2),
        Point3::new(0.2, 0.0, -0.2),
        Point3::new(0.2, 0.0, 0.2),
        Point3::new(-0.2, 0.0, 0.2),
    ];
    let engine = KineticPartition3::new(unit_cube_parameters(1));
    let partition = engine.partition(&[polygon]).unwrap();

    assert_eq!(partition.number_of_support_planes(), 7);
    assert!(all_frozen(&partition));
    assert_close(total_area(&partition, 6), 1.0, 1.0e-6);
}

fn assert_close(value: Real, expected: Real, epsilon: Real) {
    assert!(
        (value - expected).abs() <= epsilon,
        "expected {expected}, got {value}"
    );
}
