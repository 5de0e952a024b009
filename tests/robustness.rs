use cleave3d::data_structure::DataStructure;
use cleave3d::geometry::{segments_intersection2d, SegmentsIntersection};
use cleave3d::igraph::IntersectionGraph;
use cleave3d::na::{Point2, Point3};
use rand::{Rng, SeedableRng};
use rand_isaac::IsaacRng;

#[test]
fn sorted_random_points_form_a_ccw_polygon() {
    let mut rng = IsaacRng::seed_from_u64(42);
    let data = DataStructure::new(false);

    for _ in 0..50 {
        let n = rng.gen_range(4..12);
        let mut points: Vec<Point2<f64>> = (0..n)
            .map(|_| {
                let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                let radius: f64 = rng.gen_range(0.5..2.0);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();

        let centroid = data.sort_points_by_direction(&mut points).unwrap();
        assert_eq!(points.len(), n);

        // Sorting by direction around the centroid must produce a
        // counter-clockwise outline.
        let mut area2 = 0.0;
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            area2 += p.x * q.y - q.x * p.y;
        }
        assert!(area2 > 0.0);

        // The centroid stays inside the star-shaped outline, so every point
        // keeps a strictly increasing direction.
        let mut last = f64::MIN;
        for p in &points {
            let d = p - centroid;
            let angle = d.y.atan2(d.x);
            assert!(angle >= last);
            last = angle;
        }
    }
}

#[test]
fn random_segment_intersections_agree_on_both_segments() {
    let mut rng = IsaacRng::seed_from_u64(7);

    let mut checked = 0;
    for _ in 0..500 {
        let mut pt = || Point2::new(rng.gen_range(-1.0..1.0f64), rng.gen_range(-1.0..1.0f64));
        let (a, b, c, d) = (pt(), pt(), pt(), pt());

        if let Some(SegmentsIntersection::Point { loc1, loc2 }) =
            segments_intersection2d(&a, &b, &c, &d, 1.0e-12)
        {
            let u = loc1.barycentric_coordinates();
            let v = loc2.barycentric_coordinates();
            let p1 = Point2::from(a.coords * u[0] + b.coords * u[1]);
            let p2 = Point2::from(c.coords * v[0] + d.coords * v[1]);
            assert!((p1 - p2).norm() < 1.0e-7, "{p1:?} vs {p2:?}");
            checked += 1;
        }
    }
    assert!(checked > 20, "the sampling never produced intersections");
}

#[test]
fn repeated_arc_splits_keep_the_line_structure() {
    let mut rng = IsaacRng::seed_from_u64(1234);
    let mut graph = IntersectionGraph::new();

    let (start, _) = graph.add_vertex(Point3::new(0.0, 0.0, 0.0), [0, 1]);
    let (end, _) = graph.add_vertex(Point3::new(1.0, 0.0, 0.0), [0, 1]);
    let (edge, _) = graph.add_edge(start, end, [0, 1]);
    let line = graph.add_line();
    graph.set_line(edge, line);

    // Split the polyline at random interior points, always picking an
    // active fragment to cut.
    for _ in 0..20 {
        let fragments: Vec<_> = graph.active_edges().collect();
        let target = fragments[rng.gen_range(0..fragments.len())];
        let seg = graph.segment_3(target);
        if seg.length() < 1.0e-3 {
            continue;
        }
        let t = rng.gen_range(0.25..0.75);
        let (split_vertex, _) = graph.add_vertex(seg.point_at(t), [0, 1, 2]);
        let _ = graph.split_edge(target, split_vertex);
    }

    // All fragments carry the original line id and plane set, and the
    // active fragments tile the original segment.
    let mut total_length = 0.0;
    for e in graph.active_edges() {
        assert_eq!(graph.line(e), Some(line));
        assert!(graph.intersected_planes(e).contains(&0));
        assert!(graph.intersected_planes(e).contains(&1));
        total_length += graph.segment_3(e).length();
    }
    assert!((total_length - 1.0).abs() < 1.0e-9);

    // Interior vertices join exactly two fragments; the endpoints keep one.
    for v in [start, end] {
        let n = graph
            .incident_edges(v)
            .iter()
            .filter(|&&e| graph.is_edge_active(e))
            .count();
        assert_eq!(n, 1);
    }
}
