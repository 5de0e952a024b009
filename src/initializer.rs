//! Initialization of the kinetic data structure: bounding box, support
//! planes, intersection graph, and the initial subdivisions.

use std::collections::{BTreeMap, BTreeSet};

use crate::data_structure::DataStructure;
use crate::error::Error;
use crate::geometry::{Segment2, SegmentsIntersection};
use crate::igraph::IVertexId;
use crate::math::{Matrix3, Point3, Real, Vector3, TOLERANCE};
use crate::parameters::Parameters;
use crate::splitter;

/// Builds the full initial state of the kinetic process and returns the
/// precomputed time step (one fiftieth of the bounding-box diagonal).
pub fn initialize(
    data: &mut DataStructure,
    polygons: &[Vec<Point3<Real>>],
    parameters: &Parameters,
) -> Result<Real, Error> {
    let (corners, time_step) = create_bounding_box(polygons, parameters)?;
    log::debug!("precomputed time step: {time_step}");

    let bbox_faces = bounding_box_to_polygons(&corners);
    for face in &bbox_faces {
        data.add_bbox_polygon(face)?;
    }
    if data.number_of_support_planes() != 6
        || data.igraph().num_vertices() != 8
        || data.igraph().num_edges() != 12
    {
        return Err(Error::invariant(
            "the bounding box did not produce 6 planes, 8 vertices and 12 arcs".to_string(),
        ));
    }
    log::debug!("inserted bbox faces: {}", bbox_faces.len());

    for (input_index, polygon) in polygons.iter().enumerate() {
        let _ = data.add_input_polygon(polygon, input_index)?;
    }
    log::debug!("inserted input polygons: {}", polygons.len());

    data.check_integrity(false)?;
    make_polygons_intersection_free(data)?;
    for plane in 0..data.number_of_support_planes() {
        splitter::split_support_plane(data, plane)?;
    }
    data.check_integrity(false)?;
    data.check_bbox()?;

    for plane in 0..data.number_of_support_planes() {
        data.support_plane_mut(plane).set_k(parameters.k.max(1));
    }
    data.precompute_iedge_data();
    data.set_limit_lines()?;

    Ok(time_step)
}

/// The eight corners of the (possibly enlarged) bounding box of the input,
/// and the precomputed time step.
fn create_bounding_box(
    polygons: &[Vec<Point3<Real>>],
    parameters: &Parameters,
) -> Result<([Point3<Real>; 8], Real), Error> {
    let explicit = parameters.bbox.is_some();
    let mut corners = match parameters.bbox {
        Some([mins, maxs]) => axis_aligned_corners_checked(mins, maxs)?,
        None => {
            let points: Vec<Point3<Real>> =
                polygons.iter().flat_map(|poly| poly.iter().copied()).collect();
            if points.is_empty() {
                return Err(Error::DegenerateInput(
                    "no input points and no explicit bounding box".to_string(),
                ));
            }
            if parameters.reorient {
                match oriented_corners(&points) {
                    Some(corners) => corners,
                    None => {
                        log::debug!("optimal bounding box is flat, reverting");
                        axis_aligned_corners_of_points(&points)?
                    }
                }
            } else {
                axis_aligned_corners_of_points(&points)?
            }
        }
    };

    let time_step = (corners[7] - corners[0]).norm() / 50.0;

    if !explicit {
        let mut ratio = parameters.enlarge_bbox_ratio;
        if ratio < 1.0 {
            return Err(Error::DegenerateInput(
                "the bounding-box enlargement ratio must be at least 1".to_string(),
            ));
        }
        if ratio == 1.0 {
            ratio += 2.0 * TOLERANCE;
        }
        enlarge(&mut corners, ratio);
    }

    Ok((corners, time_step))
}

/// The axis-aligned corners of all input points, with near-degenerate axes
/// spread apart by twice the tolerance.
fn axis_aligned_corners_of_points(
    points: &[Point3<Real>],
) -> Result<[Point3<Real>; 8], Error> {
    let mut mins = points[0];
    let mut maxs = points[0];
    for p in points {
        mins = mins.inf(p);
        maxs = maxs.sup(p);
    }
    axis_aligned_corners_checked(mins, maxs)
}

fn axis_aligned_corners_checked(
    mut mins: Point3<Real>,
    mut maxs: Point3<Real>,
) -> Result<[Point3<Real>; 8], Error> {
    let mut degenerate_axes = 0;
    for axis in 0..3 {
        if maxs[axis] - mins[axis] < TOLERANCE {
            degenerate_axes += 1;
            mins[axis] -= 2.0 * TOLERANCE;
            maxs[axis] += 2.0 * TOLERANCE;
        }
    }
    if degenerate_axes >= 2 {
        return Err(Error::DegenerateInput(
            "the input is flat on two or more axes".to_string(),
        ));
    }
    Ok(axis_aligned_corners(mins, maxs))
}

fn axis_aligned_corners(mins: Point3<Real>, maxs: Point3<Real>) -> [Point3<Real>; 8] {
    [
        Point3::new(mins.x, mins.y, mins.z),
        Point3::new(maxs.x, mins.y, mins.z),
        Point3::new(maxs.x, maxs.y, mins.z),
        Point3::new(mins.x, maxs.y, mins.z),
        Point3::new(mins.x, maxs.y, maxs.z),
        Point3::new(mins.x, mins.y, maxs.z),
        Point3::new(maxs.x, mins.y, maxs.z),
        Point3::new(maxs.x, maxs.y, maxs.z),
    ]
}

/// The corners of a covariance-oriented bounding box of the points, or
/// `None` when the box is flat on any axis.
fn oriented_corners(points: &[Point3<Real>]) -> Option<[Point3<Real>; 8]> {
    let n = points.len() as Real;
    let mean = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p.coords - mean;
        cov += d * d.transpose();
    }
    cov /= n;

    let eigen = cov.symmetric_eigen();
    let axes = [
        eigen.eigenvectors.column(0).into_owned(),
        eigen.eigenvectors.column(1).into_owned(),
        eigen.eigenvectors.column(2).into_owned(),
    ];

    let mut mins = Vector3::repeat(Real::MAX);
    let mut maxs = Vector3::repeat(-Real::MAX);
    for p in points {
        let d = p.coords - mean;
        for axis in 0..3 {
            let coord = d.dot(&axes[axis]);
            mins[axis] = mins[axis].min(coord);
            maxs[axis] = maxs[axis].max(coord);
        }
    }

    for axis in 0..3 {
        if maxs[axis] - mins[axis] < TOLERANCE {
            return None;
        }
    }

    let corner = |sx: bool, sy: bool, sz: bool| {
        let x = if sx { maxs.x } else { mins.x };
        let y = if sy { maxs.y } else { mins.y };
        let z = if sz { maxs.z } else { mins.z };
        Point3::from(mean + axes[0] * x + axes[1] * y + axes[2] * z)
    };

    Some([
        corner(false, false, false),
        corner(true, false, false),
        corner(true, true, false),
        corner(false, true, false),
        corner(false, true, true),
        corner(false, false, true),
        corner(true, false, true),
        corner(true, true, true),
    ])
}

/// Scales the box about its centroid.
fn enlarge(corners: &mut [Point3<Real>; 8], ratio: Real) {
    let centroid = corners
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / 8.0;
    for corner in corners.iter_mut() {
        *corner = Point3::from(centroid + (corner.coords - centroid) * ratio);
    }
}

/// The six quadrilateral faces of the box, in a fixed order.
fn bounding_box_to_polygons(corners: &[Point3<Real>; 8]) -> [[Point3<Real>; 4]; 6] {
    let c = corners;
    [
        [c[0], c[1], c[2], c[3]],
        [c[0], c[1], c[6], c[5]],
        [c[1], c[2], c[7], c[6]],
        [c[2], c[3], c[4], c[7]],
        [c[3], c[0], c[5], c[4]],
        [c[5], c[6], c[7], c[4]],
    ]
}

/// Creates every transverse intersection line of the non-box planes: pairs
/// of intersection vertices sharing the same set of crossed planes span a
/// line; lines sharing a plane are intersected pairwise in 2D to produce the
/// interior intersection vertices, and each line becomes a polyline of arcs.
fn make_polygons_intersection_free(data: &mut DataStructure) -> Result<(), Error> {
    // Pair up the line endpoints by their sets of crossed planes.
    use std::collections::btree_map::Entry;
    let mut map_p2vv: BTreeMap<BTreeSet<usize>, (IVertexId, Option<IVertexId>)> = BTreeMap::new();
    for iv in data.igraph().vertices().collect::<Vec<_>>() {
        let key = data.igraph().intersected_planes_of_vertex(iv, false);
        if key.len() < 2 {
            continue;
        }
        match map_p2vv.entry(key) {
            Entry::Vacant(entry) => {
                let _ = entry.insert((iv, None));
            }
            Entry::Occupied(mut entry) => entry.get_mut().1 = Some(iv),
        }
    }

    let entries: Vec<(BTreeSet<usize>, (IVertexId, IVertexId))> = map_p2vv
        .iter()
        .filter_map(|(key, (first, second))| second.map(|s| (key.clone(), (*first, s))))
        .collect();

    let mut todo: Vec<(BTreeSet<usize>, Vec<IVertexId>)> = Vec::new();
    for (key_a, (first_a, second_a)) in &entries {
        let mut crossed_vertices = vec![*first_a];
        let mut done: BTreeSet<BTreeSet<usize>> = BTreeSet::new();

        for (key_b, (first_b, second_b)) in &entries {
            let common_plane = key_a.intersection(key_b).copied().max();
            let Some(common_plane) = common_plane else {
                continue;
            };
            let union_set: BTreeSet<usize> = key_a.union(key_b).copied().collect();
            if !done.insert(union_set.clone()) {
                continue;
            }
            if union_set == *key_a {
                // Both keys describe the same line.
                continue;
            }

            let seg_a = Segment2::new(
                data.point_2_of_ivertex(common_plane, *first_a),
                data.point_2_of_ivertex(common_plane, *second_a),
            );
            let seg_b = Segment2::new(
                data.point_2_of_ivertex(common_plane, *first_b),
                data.point_2_of_ivertex(common_plane, *second_b),
            );

            let Some(SegmentsIntersection::Point { loc1, .. }) =
                crate::geometry::segments_intersection2d(
                    &seg_a.a, &seg_a.b, &seg_b.a, &seg_b.b, TOLERANCE,
                )
            else {
                continue;
            };
            let bary = loc1.barycentric_coordinates();
            let inter_2 = crate::math::Point2::from(
                seg_a.a.coords * bary[0] + seg_a.b.coords * bary[1],
            );
            let inter_3 = data.to_3d(common_plane, &inter_2);

            let (iv, _) = data
                .igraph_mut()
                .add_vertex(inter_3, union_set.iter().copied());
            crossed_vertices.push(iv);
        }
        crossed_vertices.push(*second_a);

        todo.push((key_a.clone(), crossed_vertices));
    }

    for (planes, vertices) in todo {
        data.add_iedge_polyline(&planes, vertices)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unit_box_corners_are_ordered() {
        let corners = axis_aligned_corners(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        assert_eq!(corners[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(corners[7], Point3::new(1.0, 1.0, 1.0));
        // Every face must be a planar quad of the box.
        for face in bounding_box_to_polygons(&corners) {
            for pair in face.windows(2) {
                assert_relative_eq!((pair[1] - pair[0]).norm(), 1.0);
            }
        }
    }

    #[test]
    fn degenerate_axis_is_spread_apart() {
        let corners = axis_aligned_corners_checked(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(corners[1].x - corners[0].x >= 4.0 * TOLERANCE);
    }

    #[test]
    fn doubly_degenerate_input_is_refused() {
        let status = axis_aligned_corners_checked(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        assert!(matches!(status, Err(Error::DegenerateInput(_))));
    }

    #[test]
    fn enlarge_is_centered() {
        let mut corners = axis_aligned_corners(
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        enlarge(&mut corners, 2.0);
        assert_relative_eq!(corners[0], Point3::new(-2.0, -2.0, -2.0));
        assert_relative_eq!(corners[7], Point3::new(2.0, 2.0, 2.0));
    }
}
