//! The public entry point of the crate and the final partition view.

use crate::data_structure::{DataStructure, PFace};
use crate::error::Error;
use crate::math::{Point3, Real, Vector3};
use crate::parameters::Parameters;
use crate::initializer;
use crate::propagation::{self, PropagationStats};

/// Inside/outside label of a volume cell. Label assignment is performed by
/// an external classification pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum VisibilityLabel {
    /// The cell belongs to the reconstructed solid.
    Inside,
    /// The cell belongs to the empty space.
    Outside,
}

/// One convex polyhedral cell of the final partition.
///
/// Cells are produced by an external volume-extraction pass; the kinetic
/// core only provides the container.
#[derive(Clone, Debug)]
pub struct VolumeCell {
    /// The polygonal faces bounding this cell, one per touching support
    /// plane.
    pub pfaces: Vec<PFace>,
    /// For each face, the index of the cell on its other side, if any.
    pub neighbors: Vec<Option<usize>>,
    /// The centroid of the cell.
    pub centroid: Point3<Real>,
    /// The index of this cell.
    pub index: usize,
    /// The inside/outside label of this cell.
    pub visibility: VisibilityLabel,
}

impl VolumeCell {
    /// Registers a bounding face and its neighbor cell.
    pub fn add_pface(&mut self, pface: PFace, neighbor: Option<usize>) {
        self.pfaces.push(pface);
        self.neighbors.push(neighbor);
    }
}

/// The surface assembled from the final partition by an external pass.
#[derive(Clone, Debug, Default)]
pub struct ReconstructedModel {
    /// The faces retained on the output surface.
    pub pfaces: Vec<PFace>,
}

impl ReconstructedModel {
    /// Drops every retained face.
    pub fn clear(&mut self) {
        self.pfaces.clear();
    }
}

/// A consumer data structure the final partition can be converted into.
pub trait FromPartition: Sized {
    /// Builds the consumer structure from the final partition.
    fn from_partition(partition: &Partition) -> Self;
}

/// The resolved kinetic partition: every support plane carries its final
/// planar subdivision, and the support planes together decompose the
/// bounding box into convex cells.
#[derive(Debug)]
pub struct Partition {
    data: DataStructure,
    stats: PropagationStats,
    volumes: Vec<VolumeCell>,
    reconstructed_model: ReconstructedModel,
}

impl Partition {
    /// The underlying kinetic data structure.
    #[inline]
    pub fn data(&self) -> &DataStructure {
        &self.data
    }

    /// Mutable access to the underlying kinetic data structure, for volume
    /// extraction passes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut DataStructure {
        &mut self.data
    }

    /// The statistics of the propagation run.
    #[inline]
    pub fn stats(&self) -> PropagationStats {
        self.stats
    }

    /// The number of support planes, including the six bounding-box faces.
    pub fn number_of_support_planes(&self) -> usize {
        self.data.number_of_support_planes()
    }

    /// The faces of the subdivision carried by one support plane.
    pub fn pfaces(&self, plane: usize) -> Vec<PFace> {
        self.data.pfaces(plane)
    }

    /// The 3D polygon of a face, sampled at the final simulated time.
    pub fn polygon_of_pface(&self, pface: PFace) -> Vec<Point3<Real>> {
        let time = self.data.current_time();
        self.data
            .pvertices_of_pface(pface)
            .into_iter()
            .map(|pv| self.data.point_3(pv, time))
            .collect()
    }

    /// The centroid of a face at the final simulated time.
    pub fn centroid_of_pface(&self, pface: PFace) -> Point3<Real> {
        let polygon = self.polygon_of_pface(pface);
        let n = polygon.len().max(1) as Real;
        let sum = polygon
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / n)
    }

    /// The indices of the input polygons a face originates from.
    pub fn input_of_pface(&self, pface: PFace) -> Vec<usize> {
        self.data.mesh(pface.plane).face(pface.face).input.clone()
    }

    /// The volume cells, to be filled by an external volume-extraction pass.
    pub fn volumes(&self) -> &[VolumeCell] {
        &self.volumes
    }

    /// Mutable volume cells.
    pub fn volumes_mut(&mut self) -> &mut Vec<VolumeCell> {
        &mut self.volumes
    }

    /// The reconstructed model slot, to be filled externally.
    pub fn reconstructed_model(&self) -> &ReconstructedModel {
        &self.reconstructed_model
    }

    /// Mutable reconstructed model slot.
    pub fn reconstructed_model_mut(&mut self) -> &mut ReconstructedModel {
        &mut self.reconstructed_model
    }

    /// Converts the partition into a consumer data structure.
    pub fn convert<T: FromPartition>(&self) -> T {
        T::from_partition(self)
    }
}

/// The kinetic partitioning engine.
///
/// ```
/// use cleave3d::{KineticPartition3, Parameters};
/// use cleave3d::na::Point3;
///
/// let square = vec![
///     Point3::new(-0.5, 0.0, -0.5),
///     Point3::new(0.5, 0.0, -0.5),
///     Point3::new(0.5, 0.0, 0.5),
///     Point3::new(-0.5, 0.0, 0.5),
/// ];
/// let mut parameters = Parameters::default();
/// parameters.bbox = Some([Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5)]);
///
/// let engine = KineticPartition3::new(parameters);
/// let partition = engine.partition(&[square]).unwrap();
/// assert_eq!(partition.number_of_support_planes(), 7);
/// ```
#[derive(Debug, Default)]
pub struct KineticPartition3 {
    parameters: Parameters,
}

impl KineticPartition3 {
    /// An engine with the given parameters.
    pub fn new(parameters: Parameters) -> Self {
        KineticPartition3 { parameters }
    }

    /// The parameters of this engine.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Builds the kinetic partition of the given polygons.
    ///
    /// Each polygon is a simple planar loop of 3D points. The returned
    /// partition is fully resolved: every polygon vertex ended frozen on the
    /// intersection graph.
    pub fn partition(&self, polygons: &[Vec<Point3<Real>>]) -> Result<Partition, Error> {
        let mut data = DataStructure::new(self.parameters.verbose);
        let time_step = initializer::initialize(&mut data, polygons, &self.parameters)?;
        let stats = propagation::propagate(&mut data, time_step, &self.parameters)?;

        if self.parameters.debug {
            data.check_integrity(true)?;
            data.check_vertices()?;
            data.check_edge_planes()?;
        }

        Ok(Partition {
            data,
            stats,
            volumes: Vec::new(),
            reconstructed_model: ReconstructedModel::default(),
        })
    }
}
