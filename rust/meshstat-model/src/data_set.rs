//! Leaf data sets: explicit point sets, structured (implicit) grids and generic
//! data sets.

use meshstat_format::DataObjectType;

use crate::{array::DataArray, attributes::DataSetAttributes};

/// An inverted (empty) bounding box.
pub const EMPTY_BOUNDS: [f64; 6] = [
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::NEG_INFINITY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSetKind {
    PolyData,
    UnstructuredGrid,
    StructuredGrid,
    ImageData,
    UniformGrid,
    RectilinearGrid,
}

impl DataSetKind {
    pub fn data_object_type(self) -> DataObjectType {
        match self {
            DataSetKind::PolyData => DataObjectType::PolyData,
            DataSetKind::UnstructuredGrid => DataObjectType::UnstructuredGrid,
            DataSetKind::StructuredGrid => DataObjectType::StructuredGrid,
            DataSetKind::ImageData => DataObjectType::ImageData,
            DataSetKind::UniformGrid => DataObjectType::UniformGrid,
            DataSetKind::RectilinearGrid => DataObjectType::RectilinearGrid,
        }
    }

    /// Kinds that store their points explicitly.
    pub fn is_point_set(self) -> bool {
        matches!(
            self,
            DataSetKind::PolyData | DataSetKind::UnstructuredGrid | DataSetKind::StructuredGrid
        )
    }

}

#[derive(Debug, Clone)]
pub struct DataSet {
    kind: DataSetKind,
    points: Option<DataArray>,
    num_cells: u64,
    extent: Option<[i32; 6]>,
    origin: [f64; 3],
    spacing: [f64; 3],
    coordinates: Option<Box<[DataArray; 3]>>,
    pub point_data: DataSetAttributes,
    pub cell_data: DataSetAttributes,
}

impl DataSet {
    fn with_kind(kind: DataSetKind) -> DataSet {
        DataSet {
            kind,
            points: None,
            num_cells: 0,
            extent: None,
            origin: [0.0; 3],
            spacing: [1.0; 3],
            coordinates: None,
            point_data: DataSetAttributes::default(),
            cell_data: DataSetAttributes::default(),
        }
    }

    pub fn poly_data(points: Option<DataArray>, num_cells: u64) -> DataSet {
        DataSet {
            points,
            num_cells,
            ..DataSet::with_kind(DataSetKind::PolyData)
        }
    }

    pub fn unstructured_grid(points: Option<DataArray>, num_cells: u64) -> DataSet {
        DataSet {
            points,
            num_cells,
            ..DataSet::with_kind(DataSetKind::UnstructuredGrid)
        }
    }

    pub fn structured_grid(extent: [i32; 6], points: Option<DataArray>) -> DataSet {
        DataSet {
            points,
            num_cells: cells_of_dimensions(dimensions_of(&extent)),
            extent: Some(extent),
            ..DataSet::with_kind(DataSetKind::StructuredGrid)
        }
    }

    pub fn image_data(extent: [i32; 6], origin: [f64; 3], spacing: [f64; 3]) -> DataSet {
        DataSet {
            num_cells: cells_of_dimensions(dimensions_of(&extent)),
            extent: Some(extent),
            origin,
            spacing,
            ..DataSet::with_kind(DataSetKind::ImageData)
        }
    }

    pub fn uniform_grid(extent: [i32; 6], origin: [f64; 3], spacing: [f64; 3]) -> DataSet {
        DataSet {
            kind: DataSetKind::UniformGrid,
            ..DataSet::image_data(extent, origin, spacing)
        }
    }

    /// A rectilinear grid whose extent is derived from the coordinate array
    /// lengths, starting at index zero.
    pub fn rectilinear_grid(x: DataArray, y: DataArray, z: DataArray) -> DataSet {
        let dims = [x.num_tuples(), y.num_tuples(), z.num_tuples()];
        let extent = [
            0,
            dims[0] as i32 - 1,
            0,
            dims[1] as i32 - 1,
            0,
            dims[2] as i32 - 1,
        ];
        DataSet {
            num_cells: cells_of_dimensions(dims),
            extent: Some(extent),
            coordinates: Some(Box::new([x, y, z])),
            ..DataSet::with_kind(DataSetKind::RectilinearGrid)
        }
    }

    pub fn with_point_data(mut self, point_data: DataSetAttributes) -> Self {
        self.point_data = point_data;
        self
    }

    pub fn with_cell_data(mut self, cell_data: DataSetAttributes) -> Self {
        self.cell_data = cell_data;
        self
    }

    pub fn kind(&self) -> DataSetKind {
        self.kind
    }

    pub fn data_object_type(&self) -> DataObjectType {
        self.kind.data_object_type()
    }

    pub fn points(&self) -> Option<&DataArray> {
        self.points.as_ref()
    }

    /// Replaces the explicit points. Ignored for kinds with implicit points.
    pub fn set_points(&mut self, points: Option<DataArray>) {
        if self.kind.is_point_set() {
            self.points = points;
        }
    }

    pub fn extent(&self) -> Option<[i32; 6]> {
        self.extent
    }

    pub fn num_points(&self) -> u64 {
        match self.kind {
            DataSetKind::PolyData | DataSetKind::UnstructuredGrid | DataSetKind::StructuredGrid => {
                self.points.as_ref().map_or(0, |p| p.num_tuples() as u64)
            }
            DataSetKind::ImageData | DataSetKind::UniformGrid | DataSetKind::RectilinearGrid => self
                .extent
                .map_or(0, |e| dimensions_of(&e).iter().product::<usize>() as u64),
        }
    }

    pub fn num_cells(&self) -> u64 {
        self.num_cells
    }

    /// Axis-aligned bounds `[xmin, xmax, ymin, ymax, zmin, zmax]`, inverted when
    /// the data set has no points.
    pub fn bounds(&self) -> [f64; 6] {
        if self.num_points() == 0 {
            return EMPTY_BOUNDS;
        }
        match self.kind {
            DataSetKind::PolyData | DataSetKind::UnstructuredGrid | DataSetKind::StructuredGrid => {
                let mut bounds = EMPTY_BOUNDS;
                if let Some(points) = &self.points {
                    for (axis, range) in points.component_ranges().iter().take(3).enumerate() {
                        bounds[2 * axis] = range[0];
                        bounds[2 * axis + 1] = range[1];
                    }
                }
                bounds
            }
            DataSetKind::ImageData | DataSetKind::UniformGrid => {
                let mut bounds = EMPTY_BOUNDS;
                let extent = self.extent.unwrap_or([0; 6]);
                for axis in 0..3 {
                    let a = self.origin[axis] + extent[2 * axis] as f64 * self.spacing[axis];
                    let b = self.origin[axis] + extent[2 * axis + 1] as f64 * self.spacing[axis];
                    bounds[2 * axis] = a.min(b);
                    bounds[2 * axis + 1] = a.max(b);
                }
                bounds
            }
            DataSetKind::RectilinearGrid => {
                let mut bounds = EMPTY_BOUNDS;
                if let Some(coords) = &self.coordinates {
                    for (axis, coord) in coords.iter().enumerate() {
                        let range = coord.component_ranges()[0];
                        bounds[2 * axis] = range[0];
                        bounds[2 * axis + 1] = range[1];
                    }
                }
                bounds
            }
        }
    }

    pub fn memory_size(&self) -> usize {
        let geometry = self.points.as_ref().map_or(0, DataArray::memory_size)
            + self
                .coordinates
                .as_ref()
                .map_or(0, |c| c.iter().map(DataArray::memory_size).sum());
        geometry + self.point_data.memory_size() + self.cell_data.memory_size()
    }
}

/// Point counts along each axis of a structured extent.
pub fn dimensions_of(extent: &[i32; 6]) -> [usize; 3] {
    let dim = |lo: i32, hi: i32| {
        if hi >= lo {
            (hi as i64 - lo as i64 + 1) as usize
        } else {
            0
        }
    };
    [
        dim(extent[0], extent[1]),
        dim(extent[2], extent[3]),
        dim(extent[4], extent[5]),
    ]
}

fn cells_of_dimensions(dims: [usize; 3]) -> u64 {
    if dims.contains(&0) {
        return 0;
    }
    dims.iter().map(|&d| (d.max(2) - 1) as u64).product()
}

/// A data set reached only through generic (adaptor-style) accessors: it
/// reports counts, bounds and attributes but exposes no concrete geometry.
#[derive(Debug, Clone, Default)]
pub struct GenericDataSet {
    pub num_points: u64,
    pub num_cells: u64,
    pub bounds: Option<[f64; 6]>,
    pub point_data: DataSetAttributes,
    pub cell_data: DataSetAttributes,
}

impl GenericDataSet {
    pub fn bounds(&self) -> [f64; 6] {
        self.bounds.unwrap_or(EMPTY_BOUNDS)
    }

    pub fn memory_size(&self) -> usize {
        self.point_data.memory_size() + self.cell_data.memory_size()
    }
}
