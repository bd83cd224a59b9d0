//! Non-geometric data objects: graphs, tables and selections.

use meshstat_format::{DataObjectType, FieldAssociation};

use crate::{array::DataArray, attributes::DataSetAttributes, data_set::EMPTY_BOUNDS};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub directed: bool,
    pub num_vertices: u64,
    pub num_edges: u64,
    /// Optional vertex positions (3 components).
    pub points: Option<DataArray>,
    pub vertex_data: DataSetAttributes,
    pub edge_data: DataSetAttributes,
}

impl Graph {
    pub fn data_object_type(&self) -> DataObjectType {
        if self.directed {
            DataObjectType::DirectedGraph
        } else {
            DataObjectType::UndirectedGraph
        }
    }

    pub fn bounds(&self) -> [f64; 6] {
        let mut bounds = EMPTY_BOUNDS;
        if let Some(points) = &self.points {
            for (axis, range) in points.component_ranges().iter().take(3).enumerate() {
                bounds[2 * axis] = range[0];
                bounds[2 * axis + 1] = range[1];
            }
        }
        bounds
    }

    pub fn memory_size(&self) -> usize {
        self.points.as_ref().map_or(0, DataArray::memory_size)
            + self.vertex_data.memory_size()
            + self.edge_data.memory_size()
    }
}

/// Column-oriented table. Each row-data array is a column.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub row_data: DataSetAttributes,
}

impl Table {
    pub fn new(row_data: DataSetAttributes) -> Table {
        Table { row_data }
    }

    pub fn num_rows(&self) -> u64 {
        self.row_data.max_tuples() as u64
    }

    pub fn num_columns(&self) -> u64 {
        self.row_data.num_arrays() as u64
    }

    pub fn memory_size(&self) -> usize {
        self.row_data.memory_size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionContent {
    Indices,
    GlobalIds,
    Values,
    Thresholds,
    Frustum,
    Blocks,
}

#[derive(Debug, Clone)]
pub struct SelectionNode {
    pub content: SelectionContent,
    pub field: FieldAssociation,
    pub selection_list: Option<DataArray>,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub nodes: Vec<SelectionNode>,
}

impl Selection {
    pub fn memory_size(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| n.selection_list.as_ref())
            .map(DataArray::memory_size)
            .sum()
    }
}
