//! Closed vocabularies used on the wire: element types, data object types,
//! attribute associations and attribute roles.
//!
//! Every enum carries a stable integer tag. The tags are what the message stream
//! stores, so they must never be renumbered.

use serde::{Deserialize, Serialize};

/// Element (value) type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ElementType {
    Void = 0,
    UInt8 = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Float32 = 10,
    Float64 = 11,
    IdType = 12,
    String = 13,
    Int8 = 15,
    Int64 = 16,
    UInt64 = 17,
}

impl ElementType {
    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn from_tag(tag: i32) -> Option<ElementType> {
        let ty = match tag {
            0 => ElementType::Void,
            3 => ElementType::UInt8,
            4 => ElementType::Int16,
            5 => ElementType::UInt16,
            6 => ElementType::Int32,
            7 => ElementType::UInt32,
            10 => ElementType::Float32,
            11 => ElementType::Float64,
            12 => ElementType::IdType,
            13 => ElementType::String,
            15 => ElementType::Int8,
            16 => ElementType::Int64,
            17 => ElementType::UInt64,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns `true` for the fixed-width numeric types.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ElementType::Void | ElementType::String)
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Void => "void",
            ElementType::UInt8 => "unsigned_char",
            ElementType::Int16 => "short",
            ElementType::UInt16 => "unsigned_short",
            ElementType::Int32 => "int",
            ElementType::UInt32 => "unsigned_int",
            ElementType::Float32 => "float",
            ElementType::Float64 => "double",
            ElementType::IdType => "idtype",
            ElementType::String => "string",
            ElementType::Int8 => "signed_char",
            ElementType::Int64 => "long_long",
            ElementType::UInt64 => "unsigned_long_long",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Dynamic kind of a data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataObjectType {
    PolyData = 0,
    StructuredPoints = 1,
    StructuredGrid = 2,
    RectilinearGrid = 3,
    UnstructuredGrid = 4,
    ImageData = 6,
    DataObject = 7,
    DataSet = 8,
    PointSet = 9,
    UniformGrid = 10,
    CompositeDataSet = 11,
    MultiBlockDataSet = 13,
    GenericDataSet = 16,
    Table = 19,
    Graph = 20,
    Selection = 22,
    DirectedGraph = 23,
    UndirectedGraph = 24,
    MultiPieceDataSet = 25,
    NonOverlappingAmr = 30,
    OverlappingAmr = 31,
    PartitionedDataSet = 37,
    PartitionedDataSetCollection = 38,
}

impl DataObjectType {
    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn from_tag(tag: i32) -> Option<DataObjectType> {
        use DataObjectType::*;
        let ty = match tag {
            0 => PolyData,
            1 => StructuredPoints,
            2 => StructuredGrid,
            3 => RectilinearGrid,
            4 => UnstructuredGrid,
            6 => ImageData,
            7 => DataObject,
            8 => DataSet,
            9 => PointSet,
            10 => UniformGrid,
            11 => CompositeDataSet,
            13 => MultiBlockDataSet,
            16 => GenericDataSet,
            19 => Table,
            20 => Graph,
            22 => Selection,
            23 => DirectedGraph,
            24 => UndirectedGraph,
            25 => MultiPieceDataSet,
            30 => NonOverlappingAmr,
            31 => OverlappingAmr,
            37 => PartitionedDataSet,
            38 => PartitionedDataSetCollection,
            _ => return None,
        };
        Some(ty)
    }

    /// Types whose points are stored explicitly.
    pub fn is_point_set(self) -> bool {
        matches!(
            self,
            DataObjectType::PolyData
                | DataObjectType::StructuredGrid
                | DataObjectType::UnstructuredGrid
                | DataObjectType::PointSet
        )
    }

    /// Members of the implicit-geometry family that collapse to
    /// [`DataObjectType::DataSet`] when mixed with anything else.
    pub fn is_data_set_family(self) -> bool {
        matches!(
            self,
            DataObjectType::ImageData | DataObjectType::RectilinearGrid | DataObjectType::DataSet
        )
    }

    /// Least common supertype of two data set types, as used when summaries of
    /// heterogeneous pieces are combined. `None` stands for "unset".
    ///
    /// The check order matters: the data-set family wins over the generic type,
    /// and everything else degrades to a point set.
    pub fn promote(
        this: Option<DataObjectType>,
        other: Option<DataObjectType>,
    ) -> Option<DataObjectType> {
        if this == other {
            return this;
        }
        let Some(current) = this else {
            return other;
        };
        let other_in = |pred: fn(DataObjectType) -> bool| other.map(pred).unwrap_or(false);
        if current.is_data_set_family() || other_in(DataObjectType::is_data_set_family) {
            Some(DataObjectType::DataSet)
        } else if current == DataObjectType::GenericDataSet
            || other == Some(DataObjectType::GenericDataSet)
        {
            Some(DataObjectType::GenericDataSet)
        } else {
            Some(DataObjectType::PointSet)
        }
    }

    pub fn class_name(self) -> &'static str {
        use DataObjectType::*;
        match self {
            PolyData => "PolyData",
            StructuredPoints => "StructuredPoints",
            StructuredGrid => "StructuredGrid",
            RectilinearGrid => "RectilinearGrid",
            UnstructuredGrid => "UnstructuredGrid",
            ImageData => "ImageData",
            DataObject => "DataObject",
            DataSet => "DataSet",
            PointSet => "PointSet",
            UniformGrid => "UniformGrid",
            CompositeDataSet => "CompositeDataSet",
            MultiBlockDataSet => "MultiBlockDataSet",
            GenericDataSet => "GenericDataSet",
            Table => "Table",
            Graph => "Graph",
            Selection => "Selection",
            DirectedGraph => "DirectedGraph",
            UndirectedGraph => "UndirectedGraph",
            MultiPieceDataSet => "MultiPieceDataSet",
            NonOverlappingAmr => "NonOverlappingAMR",
            OverlappingAmr => "OverlappingAMR",
            PartitionedDataSet => "PartitionedDataSet",
            PartitionedDataSetCollection => "PartitionedDataSetCollection",
        }
    }
}

/// Association of an attribute set with the elements of a data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum FieldAssociation {
    #[default]
    Points = 0,
    Cells = 1,
    Field = 2,
    Vertices = 4,
    Edges = 5,
    Rows = 6,
}

impl FieldAssociation {
    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn from_tag(tag: i32) -> Option<FieldAssociation> {
        let association = match tag {
            0 => FieldAssociation::Points,
            1 => FieldAssociation::Cells,
            2 => FieldAssociation::Field,
            4 => FieldAssociation::Vertices,
            5 => FieldAssociation::Edges,
            6 => FieldAssociation::Rows,
            _ => return None,
        };
        Some(association)
    }
}

/// Special role an array can hold inside an attribute set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeRole {
    Scalars,
    Vectors,
    Normals,
    TCoords,
    Tensors,
}

impl AttributeRole {
    pub const ALL: [AttributeRole; 5] = [
        AttributeRole::Scalars,
        AttributeRole::Vectors,
        AttributeRole::Normals,
        AttributeRole::TCoords,
        AttributeRole::Tensors,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_tags_round_trip() {
        for tag in -1..20 {
            if let Some(ty) = ElementType::from_tag(tag) {
                assert_eq!(ty.tag(), tag);
            }
        }
        assert_eq!(ElementType::from_tag(1), None);
        assert_eq!(ElementType::from_tag(12), Some(ElementType::IdType));
    }

    #[test]
    fn test_promotion_lattice() {
        use DataObjectType::*;
        assert_eq!(DataObjectType::promote(None, Some(PolyData)), Some(PolyData));
        assert_eq!(
            DataObjectType::promote(Some(RectilinearGrid), Some(UnstructuredGrid)),
            Some(DataSet)
        );
        assert_eq!(
            DataObjectType::promote(Some(UnstructuredGrid), Some(ImageData)),
            Some(DataSet)
        );
        assert_eq!(
            DataObjectType::promote(Some(GenericDataSet), Some(ImageData)),
            Some(DataSet)
        );
        assert_eq!(
            DataObjectType::promote(Some(PolyData), Some(GenericDataSet)),
            Some(GenericDataSet)
        );
        assert_eq!(
            DataObjectType::promote(Some(PolyData), Some(UnstructuredGrid)),
            Some(PointSet)
        );
        assert_eq!(DataObjectType::promote(Some(Table), Some(Table)), Some(Table));
        // A set type meeting an unset one is not adopted, it degrades.
        assert_eq!(DataObjectType::promote(Some(PolyData), None), Some(PointSet));
    }

    #[test]
    fn test_field_association_serde() {
        let json = serde_json::to_string(&FieldAssociation::Rows).unwrap();
        assert_eq!(json, "\"Rows\"");
        let back: FieldAssociation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FieldAssociation::Rows);
    }
}
