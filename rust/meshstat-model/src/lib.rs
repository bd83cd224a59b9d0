//! In-memory data objects that summaries are built from.
//!
//! The model carries what the statistics layer
//! reads (array values, counts, geometry, hierarchy and time metadata) and what the
//! empty-partition repair writes back. Array payloads are Arrow arrays.

pub mod array;
pub mod attributes;
pub mod composite;
pub mod data_set;
pub mod object;
pub mod tabular;

pub use array::{DataArray, InformationKey};
pub use attributes::DataSetAttributes;
pub use composite::{AmrDataSet, AmrKind, Block, CompositeDataSet, CompositeKind};
pub use data_set::{DataSet, DataSetKind, GenericDataSet};
pub use object::{DataBody, DataObject, ForeignObject, PipelineMetadata};
pub use tabular::{Graph, Selection, SelectionContent, SelectionNode, Table};
