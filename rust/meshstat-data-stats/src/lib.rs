//! Data information statistics.
//!
//! Compact, mergeable summaries of data objects: what arrays they carry and
//! over which ranges, how many points, cells and rows they hold, where they
//! sit in space and time, and how composite objects are structured. Each
//! process builds a [`DatasetStatistics`] from its local data, serializes it
//! with [`DatasetStatistics::to_bytes`], and a collector folds the decoded
//! summaries together with [`DatasetStatistics::add_information`].

pub mod array;
pub mod attributes;
pub mod bounds;
pub mod composite;
pub mod dataset;
pub mod discrete;
pub mod helpers;

pub use array::ArrayStatistics;
pub use attributes::AttributeSetStatistics;
pub use bounds::{Bounds, Extent};
pub use composite::{CompositeChild, CompositeTreeStatistics};
pub use dataset::DatasetStatistics;
pub use discrete::{MAX_CATEGORICAL_VALUES, UniqueValues};
pub use helpers::{DataInformationHelper, HelperRegistry};
