//! The top-level data object: a tagged union over every supported kind, plus the
//! field data and pipeline metadata common to all of them.

use std::{any::Any, sync::Arc};

use meshstat_format::DataObjectType;

use crate::{
    attributes::DataSetAttributes,
    composite::{AmrDataSet, CompositeDataSet},
    data_set::{DataSet, GenericDataSet},
    tabular::{Graph, Selection, Table},
};

/// Time information attached to a data object by the producing pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetadata {
    pub time_steps: Vec<f64>,
    pub time_range: Option<[f64; 2]>,
    pub current_time: Option<f64>,
    pub time_label: Option<String>,
}

/// An object of a type this crate does not know about. Summaries for it are
/// produced by a helper registered under `type_name`.
#[derive(Clone)]
pub struct ForeignObject {
    pub type_name: String,
    pub payload: Arc<dyn Any + Send + Sync>,
}

impl ForeignObject {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> ForeignObject {
        ForeignObject {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }
}

impl std::fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignObject")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum DataBody {
    DataSet(DataSet),
    Composite(CompositeDataSet),
    Amr(AmrDataSet),
    Generic(GenericDataSet),
    Graph(Graph),
    Table(Table),
    Selection(Selection),
    Foreign(ForeignObject),
}

#[derive(Debug, Clone)]
pub struct DataObject {
    pub body: DataBody,
    pub field_data: DataSetAttributes,
    pub metadata: PipelineMetadata,
}

impl DataObject {
    pub fn new(body: DataBody) -> DataObject {
        DataObject {
            body,
            field_data: DataSetAttributes::default(),
            metadata: PipelineMetadata::default(),
        }
    }

    pub fn with_field_data(mut self, field_data: DataSetAttributes) -> Self {
        self.field_data = field_data;
        self
    }

    pub fn with_metadata(mut self, metadata: PipelineMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The concrete type tag, `None` for foreign objects.
    pub fn data_object_type(&self) -> Option<DataObjectType> {
        let ty = match &self.body {
            DataBody::DataSet(ds) => ds.data_object_type(),
            DataBody::Composite(c) => c.kind().data_object_type(),
            DataBody::Amr(amr) => amr.data_object_type(),
            DataBody::Generic(_) => DataObjectType::GenericDataSet,
            DataBody::Graph(g) => g.data_object_type(),
            DataBody::Table(_) => DataObjectType::Table,
            DataBody::Selection(_) => DataObjectType::Selection,
            DataBody::Foreign(_) => return None,
        };
        Some(ty)
    }

    pub fn class_name(&self) -> &str {
        match &self.body {
            DataBody::Foreign(foreign) => &foreign.type_name,
            _ => self
                .data_object_type()
                .map_or("DataObject", DataObjectType::class_name),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.body, DataBody::Composite(_) | DataBody::Amr(_))
    }

    pub fn as_data_set(&self) -> Option<&DataSet> {
        match &self.body {
            DataBody::DataSet(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn as_data_set_mut(&mut self) -> Option<&mut DataSet> {
        match &mut self.body {
            DataBody::DataSet(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeDataSet> {
        match &self.body {
            DataBody::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a DataObject>) {
        match &self.body {
            DataBody::Composite(c) => {
                for block in c.blocks() {
                    if let Some(data) = &block.data {
                        data.collect_leaves(leaves);
                    }
                }
            }
            _ => leaves.push(self),
        }
    }
}

macro_rules! impl_from_body {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DataObject {
                fn from(value: $ty) -> Self {
                    DataObject::new(DataBody::$variant(value))
                }
            }
        )*
    };
}

impl_from_body!(
    DataSet => DataSet,
    CompositeDataSet => Composite,
    AmrDataSet => Amr,
    GenericDataSet => Generic,
    Graph => Graph,
    Table => Table,
    Selection => Selection,
    ForeignObject => Foreign,
);
