//! Named, multi-component arrays backed by Arrow.

use std::{collections::BTreeMap, sync::Arc};

use arrow_array::{
    Array, ArrayRef, ArrowPrimitiveType, PrimitiveArray, StringArray,
    cast::AsArray,
    types::{
        Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
        UInt16Type, UInt32Type, UInt64Type,
    },
};
use arrow_schema::DataType;
use meshstat_format::ElementType;

/// A `(location, name)` pair identifying a metadata key attached to an array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InformationKey {
    pub location: String,
    pub name: String,
}

impl InformationKey {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> InformationKey {
        InformationKey {
            location: location.into(),
            name: name.into(),
        }
    }
}

/// A named array of tuples.
///
/// Values are stored flat and tuple-major in a single Arrow array: tuple `i`
/// occupies positions `i * num_components .. (i + 1) * num_components`.
#[derive(Debug, Clone)]
pub struct DataArray {
    name: Option<String>,
    values: ArrayRef,
    num_components: usize,
    id_type: bool,
    component_names: BTreeMap<usize, String>,
    info_keys: Vec<InformationKey>,
}

impl DataArray {
    /// Wraps an Arrow array. `num_components` is clamped to at least one.
    pub fn new(name: Option<&str>, values: ArrayRef, num_components: usize) -> DataArray {
        DataArray {
            name: name.map(str::to_string),
            values,
            num_components: num_components.max(1),
            id_type: false,
            component_names: BTreeMap::new(),
            info_keys: Vec::new(),
        }
    }

    /// Builds a primitive array from native values.
    pub fn from_values<T: ArrowPrimitiveType>(
        name: &str,
        num_components: usize,
        values: impl IntoIterator<Item = T::Native>,
    ) -> DataArray {
        let values = PrimitiveArray::<T>::from_iter_values(values);
        DataArray::new(Some(name), Arc::new(values), num_components)
    }

    pub fn from_f64(name: &str, num_components: usize, values: Vec<f64>) -> DataArray {
        DataArray::from_values::<Float64Type>(name, num_components, values)
    }

    pub fn from_f32(name: &str, num_components: usize, values: Vec<f32>) -> DataArray {
        DataArray::from_values::<Float32Type>(name, num_components, values)
    }

    pub fn from_i32(name: &str, num_components: usize, values: Vec<i32>) -> DataArray {
        DataArray::from_values::<Int32Type>(name, num_components, values)
    }

    /// Builds an id-typed array (64-bit signed storage, reported as `IdType`).
    pub fn from_ids(name: &str, values: Vec<i64>) -> DataArray {
        let mut array = DataArray::from_values::<Int64Type>(name, 1, values);
        array.id_type = true;
        array
    }

    pub fn from_strings<'a>(name: &str, values: impl IntoIterator<Item = &'a str>) -> DataArray {
        let values = StringArray::from_iter_values(values);
        DataArray::new(Some(name), Arc::new(values), 1)
    }

    /// An array with no tuples of the given element type, or `None` when the type
    /// has no Arrow storage.
    pub fn empty(
        name: Option<&str>,
        element_type: ElementType,
        num_components: usize,
    ) -> Option<DataArray> {
        let data_type = arrow_type_of(element_type)?;
        let mut array = DataArray::new(
            name,
            arrow_array::new_empty_array(&data_type),
            num_components,
        );
        array.id_type = element_type == ElementType::IdType;
        Some(array)
    }

    pub fn with_component_name(mut self, component: usize, name: impl Into<String>) -> Self {
        self.component_names.insert(component, name.into());
        self
    }

    pub fn with_info_key(mut self, key: InformationKey) -> Self {
        self.info_keys.push(key);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_string);
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn num_tuples(&self) -> usize {
        self.values.len() / self.num_components
    }

    pub fn component_names(&self) -> &BTreeMap<usize, String> {
        &self.component_names
    }

    pub fn info_keys(&self) -> &[InformationKey] {
        &self.info_keys
    }

    /// Element type of the stored values, `None` if the Arrow type is outside
    /// the supported set.
    pub fn element_type(&self) -> Option<ElementType> {
        let ty = element_type_of(self.values.data_type())?;
        if self.id_type && ty == ElementType::Int64 {
            Some(ElementType::IdType)
        } else {
            Some(ty)
        }
    }

    pub fn memory_size(&self) -> usize {
        self.values.get_array_memory_size()
    }

    /// Per-component `[min, max]` over all non-null, non-NaN values. Components
    /// without any such value keep the inverted `[+inf, -inf]` range.
    pub fn component_ranges(&self) -> Vec<[f64; 2]> {
        let nc = self.num_components;
        let mut ranges = vec![[f64::INFINITY, f64::NEG_INFINITY]; nc];
        visit_f64(self.values.as_ref(), 0..self.values.len(), |i, v| {
            if !v.is_nan() {
                let r = &mut ranges[i % nc];
                r[0] = r[0].min(v);
                r[1] = r[1].max(v);
            }
        });
        ranges
    }
}

/// Calls `f(index, value)` for every valid numeric entry in `range`. Returns
/// `false` (and visits nothing) when the array is not numeric.
pub fn visit_f64(
    values: &dyn Array,
    range: std::ops::Range<usize>,
    mut f: impl FnMut(usize, f64),
) -> bool {
    macro_rules! visit {
        ($t:ty) => {{
            let typed = values.as_primitive::<$t>();
            for i in range {
                if typed.is_valid(i) {
                    f(i, typed.value(i) as f64);
                }
            }
            true
        }};
    }
    match values.data_type() {
        DataType::Int8 => visit!(Int8Type),
        DataType::UInt8 => visit!(UInt8Type),
        DataType::Int16 => visit!(Int16Type),
        DataType::UInt16 => visit!(UInt16Type),
        DataType::Int32 => visit!(Int32Type),
        DataType::UInt32 => visit!(UInt32Type),
        DataType::Int64 => visit!(Int64Type),
        DataType::UInt64 => visit!(UInt64Type),
        DataType::Float32 => visit!(Float32Type),
        DataType::Float64 => visit!(Float64Type),
        _ => false,
    }
}

pub fn element_type_of(data_type: &DataType) -> Option<ElementType> {
    let ty = match data_type {
        DataType::Int8 => ElementType::Int8,
        DataType::UInt8 => ElementType::UInt8,
        DataType::Int16 => ElementType::Int16,
        DataType::UInt16 => ElementType::UInt16,
        DataType::Int32 => ElementType::Int32,
        DataType::UInt32 => ElementType::UInt32,
        DataType::Int64 => ElementType::Int64,
        DataType::UInt64 => ElementType::UInt64,
        DataType::Float32 => ElementType::Float32,
        DataType::Float64 => ElementType::Float64,
        DataType::Utf8 | DataType::LargeUtf8 => ElementType::String,
        DataType::Null => ElementType::Void,
        _ => return None,
    };
    Some(ty)
}

pub fn arrow_type_of(element_type: ElementType) -> Option<DataType> {
    let ty = match element_type {
        ElementType::Int8 => DataType::Int8,
        ElementType::UInt8 => DataType::UInt8,
        ElementType::Int16 => DataType::Int16,
        ElementType::UInt16 => DataType::UInt16,
        ElementType::Int32 => DataType::Int32,
        ElementType::UInt32 => DataType::UInt32,
        ElementType::Int64 | ElementType::IdType => DataType::Int64,
        ElementType::UInt64 => DataType::UInt64,
        ElementType::Float32 => DataType::Float32,
        ElementType::Float64 => DataType::Float64,
        ElementType::String => DataType::Utf8,
        ElementType::Void => return None,
    };
    Some(ty)
}
