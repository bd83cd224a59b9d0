//! Empty arrays shaped after a summary.

use meshstat_data_stats::ArrayStatistics;
use meshstat_format::ElementType;
use meshstat_model::DataArray;

/// Creates an array with no tuples, carrying the name, element type, component
/// count and component names recorded in `info`.
///
/// Only numeric element types are created; `None` is returned for strings,
/// `Void` and anything else.
pub fn create_empty_array(info: &ArrayStatistics) -> Option<DataArray> {
    let element_type = match info.element_type() {
        ty @ (ElementType::Float32
        | ElementType::Float64
        | ElementType::Int32
        | ElementType::Int8
        | ElementType::IdType
        | ElementType::Int64
        | ElementType::Int16
        | ElementType::UInt8
        | ElementType::UInt32
        | ElementType::UInt64
        | ElementType::UInt16) => ty,
        ElementType::Void | ElementType::String => return None,
    };
    let mut array = DataArray::empty(info.name(), element_type, info.num_components())?;
    for (&component, name) in info.component_names() {
        if component < info.num_components() {
            array = array.with_component_name(component, name.clone());
        }
    }
    Some(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, element_type: ElementType, num_components: usize) -> ArrayStatistics {
        let mut info = ArrayStatistics::new();
        info.set_name(Some(name));
        info.set_element_type(element_type);
        info.set_num_components(num_components);
        info
    }

    #[test]
    fn test_numeric_types() {
        for ty in [
            ElementType::Float32,
            ElementType::Float64,
            ElementType::Int32,
            ElementType::Int8,
            ElementType::IdType,
            ElementType::Int64,
            ElementType::Int16,
            ElementType::UInt8,
            ElementType::UInt32,
            ElementType::UInt64,
            ElementType::UInt16,
        ] {
            let array = create_empty_array(&summary("v", ty, 3)).unwrap();
            assert_eq!(array.name(), Some("v"));
            assert_eq!(array.element_type(), Some(ty));
            assert_eq!(array.num_components(), 3);
            assert_eq!(array.num_tuples(), 0);
        }
    }

    #[test]
    fn test_unsupported_types() {
        assert!(create_empty_array(&summary("s", ElementType::String, 1)).is_none());
        assert!(create_empty_array(&summary("v", ElementType::Void, 1)).is_none());
        assert!(create_empty_array(&ArrayStatistics::new()).is_none());
    }

    #[test]
    fn test_component_names_are_carried() {
        let mut info = summary("Velocity", ElementType::Float64, 3);
        info.set_component_name(2, Some("w"));
        let array = create_empty_array(&info).unwrap();
        assert_eq!(array.component_names().get(&2).map(String::as_str), Some("w"));
    }
}
