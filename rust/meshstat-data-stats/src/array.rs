//! Summary of a single named array: type, shape, per-component value ranges,
//! component names, provenance keys and categorical values.

use std::collections::BTreeMap;

use meshstat_common::{Result, error::Error, verify_data};
use meshstat_format::{ElementType, MessageReader, MessageWriter, Variant};
use meshstat_model::{DataArray, InformationKey, array::visit_f64};

use crate::discrete::UniqueValues;

const EMPTY_RANGE: [f64; 2] = [f64::INFINITY, f64::NEG_INFINITY];

/// Statistics describing one array.
///
/// Ranges are stored per component, with an extra leading slot holding the
/// range of the tuple magnitude when the array has more than one component.
/// External component indices are shifted past that slot; index `-1` always
/// addresses the magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayStatistics {
    name: Option<String>,
    element_type: ElementType,
    num_components: usize,
    num_tuples: i64,
    is_partial: bool,
    ranges: Vec<[f64; 2]>,
    component_names: BTreeMap<usize, String>,
    info_keys: Vec<InformationKey>,
    unique_values: Option<UniqueValues>,
}

impl Default for ArrayStatistics {
    fn default() -> Self {
        ArrayStatistics {
            name: None,
            element_type: ElementType::Void,
            num_components: 0,
            num_tuples: 0,
            is_partial: false,
            ranges: Vec::new(),
            component_names: BTreeMap::new(),
            info_keys: Vec::new(),
            unique_values: None,
        }
    }
}

impl ArrayStatistics {
    pub fn new() -> ArrayStatistics {
        ArrayStatistics::default()
    }

    /// Builds the statistics of a live array.
    pub fn from_array(array: &DataArray) -> Result<ArrayStatistics> {
        let mut stats = ArrayStatistics::new();
        stats.copy_from_object(Some(array))?;
        Ok(stats)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_string);
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn set_element_type(&mut self, element_type: ElementType) {
        self.element_type = element_type;
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn num_tuples(&self) -> i64 {
        self.num_tuples
    }

    pub fn set_num_tuples(&mut self, num_tuples: i64) {
        self.num_tuples = num_tuples;
    }

    /// `true` when the array was missing from at least one of the parts merged
    /// into this summary.
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    pub fn set_partial(&mut self, partial: bool) {
        self.is_partial = partial;
    }

    /// Resizes the component layout.
    ///
    /// Changing the count resets every range to the inverted `[+inf, -inf]`
    /// pair and discards categorical tracking. Setting the same count is a
    /// no-op.
    pub fn set_num_components(&mut self, num_components: usize) {
        if num_components == self.num_components {
            return;
        }
        self.num_components = num_components;
        self.ranges = vec![EMPTY_RANGE; range_slots(num_components)];
        self.unique_values = None;
    }

    /// Sets the range of an external component index (`-1` for the magnitude).
    pub fn set_component_range(&mut self, component: i32, min: f64, max: f64) -> Result<()> {
        let slot = self.range_slot(component)?;
        self.ranges[slot] = [min, max];
        Ok(())
    }

    /// Range of an external component index (`-1` for the magnitude). Returns
    /// the inverted empty range for an index outside the layout.
    pub fn component_range(&self, component: i32) -> [f64; 2] {
        self.range_slot(component)
            .map_or(EMPTY_RANGE, |slot| self.ranges[slot])
    }

    /// Raw range slots, magnitude first when present.
    pub fn ranges(&self) -> &[[f64; 2]] {
        &self.ranges
    }

    fn range_slot(&self, component: i32) -> Result<usize> {
        if component >= self.num_components as i32 || self.ranges.is_empty() {
            return Err(Error::invalid_arg(
                "component",
                format!(
                    "component {component} out of range for {} components",
                    self.num_components
                ),
            ));
        }
        let slot = if component < 0 {
            0
        } else if self.num_components > 1 {
            component as usize + 1
        } else {
            component as usize
        };
        Ok(slot)
    }

    pub fn component_name(&self, component: usize) -> Option<&str> {
        self.component_names.get(&component).map(String::as_str)
    }

    pub fn component_names(&self) -> &BTreeMap<usize, String> {
        &self.component_names
    }

    pub fn set_component_name(&mut self, component: usize, name: Option<&str>) {
        match name {
            Some(name) => {
                self.component_names.insert(component, name.to_string());
            }
            None => {
                self.component_names.remove(&component);
            }
        }
    }

    pub fn info_keys(&self) -> &[InformationKey] {
        &self.info_keys
    }

    pub fn has_info_key(&self, location: &str, name: &str) -> bool {
        self.info_keys
            .iter()
            .any(|key| key.location == location && key.name == name)
    }

    /// Adds a key unless an equal `(location, name)` pair is already present.
    pub fn add_info_key(&mut self, key: InformationKey) {
        if !self.info_keys.contains(&key) {
            self.info_keys.push(key);
        }
    }

    pub fn unique_values(&self) -> Option<&UniqueValues> {
        self.unique_values.as_ref()
    }

    /// Replaces the categorical tracking. `None` means "not tracked".
    pub fn set_unique_values(&mut self, unique_values: Option<UniqueValues>) {
        self.unique_values = unique_values;
    }

    /// Resets to the freshly constructed state.
    pub fn clear(&mut self) {
        *self = ArrayStatistics::default();
    }

    /// Populates every field from a live array.
    ///
    /// `None` resets the summary. An array whose values are outside the
    /// supported element types also resets it and is reported as an error.
    pub fn copy_from_object(&mut self, array: Option<&DataArray>) -> Result<()> {
        self.clear();
        let Some(array) = array else {
            return Ok(());
        };
        let Some(element_type) = array.element_type() else {
            return Err(Error::unsupported_type(
                format!("array {:?}", array.name().unwrap_or_default()),
                array.values().data_type().to_string(),
            ));
        };

        let nc = array.num_components();
        self.name = array.name().map(str::to_string);
        self.element_type = element_type;
        self.set_num_components(nc);
        self.num_tuples = array.num_tuples() as i64;

        if element_type.is_numeric() {
            let offset = usize::from(nc > 1);
            for (component, range) in array.component_ranges().into_iter().enumerate() {
                self.ranges[component + offset] = range;
            }
            if nc > 1 {
                self.ranges[0] = magnitude_range(array);
            }
        }

        self.component_names = array.component_names().clone();
        for key in array.info_keys() {
            self.add_info_key(key.clone());
        }
        self.unique_values = Some(UniqueValues::scan(array));
        Ok(())
    }

    pub fn deep_copy(&mut self, other: &ArrayStatistics) {
        self.clone_from(other);
    }

    /// Unions the ranges of `other` into this summary and adds its tuples.
    ///
    /// The component counts must match; a mismatch leaves this summary
    /// untouched.
    pub fn add_ranges(&mut self, other: &ArrayStatistics) -> Result<()> {
        if self.num_components != other.num_components {
            return Err(Error::shape_mismatch(
                self.name.clone().unwrap_or_default(),
                self.num_components,
                other.num_components,
            ));
        }
        for (ours, theirs) in self.ranges.iter_mut().zip(&other.ranges) {
            ours[0] = ours[0].min(theirs[0]);
            ours[1] = ours[1].max(theirs[1]);
        }
        self.num_tuples += other.num_tuples;
        Ok(())
    }

    pub fn add_information_keys(&mut self, other: &ArrayStatistics) {
        for key in &other.info_keys {
            self.add_info_key(key.clone());
        }
    }

    /// Merges the categorical tracking of `other`.
    ///
    /// An untracked `other` leaves this summary unchanged. A slot `other`
    /// dropped is dropped here too.
    pub fn add_unique_values(&mut self, other: &ArrayStatistics) {
        let Some(theirs) = &other.unique_values else {
            return;
        };
        self.unique_values
            .get_or_insert_with(UniqueValues::new)
            .merge(theirs, self.num_components);
    }

    /// Merges ranges, information keys and categorical values of `other`.
    /// A shape mismatch is logged and the remaining steps still run.
    pub fn add_information(&mut self, other: &ArrayStatistics) {
        if let Err(e) = self.add_ranges(other) {
            log::warn!("skipping range merge: {e}");
        }
        self.add_information_keys(other);
        self.add_unique_values(other);
    }

    /// Cheap identity check: name, component count and number of information
    /// keys. Ranges and element types are not compared.
    pub fn compare(&self, other: &ArrayStatistics) -> bool {
        self.name == other.name
            && self.num_components == other.num_components
            && self.info_keys.len() == other.info_keys.len()
    }

    /// Distinct values of an external component index when it is categorical.
    pub fn unique_component_values_if_discrete(&self, component: usize) -> Option<Vec<Variant>> {
        self.unique_values
            .as_ref()?
            .component(component)
            .map(|set| set.iter().cloned().collect())
    }

    /// Distinct tuples when the array as a whole is categorical.
    pub fn unique_tuples_if_discrete(&self) -> Option<Vec<Vec<Variant>>> {
        self.unique_values
            .as_ref()?
            .tuples()
            .map(|set| set.iter().cloned().collect())
    }

    pub fn is_discrete(&self, component: usize) -> bool {
        self.unique_values
            .as_ref()
            .is_some_and(|unique| unique.has_slot(component, self.num_components))
    }

    pub fn copy_to_stream(&self, writer: &mut MessageWriter) {
        writer.write_str(self.name.as_deref());
        writer.write_i32(self.element_type.tag());
        writer.write_i64(self.num_tuples);
        writer.write_i32(self.num_components as i32);
        let flat: Vec<f64> = self.ranges.iter().flatten().copied().collect();
        writer.write_f64_array(&flat);

        let num_names = self
            .component_names
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        writer.write_i32(num_names as i32);
        for i in 0..num_names {
            writer.write_str(self.component_name(i));
        }

        writer.write_i32(self.info_keys.len() as i32);
        for key in &self.info_keys {
            writer.write_str(Some(&key.location));
            writer.write_str(Some(&key.name));
        }

        match &self.unique_values {
            None => writer.write_i32(-1),
            Some(unique) => {
                writer.write_i32(unique.num_slots() as i32);
                for (slot, values) in unique.component_slots() {
                    writer.write_i32(slot as i32);
                    writer.write_u32(values.len() as u32);
                    for value in values {
                        writer.write_variant(value);
                    }
                }
                if let Some(tuples) = unique.tuples() {
                    writer.write_i32(self.num_components as i32);
                    writer.write_u32((tuples.len() * self.num_components) as u32);
                    for value in tuples.iter().flatten() {
                        writer.write_variant(value);
                    }
                }
            }
        }
    }

    /// Replaces this summary with one decoded from `reader`.
    ///
    /// On a decode error the fields read so far are kept and the rest stay at
    /// their defaults.
    pub fn copy_from_stream(&mut self, reader: &mut MessageReader) -> Result<()> {
        self.clear();
        self.name = reader.read_str("array name")?;
        let tag = reader.read_i32("element type")?;
        self.element_type = ElementType::from_tag(tag)
            .ok_or_else(|| Error::decode("element type", format!("unknown tag {tag}")))?;
        self.num_tuples = reader.read_i64("tuple count")?;
        let nc = reader.read_i32("component count")?.max(0) as usize;
        // Every range slot occupies 16 bytes of the range array that follows.
        verify_data!(nc, range_slots(nc).saturating_mul(16) <= reader.remaining());
        self.set_num_components(nc);

        let flat = reader.read_f64_array("component ranges")?;
        verify_data!(flat, flat.len() == 2 * self.ranges.len());
        for (range, pair) in self.ranges.iter_mut().zip(flat.chunks_exact(2)) {
            *range = [pair[0], pair[1]];
        }

        let num_names = reader.read_i32("component name count")?;
        for i in 0..num_names.max(0) as usize {
            if let Some(name) = reader.read_str("component name")? {
                self.component_names.insert(i, name);
            }
        }

        let num_keys = reader.read_i32("information key count")?;
        for _ in 0..num_keys.max(0) {
            let location = reader.read_str("information key location")?.unwrap_or_default();
            let name = reader.read_str("information key name")?.unwrap_or_default();
            self.add_info_key(InformationKey::new(location, name));
        }

        let num_slots = reader.read_i32("categorical slot count")?;
        if num_slots < 0 {
            return Ok(());
        }
        let mut unique = UniqueValues::new();
        for _ in 0..num_slots {
            let slot = reader.read_i32("categorical slot")?;
            verify_data!(slot, slot >= 0 && slot as usize <= nc);
            let count = reader.read_u32("categorical value count")? as usize;
            let mut values = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                values.push(reader.read_variant("categorical value")?);
            }
            if slot as usize == nc {
                verify_data!(count, nc > 0 && count % nc == 0);
                unique.ensure_tuples();
                for tuple in values.chunks_exact(nc) {
                    unique.insert_tuple(tuple.to_vec());
                }
            } else {
                unique.ensure_component(slot as usize);
                for value in values {
                    unique.insert_component_value(slot as usize, value);
                }
            }
        }
        self.unique_values = Some(unique);
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        self.copy_to_stream(&mut writer);
        writer.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ArrayStatistics> {
        let mut stats = ArrayStatistics::new();
        stats.copy_from_stream(&mut MessageReader::new(bytes))?;
        Ok(stats)
    }
}

fn range_slots(num_components: usize) -> usize {
    if num_components > 1 {
        num_components + 1
    } else {
        num_components
    }
}

/// `[min, max]` of the Euclidean norm over tuples.
fn magnitude_range(array: &DataArray) -> [f64; 2] {
    let nc = array.num_components();
    let mut sums = vec![0.0f64; array.num_tuples()];
    let values = array.values();
    visit_f64(values.as_ref(), 0..(sums.len() * nc).min(values.len()), |i, v| {
        sums[i / nc] += v * v;
    });
    sums.into_iter()
        .map(f64::sqrt)
        .filter(|m| !m.is_nan())
        .fold(EMPTY_RANGE, |r, m| [r[0].min(m), r[1].max(m)])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn unique_component(stats: &ArrayStatistics, slot: usize) -> BTreeSet<Variant> {
        stats
            .unique_values()
            .and_then(|u| u.component(slot))
            .cloned()
            .unwrap_or_default()
    }

    fn vector_array() -> DataArray {
        DataArray::from_f64("velocity", 3, vec![3.0, 4.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 2.0])
            .with_component_name(0, "vx")
            .with_component_name(2, "vz")
            .with_info_key(InformationKey::new("meta", "units"))
    }

    #[test]
    fn test_copy_from_vector_array() {
        let stats = ArrayStatistics::from_array(&vector_array()).unwrap();
        assert_eq!(stats.name(), Some("velocity"));
        assert_eq!(stats.element_type(), ElementType::Float64);
        assert_eq!(stats.num_components(), 3);
        assert_eq!(stats.num_tuples(), 3);
        assert_eq!(stats.ranges().len(), 4);
        assert_eq!(stats.component_range(-1), [1.0, 5.0]);
        assert_eq!(stats.component_range(0), [-1.0, 3.0]);
        assert_eq!(stats.component_range(1), [0.0, 4.0]);
        assert_eq!(stats.component_range(2), [0.0, 2.0]);
        assert_eq!(stats.component_name(0), Some("vx"));
        assert_eq!(stats.component_name(1), None);
        assert!(stats.has_info_key("meta", "units"));
        assert!(stats.is_discrete(0));
    }

    #[test]
    fn test_scalar_has_no_magnitude_slot() {
        let stats =
            ArrayStatistics::from_array(&DataArray::from_i32("id", 1, vec![5, -2])).unwrap();
        assert_eq!(stats.ranges(), &[[-2.0, 5.0]]);
        assert_eq!(stats.component_range(-1), [-2.0, 5.0]);
    }

    #[test]
    fn test_set_num_components_resets() {
        let mut stats = ArrayStatistics::from_array(&vector_array()).unwrap();
        stats.set_num_components(3);
        assert_eq!(stats.component_range(0), [-1.0, 3.0]);
        stats.set_num_components(2);
        assert_eq!(stats.ranges(), &[EMPTY_RANGE; 3]);
        assert!(stats.unique_values().is_none());
        stats.set_num_components(0);
        assert!(stats.ranges().is_empty());
    }

    #[test]
    fn test_set_component_range_bounds() {
        let mut stats = ArrayStatistics::new();
        stats.set_num_components(2);
        stats.set_component_range(1, 0.0, 1.0).unwrap();
        stats.set_component_range(-1, 2.0, 3.0).unwrap();
        assert_eq!(stats.ranges(), &[[2.0, 3.0], EMPTY_RANGE, [0.0, 1.0]]);
        assert!(stats.set_component_range(2, 0.0, 1.0).is_err());
        assert_eq!(stats.ranges(), &[[2.0, 3.0], EMPTY_RANGE, [0.0, 1.0]]);
    }

    #[test]
    fn test_null_array_resets() {
        let mut stats = ArrayStatistics::from_array(&vector_array()).unwrap();
        stats.copy_from_object(None).unwrap();
        assert_eq!(stats, ArrayStatistics::new());
    }

    #[test]
    fn test_add_ranges_shape_mismatch() {
        let mut a = ArrayStatistics::from_array(&vector_array()).unwrap();
        let b =
            ArrayStatistics::from_array(&DataArray::from_f64("velocity", 1, vec![100.0])).unwrap();
        let before = a.clone();
        let err = a.add_ranges(&b).unwrap_err();
        assert!(matches!(
            err.kind(),
            meshstat_common::error::ErrorKind::ShapeMismatch { expected: 3, actual: 1, .. }
        ));
        assert_eq!(a, before);
    }

    #[test]
    fn test_add_information_unions() {
        let mut a =
            ArrayStatistics::from_array(&DataArray::from_f64("t", 1, vec![10.0, 90.0])).unwrap();
        let b = ArrayStatistics::from_array(
            &DataArray::from_f64("t", 1, vec![5.0, 20.0, 95.0])
                .with_info_key(InformationKey::new("meta", "units")),
        )
        .unwrap();
        a.add_information(&b);
        assert_eq!(a.component_range(0), [5.0, 95.0]);
        assert_eq!(a.num_tuples(), 5);
        assert_eq!(a.info_keys().len(), 1);
        a.add_information(&b);
        assert_eq!(a.info_keys().len(), 1);
        assert_eq!(unique_component(&a, 0).len(), 5);
    }

    #[test]
    fn test_compare_ignores_ranges() {
        let a = ArrayStatistics::from_array(&DataArray::from_f64("t", 1, vec![1.0])).unwrap();
        let b = ArrayStatistics::from_array(&DataArray::from_i32("t", 1, vec![7, 8])).unwrap();
        assert!(a.compare(&b));
        let c = ArrayStatistics::from_array(&DataArray::from_f64("u", 1, vec![1.0])).unwrap();
        assert!(!a.compare(&c));
    }

    #[test]
    fn test_stream_round_trip() {
        let mut stats = ArrayStatistics::from_array(&vector_array()).unwrap();
        stats.set_name(Some("vélocité"));
        let decoded = ArrayStatistics::from_bytes(&stats.to_bytes()).unwrap();
        assert_eq!(decoded, stats);

        let untracked = ArrayStatistics::new();
        assert_eq!(ArrayStatistics::from_bytes(&untracked.to_bytes()).unwrap(), untracked);
    }

    #[test]
    fn test_truncated_stream_keeps_prefix() {
        let stats = ArrayStatistics::from_array(&vector_array()).unwrap();
        let bytes = stats.to_bytes();
        let mut decoded = ArrayStatistics::new();
        let result = decoded.copy_from_stream(&mut MessageReader::new(&bytes[..40]));
        assert!(result.is_err());
        assert_eq!(decoded.name(), Some("velocity"));
        assert_eq!(decoded.num_tuples(), 3);
        assert_eq!(decoded.num_components(), 0);
        assert!(decoded.unique_values().is_none());
    }

    #[test]
    fn test_huge_component_count_is_a_decode_error() {
        let mut writer = MessageWriter::new();
        writer.write_str(Some("x"));
        writer.write_i32(ElementType::Float64.tag());
        writer.write_i64(1);
        writer.write_i32(i32::MAX);
        writer.write_f64_array(&[0.0, 1.0]);
        let bytes = writer.finish();

        let mut decoded = ArrayStatistics::new();
        let err = decoded
            .copy_from_stream(&mut MessageReader::new(&bytes))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            meshstat_common::error::ErrorKind::Decode { element, .. } if element == "nc"
        ));
        assert_eq!(decoded.num_components(), 0);
        assert!(decoded.ranges().is_empty());
    }
}
