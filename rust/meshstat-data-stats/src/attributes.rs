//! Statistics for every array attached to one field association.

use std::collections::{BTreeMap, BTreeSet};

use meshstat_common::{Result, error::Error};
use meshstat_format::{AttributeRole, FieldAssociation, MessageReader, MessageWriter};
use meshstat_model::DataSetAttributes;

use crate::array::ArrayStatistics;

/// Array statistics of one association (points, cells, field data, ...).
///
/// Arrays are looked up by name or by index. Arrays flagged with an attribute
/// role (scalars, vectors, ...) keep that flag.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSetStatistics {
    association: FieldAssociation,
    arrays: Vec<ArrayStatistics>,
    roles: BTreeMap<AttributeRole, usize>,
}

impl AttributeSetStatistics {
    pub fn new(association: FieldAssociation) -> AttributeSetStatistics {
        AttributeSetStatistics {
            association,
            arrays: Vec::new(),
            roles: BTreeMap::new(),
        }
    }

    pub fn association(&self) -> FieldAssociation {
        self.association
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
        self.roles.clear();
    }

    pub fn num_arrays(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn arrays(&self) -> &[ArrayStatistics] {
        &self.arrays
    }

    pub fn array_information(&self, name: &str) -> Option<&ArrayStatistics> {
        self.arrays.iter().find(|a| a.name() == Some(name))
    }

    pub fn array_information_at(&self, index: usize) -> Option<&ArrayStatistics> {
        self.arrays.get(index)
    }

    pub fn attribute_information(&self, role: AttributeRole) -> Option<&ArrayStatistics> {
        self.roles.get(&role).and_then(|&i| self.arrays.get(i))
    }

    pub fn role_of(&self, index: usize) -> Option<AttributeRole> {
        self.roles
            .iter()
            .find_map(|(role, &i)| (i == index).then_some(*role))
    }

    /// Adds an array summary, replacing one with the same name. Returns its
    /// index.
    pub fn add_array(&mut self, array: ArrayStatistics) -> usize {
        match self.position(array.name()) {
            Some(index) => {
                self.arrays[index] = array;
                index
            }
            None => {
                self.arrays.push(array);
                self.arrays.len() - 1
            }
        }
    }

    pub fn set_role(&mut self, role: AttributeRole, index: usize) {
        if index < self.arrays.len() {
            self.roles.insert(role, index);
        }
    }

    fn position(&self, name: Option<&str>) -> Option<usize> {
        self.arrays.iter().position(|a| a.name() == name)
    }

    /// Rebuilds the set from live attributes. Arrays of unsupported element
    /// types are logged and skipped.
    pub fn copy_from_data_set_attributes(&mut self, attributes: &DataSetAttributes) {
        self.clear();
        for (index, array) in attributes.arrays().iter().enumerate() {
            match ArrayStatistics::from_array(array) {
                Ok(stats) => {
                    let position = self.add_array(stats);
                    if let Some(role) = attributes.role_of(index) {
                        self.roles.insert(role, position);
                    }
                }
                Err(e) => log::warn!("{:?} data: skipping array: {e}", self.association),
            }
        }
    }

    /// Unions the arrays of `other` into this set.
    ///
    /// Arrays only `other` has are copied. Arrays both have are merged, unless
    /// `other`'s copy has no components. Arrays only this set has are kept.
    pub fn add_information(&mut self, other: &AttributeSetStatistics) {
        for (index, theirs) in other.arrays.iter().enumerate() {
            let position = match self.position(theirs.name()) {
                None => {
                    self.arrays.push(theirs.clone());
                    self.arrays.len() - 1
                }
                Some(position) => {
                    if theirs.num_components() > 0 {
                        self.arrays[position].add_information(theirs);
                    }
                    position
                }
            };
            if let Some(role) = other.role_of(index) {
                self.roles.entry(role).or_insert(position);
            }
        }
    }

    /// Like [`add_information`](Self::add_information), and also flags every
    /// array present on only one side as partial.
    pub fn add_part_information(&mut self, other: &AttributeSetStatistics) {
        let ours: BTreeSet<Option<String>> = self.names();
        let theirs: BTreeSet<Option<String>> = other.names();
        self.add_information(other);
        for array in &mut self.arrays {
            let name = array.name().map(str::to_string);
            if !ours.contains(&name) || !theirs.contains(&name) {
                array.set_partial(true);
            }
        }
    }

    fn names(&self) -> BTreeSet<Option<String>> {
        self.arrays
            .iter()
            .map(|a| a.name().map(str::to_string))
            .collect()
    }

    pub fn deep_copy(&mut self, other: &AttributeSetStatistics) {
        self.clone_from(other);
    }

    pub fn copy_to_stream(&self, writer: &mut MessageWriter) {
        writer.write_i32(self.association.tag());
        writer.write_i32(self.arrays.len() as i32);
        for array in &self.arrays {
            let mut nested = MessageWriter::new();
            array.copy_to_stream(&mut nested);
            writer.write_message(&nested.finish());
        }
        for role in AttributeRole::ALL {
            writer.write_i32(self.roles.get(&role).map_or(-1, |&i| i as i32));
        }
    }

    /// Replaces this set with one decoded from `reader`.
    ///
    /// A malformed array message is logged and whatever was decoded from it is
    /// kept; the following arrays are still read. A malformed top-level value
    /// stops decoding.
    pub fn copy_from_stream(&mut self, reader: &mut MessageReader) -> Result<()> {
        self.clear();
        let tag = reader.read_i32("field association")?;
        self.association = FieldAssociation::from_tag(tag)
            .ok_or_else(|| Error::decode("field association", format!("unknown tag {tag}")))?;
        let count = reader.read_i32("array count")?;
        for _ in 0..count.max(0) {
            let bytes = reader.read_message("array")?;
            let mut array = ArrayStatistics::new();
            if let Err(e) = array.copy_from_stream(&mut MessageReader::new(bytes)) {
                log::warn!("{:?} data: malformed array message: {e}", self.association);
            }
            self.arrays.push(array);
        }
        for role in AttributeRole::ALL {
            let index = reader.read_i32("attribute role")?;
            if index >= 0 {
                self.set_role(role, index as usize);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        self.copy_to_stream(&mut writer);
        writer.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<AttributeSetStatistics> {
        let mut decoded = AttributeSetStatistics::default();
        decoded.copy_from_stream(&mut MessageReader::new(bytes))?;
        Ok(decoded)
    }
}

impl Default for AttributeSetStatistics {
    fn default() -> Self {
        AttributeSetStatistics::new(FieldAssociation::Points)
    }
}

#[cfg(test)]
mod tests {
    use meshstat_model::DataArray;

    use super::*;

    fn point_attributes(temperature: Vec<f64>) -> DataSetAttributes {
        DataSetAttributes::new()
            .with_attribute(
                DataArray::from_f64("Temperature", 1, temperature),
                AttributeRole::Scalars,
            )
            .with_array(DataArray::from_f32("Velocity", 3, vec![0.0, 1.0, 2.0]))
    }

    #[test]
    fn test_copy_from_attributes() {
        let mut set = AttributeSetStatistics::new(FieldAssociation::Points);
        set.copy_from_data_set_attributes(&point_attributes(vec![1.0, 2.0, 3.0]));
        assert_eq!(set.num_arrays(), 2);
        assert_eq!(
            set.attribute_information(AttributeRole::Scalars).unwrap().name(),
            Some("Temperature")
        );
        assert!(set.array_information("Velocity").is_some());
        assert!(set.array_information("Pressure").is_none());
        assert_eq!(set.array_information_at(1).unwrap().num_components(), 3);
        assert!(set.array_information_at(2).is_none());
    }

    #[test]
    fn test_add_information_is_union() {
        let mut a = AttributeSetStatistics::new(FieldAssociation::Points);
        a.copy_from_data_set_attributes(&point_attributes(vec![10.0, 90.0]));
        let mut b = AttributeSetStatistics::new(FieldAssociation::Points);
        b.copy_from_data_set_attributes(
            &DataSetAttributes::new()
                .with_array(DataArray::from_f64("Temperature", 1, vec![5.0, 95.0]))
                .with_array(DataArray::from_i32("Material", 1, vec![1, 2])),
        );
        a.add_information(&b);
        assert_eq!(a.num_arrays(), 3);
        assert_eq!(
            a.array_information("Temperature").unwrap().component_range(0),
            [5.0, 95.0]
        );
        assert!(a.array_information("Velocity").is_some());
        assert!(a.array_information("Material").is_some());
    }

    #[test]
    fn test_zero_component_array_is_skipped() {
        let mut a = AttributeSetStatistics::new(FieldAssociation::Cells);
        a.copy_from_data_set_attributes(
            &DataSetAttributes::new().with_array(DataArray::from_f64("p", 1, vec![1.0, 2.0])),
        );
        let mut empty = ArrayStatistics::new();
        empty.set_name(Some("p"));
        let mut b = AttributeSetStatistics::new(FieldAssociation::Cells);
        b.add_array(empty);
        let before = a.clone();
        a.add_information(&b);
        assert_eq!(a, before);
    }

    #[test]
    fn test_partial_flags() {
        let mut a = AttributeSetStatistics::new(FieldAssociation::Points);
        a.copy_from_data_set_attributes(&point_attributes(vec![1.0]));
        let mut b = AttributeSetStatistics::new(FieldAssociation::Points);
        b.copy_from_data_set_attributes(
            &DataSetAttributes::new().with_array(DataArray::from_f64("Temperature", 1, vec![2.0])),
        );
        a.add_part_information(&b);
        assert!(!a.array_information("Temperature").unwrap().is_partial());
        assert!(a.array_information("Velocity").unwrap().is_partial());
    }

    #[test]
    fn test_stream_round_trip() {
        let mut set = AttributeSetStatistics::new(FieldAssociation::Rows);
        set.copy_from_data_set_attributes(&point_attributes(vec![1.0, 4.0]));
        let mut writer = MessageWriter::new();
        set.copy_to_stream(&mut writer);
        let bytes = writer.finish();
        let mut decoded = AttributeSetStatistics::default();
        decoded.copy_from_stream(&mut MessageReader::new(&bytes)).unwrap();
        assert_eq!(decoded, set);
    }
}
