//! Attribute containers: the arrays associated with points, cells, vertices, edges,
//! rows or the object as a whole.

use std::collections::BTreeMap;

use meshstat_format::AttributeRole;

use crate::array::DataArray;

#[derive(Debug, Clone, Default)]
pub struct DataSetAttributes {
    arrays: Vec<DataArray>,
    roles: BTreeMap<AttributeRole, usize>,
}

impl DataSetAttributes {
    pub fn new() -> DataSetAttributes {
        DataSetAttributes::default()
    }

    /// Adds an array, replacing an existing array of the same name in place.
    /// Returns the array's index.
    pub fn add_array(&mut self, array: DataArray) -> usize {
        if let Some(name) = array.name() {
            if let Some(index) = self.index_of(name) {
                self.arrays[index] = array;
                return index;
            }
        }
        self.arrays.push(array);
        self.arrays.len() - 1
    }

    /// Adds an array and flags it with `role`, replacing any array previously
    /// holding that role as the role holder (the old array stays in the set).
    pub fn set_attribute(&mut self, array: DataArray, role: AttributeRole) -> usize {
        let index = self.add_array(array);
        self.roles.insert(role, index);
        index
    }

    pub fn with_array(mut self, array: DataArray) -> Self {
        self.add_array(array);
        self
    }

    pub fn with_attribute(mut self, array: DataArray, role: AttributeRole) -> Self {
        self.set_attribute(array, role);
        self
    }

    pub fn arrays(&self) -> &[DataArray] {
        &self.arrays
    }

    pub fn num_arrays(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn array(&self, name: &str) -> Option<&DataArray> {
        self.index_of(name).map(|i| &self.arrays[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.arrays.iter().position(|a| a.name() == Some(name))
    }

    /// The role held by the array at `index`, if any.
    pub fn role_of(&self, index: usize) -> Option<AttributeRole> {
        self.roles
            .iter()
            .find_map(|(role, &i)| (i == index).then_some(*role))
    }

    pub fn attribute(&self, role: AttributeRole) -> Option<&DataArray> {
        self.roles.get(&role).and_then(|&i| self.arrays.get(i))
    }

    pub fn memory_size(&self) -> usize {
        self.arrays.iter().map(DataArray::memory_size).sum()
    }

    /// Largest tuple count among the arrays.
    pub fn max_tuples(&self) -> usize {
        self.arrays
            .iter()
            .map(DataArray::num_tuples)
            .max()
            .unwrap_or(0)
    }
}
