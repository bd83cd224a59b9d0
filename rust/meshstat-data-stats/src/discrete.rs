//! Categorical ("discrete") value tracking.
//!
//! Each array summary may remember the distinct values seen per component, plus
//! the distinct whole tuples, for as long as their number stays small. Slot
//! `num_components` holds the tuples. A slot that reached the cap during the
//! scan is dropped, and a dropped slot is never revived by a later merge unless
//! the other side still tracks it.

use std::collections::{BTreeMap, BTreeSet};

use arrow_array::{
    Array, LargeStringArray, PrimitiveArray, StringArray,
    cast::AsArray,
    types::{
        Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
        UInt16Type, UInt32Type, UInt64Type,
    },
};
use arrow_schema::DataType;
use meshstat_format::{ElementType, Variant};
use meshstat_model::DataArray;

/// Upper bound on the number of distinct values kept per slot.
pub const MAX_CATEGORICAL_VALUES: usize = 32;

/// Distinct values per component slot plus the distinct-tuple slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniqueValues {
    components: BTreeMap<usize, BTreeSet<Variant>>,
    tuples: Option<BTreeSet<Vec<Variant>>>,
}

impl UniqueValues {
    pub fn new() -> UniqueValues {
        UniqueValues::default()
    }

    /// Scans the array and keeps every slot whose distinct-value count stayed
    /// under [`MAX_CATEGORICAL_VALUES`].
    ///
    /// Scanning stops early once every component has overflowed.
    pub fn scan(array: &DataArray) -> UniqueValues {
        let nc = array.num_components();
        let Some(accessor) = ValueAccessor::new(array.values().as_ref(), array.element_type())
        else {
            return UniqueValues::default();
        };

        let mut components: Vec<Option<BTreeSet<Variant>>> = vec![Some(BTreeSet::new()); nc];
        let mut tuples = Some(BTreeSet::new());
        let mut remaining = nc;

        for tuple in 0..array.num_tuples() {
            if remaining == 0 {
                break;
            }
            let mut row = tuples.as_ref().map(|_| Vec::with_capacity(nc));
            for (component, slot) in components.iter_mut().enumerate() {
                let value = accessor.get(tuple * nc + component);
                if let Some(set) = slot {
                    if let Some(value) = &value {
                        if set.len() <= MAX_CATEGORICAL_VALUES {
                            set.insert(value.clone());
                        }
                        if set.len() > MAX_CATEGORICAL_VALUES {
                            *slot = None;
                            remaining -= 1;
                            row = None;
                            tuples = None;
                        }
                    }
                }
                match value {
                    Some(value) => {
                        if let Some(row) = row.as_mut() {
                            row.push(value);
                        }
                    }
                    None => row = None,
                }
            }
            if let Some(row) = row {
                if let Some(set) = tuples.as_mut() {
                    if row.len() == nc {
                        set.insert(row);
                    }
                    if set.len() > MAX_CATEGORICAL_VALUES {
                        tuples = None;
                    }
                }
            }
        }

        let components = components
            .into_iter()
            .enumerate()
            .filter_map(|(i, set)| set.map(|set| (i, set)))
            .filter(|(_, set)| set.len() < MAX_CATEGORICAL_VALUES)
            .collect();
        let tuples = tuples.filter(|set| set.len() < MAX_CATEGORICAL_VALUES);
        UniqueValues { components, tuples }
    }

    /// Distinct values of a single component.
    pub fn component(&self, slot: usize) -> Option<&BTreeSet<Variant>> {
        self.components.get(&slot)
    }

    pub fn tuples(&self) -> Option<&BTreeSet<Vec<Variant>>> {
        self.tuples.as_ref()
    }

    pub fn has_slot(&self, slot: usize, num_components: usize) -> bool {
        if slot == num_components {
            self.tuples.is_some()
        } else {
            self.components.contains_key(&slot)
        }
    }

    pub fn remove_slot(&mut self, slot: usize, num_components: usize) {
        if slot == num_components {
            self.tuples = None;
        } else {
            self.components.remove(&slot);
        }
    }

    /// Number of slots still tracked.
    pub fn num_slots(&self) -> usize {
        self.components.len() + usize::from(self.tuples.is_some())
    }

    /// Total number of values across all slots (a tuple counts as one).
    pub fn total_len(&self) -> usize {
        self.components.values().map(BTreeSet::len).sum::<usize>()
            + self.tuples.as_ref().map_or(0, BTreeSet::len)
    }

    pub fn insert_component_value(&mut self, slot: usize, value: Variant) {
        self.components.entry(slot).or_default().insert(value);
    }

    /// Starts tracking a component slot, keeping any values it already has.
    pub fn ensure_component(&mut self, slot: usize) {
        self.components.entry(slot).or_default();
    }

    pub fn ensure_tuples(&mut self) {
        self.tuples.get_or_insert_with(BTreeSet::new);
    }

    pub fn insert_tuple(&mut self, tuple: Vec<Variant>) {
        self.tuples.get_or_insert_with(BTreeSet::new).insert(tuple);
    }

    /// Unions `other` into this set, slot by slot, for slots `0..=num_components`.
    ///
    /// A slot missing from `other` is dropped here. While unioning a slot, the
    /// slot is dropped as soon as the total value count across all slots exceeds
    /// `MAX_CATEGORICAL_VALUES - 1`.
    pub fn merge(&mut self, other: &UniqueValues, num_components: usize) {
        let limit = MAX_CATEGORICAL_VALUES - 1;
        for slot in 0..=num_components {
            if !other.has_slot(slot, num_components) {
                self.remove_slot(slot, num_components);
                continue;
            }
            if slot == num_components {
                let Some(theirs) = &other.tuples else {
                    continue;
                };
                self.tuples.get_or_insert_with(BTreeSet::new);
                for tuple in theirs {
                    if let Some(ours) = self.tuples.as_mut() {
                        ours.insert(tuple.clone());
                    }
                    if self.total_len() > limit {
                        self.tuples = None;
                        break;
                    }
                }
            } else {
                let Some(theirs) = other.components.get(&slot) else {
                    continue;
                };
                self.components.entry(slot).or_default();
                for value in theirs {
                    if let Some(ours) = self.components.get_mut(&slot) {
                        ours.insert(value.clone());
                    }
                    if self.total_len() > limit {
                        self.components.remove(&slot);
                        break;
                    }
                }
            }
        }
    }

    pub(crate) fn component_slots(&self) -> impl Iterator<Item = (usize, &BTreeSet<Variant>)> {
        self.components.iter().map(|(slot, set)| (*slot, set))
    }
}

/// Typed view of an Arrow array producing [`Variant`] values.
enum ValueAccessor<'a> {
    Int8(&'a PrimitiveArray<Int8Type>),
    UInt8(&'a PrimitiveArray<UInt8Type>),
    Int16(&'a PrimitiveArray<Int16Type>),
    UInt16(&'a PrimitiveArray<UInt16Type>),
    Int32(&'a PrimitiveArray<Int32Type>),
    UInt32(&'a PrimitiveArray<UInt32Type>),
    Int64(&'a PrimitiveArray<Int64Type>),
    IdType(&'a PrimitiveArray<Int64Type>),
    UInt64(&'a PrimitiveArray<UInt64Type>),
    Float32(&'a PrimitiveArray<Float32Type>),
    Float64(&'a PrimitiveArray<Float64Type>),
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
}

impl<'a> ValueAccessor<'a> {
    fn new(values: &'a dyn Array, element_type: Option<ElementType>) -> Option<Self> {
        let accessor = match values.data_type() {
            DataType::Int8 => ValueAccessor::Int8(values.as_primitive()),
            DataType::UInt8 => ValueAccessor::UInt8(values.as_primitive()),
            DataType::Int16 => ValueAccessor::Int16(values.as_primitive()),
            DataType::UInt16 => ValueAccessor::UInt16(values.as_primitive()),
            DataType::Int32 => ValueAccessor::Int32(values.as_primitive()),
            DataType::UInt32 => ValueAccessor::UInt32(values.as_primitive()),
            DataType::Int64 if element_type == Some(ElementType::IdType) => {
                ValueAccessor::IdType(values.as_primitive())
            }
            DataType::Int64 => ValueAccessor::Int64(values.as_primitive()),
            DataType::UInt64 => ValueAccessor::UInt64(values.as_primitive()),
            DataType::Float32 => ValueAccessor::Float32(values.as_primitive()),
            DataType::Float64 => ValueAccessor::Float64(values.as_primitive()),
            DataType::Utf8 => ValueAccessor::Utf8(values.as_string()),
            DataType::LargeUtf8 => ValueAccessor::LargeUtf8(values.as_string()),
            _ => return None,
        };
        Some(accessor)
    }

    fn get(&self, index: usize) -> Option<Variant> {
        macro_rules! get {
            ($arr:expr, $variant:ident) => {
                ($arr.len() > index && $arr.is_valid(index))
                    .then(|| Variant::$variant($arr.value(index)))
            };
        }
        match self {
            ValueAccessor::Int8(a) => get!(a, Int8),
            ValueAccessor::UInt8(a) => get!(a, UInt8),
            ValueAccessor::Int16(a) => get!(a, Int16),
            ValueAccessor::UInt16(a) => get!(a, UInt16),
            ValueAccessor::Int32(a) => get!(a, Int32),
            ValueAccessor::UInt32(a) => get!(a, UInt32),
            ValueAccessor::Int64(a) => get!(a, Int64),
            ValueAccessor::IdType(a) => get!(a, IdType),
            ValueAccessor::UInt64(a) => get!(a, UInt64),
            ValueAccessor::Float32(a) => get!(a, Float32),
            ValueAccessor::Float64(a) => get!(a, Float64),
            ValueAccessor::Utf8(a) => (a.len() > index && a.is_valid(index))
                .then(|| Variant::String(a.value(index).to_string())),
            ValueAccessor::LargeUtf8(a) => (a.len() > index && a.is_valid(index))
                .then(|| Variant::String(a.value(index).to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_small_set() {
        let array = DataArray::from_i32("material", 1, vec![3, 1, 3, 2, 1, 1]);
        let unique = UniqueValues::scan(&array);
        let values: Vec<_> = unique.component(0).unwrap().iter().cloned().collect();
        assert_eq!(
            values,
            vec![Variant::Int32(1), Variant::Int32(2), Variant::Int32(3)]
        );
        assert_eq!(unique.tuples().unwrap().len(), 3);
    }

    #[test]
    fn test_scan_drops_slot_at_cap() {
        let array = DataArray::from_i32("id", 1, (0..33).collect());
        let unique = UniqueValues::scan(&array);
        assert!(unique.component(0).is_none());
        assert!(unique.tuples().is_none());

        // Reaching the cap exactly also drops the slot.
        let array = DataArray::from_i32("id", 1, (0..32).collect());
        assert!(UniqueValues::scan(&array).component(0).is_none());

        let array = DataArray::from_i32("id", 1, (0..31).collect());
        assert_eq!(UniqueValues::scan(&array).component(0).unwrap().len(), 31);
    }

    #[test]
    fn test_scan_mixed_components() {
        // Component 0 is continuous, component 1 is categorical.
        let values = (0..100).flat_map(|i| [i as f64 * 0.5, (i % 4) as f64]).collect();
        let array = DataArray::from_f64("mixed", 2, values);
        let unique = UniqueValues::scan(&array);
        assert!(unique.component(0).is_none());
        assert_eq!(unique.component(1).unwrap().len(), 4);
        assert!(unique.tuples().is_none());
    }

    #[test]
    fn test_scan_strings() {
        let array = DataArray::from_strings("label", ["a", "b", "a", "ü"]);
        let unique = UniqueValues::scan(&array);
        assert_eq!(unique.component(0).unwrap().len(), 3);
        assert!(unique.component(0).unwrap().contains(&Variant::from("ü")));
    }

    #[test]
    fn test_merge_drops_missing_slots() {
        let a = UniqueValues::scan(&DataArray::from_i32("x", 1, vec![1, 2]));
        let b = UniqueValues::scan(&DataArray::from_i32("x", 1, (0..40).collect()));
        let mut merged = a.clone();
        merged.merge(&b, 1);
        assert_eq!(merged.num_slots(), 0);

        let mut merged = a.clone();
        merged.merge(&UniqueValues::scan(&DataArray::from_i32("x", 1, vec![2, 7])), 1);
        assert_eq!(merged.component(0).unwrap().len(), 3);
    }

    #[test]
    fn test_merge_cap_counts_all_slots() {
        let a = UniqueValues::scan(&DataArray::from_i32("x", 1, (0..10).collect()));
        let b = UniqueValues::scan(&DataArray::from_i32("x", 1, (10..20).collect()));
        let mut merged = a.clone();
        merged.merge(&b, 1);
        // Component 0 alone would hold 20 values, but together with the ten
        // tracked tuples the total passes the limit and the slot is dropped.
        assert!(merged.component(0).is_none());
        assert_eq!(merged.tuples().unwrap().len(), 20);
    }
}
