//! Structure of a composite data object: one summary per tree node.

use std::collections::BTreeMap;

use meshstat_common::{Result, error::Error, verify_data};
use meshstat_format::{MessageReader, MessageWriter};
use meshstat_model::{AmrDataSet, CompositeDataSet, DataBody, DataObject};

use crate::{dataset::DatasetStatistics, helpers::HelperRegistry};

/// Upper bound on the child count accepted from a stream.
const MAX_CHILDREN: u32 = 1 << 24;

/// One node of a composite tree. `info` is `None` for a node without data.
///
/// Only nodes with data or a name are stored; the others are implied by the
/// tree's child count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeChild {
    pub info: Option<DatasetStatistics>,
    pub name: String,
}

/// Per-node statistics of a composite data object.
///
/// Multi-piece and partitioned containers are not expanded: only their piece
/// count is kept and `children` stays empty. AMR hierarchies get one child per
/// level, each describing its level as a multi-piece container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeTreeStatistics {
    is_composite: bool,
    is_multi_piece: bool,
    num_pieces: u32,
    num_amr_levels: u32,
    num_children: usize,
    children: BTreeMap<usize, CompositeChild>,
}

impl CompositeTreeStatistics {
    pub fn new() -> CompositeTreeStatistics {
        CompositeTreeStatistics::default()
    }

    pub fn multi_piece(num_pieces: u32) -> CompositeTreeStatistics {
        CompositeTreeStatistics {
            is_composite: true,
            is_multi_piece: true,
            num_pieces,
            ..Default::default()
        }
    }

    pub fn initialize(&mut self) {
        *self = CompositeTreeStatistics::default();
    }

    pub fn is_composite(&self) -> bool {
        self.is_composite
    }

    pub fn is_multi_piece(&self) -> bool {
        self.is_multi_piece
    }

    pub fn num_pieces(&self) -> u32 {
        self.num_pieces
    }

    pub fn num_amr_levels(&self) -> u32 {
        self.num_amr_levels
    }

    pub fn num_children(&self) -> usize {
        self.num_children
    }

    /// Children holding data or a name, in index order.
    pub fn children(&self) -> impl Iterator<Item = (usize, &CompositeChild)> {
        self.children.iter().map(|(index, child)| (*index, child))
    }

    pub fn child(&self, index: usize) -> Option<&DatasetStatistics> {
        self.children.get(&index)?.info.as_ref()
    }

    pub fn child_name(&self, index: usize) -> Option<&str> {
        self.children
            .get(&index)
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn push_child(&mut self, info: Option<DatasetStatistics>, name: &str) {
        self.is_composite = true;
        let index = self.num_children;
        self.num_children += 1;
        self.insert_child(
            index,
            CompositeChild {
                info,
                name: name.to_string(),
            },
        );
    }

    fn insert_child(&mut self, index: usize, child: CompositeChild) {
        if child.info.is_some() || !child.name.is_empty() {
            self.children.insert(index, child);
        }
    }

    /// Builds the tree of a composite object. Non-composite objects leave the
    /// tree in its initial state.
    pub fn copy_from_object(&mut self, object: &DataObject, helpers: &HelperRegistry) {
        self.initialize();
        match &object.body {
            DataBody::Composite(composite) if composite.kind().is_multi_piece() => {
                self.is_composite = true;
                self.is_multi_piece = true;
                self.num_pieces = composite.num_blocks() as u32;
            }
            DataBody::Composite(composite) => self.copy_from_tree(composite, helpers),
            DataBody::Amr(amr) => self.copy_from_amr(amr),
            _ => {}
        }
    }

    fn copy_from_tree(&mut self, composite: &CompositeDataSet, helpers: &HelperRegistry) {
        self.is_composite = true;
        self.num_children = composite.num_blocks();
        for (index, block) in composite.blocks().iter().enumerate() {
            let name = block.name.as_deref().unwrap_or_default();
            let info = block.data.as_ref().map(|data| {
                let mut info = DatasetStatistics::from_object_with(data, helpers);
                info.set_composite_block_name(block.name.as_deref());
                info
            });
            self.insert_child(
                index,
                CompositeChild {
                    info,
                    name: name.to_string(),
                },
            );
        }
    }

    fn copy_from_amr(&mut self, amr: &AmrDataSet) {
        self.is_composite = true;
        self.num_amr_levels = amr.num_levels() as u32;
        self.num_children = amr.num_levels();
        for (index, level) in amr.levels().enumerate() {
            let mut level_info = DatasetStatistics::new();
            level_info.set_composite_info(Some(CompositeTreeStatistics::multi_piece(
                level.len() as u32,
            )));
            for data_set in level.iter().flatten() {
                let leaf = DatasetStatistics::from_data_set(data_set);
                level_info.add_information(&leaf, true);
            }
            self.children.insert(
                index,
                CompositeChild {
                    info: Some(level_info),
                    name: String::new(),
                },
            );
        }
    }

    /// Merges the tree of another process's view of the same object.
    ///
    /// The composite flags and AMR level count are taken from `other`. For
    /// multi-piece trees only the larger piece count is kept. Otherwise
    /// children are merged index by index and non-empty names from `other`
    /// win.
    pub fn add_information(&mut self, other: &CompositeTreeStatistics) {
        self.is_composite = other.is_composite;
        self.is_multi_piece = other.is_multi_piece;
        self.num_amr_levels = other.num_amr_levels;
        if self.is_multi_piece {
            self.num_pieces = self.num_pieces.max(other.num_pieces);
            return;
        }

        self.num_children = self.num_children.max(other.num_children);
        for (&index, theirs) in &other.children {
            let ours = self.children.entry(index).or_default();
            if let Some(their_info) = &theirs.info {
                ours.info
                    .get_or_insert_with(DatasetStatistics::new)
                    .add_information(their_info, false);
            }
            if !theirs.name.is_empty() {
                if !ours.name.is_empty() && ours.name != theirs.name {
                    log::info!(
                        "composite child {index}: name {:?} replaced by {:?}",
                        ours.name,
                        theirs.name
                    );
                }
                ours.name.clone_from(&theirs.name);
            }
        }
    }

    /// Writes the tree. Only children with data or a name are written, each
    /// preceded by its index; the child count is repeated at the end to mark
    /// the last entry.
    pub fn copy_to_stream(&self, writer: &mut MessageWriter) {
        writer.write_bool(self.is_composite);
        writer.write_bool(self.is_multi_piece);
        writer.write_u32(self.num_pieces);
        writer.write_u32(self.num_amr_levels);
        let count = self.num_children as u32;
        writer.write_u32(count);
        for (&index, child) in &self.children {
            writer.write_u32(index as u32);
            writer.write_str((!child.name.is_empty()).then_some(child.name.as_str()));
            let mut nested = MessageWriter::new();
            if let Some(info) = &child.info {
                info.copy_to_stream(&mut nested);
            }
            writer.write_message(&nested.finish());
        }
        writer.write_u32(count);
    }

    /// Replaces this tree with one decoded from `reader`.
    ///
    /// A malformed child message is logged and the partially decoded child is
    /// kept. A malformed top-level value stops decoding.
    pub fn copy_from_stream(&mut self, reader: &mut MessageReader) -> Result<()> {
        self.initialize();
        self.is_composite = reader.read_bool("is composite")?;
        self.is_multi_piece = reader.read_bool("is multi-piece")?;
        self.num_pieces = reader.read_u32("piece count")?;
        self.num_amr_levels = reader.read_u32("AMR level count")?;
        let count = reader.read_u32("child count")?;
        verify_data!(count, count <= MAX_CHILDREN);
        self.num_children = count as usize;
        loop {
            let index = reader.read_u32("child index")?;
            if index == count {
                break;
            }
            if index > count {
                return Err(Error::decode(
                    "child index",
                    format!("index {index} out of range for {count} children"),
                ));
            }
            let name = reader.read_str("child name")?.unwrap_or_default();
            let bytes = reader.read_message("child")?;
            let info = (!bytes.is_empty()).then(|| {
                let mut info = DatasetStatistics::new();
                if let Err(e) = info.copy_from_stream(&mut MessageReader::new(bytes)) {
                    log::warn!("composite child {index}: malformed message: {e}");
                }
                info
            });
            self.insert_child(index as usize, CompositeChild { info, name });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        self.copy_to_stream(&mut writer);
        writer.finish()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<CompositeTreeStatistics> {
        let mut decoded = CompositeTreeStatistics::new();
        decoded.copy_from_stream(&mut MessageReader::new(bytes))?;
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use meshstat_model::{AmrKind, Block, DataArray, DataSet};

    use super::*;

    fn poly(num_points: usize) -> DataObject {
        let coords = (0..num_points * 3).map(|i| i as f64).collect();
        DataObject::from(DataSet::poly_data(
            Some(DataArray::from_f64("Points", 3, coords)),
            num_points as u64,
        ))
    }

    #[test]
    fn test_tree_keeps_empty_slots_and_names() {
        let tree = CompositeDataSet::multi_block(vec![
            Block::new(Some("left"), Some(poly(4))),
            Block::new(Some("hole"), None),
            Block::new(None, Some(poly(2))),
        ]);
        let mut info = CompositeTreeStatistics::new();
        info.copy_from_object(&DataObject::from(tree), &HelperRegistry::new());
        assert!(info.is_composite());
        assert!(!info.is_multi_piece());
        assert_eq!(info.num_children(), 3);
        assert_eq!(info.child(0).unwrap().num_points(), 4);
        assert_eq!(info.child(0).unwrap().composite_block_name(), Some("left"));
        assert!(info.child(1).is_none());
        assert_eq!(info.child_name(1), Some("hole"));
        assert_eq!(info.child_name(2), None);
    }

    #[test]
    fn test_multi_piece_is_not_expanded() {
        let pieces = CompositeDataSet::multi_piece(vec![Some(poly(1)), None, Some(poly(3))]);
        let mut info = CompositeTreeStatistics::new();
        info.copy_from_object(&DataObject::from(pieces), &HelperRegistry::new());
        assert!(info.is_multi_piece());
        assert_eq!(info.num_pieces(), 3);
        assert_eq!(info.num_children(), 0);
    }

    #[test]
    fn test_amr_levels_become_multi_piece_children() {
        let grid = |x0: i32| DataSet::uniform_grid([x0, x0 + 2, 0, 2, 0, 0], [0.0; 3], [1.0; 3]);
        let amr = AmrDataSet::new(
            AmrKind::Overlapping,
            vec![vec![Some(grid(0))], vec![Some(grid(0)), None, Some(grid(2))]],
        );
        let mut info = CompositeTreeStatistics::new();
        info.copy_from_object(&DataObject::from(amr), &HelperRegistry::new());
        assert_eq!(info.num_amr_levels(), 2);
        assert_eq!(info.num_children(), 2);
        let level1 = info.child(1).unwrap();
        assert_eq!(level1.num_data_sets(), 2);
        assert_eq!(level1.num_points(), 18);
        let level1_tree = level1.composite_info().unwrap();
        assert!(level1_tree.is_multi_piece());
        assert_eq!(level1_tree.num_pieces(), 3);
    }

    #[test]
    fn test_merge_pads_children_and_takes_names() {
        let mut a = CompositeTreeStatistics::new();
        a.push_child(None, "a");
        let mut b = CompositeTreeStatistics::new();
        b.push_child(None, "renamed");
        b.push_child(Some(DatasetStatistics::from_object(&poly(5))), "b");
        a.add_information(&b);
        assert_eq!(a.num_children(), 2);
        assert_eq!(a.child_name(0), Some("renamed"));
        assert_eq!(a.child(1).unwrap().num_points(), 5);
    }

    #[test]
    fn test_merge_multi_piece_takes_max() {
        let mut a = CompositeTreeStatistics::multi_piece(4);
        a.add_information(&CompositeTreeStatistics::multi_piece(2));
        assert_eq!(a.num_pieces(), 4);
        a.add_information(&CompositeTreeStatistics::multi_piece(7));
        assert_eq!(a.num_pieces(), 7);
    }

    #[test]
    fn test_merge_overwrites_flags() {
        let mut a = CompositeTreeStatistics::multi_piece(4);
        a.add_information(&CompositeTreeStatistics::new());
        assert!(!a.is_composite());
        assert!(!a.is_multi_piece());
        assert_eq!(a.num_pieces(), 4);
    }

    #[test]
    fn test_huge_child_count_without_children_is_a_decode_error() {
        let mut writer = MessageWriter::new();
        writer.write_bool(true);
        writer.write_bool(false);
        writer.write_u32(0);
        writer.write_u32(0);
        writer.write_u32(MAX_CHILDREN);
        let bytes = writer.finish();
        let err = CompositeTreeStatistics::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err.kind(),
            meshstat_common::error::ErrorKind::Decode { .. }
        ));
    }

    #[test]
    fn test_empty_children_are_not_stored() {
        let mut tree = CompositeTreeStatistics::new();
        for _ in 0..10_000 {
            tree.push_child(None, "");
        }
        tree.push_child(Some(DatasetStatistics::from_object(&poly(2))), "last");
        assert_eq!(tree.num_children(), 10_001);
        assert_eq!(tree.children().count(), 1);

        let bytes = tree.to_bytes();
        assert!(bytes.len() < 10_000);
        let decoded = CompositeTreeStatistics::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.num_children(), 10_001);
        assert_eq!(decoded.child_name(10_000), Some("last"));
        assert!(decoded.child(9_999).is_none());
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_stream_round_trip_with_sparse_children() {
        let mut tree = CompositeTreeStatistics::new();
        tree.push_child(None, "");
        tree.push_child(None, "named hole");
        tree.push_child(Some(DatasetStatistics::from_object(&poly(3))), "data");
        tree.push_child(None, "");
        let mut writer = MessageWriter::new();
        tree.copy_to_stream(&mut writer);
        let bytes = writer.finish();
        let mut decoded = CompositeTreeStatistics::new();
        decoded.copy_from_stream(&mut MessageReader::new(&bytes)).unwrap();
        assert_eq!(decoded, tree);
    }
}
