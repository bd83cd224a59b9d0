//! Hierarchical containers: multi-block trees, multi-piece and partitioned
//! collections, and AMR hierarchies.

use meshstat_format::DataObjectType;

use crate::{data_set::DataSet, object::DataObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    MultiBlock,
    MultiPiece,
    PartitionedDataSet,
    PartitionedDataSetCollection,
}

impl CompositeKind {
    pub fn data_object_type(self) -> DataObjectType {
        match self {
            CompositeKind::MultiBlock => DataObjectType::MultiBlockDataSet,
            CompositeKind::MultiPiece => DataObjectType::MultiPieceDataSet,
            CompositeKind::PartitionedDataSet => DataObjectType::PartitionedDataSet,
            CompositeKind::PartitionedDataSetCollection => {
                DataObjectType::PartitionedDataSetCollection
            }
        }
    }

    /// Flat containers of homogeneous, unnamed pieces.
    pub fn is_multi_piece(self) -> bool {
        matches!(
            self,
            CompositeKind::MultiPiece | CompositeKind::PartitionedDataSet
        )
    }
}

/// One child slot of a composite. A slot may be empty.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub name: Option<String>,
    pub data: Option<DataObject>,
}

impl Block {
    pub fn new(name: Option<&str>, data: Option<DataObject>) -> Block {
        Block {
            name: name.map(str::to_string),
            data,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositeDataSet {
    kind: CompositeKind,
    blocks: Vec<Block>,
}

impl CompositeDataSet {
    pub fn new(kind: CompositeKind) -> CompositeDataSet {
        CompositeDataSet {
            kind,
            blocks: Vec::new(),
        }
    }

    pub fn multi_block(blocks: Vec<Block>) -> CompositeDataSet {
        CompositeDataSet {
            kind: CompositeKind::MultiBlock,
            blocks,
        }
    }

    pub fn multi_piece(pieces: Vec<Option<DataObject>>) -> CompositeDataSet {
        CompositeDataSet {
            kind: CompositeKind::MultiPiece,
            blocks: pieces.into_iter().map(|data| Block { name: None, data }).collect(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Non-empty, non-composite descendants in depth-first order.
    pub fn leaves(&self) -> Vec<&DataObject> {
        let mut leaves = Vec::new();
        for block in &self.blocks {
            if let Some(data) = &block.data {
                data.collect_leaves(&mut leaves);
            }
        }
        leaves
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmrKind {
    Overlapping,
    NonOverlapping,
}

/// Adaptive mesh refinement hierarchy: a list of levels, each holding a
/// variable number of (possibly absent) uniform grids.
#[derive(Debug, Clone)]
pub struct AmrDataSet {
    kind: AmrKind,
    levels: Vec<Vec<Option<DataSet>>>,
}

impl AmrDataSet {
    pub fn new(kind: AmrKind, levels: Vec<Vec<Option<DataSet>>>) -> AmrDataSet {
        AmrDataSet { kind, levels }
    }

    pub fn kind(&self) -> AmrKind {
        self.kind
    }

    pub fn data_object_type(&self) -> DataObjectType {
        match self.kind {
            AmrKind::Overlapping => DataObjectType::OverlappingAmr,
            AmrKind::NonOverlapping => DataObjectType::NonOverlappingAmr,
        }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &[Option<DataSet>] {
        self.levels.get(level).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn levels(&self) -> impl Iterator<Item = &[Option<DataSet>]> {
        self.levels.iter().map(Vec::as_slice)
    }

    pub fn memory_size(&self) -> usize {
        self.levels
            .iter()
            .flatten()
            .flatten()
            .map(DataSet::memory_size)
            .sum()
    }
}
