//! Gives an empty rank-0 partition the arrays the other ranks carry.
//!
//! Serial consumers downstream of a distributed pipeline (writers in
//! particular) only look at rank 0. When rank 0 ends up with no geometry, its
//! output would also lack the point and cell arrays every other partition has.
//! [`EmptyPartitionRepair`] gathers the summaries of all ranks on rank 0 and
//! fabricates correctly typed, named and shaped arrays with zero tuples there.

use byteorder::{ByteOrder, LittleEndian};
use meshstat_common::{Result, error::Error};
use meshstat_data_stats::{AttributeSetStatistics, DatasetStatistics};
use meshstat_format::{ElementType, MessageReader};
use meshstat_model::{DataArray, DataBody, DataObject, DataSetAttributes};

use crate::{array_factory::create_empty_array, communicator::Communicator, config::GatherConfig};

/// Rank that decides whether repair is needed and collects the summaries.
const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
pub struct EmptyPartitionRepair {
    config: GatherConfig,
}

impl EmptyPartitionRepair {
    pub fn new(config: GatherConfig) -> Result<EmptyPartitionRepair> {
        config.validate()?;
        Ok(EmptyPartitionRepair { config })
    }

    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    /// Runs the repair on this rank and returns its output.
    ///
    /// Every rank of `comm` must call this. The output starts as a copy of
    /// `input`. With a single rank, or when rank 0 has both points and cells,
    /// it is returned as is. Otherwise the other ranks send their summaries to
    /// rank 0, which adds the missing arrays (and, for point sets, an empty
    /// points array) to its output.
    ///
    /// Malformed summaries and unsupported array types are logged and skipped.
    /// Only transport failures are returned as errors.
    pub fn execute<C: Communicator + ?Sized>(
        &self,
        input: &DataObject,
        comm: &C,
    ) -> Result<DataObject> {
        let mut output = input.clone();
        if comm.size() <= 1 {
            return Ok(output);
        }

        let rank = comm.rank();
        let local_complete = rank == ROOT && has_points_and_cells(&output);
        if comm.broadcast(local_complete, ROOT)? {
            log::debug!("rank {rank}: rank {ROOT} has geometry, nothing to repair");
            return Ok(output);
        }

        if rank != ROOT {
            self.send_summary(&output, comm)?;
            return Ok(output);
        }

        let merged = self.gather(comm)?;
        fabricate(&mut output, &merged);
        Ok(output)
    }

    fn send_summary<C: Communicator + ?Sized>(&self, output: &DataObject, comm: &C) -> Result<()> {
        let payload = DatasetStatistics::from_object(output).to_bytes();
        let length = i32::try_from(payload.len()).map_err(|_| {
            Error::transport(
                "send summary",
                format!("summary of {} bytes exceeds the length prefix", payload.len()),
            )
        })?;
        let mut prefix = [0u8; 4];
        LittleEndian::write_i32(&mut prefix, length);
        log::trace!("rank {}: sending {length} byte summary", comm.rank());
        comm.send(&prefix, ROOT, self.config.length_tag)?;
        comm.send(&payload, ROOT, self.config.payload_tag)
    }

    /// Receives one summary from every other rank, in rank order, and merges
    /// them.
    fn gather<C: Communicator + ?Sized>(&self, comm: &C) -> Result<DatasetStatistics> {
        let mut merged = DatasetStatistics::new();
        for source in (0..comm.size()).filter(|&r| r != ROOT) {
            let prefix = comm.receive(source, self.config.length_tag)?;
            if prefix.len() != 4 {
                return Err(Error::transport(
                    "gather summaries",
                    format!("rank {source} sent a {} byte length prefix", prefix.len()),
                ));
            }
            let length = LittleEndian::read_i32(&prefix);
            let payload = comm.receive(source, self.config.payload_tag)?;
            if i64::from(length) != payload.len() as i64 {
                log::warn!(
                    "rank {source}: announced {length} summary bytes, received {}",
                    payload.len()
                );
            }

            let mut scratch = DatasetStatistics::new();
            if let Err(e) = scratch.copy_from_stream(&mut MessageReader::new(&payload)) {
                log::error!("rank {source}: malformed summary, keeping what was decoded: {e}");
            }
            log::trace!(
                "rank {source}: {} points, {} cells",
                scratch.num_points(),
                scratch.num_cells()
            );
            merged.add_information(&scratch, false);
        }
        Ok(merged)
    }
}

/// Data sets need repair unless they have both points and cells. Other
/// objects are never repaired.
fn has_points_and_cells(object: &DataObject) -> bool {
    match &object.body {
        DataBody::DataSet(data_set) => data_set.num_points() > 0 && data_set.num_cells() > 0,
        _ => true,
    }
}

fn fabricate(output: &mut DataObject, merged: &DatasetStatistics) {
    let Some(data_set) = output.as_data_set_mut() else {
        return;
    };
    add_missing_arrays(&mut data_set.point_data, merged.point_data());
    add_missing_arrays(&mut data_set.cell_data, merged.cell_data());

    let has_points = data_set.points().is_some_and(|p| p.num_tuples() > 0);
    if data_set.kind().is_point_set() && !has_points {
        let points = create_empty_array(merged.point_array_information())
            .or_else(|| DataArray::empty(Some("Points"), ElementType::Float32, 3));
        data_set.set_points(points);
    }
}

/// Adds an empty array for every summarized array `attributes` lacks, keeping
/// attribute roles.
fn add_missing_arrays(attributes: &mut DataSetAttributes, summary: &AttributeSetStatistics) {
    for (index, info) in summary.arrays().iter().enumerate() {
        if info.name().is_some_and(|name| attributes.array(name).is_some()) {
            continue;
        }
        let Some(array) = create_empty_array(info) else {
            log::error!(
                "{:?} data: cannot create array {:?} of type {}",
                summary.association(),
                info.name().unwrap_or(""),
                info.element_type().name()
            );
            continue;
        };
        match summary.role_of(index) {
            Some(role) => attributes.set_attribute(array, role),
            None => attributes.add_array(array),
        };
    }
}
