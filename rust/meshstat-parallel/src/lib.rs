//! Cross-process plumbing for dataset summaries.
//!
//! [`Communicator`] is the blocking point-to-point contract the gather protocol
//! runs over; [`LocalCommunicator`] connects ranks living on threads of one
//! process. [`EmptyPartitionRepair`] gathers the summaries of every rank on
//! rank 0 and gives an empty rank-0 partition the arrays its peers carry.

pub mod array_factory;
pub mod communicator;
pub mod config;
pub mod empty_partition;

pub use array_factory::create_empty_array;
pub use communicator::{Communicator, LocalCommunicator, SingleProcess};
pub use config::GatherConfig;
pub use empty_partition::EmptyPartitionRepair;
