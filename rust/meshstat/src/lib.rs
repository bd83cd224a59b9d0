//! # Meshstat: summaries of distributed scientific datasets
//!
//! Meshstat describes a (possibly distributed, possibly composite) dataset
//! without moving its data: which arrays it carries and over which value
//! ranges, how many points, cells and rows it holds, where it lies in space and
//! time, and how its composite tree is shaped. Every process summarizes its
//! local partition, ships the summary as a compact binary message, and a
//! collector merges the messages into one summary of the whole.
//!
//! ## Module Organization
//!
//! * [`common`] - Errors and result helpers shared by all crates
//! * [`format`] - Element and data object type tags, the generic variant and
//!   the binary message codec
//! * [`model`] - The in-memory data model summaries are built from
//! * [`data_stats`] - Array, attribute set, composite tree and dataset
//!   summaries, and the merge that combines them
//! * [`parallel`] - The communicator contract and the empty partition repair
//!
//! ## Merge semantics
//!
//! Merging is associative and, apart from the composite flags and the time
//! label (the last merged summary wins), commutative. Summaries of sibling
//! parts of one object are merged with `adding_parts = true`; summaries of the
//! same part seen by different processes with `adding_parts = false`.

pub use meshstat_common as common;
pub use meshstat_data_stats as data_stats;
pub use meshstat_format as format;
pub use meshstat_model as model;
pub use meshstat_parallel as parallel;
