//! Settings of the summary gather protocol.

use meshstat_common::{Result, error::Error, verify_arg};
use serde::{Deserialize, Serialize};

/// Tag of the message carrying a serialized summary's byte count.
pub const DEFAULT_LENGTH_TAG: i32 = 1_987_002;

/// Tag of the message carrying the serialized summary itself.
pub const DEFAULT_PAYLOAD_TAG: i32 = 1_987_003;

/// Message tags used when peers ship their summaries to rank 0.
///
/// Sender and receiver must agree on both tags; an embedding pipeline that
/// already uses the defaults for other traffic can pick its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    pub length_tag: i32,
    pub payload_tag: i32,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            length_tag: DEFAULT_LENGTH_TAG,
            payload_tag: DEFAULT_PAYLOAD_TAG,
        }
    }
}

impl GatherConfig {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(length_tag, self.length_tag >= 0);
        verify_arg!(payload_tag, self.payload_tag >= 0);
        if self.length_tag == self.payload_tag {
            return Err(Error::invalid_arg(
                "tags",
                format!("length and payload tags must differ, both are {}", self.length_tag),
            ));
        }
        Ok(())
    }
}
