//! Configuration error types for Sleet.
//!
//! Every error here is raised while building a [`Generator`](crate::Generator).
//! Producing IDs never fails, so there is no runtime error type.

/// A static misconfiguration detected at construction time.
///
/// These are never transient: the caller should abort startup rather than retry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The node ID does not fit below the exclusive bound `2^node_id_bits - 1`.
    #[error("node id {node_id} is too big (must be less than {max_node_id})")]
    NodeIdOutOfRange { node_id: u64, max_node_id: u64 },

    #[error(
        "invalid bit widths: node_id_bits={node_id_bits}, sequence_bits={sequence_bits} \
         (both must be non-zero and sum to less than 64)"
    )]
    InvalidBitWidth { node_id_bits: u32, sequence_bits: u32 },

    #[error("resume sequence {sequence} exceeds max sequence {max_sequence}")]
    SequenceOutOfRange { sequence: u64, max_sequence: u64 },

    #[error("resume timestamp {last_timestamp} is earlier than base epoch {base_epoch}")]
    TimestampBeforeEpoch { last_timestamp: u64, base_epoch: u64 },

    /// The time field is too narrow for a timestamp this far past the base epoch.
    #[error(
        "{elapsed_ms}ms since base epoch does not fit in the time field (max {max_time}ms); \
         widen the time field or move the base epoch forward"
    )]
    TimeFieldOverflow { elapsed_ms: u64, max_time: u64 },

    /// Settings could not be read from file or environment.
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Convenience type alias for Results using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
