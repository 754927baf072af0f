//! Bit layout of a Sleet ID.
//!
//! ```text
//! | time: 64 - node_id_bits - sequence_bits | node_id: node_id_bits | sequence: sequence_bits |
//! ```
//!
//! With the default 5/14 split the time field has 45 bits, which covers about
//! 1115 years of milliseconds past the base epoch. Narrower time fields cover
//! less: 10/22 leaves 32 bits, about 49.7 days.

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_NODE_ID_BITS: u32 = 5;
pub const DEFAULT_SEQUENCE_BITS: u32 = 14;

/// Validated field widths and the shifts/masks derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    node_id_bits: u32,
    sequence_bits: u32,
}

/// The three fields of an ID, as stored (time is relative to the base epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParts {
    pub elapsed_ms: u64,
    pub node_id: u64,
    pub sequence: u64,
}

impl IdParts {
    /// Absolute milliseconds since the Unix epoch, or `None` if the sum overflows.
    pub fn timestamp(&self, base_epoch: u64) -> Option<u64> {
        self.elapsed_ms.checked_add(base_epoch)
    }

    pub fn datetime(&self, base_epoch: u64) -> Option<DateTime<Utc>> {
        let ms = i64::try_from(self.timestamp(base_epoch)?).ok()?;
        DateTime::from_timestamp_millis(ms)
    }
}

impl BitLayout {
    pub fn new(node_id_bits: u32, sequence_bits: u32) -> ConfigResult<Self> {
        let valid = node_id_bits > 0
            && sequence_bits > 0
            && node_id_bits.saturating_add(sequence_bits) < u64::BITS;
        if !valid {
            return Err(ConfigError::InvalidBitWidth {
                node_id_bits,
                sequence_bits,
            });
        }

        Ok(Self {
            node_id_bits,
            sequence_bits,
        })
    }

    pub fn node_id_bits(&self) -> u32 {
        self.node_id_bits
    }

    pub fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    pub fn time_bits(&self) -> u32 {
        u64::BITS - self.time_shift()
    }

    /// `2^node_id_bits - 1`. Node IDs must be strictly below this value, so a
    /// 5-bit field accepts 0..=30. The off-by-one is kept for compatibility
    /// with IDs already issued under this convention.
    pub fn max_node_id(&self) -> u64 {
        mask(self.node_id_bits)
    }

    pub fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    pub fn max_time(&self) -> u64 {
        mask(self.time_bits())
    }

    pub fn time_shift(&self) -> u32 {
        self.node_id_bits + self.sequence_bits
    }

    pub fn node_id_shift(&self) -> u32 {
        self.sequence_bits
    }

    /// Pack the three fields. `elapsed_ms` must not exceed [`max_time`](Self::max_time);
    /// [`Generator`](crate::Generator) guarantees this for every ID it issues.
    pub fn compose(&self, elapsed_ms: u64, node_id: u64, sequence: u64) -> u64 {
        (elapsed_ms << self.time_shift())
            | ((node_id & self.max_node_id()) << self.node_id_shift())
            | (sequence & self.max_sequence())
    }

    pub fn decompose(&self, id: u64) -> IdParts {
        IdParts {
            elapsed_ms: id >> self.time_shift(),
            node_id: (id >> self.node_id_shift()) & self.max_node_id(),
            sequence: id & self.max_sequence(),
        }
    }
}

impl Default for BitLayout {
    fn default() -> Self {
        Self {
            node_id_bits: DEFAULT_NODE_ID_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
        }
    }
}

fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}
