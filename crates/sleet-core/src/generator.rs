//! The Sleet ID generator.
//!
//! One [`Generator`] per node. Every call to [`Generator::next_id`] runs as a
//! single critical section, so IDs from one instance are unique and
//! non-decreasing in call order. Sequence exhaustion and a clock that moves
//! backwards are handled the same way: the sequence advances, and when it
//! wraps the generator moves its own time slot forward by one millisecond.
//! The embedded timestamp can therefore run ahead of the wall clock; a warning
//! is logged once the gap exceeds [`GeneratorConfig::max_drift_ms`].
//!
//! The time slot never leaves `base_epoch..=base_epoch + max_time`. At the top
//! of that range the generator keeps returning its highest ID instead of
//! wrapping to small values, and logs an error once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::{GeneratorConfig, Settings};
use crate::error::{ConfigError, ConfigResult};
use crate::layout::{BitLayout, IdParts};

#[derive(Debug)]
pub struct Generator {
    node_id: u64,
    base_epoch: u64,
    layout: BitLayout,
    /// Last absolute ms the time field can represent.
    max_timestamp: u64,
    max_drift_ms: u64,
    clock: Arc<dyn Clock>,
    state: Mutex<GeneratorState>,
}

#[derive(Debug)]
struct GeneratorState {
    /// Absolute ms of the slot the last ID was issued in.
    last_timestamp: u64,
    sequence: u64,
    /// Set while `last_timestamp` is more than `max_drift_ms` ahead of the clock.
    drifting: bool,
    /// Set once the final slot's sequence space is used up.
    exhausted: bool,
}

impl GeneratorState {
    /// Next sequence number in the current slot, moving to the following slot on
    /// wraparound. Returns `false`, leaving the state untouched, when there is no
    /// following slot.
    fn advance(&mut self, max_sequence: u64, max_timestamp: u64) -> bool {
        if self.sequence == max_sequence && self.last_timestamp >= max_timestamp {
            return false;
        }
        self.sequence = (self.sequence + 1) & max_sequence;
        if self.sequence == 0 {
            self.last_timestamp += 1;
        }
        true
    }
}

impl Generator {
    /// Generator with the default layout and epoch, reading the system clock.
    pub fn new(node_id: u64) -> ConfigResult<Self> {
        Self::with_config(node_id, &GeneratorConfig::default())
    }

    pub fn with_config(node_id: u64, config: &GeneratorConfig) -> ConfigResult<Self> {
        Self::with_clock(node_id, config, Arc::new(SystemClock))
    }

    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        Self::with_config(settings.node_id, &settings.generator)
    }

    /// Build a generator reading time from `clock`.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidBitWidth`] if the layout leaves no room for time.
    /// - [`ConfigError::NodeIdOutOfRange`] if `node_id >= 2^node_id_bits - 1`.
    /// - [`ConfigError::TimeFieldOverflow`] if the clock, or a resume timestamp,
    ///   is already past the last millisecond the time field can hold.
    /// - [`ConfigError::SequenceOutOfRange`] / [`ConfigError::TimestampBeforeEpoch`]
    ///   for resume seeds that the layout cannot represent.
    pub fn with_clock(
        node_id: u64,
        config: &GeneratorConfig,
        clock: Arc<dyn Clock>,
    ) -> ConfigResult<Self> {
        let layout = config.layout()?;

        let max_node_id = layout.max_node_id();
        if node_id >= max_node_id {
            return Err(ConfigError::NodeIdOutOfRange {
                node_id,
                max_node_id,
            });
        }

        let sequence = config.sequence.unwrap_or(0);
        if sequence > layout.max_sequence() {
            return Err(ConfigError::SequenceOutOfRange {
                sequence,
                max_sequence: layout.max_sequence(),
            });
        }

        let max_time = layout.max_time();
        let max_timestamp = config.base_epoch.saturating_add(max_time);

        let elapsed_ms = clock.now_millis().saturating_sub(config.base_epoch);
        if elapsed_ms > max_time {
            return Err(ConfigError::TimeFieldOverflow {
                elapsed_ms,
                max_time,
            });
        }

        let last_timestamp = match config.last_timestamp {
            Some(ts) if ts < config.base_epoch => {
                return Err(ConfigError::TimestampBeforeEpoch {
                    last_timestamp: ts,
                    base_epoch: config.base_epoch,
                });
            }
            Some(ts) if ts > max_timestamp => {
                return Err(ConfigError::TimeFieldOverflow {
                    elapsed_ms: ts - config.base_epoch,
                    max_time,
                });
            }
            Some(ts) => ts,
            None => 0,
        };

        tracing::info!(
            node_id,
            base_epoch = config.base_epoch,
            node_id_bits = layout.node_id_bits(),
            sequence_bits = layout.sequence_bits(),
            resumed = config.last_timestamp.is_some(),
            "ID generator ready"
        );

        Ok(Self {
            node_id,
            base_epoch: config.base_epoch,
            layout,
            max_timestamp,
            max_drift_ms: config.max_drift_ms,
            clock,
            state: Mutex::new(GeneratorState {
                last_timestamp,
                sequence,
                drifting: false,
                exhausted: false,
            }),
        })
    }

    /// Produce the next ID. Never blocks on the clock and never fails.
    pub fn next_id(&self) -> u64 {
        let mut state = self.state.lock();

        // The slot stays inside the time field, so it neither underflows nor wraps.
        let now = self
            .clock
            .now_millis()
            .clamp(self.base_epoch, self.max_timestamp);
        let max_sequence = self.layout.max_sequence();

        let advanced = if now < state.last_timestamp {
            tracing::debug!(
                node_id = self.node_id,
                behind_ms = state.last_timestamp - now,
                "clock moved backwards; continuing from last timestamp"
            );
            state.advance(max_sequence, self.max_timestamp)
        } else if now == state.last_timestamp {
            state.advance(max_sequence, self.max_timestamp)
        } else {
            state.sequence = 0;
            state.last_timestamp = now;
            true
        };

        if !advanced && !state.exhausted {
            state.exhausted = true;
            tracing::error!(
                node_id = self.node_id,
                max_timestamp = self.max_timestamp,
                "time field exhausted; repeating the highest ID until reconfigured"
            );
        }

        self.track_drift(&mut state, now);

        self.layout.compose(
            state.last_timestamp - self.base_epoch,
            self.node_id,
            state.sequence,
        )
    }

    fn track_drift(&self, state: &mut GeneratorState, now: u64) {
        if self.max_drift_ms == 0 {
            return;
        }

        let drift_ms = state.last_timestamp.saturating_sub(now);
        if drift_ms > self.max_drift_ms && !state.drifting {
            state.drifting = true;
            tracing::warn!(
                node_id = self.node_id,
                drift_ms,
                max_drift_ms = self.max_drift_ms,
                "embedded timestamps are running ahead of the wall clock"
            );
        } else if drift_ms <= self.max_drift_ms && state.drifting {
            state.drifting = false;
            tracing::info!(node_id = self.node_id, drift_ms, "clock drift recovered");
        }
    }

    /// Absolute ms of the slot the most recent ID was issued in.
    pub fn last_timestamp(&self) -> u64 {
        self.state.lock().last_timestamp
    }

    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn base_epoch(&self) -> u64 {
        self.base_epoch
    }

    pub fn layout(&self) -> BitLayout {
        self.layout
    }

    pub fn decompose(&self, id: u64) -> IdParts {
        self.layout.decompose(id)
    }

    /// Milliseconds since the Unix epoch embedded in `id`, or `None` if `id`
    /// decodes past `u64::MAX` under this generator's epoch.
    pub fn timestamp_of(&self, id: u64) -> Option<u64> {
        self.layout.decompose(id).timestamp(self.base_epoch)
    }

    /// Extract the creation time embedded in `id`.
    pub fn datetime_of(&self, id: u64) -> Option<DateTime<Utc>> {
        self.layout.decompose(id).datetime(self.base_epoch)
    }
}
