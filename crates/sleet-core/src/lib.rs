//! # sleet-core
//!
//! Coordination-free, time-ordered 64-bit IDs.
//! Each ID packs a millisecond timestamp, a node ID and a per-millisecond
//! sequence: `[ time | node_id | sequence ]`, most significant first.
//!
//! ```no_run
//! use sleet_core::Generator;
//!
//! let generator = Generator::new(1)?;
//! let a = generator.next_id();
//! let b = generator.next_id();
//! assert!(b > a);
//! # Ok::<(), sleet_core::ConfigError>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GeneratorConfig, Settings, DEFAULT_BASE_EPOCH};
pub use error::{ConfigError, ConfigResult};
pub use generator::Generator;
pub use layout::{BitLayout, IdParts};
