//! Generator configuration, loaded once at startup.
//!
//! Supports a `.env` file for development and environment variables for production.
//! Config precedence: env vars > .env file > sleet.toml > defaults
//!
//! The loaded [`Settings`] are returned to the caller and passed explicitly to
//! [`Generator::from_settings`](crate::Generator::from_settings); nothing is
//! stored globally.

use config::ConfigBuilder;
use config::builder::DefaultState;
use serde::Deserialize;

use crate::error::ConfigResult;
use crate::layout::{BitLayout, DEFAULT_NODE_ID_BITS, DEFAULT_SEQUENCE_BITS};

/// 2023-01-01T00:00:00Z in milliseconds since the Unix epoch.
pub const DEFAULT_BASE_EPOCH: u64 = 1_672_531_200_000;

/// Drift (ms) between the generator's time slot and the wall clock above which
/// a warning is logged.
pub const DEFAULT_MAX_DRIFT_MS: u64 = 1_000;

/// Tunables for a single [`Generator`](crate::Generator). Immutable once the
/// generator is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Milliseconds since the Unix epoch subtracted from every timestamp.
    pub base_epoch: u64,
    pub node_id_bits: u32,
    pub sequence_bits: u32,
    /// Resume seed. The caller is responsible for never reissuing IDs across restarts.
    pub last_timestamp: Option<u64>,
    /// Resume seed, only meaningful together with `last_timestamp`.
    pub sequence: Option<u64>,
    /// 0 disables the drift warning.
    pub max_drift_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_epoch: DEFAULT_BASE_EPOCH,
            node_id_bits: DEFAULT_NODE_ID_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            last_timestamp: None,
            sequence: None,
            max_drift_ms: DEFAULT_MAX_DRIFT_MS,
        }
    }
}

impl GeneratorConfig {
    pub fn layout(&self) -> ConfigResult<BitLayout> {
        BitLayout::new(self.node_id_bits, self.sequence_bits)
    }
}

/// Everything a host process needs to build its generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Assigned by the orchestrator; must be unique across the fleet.
    pub node_id: u64,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Settings {
    /// Load from `sleet.toml` (optional) and `SLEET__*` environment variables,
    /// e.g. `SLEET__NODE_ID=3`, `SLEET__GENERATOR__SEQUENCE_BITS=12`.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from("sleet")
    }

    /// Like [`Settings::load`] but reads the config file at `path` (extension optional).
    pub fn load_from(path: &str) -> ConfigResult<Self> {
        Self::load_with(path, None)
    }

    /// Like [`Settings::load_from`], with `node_id` taking precedence over every source.
    pub fn load_with(path: &str, node_id: Option<u64>) -> ConfigResult<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let cfg = defaults()?
            // Optional config file
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SLEET")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("node_id", node_id.map(|id| id as i64))?
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        tracing::debug!(
            node_id = settings.node_id,
            base_epoch = settings.generator.base_epoch,
            node_id_bits = settings.generator.node_id_bits,
            sequence_bits = settings.generator.sequence_bits,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Parse settings from a TOML document, without consulting the environment.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let cfg = defaults()?
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

fn defaults() -> ConfigResult<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("generator.base_epoch", DEFAULT_BASE_EPOCH as i64)?
        .set_default("generator.node_id_bits", DEFAULT_NODE_ID_BITS as i64)?
        .set_default("generator.sequence_bits", DEFAULT_SEQUENCE_BITS as i64)?
        .set_default("generator.max_drift_ms", DEFAULT_MAX_DRIFT_MS as i64)?)
}
