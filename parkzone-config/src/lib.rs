//! # Parkzone Configuration System
//!
//! Hierarchical configuration for the parking allocation engine.
//!
//! ## Features
//! - **Unified Configuration**: one document covers topology, ledger, pricing and telemetry
//! - **Validation**: field limits via `validator`, cross-references via [`TopologyConfig::check`]
//! - **Environment Awareness**: per-environment overrides and `PARKZONE_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod ledger;
mod pricing;
mod telemetry;
mod topology;
mod validation;

pub use error::ConfigError;
pub use ledger::LedgerConfig;
pub use pricing::PricingConfig;
pub use telemetry::TelemetryConfig;
pub use topology::{AreaLayout, TopologyConfig, ZoneLayout};

const BASE_FILE: &str = "config/parkzone.yaml";
const ENV_PREFIX: &str = "PARKZONE_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct ParkzoneConfig {
    /// Zone/area layout and adjacency.
    #[serde(default)]
    #[validate(nested)]
    pub topology: TopologyConfig,

    /// Rollback ledger sizing.
    #[serde(default)]
    #[validate(nested)]
    pub ledger: LedgerConfig,

    /// Tariff used to price completed stays.
    #[serde(default)]
    #[validate(nested)]
    pub pricing: PricingConfig,

    /// Logging and metrics.
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl ParkzoneConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/parkzone.yaml`, if present
    /// 3. `config/<PARKZONE_ENV>.yaml` environment overrides
    /// 4. `PARKZONE_*` environment variables (`__` separates nesting)
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ParkzoneConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("PARKZONE_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, still honouring environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::finish(
            Figment::from(Serialized::defaults(ParkzoneConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Run field validation and the topology cross-checks.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.topology.check()
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.check()?;
        Ok(config)
    }
}
