// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, DEFAULT_CONFIG_NAME};
use crate::{ChainDeployment, DeploymentBook};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub const ENV_PREFIX: &str = "ELD_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrantConfig {
    /// How long a signed decryption grant stays valid
    pub duration_days: u32,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self { duration_days: 365 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawConfig {
    /// Delay before the local relayer answers a reveal request
    pub reveal_delay_ms: u64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 100,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoprocessorConfig {
    pub chain_id: u64,
    /// Seals stored ciphertexts under a key derived from this password. A random key is used
    /// when unset.
    pub password: Option<String>,
}

impl Default for CoprocessorConfig {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            password: None,
        }
    }
}

impl fmt::Debug for CoprocessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoprocessorConfig")
            .field("chain_id", &self.chain_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The config actually used throughout the app
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    chains: Vec<ChainDeployment>,
    grant: GrantConfig,
    draw: DrawConfig,
    coprocessor: CoprocessorConfig,
    /// The file this configuration was read from, if any
    found_config_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn chains(&self) -> &[ChainDeployment] {
        &self.chains
    }

    pub fn deployments(&self) -> DeploymentBook {
        DeploymentBook::new(self.chains.iter().cloned())
    }

    pub fn grant(&self) -> &GrantConfig {
        &self.grant
    }

    pub fn draw(&self) -> &DrawConfig {
        &self.draw
    }

    pub fn coprocessor(&self) -> &CoprocessorConfig {
        &self.coprocessor
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.found_config_file.as_deref()
    }
}

/// Values passed on the command line. They take precedence over the file and the environment.
#[derive(Default, Clone, Debug)]
pub struct CliOverrides {
    pub chain_id: Option<u64>,
    pub reveal_delay_ms: Option<u64>,
    pub grant_duration_days: Option<u32>,
}

/// Load the config at `config_file`, or the nearest `lucky-draw.config.yaml` found from the
/// working directory upwards, or the one in the OS config dir.
pub fn load_config(config_file: Option<&str>, overrides: CliOverrides) -> Result<AppConfig> {
    let cli_file = config_file.map(PathBuf::from);
    let resolved = resolve_config_path(
        find_in_parent,
        &env::current_dir()?,
        &OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        cli_file.as_deref(),
    );

    if cli_file.is_some() {
        fs::metadata(&resolved).with_context(|| {
            format!("Configuration file not found at {}", resolved.display())
        })?;
    }

    load_config_from(&resolved, overrides)
}

/// Layer defaults, the YAML file at `path` (skipped when absent), `ELD_` environment variables
/// and `overrides`.
pub fn load_config_from(path: &Path, overrides: CliOverrides) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    if let Some(chain_id) = overrides.chain_id {
        figment = figment.merge(Serialized::default("coprocessor.chain_id", chain_id));
    }
    if let Some(delay) = overrides.reveal_delay_ms {
        figment = figment.merge(Serialized::default("draw.reveal_delay_ms", delay));
    }
    if let Some(days) = overrides.grant_duration_days {
        figment = figment.merge(Serialized::default("grant.duration_days", days));
    }

    let mut config: AppConfig = figment
        .extract()
        .context("Could not parse configuration")?;
    config.found_config_file = path.exists().then(|| path.to_path_buf());

    info!(
        file = ?config.found_config_file,
        chains = config.chains.len(),
        chain_id = config.coprocessor.chain_id,
        "configuration loaded"
    );
    Ok(config)
}

pub struct OsDirs;

impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("lucky-draw"))
            .context("The lucky draw may only be run on an OS that can provide a config dir. See https://docs.rs/dirs for more information.")
    }
}
