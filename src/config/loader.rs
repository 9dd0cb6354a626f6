// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::engine::{default_concurrency, EngineOptions, ExecutionEngine};
use crate::errors::ConfigError;
use crate::state::MergeMode;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Engine configuration, typically loaded from a YAML file.
///
/// Every section is optional; an empty document yields the defaults.
///
/// # Fields
/// * `executor_options` - Scheduler tunables
/// * `merge_mode` - How same-step writes to an `Overwrite` field are handled
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 4
/// merge_mode: strict
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub merge_mode: MergeMode,
}

/// Scheduler tunables.
///
/// # Fields
/// * `max_concurrency` - Maximum nodes running at once within a step.
///   Defaults to the number of CPU cores.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(requested) = self.executor_options.max_concurrency {
            if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&requested) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "executor_options.max_concurrency must be between {} and {}, got {}",
                        MIN_CONCURRENCY, MAX_CONCURRENCY, requested
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_concurrency: self
                .executor_options
                .max_concurrency
                .unwrap_or_else(default_concurrency),
            merge_mode: self.merge_mode,
        }
    }

    pub fn engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(self.engine_options())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    EngineConfig::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}
