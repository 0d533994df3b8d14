//! Flow configuration
//!
//! Loaded from TOML text, or layered from an optional file plus
//! `CADENCE__*` environment variables.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// Scope name used for an anonymous root action unless configured otherwise
pub const DEFAULT_ROOT: &str = "$root";

/// Prefix for environment overrides, e.g. `CADENCE__ROOT=main`
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Scope name given to an anonymous root action
    pub root: String,

    /// Initial global fields, visible to every action
    pub params: Map<String, JsonValue>,

    /// Hooks that must be registered for the flow to build
    pub hooks: Vec<String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            params: Map::new(),
            hooks: Vec::new(),
        }
    }
}

impl FlowConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from an optional file, then apply environment overrides.
    ///
    /// `CADENCE__HOOKS` takes a comma-separated list.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::layered(path, environment())
    }

    fn layered(path: Option<&Path>, env: ::config::Environment) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }
}

fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("hooks")
}
