//! # Radiosync Configuration
//!
//! Layered YAML configuration shared by every radiosync crate:
//! - an embedded default document (`radiosync.yaml`)
//! - merged with `<config dir>/config.yaml` when present
//! - then with `RADIOSYNC_CONFIG__SECTION__KEY=value` environment overrides
//!
//! Crates add their own typed accessors through extension traits
//! (`ScraperConfigExt`, `StorageConfigExt`, ...) built on the generic
//! helpers exposed here.
//!
//! ## Usage
//!
//! ```no_run
//! use radioconfig::Config;
//!
//! let config = Config::load(None)?;
//! let level = config.get_log_level();
//! config.set_value(&["logging", "level"], "debug".into())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};

pub mod duration;

pub use duration::parse_duration;

// Embedded defaults
const DEFAULT_CONFIG: &str = include_str!("radiosync.yaml");

const ENV_CONFIG_DIR: &str = "RADIOSYNC_CONFIG";
const ENV_PREFIX: &str = "RADIOSYNC_CONFIG__";
const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration manager
///
/// The whole document is kept as a `serde_yaml::Value` tree behind a mutex.
/// Keys are case-insensitive: they are lower-cased on load and on lookup.
#[derive(Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: Option<&Path>) -> PathBuf {
        if let Some(dir) = directory {
            return dir.to_path_buf();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Using config directory from env");
            return PathBuf::from(env_path);
        }

        if Path::new(".radiosync").exists() {
            return PathBuf::from(".radiosync");
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".radiosync");
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(".radiosync")
    }

    /// Loads the configuration
    ///
    /// The directory is searched in the following order:
    /// 1. `directory` when given
    /// 2. the `RADIOSYNC_CONFIG` environment variable
    /// 3. `.radiosync` in the current directory
    /// 4. `.radiosync` in the user's home directory
    ///
    /// A missing `config.yaml` is not an error: the embedded defaults are used.
    pub fn load(directory: Option<&Path>) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        let path = config_dir.join(CONFIG_FILE_NAME);
        info!(config_dir = %config_dir.display(), "Using config directory");

        let external = match fs::read_to_string(&path) {
            Ok(text) => {
                info!(config_file = %path.display(), "Loaded config file");
                Some(text)
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using embedded defaults");
                None
            }
        };

        let mut value = Self::layered(external.as_deref())?;
        Self::apply_env_overrides(&mut value, env::vars());

        Ok(Self {
            config_dir,
            path: Some(path),
            data: Mutex::new(value),
        })
    }

    /// Builds an in-memory configuration from a YAML document merged over
    /// the defaults. Nothing is ever written back to disk.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value = Self::layered(Some(yaml))?;
        Ok(Self {
            config_dir: PathBuf::from("."),
            path: None,
            data: Mutex::new(value),
        })
    }

    fn layered(external: Option<&str>) -> Result<Value> {
        let mut default_value: Value =
            serde_yaml::from_str(DEFAULT_CONFIG).context("embedded default configuration")?;
        if let Some(text) = external {
            let external_value: Value =
                serde_yaml::from_str(text).context("invalid configuration file")?;
            if !external_value.is_null() {
                merge_yaml(&mut default_value, &external_value);
            }
        }
        Ok(lower_keys_value(default_value))
    }

    /// Directory the configuration was loaded from
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Resolves `path` relative to the configuration directory unless it is absolute
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.config_dir.join(candidate)
        }
    }

    /// Writes the current document to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = {
            let data = self.lock()?;
            serde_yaml::to_string(&*data)?
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, yaml)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("configuration lock poisoned"))
    }

    /// Sets a value at `path` (e.g. `&["daemon", "fetch_interval"]`) and saves
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock()?;
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets the value at `path`, or an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock()?;
        get_value_internal(&data, path)
    }

    /// Unsigned integer at `path`, `default` when missing or mistyped
    pub fn get_u64_or(&self, path: &[&str], default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => match n.as_u64() {
                Some(v) => v,
                None => {
                    warn!(key = %path.join("."), "Expected an unsigned integer, using default {}", default);
                    default
                }
            },
            Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!(key = %path.join("."), value = %s, "Invalid integer, using default {}", default);
                default
            }),
            _ => default,
        }
    }

    /// Boolean at `path`, `default` when missing or mistyped
    pub fn get_bool_or(&self, path: &[&str], default: bool) -> bool {
        match self.get_value(path) {
            Ok(Value::Bool(b)) => b,
            Ok(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// String at `path`, `default` when missing, null or not a scalar
    pub fn get_string_or(&self, path: &[&str], default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) => s,
            Ok(Value::Number(n)) => n.to_string(),
            Ok(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Optional non-empty string at `path`
    pub fn get_string_opt(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    /// Duration at `path`. Accepts `"90s"`, `"5m"`, `"1h30m"` or a bare
    /// number of seconds.
    pub fn get_duration_or(&self, path: &[&str], default: Duration) -> Duration {
        let raw = match self.get_value(path) {
            Ok(Value::Number(n)) => return n.as_u64().map(Duration::from_secs).unwrap_or(default),
            Ok(Value::String(s)) => s,
            _ => return default,
        };
        parse_duration(&raw).unwrap_or_else(|e| {
            warn!(key = %path.join("."), value = %raw, "Invalid duration ({}), using default", e);
            default
        })
    }

    /// Minimum log level (`logging.level`)
    pub fn get_log_level(&self) -> String {
        self.get_string_or(&["logging", "level"], DEFAULT_LOG_LEVEL)
    }

    /// Sets the minimum log level
    pub fn set_log_level(&self, level: &str) -> Result<()> {
        self.set_value(&["logging", "level"], Value::String(level.to_string()))
    }

    fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(rest) = key.strip_prefix(ENV_PREFIX) {
                let key_path = rest.split("__").collect::<Vec<_>>();
                if key_path.iter().any(|k| k.is_empty()) {
                    continue;
                }
                let yaml_value = convert_env_value(&value);
                if let Err(e) = set_value_internal(config, &key_path, yaml_value) {
                    warn!(env_var = %key, "Ignoring environment override: {}", e);
                }
            }
        }
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

/// Env values are parsed as YAML scalars; anything structured stays a string
fn convert_env_value(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
        _ => Value::String(value.to_string()),
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let new_key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(new_key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        other => other,
    }
}

/// Recursively merges `external` into `default`: mappings are merged key by
/// key, scalars and sequences are replaced.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                let k = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other.clone(),
                };
                match dmap.get_mut(&k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k, v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
