//! Loader for murmur configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: files added with [`MurmurConfigLoader::with_file`]
//! or [`MurmurConfigLoader::with_optional_file`], inline YAML, then
//! `MURMUR__SECTION__KEY` environment variables. `${VAR}` placeholders in any
//! string value are expanded after merging, so a checked-in `murmur.yaml` can
//! reference `${ACCESS_TOKEN}` or `${DB_PASS}` without carrying the secret.
use config::{Config, ConfigError, Environment, File};
use murmur_common::MurmurError;
use murmur_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "MURMUR";
const USERNAMES_POINTER: &str = "/pipeline/usernames";

#[derive(Debug, Deserialize)]
pub struct MurmurConfig {
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize)]
pub struct MastodonConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub access_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

#[derive(Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub dbname: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// SQLite database file, used when `backend: sqlite`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            host: default_db_host(),
            port: default_db_port(),
            dbname: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            path: default_db_path(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("path", &self.path)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnStoreFailure {
    /// Log the failure and keep going with whatever data is available.
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_usernames")]
    pub usernames: Vec<String>,
    #[serde(default = "default_toot_limit")]
    pub toot_limit: u32,
    /// When set, profile runs also analyse this many public-timeline authors.
    #[serde(default)]
    pub discover_limit: Option<u32>,
    /// Drop and recreate the profile and sentiment tables before writing.
    #[serde(default)]
    pub reset_schema: bool,
    #[serde(default)]
    pub on_store_failure: OnStoreFailure,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            usernames: default_usernames(),
            toot_limit: default_toot_limit(),
            discover_limit: None,
            reset_schema: false,
            on_store_failure: OnStoreFailure::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            emit_stderr: true,
            dir: None,
            filter: default_filter(),
        }
    }
}

fn default_base_url() -> String {
    "https://mastodon.social".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_db_host() -> String {
    "localhost".into()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "murmur".into()
}
fn default_db_user() -> String {
    "murmur".into()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("murmur.db")
}
fn default_usernames() -> Vec<String> {
    vec!["popsci".into(), "cricket".into()]
}
fn default_toot_limit() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// A comma-separated string at `pointer` (as set from the environment) becomes a list.
fn split_list(v: &mut Value, pointer: &str) {
    let Some(slot) = v.pointer_mut(pointer) else {
        return;
    };
    let Value::String(raw) = slot else {
        return;
    };
    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Value::String(s.to_owned()))
        .collect();
    *slot = Value::Array(items);
}

fn validate(cfg: &MurmurConfig) -> Result<(), ConfigError> {
    let token = cfg.mastodon.access_token.trim();
    if token.is_empty() || token.contains("${") {
        return Err(ConfigError::Message(
            "mastodon.access_token is empty or references an unset variable".into(),
        ));
    }
    if cfg.mastodon.timeout_secs == 0 {
        return Err(ConfigError::Message(
            "mastodon.timeout_secs must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Fold a loader error into the shared error taxonomy.
pub fn config_error(err: ConfigError) -> MurmurError {
    MurmurError::Config(err.to_string())
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct MurmurConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for MurmurConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MurmurConfigLoader {
    /// Start from an empty builder; environment overrides are applied last in [`Self::load`].
    ///
    /// ```
    /// use murmur_config::MurmurConfigLoader;
    ///
    /// let config = MurmurConfigLoader::new()
    ///     .with_yaml_str("mastodon:\n  access_token: abc")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.mastodon.base_url, "https://mastodon.social");
    /// assert_eq!(config.pipeline.toot_limit, 10);
    /// assert!(!config.pipeline.reset_schema);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so headless runs can rely on the environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and validate.
    ///
    /// ```
    /// use murmur_config::{Backend, MurmurConfigLoader};
    ///
    /// unsafe { std::env::set_var("DOC_DB_PASS", "hunter2"); }
    ///
    /// let config = MurmurConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// mastodon:
    ///   access_token: "token"
    /// database:
    ///   backend: sqlite
    ///   password: "${DOC_DB_PASS}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.database.backend, Backend::Sqlite);
    /// assert_eq!(config.database.password, "hunter2");
    /// assert!(!format!("{:?}", config.database).contains("hunter2"));
    ///
    /// unsafe { std::env::remove_var("DOC_DB_PASS"); }
    /// ```
    pub fn load(self) -> Result<MurmurConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);
        split_list(&mut v, USERNAMES_POINTER);

        // Env values stay strings; `config` coerces them into numeric and bool fields.
        let typed: MurmurConfig = Config::try_from(&v)?.try_deserialize()?;
        validate(&typed)?;
        Ok(typed)
    }
}
