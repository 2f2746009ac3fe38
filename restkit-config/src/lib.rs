use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "RESTKIT";

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub app: Option<AppSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub sqldb: Option<SqlDbSection>,
    #[serde(default)]
    pub redis: Option<RedisSection>,
    #[serde(default)]
    pub sqlqueries: Option<SqlQueriesSection>,
    #[serde(default)]
    pub jobs: Option<JobsSection>,
}

#[derive(Debug, Deserialize)]
pub struct AppSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SqlDbSection {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub connstring: Option<String>,
    #[serde(default)]
    pub max_conn: Option<u32>,
    #[serde(default)]
    pub max_idle: Option<u32>,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RedisSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SqlQueriesSection {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobsSection {
    #[serde(default)]
    pub mailer_workers: Option<usize>,
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub submit_timeout_secs: Option<u64>,
    #[serde(default)]
    pub result_timeout_secs: Option<u64>,
    #[serde(default)]
    pub mailer_delay_ms: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try each enabled format in turn.
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub sqldb: SqlDbConfig,
    pub redis: RedisConfig,
    pub sqlqueries: SqlQueriesConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Relational store settings. The store is only wired up when `connstring` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlDbConfig {
    /// Expected backend (`sqlite3`, `postgresql` or `mysql`); checked against the compiled one.
    pub driver: Option<String>,
    pub connstring: Option<String>,
    pub max_conn: u32,
    pub max_idle: u32,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQueriesConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobsConfig {
    pub mailer_workers: usize,
    pub capacity: usize,
    pub submit_timeout_secs: Option<u64>,
    pub result_timeout_secs: Option<u64>,
    pub mailer_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "restkit".to_string(),
                host: "127.0.0.1".to_string(),
                port: 8000,
                shutdown_timeout_secs: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            sqldb: SqlDbConfig {
                driver: None,
                connstring: None,
                max_conn: 10,
                max_idle: 2,
                idle_timeout_secs: Some(600),
            },
            redis: RedisConfig {
                url: None,
                password: None,
            },
            sqlqueries: SqlQueriesConfig { path: None },
            jobs: JobsConfig {
                mailer_workers: 2,
                capacity: 1,
                submit_timeout_secs: None,
                result_timeout_secs: None,
                mailer_delay_ms: 5000,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(()),
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
    ($target:expr, $source:expr, wrap) => {
        if let Some(v) = $source {
            $target = Some(v);
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        apply_raw(&mut cfg, raw);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Fold the sections present in a parsed file over `cfg`.
pub fn apply_raw(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(app) = raw.app {
        apply_opt!(cfg.app.name, app.name);
        apply_opt!(cfg.app.host, app.host);
        apply_opt!(cfg.app.port, app.port);
        apply_opt!(cfg.app.shutdown_timeout_secs, app.shutdown_timeout_secs);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(db) = raw.sqldb {
        apply_opt!(cfg.sqldb.driver, db.driver, wrap);
        apply_opt!(cfg.sqldb.connstring, db.connstring, wrap);
        apply_opt!(cfg.sqldb.max_conn, db.max_conn);
        apply_opt!(cfg.sqldb.max_idle, db.max_idle);
        apply_opt!(cfg.sqldb.idle_timeout_secs, db.idle_timeout_secs, wrap);
    }
    if let Some(redis) = raw.redis {
        apply_opt!(cfg.redis.url, redis.url, wrap);
        apply_opt!(cfg.redis.password, redis.password, wrap);
    }
    if let Some(q) = raw.sqlqueries {
        apply_opt!(cfg.sqlqueries.path, q.path, wrap);
    }
    if let Some(jobs) = raw.jobs {
        apply_opt!(cfg.jobs.mailer_workers, jobs.mailer_workers);
        apply_opt!(cfg.jobs.capacity, jobs.capacity);
        apply_opt!(cfg.jobs.submit_timeout_secs, jobs.submit_timeout_secs, wrap);
        apply_opt!(cfg.jobs.result_timeout_secs, jobs.result_timeout_secs, wrap);
        apply_opt!(cfg.jobs.mailer_delay_ms, jobs.mailer_delay_ms);
    }
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(suffix: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let key = env_key(suffix);
    match env::var(&key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_bool(suffix: &str) -> Result<Option<bool>, ConfigError> {
    let key = env_key(suffix);
    match env::var(&key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_str(suffix: &str) -> Option<String> {
    env::var(env_key(suffix)).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // App
    if let Some(v) = env_str("APP_NAME") {
        cfg.app.name = v;
    }
    if let Some(v) = env_str("APP_HOST") {
        cfg.app.host = v;
    }
    if let Some(v) = env_parse::<u16>("APP_PORT")? {
        cfg.app.port = v;
    }
    if let Some(v) = env_parse::<u64>("APP_SHUTDOWN_TIMEOUT_SECS")? {
        cfg.app.shutdown_timeout_secs = v;
    }

    // Logging
    if let Some(v) = env_str("LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Relational store
    if let Some(v) = env_str("SQLDB_DRIVER") {
        cfg.sqldb.driver = Some(v);
    }
    if let Some(v) = env_str("SQLDB_CONNSTRING") {
        cfg.sqldb.connstring = Some(v);
    }
    if let Some(v) = env_parse::<u32>("SQLDB_MAX_CONN")? {
        cfg.sqldb.max_conn = v;
    }
    if let Some(v) = env_parse::<u32>("SQLDB_MAX_IDLE")? {
        cfg.sqldb.max_idle = v;
    }
    if let Some(v) = env_parse::<u64>("SQLDB_IDLE_TIMEOUT_SECS")? {
        cfg.sqldb.idle_timeout_secs = Some(v);
    }

    // Cache
    if let Some(v) = env_str("REDIS_URL") {
        cfg.redis.url = Some(v);
    }
    if let Some(v) = env_str("REDIS_PASSWORD") {
        cfg.redis.password = Some(v);
    }

    // Queries
    if let Some(v) = env_str("SQLQUERIES_PATH") {
        cfg.sqlqueries.path = Some(v);
    }

    // Jobs
    if let Some(v) = env_parse::<usize>("JOBS_MAILER_WORKERS")? {
        cfg.jobs.mailer_workers = v;
    }
    if let Some(v) = env_parse::<usize>("JOBS_CAPACITY")? {
        cfg.jobs.capacity = v;
    }
    if let Some(v) = env_parse::<u64>("JOBS_SUBMIT_TIMEOUT_SECS")? {
        cfg.jobs.submit_timeout_secs = Some(v);
    }
    if let Some(v) = env_parse::<u64>("JOBS_RESULT_TIMEOUT_SECS")? {
        cfg.jobs.result_timeout_secs = Some(v);
    }
    if let Some(v) = env_parse::<u64>("JOBS_MAILER_DELAY_MS")? {
        cfg.jobs.mailer_delay_ms = v;
    }

    Ok(())
}

/// Accepted `sqldb.driver` names.
pub const SQL_DRIVERS: &[&str] = &["sqlite", "sqlite3", "postgres", "postgresql", "mysql"];

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.port == 0 {
        return Err(ConfigError::Validation("app.port must be > 0".into()));
    }
    let host_ok = cfg.app.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.app.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid app.host: {}",
            cfg.app.host
        )));
    }

    if cfg.sqldb.max_conn == 0 {
        return Err(ConfigError::Validation(
            "sqldb.max_conn must be > 0".into(),
        ));
    }
    if cfg.sqldb.max_idle > cfg.sqldb.max_conn {
        return Err(ConfigError::Validation(
            "sqldb.max_idle must not exceed sqldb.max_conn".into(),
        ));
    }
    if let Some(driver) = cfg.sqldb.driver.as_deref() {
        if !SQL_DRIVERS.contains(&driver.trim().to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "sqldb.driver must be one of {}: {}",
                SQL_DRIVERS.join(", "),
                driver
            )));
        }
    }
    if let Some(conn) = cfg.sqldb.connstring.as_deref() {
        if conn.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sqldb.connstring cannot be empty".into(),
            ));
        }
    }

    if let Some(raw) = cfg.redis.url.as_deref() {
        match url::Url::parse(raw) {
            Ok(u) => {
                if !matches!(u.scheme(), "redis" | "rediss" | "unix") {
                    return Err(ConfigError::Validation(format!(
                        "redis.url must use redis, rediss or unix: {}",
                        raw
                    )));
                }
            }
            Err(_) => {
                return Err(ConfigError::Validation(format!(
                    "invalid redis.url: {}",
                    raw
                )))
            }
        }
    }

    if cfg.jobs.mailer_workers == 0 {
        return Err(ConfigError::Validation(
            "jobs.mailer_workers must be >= 1".into(),
        ));
    }
    if cfg.jobs.capacity == 0 {
        return Err(ConfigError::Validation("jobs.capacity must be >= 1".into()));
    }
    Ok(())
}
