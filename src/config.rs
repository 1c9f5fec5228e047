//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment (`GSYNC_`) < CLI
use crate::sync::{SyncOptions, UploadErrorPolicy};
use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "GSYNC_";
pub const DEFAULT_CALLBACK_PORT: u16 = 8001;
pub const DEFAULT_SCOPE: &str = "activity:write,activity:read";

/// Keys whose environment values are kept verbatim rather than parsed, so a
/// password such as `0123` keeps its leading zero.
const TEXT_KEYS: &[&str] = &[
    "garmin.username",
    "garmin.password",
    "strava.access_token",
    "strava.client_id",
    "strava.client_secret",
];

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "garmin-strava-sync")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("garmin-strava-sync.toml"))
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GarminSettings {
    #[serde(deserialize_with = "string_or_number")]
    pub username: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub password: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StravaSettings {
    /// Skips the browser authorization when present.
    #[serde(deserialize_with = "string_or_number")]
    pub access_token: Option<String>,
    /// Strava shows this as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub client_secret: Option<String>,
    pub callback_port: u16,
    pub scope: String,
    /// Unset means wait for the browser step indefinitely.
    pub authorize_timeout_secs: Option<u64>,
}

impl Default for StravaSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            client_id: None,
            client_secret: None,
            callback_port: DEFAULT_CALLBACK_PORT,
            scope: DEFAULT_SCOPE.to_string(),
            authorize_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub private: bool,
    pub on_upload_error: UploadErrorPolicy,
}

/// Fully resolved application configuration after all layers merge.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http_timeout_secs: u64,
    pub garmin: GarminSettings,
    pub strava: StravaSettings,
    pub sync: SyncSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 10,
            garmin: GarminSettings::default(),
            strava: StravaSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() { "<redacted>" } else { "<unset>" }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("garmin.username", &self.garmin.username)
            .field("garmin.password", &redacted(&self.garmin.password))
            .field("strava.access_token", &redacted(&self.strava.access_token))
            .field("strava.client_id", &self.strava.client_id)
            .field("strava.client_secret", &redacted(&self.strava.client_secret))
            .field("strava.callback_port", &self.strava.callback_port)
            .field("strava.scope", &self.strava.scope)
            .field(
                "strava.authorize_timeout_secs",
                &self.strava.authorize_timeout_secs,
            )
            .field("sync", &self.sync)
            .finish()
    }
}

/// How the destination will be authorized for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StravaAccess<'a> {
    Token(&'a str),
    Authorize {
        client_id: &'a str,
        client_secret: &'a str,
    },
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn authorize_timeout(&self) -> Option<Duration> {
        self.strava.authorize_timeout_secs.map(Duration::from_secs)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            private: self.sync.private,
            on_upload_error: self.sync.on_upload_error,
        }
    }

    /// A cached access token wins over the client id/secret pair.
    pub fn strava_access(&self) -> Result<StravaAccess<'_>> {
        if let Some(token) = non_empty(&self.strava.access_token) {
            return Ok(StravaAccess::Token(token));
        }
        match (
            non_empty(&self.strava.client_id),
            non_empty(&self.strava.client_secret),
        ) {
            (Some(client_id), Some(client_secret)) => Ok(StravaAccess::Authorize {
                client_id,
                client_secret,
            }),
            _ => anyhow::bail!(
                "Invalid config: set strava.access_token, or strava.client_id and strava.client_secret"
            ),
        }
    }

    /// Garmin username and password, which may still be missing before CLI overrides.
    pub fn garmin_credentials(&self) -> Result<(&str, &str)> {
        let username = non_empty(&self.garmin.username);
        let password = non_empty(&self.garmin.password);
        match (username, password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => anyhow::bail!(
                "Garmin Connect username and password are required when not set in config"
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.http_timeout_secs > 0,
            "Invalid config: http_timeout_secs must be > 0"
        );
        ensure!(
            self.strava.authorize_timeout_secs != Some(0),
            "Invalid config: strava.authorize_timeout_secs must be > 0 when set"
        );
        ensure!(
            !self.strava.scope.trim().is_empty(),
            "Invalid config: strava.scope must not be empty"
        );
        Ok(())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Values supplied on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub private: Option<bool>,
    pub on_upload_error: Option<UploadErrorPolicy>,
    pub authorize_timeout_secs: Option<u64>,
}

/// Loads config from defaults, the TOML file at `path` (or the default
/// location) and `GSYNC_` environment variables. A missing file is fine.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    let env = Env::prefixed(ENV_PREFIX).split("__");
    let mut figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(env.clone());
    for (key, value) in env.iter() {
        if TEXT_KEYS.contains(&key.as_str()) {
            figment = figment.merge(Serialized::default(key.as_str(), value));
        }
    }

    let config: AppConfig = figment
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Applies command-line overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> AppConfig {
    if let Some(username) = &overrides.username {
        config.garmin.username = Some(username.clone());
    }
    if let Some(password) = &overrides.password {
        config.garmin.password = Some(password.clone());
    }
    if let Some(private) = overrides.private {
        config.sync.private = private;
    }
    if let Some(policy) = overrides.on_upload_error {
        config.sync.on_upload_error = policy;
    }
    if let Some(secs) = overrides.authorize_timeout_secs {
        config.strava.authorize_timeout_secs = Some(secs);
    }
    config
}
