//! Configuration management

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default identity provider host
pub const DEFAULT_ID_HOST: &str = "https://id.twitch.tv";

/// Path appended to the configured redirect base to form the callback URI
pub const DEFAULT_CALLBACK_PATH: &str = "/credentials/twitch";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before the environment is read.
    /// Paths support ~ expansion. Loaded in order; variables already present
    /// in the process environment are not overwritten.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Identity provider configuration
    pub provider: ProviderConfig,
    /// Refresh-token denylist
    pub denylist: DenylistConfig,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Sources, later ones winning:
    /// 1. YAML file at `path` (if given)
    /// 2. `OAUTH_RELAY_*` variables, nested with `__`
    ///    (e.g. `OAUTH_RELAY_PROVIDER__ID_HOST`)
    /// 3. `CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`
    /// 4. `TWITCH_CLIENTID`, `TWITCH_CLIENTSECRET`, `REDIRECTURI`
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    /// Missing credentials are *not* an error here; see
    /// [`ProviderConfig::credentials`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Env files feed the environment providers, so load them first
        let env_files: Vec<String> = Self::figment(path)?
            .extract_inner("env_files")
            .unwrap_or_default();
        load_env_files(&env_files);

        Self::figment(path)?
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        Ok(figment
            .merge(Env::prefixed("OAUTH_RELAY_").split("__"))
            .merge(credential_env(&[
                ("CLIENT_ID", "provider.client_id"),
                ("CLIENT_SECRET", "provider.client_secret"),
                ("REDIRECT_URI", "provider.redirect_uri"),
            ]))
            .merge(credential_env(&[
                ("TWITCH_CLIENTID", "provider.client_id"),
                ("TWITCH_CLIENTSECRET", "provider.client_secret"),
                ("REDIRECTURI", "provider.redirect_uri"),
            ])))
    }
}

/// Env provider that picks the given variables and renames them to config keys
fn credential_env(mapping: &'static [(&'static str, &'static str)]) -> Env {
    let names: Vec<&str> = mapping.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(move |key| {
        let upper = key.as_str().to_ascii_uppercase();
        mapping
            .iter()
            .find(|(name, _)| *name == upper)
            .map_or_else(|| key.as_str().to_owned(), |(_, target)| (*target).to_owned())
            .into()
    })
}

/// Load environment files into the process environment.
/// Supports ~ expansion. Files that don't exist are silently skipped.
fn load_env_files(paths: &[String]) {
    for path_str in paths {
        let expanded = match (path_str.strip_prefix('~'), dirs::home_dir()) {
            (Some(rest), Some(home)) => format!("{}{rest}", home.display()),
            _ => path_str.clone(),
        };

        let path = Path::new(&expanded);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
            }
        } else {
            tracing::debug!("Env file not found (skipped): {expanded}");
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Identity provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Public base URL of this relay; the callback path is appended to it
    pub redirect_uri: Option<String>,
    /// Provider host serving `/oauth2/authorize` and `/oauth2/token`
    pub id_host: String,
    /// Path appended to `redirect_uri`
    pub callback_path: String,
    /// Total timeout for a token endpoint call
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout for a token endpoint call
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            id_host: DEFAULT_ID_HOST.to_string(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// Hand-written so the secret never reaches a log line via `{:?}`
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("id_host", &self.id_host)
            .field("callback_path", &self.callback_path)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Names of the credential fields that are unset or blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Validate and return the provider credentials
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the missing fields (never their values).
    pub fn credentials(&self) -> Result<ProviderCredentials> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing provider credentials: {}",
                missing.join(", ")
            )));
        }

        let value = |field: &Option<String>| field.as_deref().unwrap_or_default().trim().to_string();
        Ok(ProviderCredentials {
            client_id: value(&self.client_id),
            client_secret: value(&self.client_secret),
            redirect_uri: value(&self.redirect_uri),
        })
    }
}

/// Validated client credentials for the identity provider
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Public base URL of this relay
    pub redirect_uri: String,
}

impl ProviderCredentials {
    /// Full callback URI registered with the provider: base URL + callback path
    #[must_use]
    pub fn callback_uri(&self, callback_path: &str) -> String {
        format!("{}{callback_path}", self.redirect_uri.trim_end_matches('/'))
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Refresh-token denylist configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DenylistConfig {
    /// Inline denylisted refresh tokens
    pub tokens: Vec<String>,
    /// File with one token per line; blank lines and `#` comments ignored
    pub file: Option<PathBuf>,
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s", "250ms")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Parse "30s", "5m", "100ms" or a bare number of seconds
    pub(crate) fn parse(s: &str) -> Result<Duration, std::num::ParseIntError> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim().parse::<u64>().map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim().parse::<u64>().map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim().parse::<u64>().map(|m| Duration::from_secs(m * 60))
        } else {
            s.parse::<u64>().map(Duration::from_secs)
        }
    }
}
