//! Tap configuration
//!
//! Settings come from an optional JSON or YAML file and are then overridden
//! by `TAP_GAPI_<FIELD>` environment variables, e.g. `TAP_GAPI_CLIENT_ID`.
//! Everything is checked by [`TapConfig::validate`] before any request goes
//! out.

use crate::client::{Credentials, RetryPolicy};
use crate::error::ExtractError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Prefix of the environment variables read by [`TapConfig::apply_env`]
pub const ENV_PREFIX: &str = "TAP_GAPI_";

const REQUIRED: [&str; 6] = [
    "client_id",
    "client_secret",
    "grant_type",
    "scope",
    "url_base",
    "access_token_url",
];

#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TapConfig {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    /// Selects the streams to run as well as the token scope
    pub scope: String,
    pub url_base: String,
    pub access_token_url: String,
    pub user_agent: Option<String>,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Abort the whole run on the first stream failure
    pub all_or_nothing: bool,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            grant_type: String::new(),
            scope: String::new(),
            url_base: String::new(),
            access_token_url: String::new(),
            user_agent: None,
            request_timeout_secs: 300,
            max_attempts: 5,
            backoff_base_ms: 1000,
            backoff_max_ms: 60_000,
            all_or_nothing: false,
        }
    }
}

impl TapConfig {
    /// Read a `.json`, `.yaml` or `.yml` config file. Missing keys take
    /// their defaults; required ones are caught by [`validate`](Self::validate).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed: Result<Self, String> = match extension.as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| e.to_string())
            }
            _ => serde_json::from_str(&content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| ExtractError::Config(format!("invalid config file {}: {e}", path.display())))
    }

    /// Load from an optional file, then apply the process environment, then
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractError> {
        let mut config = match path {
            Some(path) => {
                log::debug!("Reading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `TAP_GAPI_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ExtractError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, which is given the full variable name.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ExtractError> {
        let var = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));

        for (field, slot) in [
            ("client_id", &mut self.client_id),
            ("client_secret", &mut self.client_secret),
            ("grant_type", &mut self.grant_type),
            ("scope", &mut self.scope),
            ("url_base", &mut self.url_base),
            ("access_token_url", &mut self.access_token_url),
        ] {
            if let Some(value) = var(field) {
                *slot = value;
            }
        }
        if let Some(value) = var("user_agent") {
            self.user_agent = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = var("request_timeout_secs") {
            self.request_timeout_secs = parse_number("request_timeout_secs", &value)?;
        }
        if let Some(value) = var("max_attempts") {
            self.max_attempts = parse_number("max_attempts", &value)?;
        }
        if let Some(value) = var("backoff_base_ms") {
            self.backoff_base_ms = parse_number("backoff_base_ms", &value)?;
        }
        if let Some(value) = var("backoff_max_ms") {
            self.backoff_max_ms = parse_number("backoff_max_ms", &value)?;
        }
        if let Some(value) = var("all_or_nothing") {
            self.all_or_nothing = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ExtractError::Config(format!(
                        "all_or_nothing: expected a boolean, got '{other}'"
                    )));
                }
            };
        }
        Ok(())
    }

    /// Check required fields and URLs.
    ///
    /// # Errors
    /// [`ExtractError::Config`] listing every missing required field at
    /// once, or naming the first URL that doesn't parse.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let missing: Vec<&str> = REQUIRED
            .iter()
            .zip([
                &self.client_id,
                &self.client_secret,
                &self.grant_type,
                &self.scope,
                &self.url_base,
                &self.access_token_url,
            ])
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ExtractError::Config(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            )));
        }

        self.base_url()?;
        self.token_url()?;
        if self.request_timeout_secs == 0 {
            return Err(ExtractError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ExtractError> {
        parse_url("url_base", &self.url_base)
    }

    pub fn token_url(&self) -> Result<Url, ExtractError> {
        parse_url("access_token_url", &self.access_token_url)
    }

    pub fn credentials(&self) -> Result<Credentials, ExtractError> {
        Ok(Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            grant_type: self.grant_type.clone(),
            scope: self.scope.clone(),
            token_endpoint: self.token_url()?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms.max(self.backoff_base_ms)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .field("url_base", &self.url_base)
            .field("access_token_url", &self.access_token_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("backoff_max_ms", &self.backoff_max_ms)
            .field("all_or_nothing", &self.all_or_nothing)
            .finish()
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ExtractError> {
    Url::parse(value.trim()).map_err(|e| ExtractError::Config(format!("{field}: invalid URL '{value}': {e}")))
}

fn parse_number<N: std::str::FromStr>(field: &str, value: &str) -> Result<N, ExtractError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExtractError::Config(format!("{field}: expected a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn complete() -> TapConfig {
        TapConfig {
            client_id: "id".into(),
            client_secret: "shh".into(),
            grant_type: "client_credentials".into(),
            scope: "business/taxonomy".into(),
            url_base: "https://api.example.com/v1".into(),
            access_token_url: "https://auth.example.com/oauth2/token".into(),
            ..TapConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = TapConfig::default();
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.max_attempts, 5);
        assert!(!config.all_or_nothing);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_validate_lists_all_missing() {
        let config = TapConfig {
            client_secret: "x".into(),
            ..TapConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("client_id"));
        assert!(err.contains("grant_type"));
        assert!(err.contains("access_token_url"));
        assert!(!err.contains("client_secret"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = TapConfig {
            url_base: "not a url".into(),
            ..complete()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("url_base"));
    }

    #[test]
    fn test_complete_config_valid() {
        let config = complete();
        config.validate().unwrap();
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.token_endpoint.as_str(), "https://auth.example.com/oauth2/token");
        assert_eq!(credentials.scope, "business/taxonomy");
    }

    #[test]
    fn test_vars_override() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("TAP_GAPI_CLIENT_ID", "from-env"),
            ("TAP_GAPI_MAX_ATTEMPTS", "3"),
            ("TAP_GAPI_ALL_OR_NOTHING", "true"),
        ]);
        let mut config = complete();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.client_id, "from-env");
        assert_eq!(config.client_secret, "shh");
        assert_eq!(config.max_attempts, 3);
        assert!(config.all_or_nothing);
    }

    #[test]
    fn test_bad_number_rejected() {
        let mut config = complete();
        let err = config
            .apply_vars(|key| (key == "TAP_GAPI_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"client_id": "id", "scope": "finance/chart-of-account", "max_attempts": 2}}"#
        )
        .unwrap();

        let config = TapConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "client_id: id\nall_or_nothing: true\nuser_agent: tap/1.0").unwrap();

        let config = TapConfig::from_file(file.path()).unwrap();
        assert!(config.all_or_nothing);
        assert_eq!(config.user_agent.as_deref(), Some("tap/1.0"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            TapConfig::from_file(file.path()),
            Err(ExtractError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", complete());
        assert!(!debug.contains("shh"));
        assert!(debug.contains("<redacted>"));
    }
}
