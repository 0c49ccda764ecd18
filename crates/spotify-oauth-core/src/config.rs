use std::{env, time::Duration};

use url::Url;

use crate::{
    authorize::scope_param,
    constants::{
        DEFAULT_AUTHORIZATION_URL, DEFAULT_SCOPE_SEPARATOR, DEFAULT_TOKEN_URL,
        DEFAULT_USER_PROFILE_URL,
    },
    error::StrategyError,
    types::{ClientAuthMethod, Credentials},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ConfigError> for StrategyError {
    fn from(value: ConfigError) -> Self {
        StrategyError::Configuration(value.to_string())
    }
}

/// Settings for a Spotify strategy instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    pub credentials: Credentials,
    pub authorization_url: String,
    pub token_url: String,
    pub user_profile_url: String,
    pub callback_url: Option<String>,
    pub scope: Vec<String>,
    pub scope_separator: String,
    pub show_dialog: bool,
    pub client_auth: ClientAuthMethod,
}

impl StrategyConfig {
    /// Config pointing at the public Spotify endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(client_id, client_secret),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_owned(),
            token_url: DEFAULT_TOKEN_URL.to_owned(),
            user_profile_url: DEFAULT_USER_PROFILE_URL.to_owned(),
            callback_url: None,
            scope: Vec::new(),
            scope_separator: DEFAULT_SCOPE_SEPARATOR.to_owned(),
            show_dialog: false,
            client_auth: ClientAuthMethod::default(),
        }
    }

    /// Reads `SPOTIFY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = required_env("SPOTIFY_CLIENT_ID")?;
        let client_secret = required_env("SPOTIFY_CLIENT_SECRET")?;
        let mut config = Self::new(client_id, client_secret);

        if let Some(url) = optional_env("SPOTIFY_AUTHORIZATION_URL") {
            config.authorization_url = url;
        }
        if let Some(url) = optional_env("SPOTIFY_TOKEN_URL") {
            config.token_url = url;
        }
        if let Some(url) = optional_env("SPOTIFY_USER_PROFILE_URL") {
            config.user_profile_url = url;
        }
        config.callback_url = optional_env("SPOTIFY_CALLBACK_URL");
        if let Some(scopes) = optional_env("SPOTIFY_SCOPES") {
            config.scope = parse_scopes(&scopes);
        }
        if let Some(flag) = optional_env("SPOTIFY_SHOW_DIALOG") {
            config.show_dialog = parse_bool(&flag).ok_or_else(|| {
                ConfigError::InvalidConfig(format!("SPOTIFY_SHOW_DIALOG must be a boolean: {flag}"))
            })?;
        }
        if let Some(mode) = optional_env("SPOTIFY_CLIENT_AUTH") {
            config.client_auth = parse_client_auth(&mode)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_user_profile_url(mut self, url: impl Into<String>) -> Self {
        self.user_profile_url = url.into();
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_show_dialog(mut self, show_dialog: bool) -> Self {
        self.show_dialog = show_dialog;
        self
    }

    pub fn with_client_auth(mut self, method: ClientAuthMethod) -> Self {
        self.client_auth = method;
        self
    }

    /// Joined `scope` parameter, `None` when no scopes are configured.
    pub fn scope_param(&self) -> Option<String> {
        scope_param(&self.scope, &self.scope_separator)
    }

    /// Rejects empty credentials and endpoint URLs that do not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.client_id().is_empty() || self.credentials.client_secret().is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "missing Spotify client credentials".to_owned(),
            ));
        }
        for (name, value) in [
            ("authorization_url", self.authorization_url.as_str()),
            ("token_url", self.token_url.as_str()),
            ("user_profile_url", self.user_profile_url.as_str()),
        ] {
            Url::parse(value)
                .map_err(|err| ConfigError::InvalidConfig(format!("invalid {name}: {err}")))?;
        }
        if let Some(callback) = &self.callback_url {
            Url::parse(callback)
                .map_err(|err| ConfigError::InvalidConfig(format!("invalid callback_url: {err}")))?;
        }
        Ok(())
    }
}

/// Transport settings for the HTTP client used against Spotify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: None,
            user_agent: None,
        }
    }
}

impl HttpOptions {
    /// Reads `SPOTIFY_HTTP_TIMEOUT_MS` and `SPOTIFY_HTTP_CONNECT_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(ms) = optional_env("SPOTIFY_HTTP_TIMEOUT_MS") {
            options.timeout = Duration::from_millis(parse_millis("SPOTIFY_HTTP_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = optional_env("SPOTIFY_HTTP_CONNECT_TIMEOUT_MS") {
            options.connect_timeout = Some(Duration::from_millis(parse_millis(
                "SPOTIFY_HTTP_CONNECT_TIMEOUT_MS",
                &ms,
            )?));
        }
        Ok(options)
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    optional_env(key).ok_or(ConfigError::MissingEnv(key))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Splits a scope list on whitespace or commas.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_client_auth(raw: &str) -> Result<ClientAuthMethod, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "body" | "request_body" | "client_secret_post" => Ok(ClientAuthMethod::RequestBody),
        "basic" | "client_secret_basic" => Ok(ClientAuthMethod::Basic),
        other => Err(ConfigError::InvalidConfig(format!(
            "unknown client auth method `{other}`"
        ))),
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse()
        .map_err(|err| ConfigError::InvalidConfig(format!("{key} must be milliseconds: {err}")))
}
