use std::{collections::BTreeMap, fmt};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::PROVIDER_NAME;

/// OAuth client credentials issued by the Spotify developer dashboard.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// `Authorization` header value for HTTP Basic client authentication.
    pub fn basic_authorization(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// How the client authenticates itself to the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// `client_id` and `client_secret` travel as form fields.
    #[default]
    RequestBody,
    /// `Authorization: Basic base64(client_id:client_secret)`.
    Basic,
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientAuthMethod::RequestBody => "body",
            ClientAuthMethod::Basic => "basic",
        }
    }
}

/// Grant requested from the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
        }
    }

    /// Form field the code value is submitted under.
    pub fn code_param(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "code",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

/// A single token endpoint call, built per exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub code: String,
    pub extra_params: BTreeMap<String, String>,
}

impl TokenRequest {
    /// Derives the grant type from a `grant_type` entry in `extra_params`.
    pub fn new(code: impl Into<String>, extra_params: BTreeMap<String, String>) -> Self {
        let grant_type = match extra_params.get("grant_type").map(String::as_str) {
            Some("refresh_token") => GrantType::RefreshToken,
            _ => GrantType::AuthorizationCode,
        };
        Self {
            grant_type,
            code: code.into(),
            extra_params,
        }
    }
}

/// Tokens returned by a successful exchange.
///
/// `extra_parameters` holds the full decoded response object minus
/// `refresh_token`, which is moved into its own field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub extra_parameters: Map<String, Value>,
}

impl TokenResult {
    /// `expires_in` as reported by the endpoint, if numeric.
    pub fn expires_in(&self) -> Option<u64> {
        self.extra_parameters.get("expires_in").and_then(Value::as_u64)
    }

    /// Space separated `scope` granted by the endpoint.
    pub fn scopes(&self) -> Vec<String> {
        self.extra_parameters
            .get("scope")
            .and_then(Value::as_str)
            .map(|scope| scope.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

/// Email address attached to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Provider-agnostic user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub provider: String,
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<Email>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Response body exactly as received.
    #[serde(rename = "_raw")]
    pub raw: String,
    /// Decoded form of `raw`.
    #[serde(rename = "_json")]
    pub json: Map<String, Value>,
}

impl Profile {
    pub(crate) fn new(id: String, raw: String, json: Map<String, Value>) -> Self {
        Self {
            provider: PROVIDER_NAME.to_owned(),
            username: id.clone(),
            id,
            display_name: None,
            profile_url: None,
            photos: None,
            emails: None,
            country: None,
            followers: None,
            product: None,
            raw,
            json,
        }
    }

    /// First email address, if the provider shared one.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .as_deref()
            .and_then(|emails| emails.first())
            .map(|email| email.value.as_str())
    }
}

/// Per-request authorization options supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeOptions {
    /// Force the consent dialog even when the user already approved the app.
    #[serde(default)]
    pub show_dialog: Option<bool>,
}
