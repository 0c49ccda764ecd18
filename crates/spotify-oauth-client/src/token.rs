use std::{collections::BTreeMap, sync::Arc};

use spotify_oauth_core::{
    ClientAuthMethod, Credentials, StrategyConfig, StrategyError, StrategyResult, TokenRequest,
    TokenResult, TransportError, parse_oauth_error, parse_token_response,
};
use tracing::{debug, instrument, warn};

use crate::client::{FormRequest, OAuth2Client};

/// Form fields the exchanger owns; callers cannot override them.
const RESERVED_FIELDS: [&str; 4] = ["client_id", "client_secret", "code", "refresh_token"];

/// Exchanges authorization codes (or refresh tokens) at the token endpoint.
#[derive(Clone)]
pub struct TokenExchanger {
    client: Arc<dyn OAuth2Client>,
    credentials: Credentials,
    token_url: String,
    auth_method: ClientAuthMethod,
}

impl TokenExchanger {
    pub fn new(
        client: Arc<dyn OAuth2Client>,
        credentials: Credentials,
        token_url: impl Into<String>,
        auth_method: ClientAuthMethod,
    ) -> Self {
        Self {
            client,
            credentials,
            token_url: token_url.into(),
            auth_method,
        }
    }

    pub fn from_config(client: Arc<dyn OAuth2Client>, config: &StrategyConfig) -> Self {
        Self::new(
            client,
            config.credentials.clone(),
            config.token_url.clone(),
            config.client_auth,
        )
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn auth_method(&self) -> ClientAuthMethod {
        self.auth_method
    }

    /// Builds the form request for `request`, authenticated per the
    /// configured [`ClientAuthMethod`].
    pub fn build_request(&self, request: &TokenRequest) -> FormRequest {
        let code_param = request.grant_type.code_param();
        let mut form: Vec<(String, String)> = request
            .extra_params
            .iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if !request.extra_params.contains_key("grant_type") {
            form.push((
                "grant_type".to_owned(),
                request.grant_type.as_str().to_owned(),
            ));
        }
        form.push((code_param.to_owned(), request.code.clone()));

        let authorization = match self.auth_method {
            ClientAuthMethod::RequestBody => {
                form.push((
                    "client_id".to_owned(),
                    self.credentials.client_id().to_owned(),
                ));
                form.push((
                    "client_secret".to_owned(),
                    self.credentials.client_secret().to_owned(),
                ));
                None
            }
            ClientAuthMethod::Basic => Some(self.credentials.basic_authorization()),
        };

        FormRequest {
            url: self.token_url.clone(),
            authorization,
            form,
        }
    }

    /// Exchanges `code` for tokens.
    ///
    /// A `grant_type=refresh_token` entry in `extra_params` submits `code`
    /// as a refresh token instead.
    #[instrument(
        skip_all,
        fields(
            provider = "spotify",
            auth = self.auth_method.as_str(),
            grant_type = tracing::field::Empty
        )
    )]
    pub async fn exchange(
        &self,
        code: &str,
        extra_params: &BTreeMap<String, String>,
    ) -> StrategyResult<TokenResult> {
        let request = TokenRequest::new(code, extra_params.clone());
        tracing::Span::current().record("grant_type", request.grant_type.as_str());

        let body = match self.client.exchange_code(self.build_request(&request)).await {
            Ok(body) => body,
            Err(TransportError::Status { status, body }) => {
                warn!(target: "oauth.spotify", status, "token endpoint rejected request");
                if let Some(err) = parse_oauth_error(&body, Some(status)) {
                    return Err(err.into());
                }
                return Err(TransportError::Status { status, body }.into());
            }
            Err(err) => {
                warn!(target: "oauth.spotify", error = %err, "token request failed");
                return Err(StrategyError::Transport(err));
            }
        };

        let tokens = parse_token_response(&body)?;
        debug!(
            target: "oauth.spotify",
            has_refresh_token = tokens.refresh_token.is_some(),
            extra_fields = tokens.extra_parameters.len(),
            "token exchange completed"
        );
        Ok(tokens)
    }
}
