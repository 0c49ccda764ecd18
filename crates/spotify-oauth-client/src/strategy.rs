use std::{collections::BTreeMap, future::Future, sync::Arc};

use async_trait::async_trait;
use spotify_oauth_core::{
    AuthorizeOptions, BoxError, HttpOptions, Profile, StrategyConfig, StrategyError,
    StrategyResult, TokenResult, authorization_params, constants::PROVIDER_NAME,
};
use tracing::{debug, instrument};

use crate::{
    client::{OAuth2Client, ReqwestOAuth2Client},
    profile::ProfileFetcher,
    token::TokenExchanger,
};

/// Host callback resolving tokens and a profile into an application user.
///
/// `Ok(None)` rejects the login without it being an error.
#[async_trait]
pub trait Verify: Send + Sync {
    type User: Send;

    async fn verify(
        &self,
        tokens: TokenResult,
        profile: Profile,
    ) -> Result<Option<Self::User>, BoxError>;
}

#[async_trait]
impl<F, Fut, U> Verify for F
where
    F: Fn(TokenResult, Profile) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<U>, BoxError>> + Send + 'static,
    U: Send + 'static,
{
    type User = U;

    async fn verify(&self, tokens: TokenResult, profile: Profile) -> Result<Option<U>, BoxError> {
        (self)(tokens, profile).await
    }
}

/// Spotify authentication strategy.
///
/// Composes a [`TokenExchanger`] and a [`ProfileFetcher`] over one shared
/// [`OAuth2Client`]. The strategy holds no mutable state, so a single
/// instance can serve concurrent logins.
pub struct Strategy<V> {
    config: StrategyConfig,
    exchanger: TokenExchanger,
    fetcher: ProfileFetcher,
    verify: V,
}

impl<V> Strategy<V> {
    /// Builds a strategy on the default `reqwest` transport.
    pub fn new(config: StrategyConfig, verify: V) -> StrategyResult<Self> {
        Self::with_options(config, &HttpOptions::default(), verify)
    }

    pub fn with_options(
        config: StrategyConfig,
        options: &HttpOptions,
        verify: V,
    ) -> StrategyResult<Self> {
        let client = ReqwestOAuth2Client::new(options)
            .map_err(|err| StrategyError::configuration(format!("http client: {err}")))?;
        Self::with_client(config, Arc::new(client), verify)
    }

    /// Builds a strategy on a caller-supplied transport.
    pub fn with_client(
        config: StrategyConfig,
        client: Arc<dyn OAuth2Client>,
        verify: V,
    ) -> StrategyResult<Self> {
        config.validate()?;
        let exchanger = TokenExchanger::from_config(Arc::clone(&client), &config);
        let fetcher = ProfileFetcher::from_config(client, &config);
        Ok(Self {
            config,
            exchanger,
            fetcher,
            verify,
        })
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }

    pub fn fetcher(&self) -> &ProfileFetcher {
        &self.fetcher
    }

    /// Joined `scope` parameter for the authorization request.
    pub fn scope(&self) -> Option<String> {
        self.config.scope_param()
    }

    /// Extra authorization parameters; unset options fall back to config.
    pub fn authorization_params(&self, options: &AuthorizeOptions) -> BTreeMap<String, String> {
        let effective = AuthorizeOptions {
            show_dialog: options
                .show_dialog
                .or(self.config.show_dialog.then_some(true)),
        };
        authorization_params(&effective)
    }

    pub async fn exchange(
        &self,
        code: &str,
        extra_params: &BTreeMap<String, String>,
    ) -> StrategyResult<TokenResult> {
        self.exchanger.exchange(code, extra_params).await
    }

    pub async fn fetch(&self, access_token: &str) -> StrategyResult<Profile> {
        self.fetcher.fetch(access_token).await
    }
}

impl<V: Verify> Strategy<V> {
    /// Exchanges `code`, loads the profile and hands both to the verify
    /// callback. Stops at the first failure.
    #[instrument(skip_all, fields(provider = PROVIDER_NAME))]
    pub async fn authenticate(
        &self,
        code: &str,
        extra_params: &BTreeMap<String, String>,
    ) -> StrategyResult<Option<V::User>> {
        let tokens = self.exchange(code, extra_params).await?;
        let profile = self.fetch(&tokens.access_token).await?;
        let user = self
            .verify
            .verify(tokens, profile)
            .await
            .map_err(StrategyError::Verify)?;
        if user.is_none() {
            debug!(target: "oauth.spotify", "verify callback rejected the user");
        }
        Ok(user)
    }
}
