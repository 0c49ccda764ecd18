use std::sync::Arc;

use spotify_oauth_core::{Profile, StrategyConfig, StrategyError, StrategyResult, parse_profile};
use tracing::{debug, instrument, warn};

use crate::client::OAuth2Client;

/// Loads the current user's profile with a bearer access token.
#[derive(Clone)]
pub struct ProfileFetcher {
    client: Arc<dyn OAuth2Client>,
    profile_url: String,
}

impl ProfileFetcher {
    pub fn new(client: Arc<dyn OAuth2Client>, profile_url: impl Into<String>) -> Self {
        Self {
            client,
            profile_url: profile_url.into(),
        }
    }

    pub fn from_config(client: Arc<dyn OAuth2Client>, config: &StrategyConfig) -> Self {
        Self::new(client, config.user_profile_url.clone())
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    #[instrument(skip_all, fields(provider = "spotify"))]
    pub async fn fetch(&self, access_token: &str) -> StrategyResult<Profile> {
        let body = self
            .client
            .authenticated_get(&self.profile_url, access_token)
            .await
            .map_err(|err| {
                warn!(target: "oauth.spotify", error = %err, "failed to fetch user profile");
                StrategyError::ProfileFetch(err)
            })?;

        let profile = parse_profile(&body)?;
        debug!(
            target: "oauth.spotify",
            has_email = profile.emails.is_some(),
            photos = profile.photos.as_ref().map_or(0, Vec::len),
            "profile loaded"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spotify_oauth_core::TransportError;
    use std::sync::Mutex;

    use crate::client::FormRequest;

    struct StaticClient {
        body: Result<String, u16>,
        seen_tokens: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OAuth2Client for StaticClient {
        async fn exchange_code(&self, _request: FormRequest) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Cancelled)
        }

        async fn authenticated_get(
            &self,
            _url: &str,
            access_token: &str,
        ) -> Result<Vec<u8>, TransportError> {
            self.seen_tokens
                .lock()
                .expect("tokens lock")
                .push(access_token.to_owned());
            match &self.body {
                Ok(body) => Ok(body.clone().into_bytes()),
                Err(status) => Err(TransportError::Status {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn fetcher(body: Result<String, u16>) -> (ProfileFetcher, Arc<StaticClient>) {
        let client = Arc::new(StaticClient {
            body,
            seen_tokens: Mutex::new(Vec::new()),
        });
        let fetcher = ProfileFetcher::new(client.clone(), "https://api.spotify.com/v1/me");
        (fetcher, client)
    }

    #[tokio::test]
    async fn fetch_passes_token_and_maps_profile() {
        let (fetcher, client) = fetcher(Ok(r#"{"id":"u1","email":"a@b.com"}"#.to_owned()));
        let profile = fetcher.fetch("something").await.expect("profile");
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.primary_email(), Some("a@b.com"));
        assert_eq!(profile.emails.as_ref().map(Vec::len), Some(1));
        assert_eq!(profile.emails.as_ref().and_then(|e| e[0].kind.clone()), None);
        assert_eq!(
            client.seen_tokens.lock().expect("tokens lock").as_slice(),
            ["something".to_owned()]
        );
    }

    #[tokio::test]
    async fn status_failure_is_wrapped_as_profile_fetch() {
        let (fetcher, _) = fetcher(Err(401));
        let err = fetcher.fetch("something").await.unwrap_err();
        assert!(err.is_profile_fetch());
        assert!(matches!(
            err,
            StrategyError::ProfileFetch(TransportError::Status { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let (fetcher, _) = fetcher(Ok("I'm not a JSON, really!".to_owned()));
        let err = fetcher.fetch("something").await.unwrap_err();
        assert!(err.is_decode());
        assert!(!err.is_profile_fetch());
    }
}
