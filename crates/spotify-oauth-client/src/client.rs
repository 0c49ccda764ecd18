use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, header};
use spotify_oauth_core::{HttpOptions, TransportError};
use tracing::debug;

/// Content type of every token endpoint request.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A form-encoded POST against a token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    /// Full `Authorization` header value, when the client authenticates
    /// through a header instead of the body.
    pub authorization: Option<String>,
    pub form: Vec<(String, String)>,
}

impl FormRequest {
    /// URL-encoded body, fields in insertion order.
    pub fn encoded_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form.iter())
            .finish()
    }

    /// Value of the first form field named `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for FormRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.form.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("FormRequest")
            .field("url", &self.url)
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("fields", &fields)
            .finish()
    }
}

/// Generic OAuth 2.0 HTTP capability the strategy is composed with.
///
/// Implementations return the undecoded response body for success statuses
/// and [`TransportError::Status`] for everything else. Dropping a returned
/// future cancels the request.
#[async_trait]
pub trait OAuth2Client: Send + Sync {
    /// Sends a token endpoint request.
    async fn exchange_code(&self, request: FormRequest) -> Result<Vec<u8>, TransportError>;

    /// Sends a GET authenticated with `Authorization: Bearer <access_token>`.
    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<Vec<u8>, TransportError>;
}

/// [`OAuth2Client`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestOAuth2Client {
    http: HttpClient,
}

impl ReqwestOAuth2Client {
    /// Builds a client honoring the configured timeouts and user agent.
    pub fn new(options: &HttpOptions) -> Result<Self, reqwest::Error> {
        let mut builder = HttpClient::builder().timeout(options.timeout);
        if let Some(connect) = options.connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Wraps an existing `reqwest` client.
    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl OAuth2Client for ReqwestOAuth2Client {
    async fn exchange_code(&self, request: FormRequest) -> Result<Vec<u8>, TransportError> {
        let mut builder = self
            .http
            .post(&request.url)
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.encoded_body());
        if let Some(authorization) = &request.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        let response = builder.send().await.map_err(TransportError::request)?;
        read_body(response).await
    }

    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<Vec<u8>, TransportError> {
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(TransportError::request)?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, TransportError> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.bytes().await.map_err(TransportError::request)?;
    debug!(
        target: "oauth.spotify.http",
        url = %url.path(),
        status = status.as_u16(),
        "received response"
    );
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body.to_vec())
}
