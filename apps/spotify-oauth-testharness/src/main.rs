use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    sync::Arc,
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use spotify_oauth_client::{Strategy, Verify};
use spotify_oauth_core::{
    AuthorizeOptions, BoxError, ConfigError, HttpOptions, Profile, StrategyConfig, StrategyError,
    TokenResult,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use uuid::Uuid;

/// Accepts every Spotify user and keeps the profile as the session user.
struct AcceptProfile;

#[async_trait]
impl Verify for AcceptProfile {
    type User = Profile;

    async fn verify(
        &self,
        _tokens: TokenResult,
        profile: Profile,
    ) -> Result<Option<Profile>, BoxError> {
        Ok(Some(profile))
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<HarnessConfig>,
    strategy: Arc<Strategy<AcceptProfile>>,
    pending: Arc<RwLock<HashSet<String>>>,
    last_profile: Arc<RwLock<Option<Profile>>>,
}

#[derive(Debug, Deserialize)]
struct AuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

struct HarnessConfig {
    listen_addr: SocketAddr,
    strategy: StrategyConfig,
    http: HttpOptions,
}

impl HarnessConfig {
    fn from_env() -> Result<Self, HarnessError> {
        let listen_addr: SocketAddr = std::env::var("HARNESS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|err| HarnessError::Config(format!("invalid HARNESS_LISTEN_ADDR: {err}")))?;

        let strategy = StrategyConfig::from_env()?;
        if strategy.callback_url.is_none() {
            return Err(HarnessError::Config(
                "SPOTIFY_CALLBACK_URL is required".into(),
            ));
        }

        Ok(Self {
            listen_addr,
            strategy,
            http: HttpOptions::from_env()?,
        })
    }
}

#[derive(Debug, Error)]
enum HarnessError {
    #[error("{0}")]
    Config(String),
    #[error("missing authorization code")]
    MissingCode,
    #[error("authorization state mismatch")]
    StateMismatch,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("user rejected")]
    Rejected,
    #[error("no authenticated profile")]
    NoProfile,
    #[error("oauth error: {0}")]
    OAuth(#[from] StrategyError),
    #[error("{0}")]
    Other(String),
}

impl From<ConfigError> for HarnessError {
    fn from(value: ConfigError) -> Self {
        HarnessError::Config(value.to_string())
    }
}

impl IntoResponse for HarnessError {
    fn into_response(self) -> Response {
        let status = match &self {
            HarnessError::Config(_) | HarnessError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HarnessError::MissingCode | HarnessError::StateMismatch => StatusCode::BAD_REQUEST,
            HarnessError::Denied(_) | HarnessError::Rejected => StatusCode::FORBIDDEN,
            HarnessError::NoProfile => StatusCode::NOT_FOUND,
            HarnessError::OAuth(StrategyError::Configuration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            HarnessError::OAuth(_) => StatusCode::BAD_GATEWAY,
        };
        let message = self.to_string();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), HarnessError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "spotify_oauth_testharness=info,spotify_oauth_client=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(HarnessConfig::from_env()?);
    let strategy = Strategy::with_options(config.strategy.clone(), &config.http, AcceptProfile)?;

    let app_state = AppState {
        config: Arc::clone(&config),
        strategy: Arc::new(strategy),
        pending: Arc::new(RwLock::new(HashSet::new())),
        last_profile: Arc::new(RwLock::new(None)),
    };

    let router = router(app_state);

    info!("listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|err| HarnessError::Other(format!("failed to bind listener: {err}")))?;
    axum::serve(listener, router)
        .await
        .map_err(|err| HarnessError::Other(format!("server error: {err}")))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/start", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/profile", get(profile_view))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Authorization URL for one login attempt identified by `state`.
fn authorize_url(
    strategy: &Strategy<AcceptProfile>,
    options: &AuthorizeOptions,
    state: &str,
) -> Result<Url, HarnessError> {
    let config = strategy.config();
    let mut url = Url::parse(&config.authorization_url)
        .map_err(|err| HarnessError::Config(format!("invalid authorization url: {err}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", config.credentials.client_id());
        if let Some(callback) = config.callback_url.as_deref() {
            query.append_pair("redirect_uri", callback);
        }
        if let Some(scope) = strategy.scope() {
            query.append_pair("scope", &scope);
        }
        query.append_pair("state", state);
        for (key, value) in strategy.authorization_params(options) {
            query.append_pair(&key, &value);
        }
    }
    Ok(url)
}

async fn auth_start(
    State(state): State<AppState>,
    Query(options): Query<AuthorizeOptions>,
) -> Result<Response, HarnessError> {
    let login_state = Uuid::new_v4().to_string();
    let url = authorize_url(&state.strategy, &options, &login_state)?;
    state.pending.write().await.insert(login_state);
    Ok(Redirect::to(url.as_str()).into_response())
}

async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallback>,
) -> Result<Response, HarnessError> {
    if let Some(error) = params.error {
        warn!(%error, "authorization denied by provider");
        return Err(HarnessError::Denied(error));
    }

    let code = params.code.ok_or(HarnessError::MissingCode)?;
    let returned_state = params.state.ok_or(HarnessError::StateMismatch)?;
    if !state.pending.write().await.remove(&returned_state) {
        return Err(HarnessError::StateMismatch);
    }

    let mut extra = BTreeMap::new();
    if let Some(callback) = state.config.strategy.callback_url.clone() {
        extra.insert("redirect_uri".to_owned(), callback);
    }

    let profile = state
        .strategy
        .authenticate(&code, &extra)
        .await?
        .ok_or(HarnessError::Rejected)?;
    info!(user = %profile.id, "login completed");

    *state.last_profile.write().await = Some(profile.clone());
    Ok(Json(profile).into_response())
}

async fn profile_view(State(state): State<AppState>) -> Result<Response, HarnessError> {
    let profile = state
        .last_profile
        .read()
        .await
        .clone()
        .ok_or(HarnessError::NoProfile)?;
    Ok(Json(profile).into_response())
}
