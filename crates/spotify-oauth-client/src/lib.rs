//! Async token exchange and profile loading for Spotify logins.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use spotify_oauth_client::Strategy;
//! use spotify_oauth_core::{BoxError, Profile, StrategyConfig, TokenResult};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StrategyConfig::new("client-id", "client-secret")
//!     .with_scope(["user-read-email", "user-read-private"]);
//! let strategy = Strategy::new(config, |_tokens: TokenResult, profile: Profile| async move {
//!     Ok::<_, BoxError>(Some(profile.id))
//! })?;
//!
//! # let code = "code-from-callback";
//! let tokens = strategy.exchange(code, &BTreeMap::new()).await?;
//! let profile = strategy.fetch(&tokens.access_token).await?;
//! println!("signed in as {}", profile.username);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod profile;
pub mod strategy;
pub mod token;

pub use client::{FORM_CONTENT_TYPE, FormRequest, OAuth2Client, ReqwestOAuth2Client};
pub use profile::ProfileFetcher;
pub use strategy::{Strategy, Verify};
pub use token::TokenExchanger;
