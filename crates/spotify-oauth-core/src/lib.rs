//! Spotify OAuth 2.0 strategy primitives shared by the client and hosts.
//!
//! Nothing in this crate performs I/O: it defines the data model, the error
//! taxonomy, configuration, and the pure parsing steps applied to token and
//! profile responses.

pub mod authorize;
pub mod config;
pub mod constants;
pub mod error;
pub mod profile;
pub mod token;
pub mod types;

pub use authorize::authorization_params;
pub use config::{ConfigError, HttpOptions, StrategyConfig};
pub use error::{BoxError, ProtocolError, StrategyError, StrategyResult, TransportError};
pub use profile::parse_profile;
pub use token::{parse_oauth_error, parse_token_response};
pub use types::{
    AuthorizeOptions, ClientAuthMethod, Credentials, Email, GrantType, Profile, TokenRequest,
    TokenResult,
};
