//! Shared constants for the Spotify OAuth strategy.

/// Name the strategy registers under and stamps on every profile.
pub const PROVIDER_NAME: &str = "spotify";

/// Spotify accounts service authorization endpoint.
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://accounts.spotify.com/authorize";

/// Spotify accounts service token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Web API endpoint describing the current user.
pub const DEFAULT_USER_PROFILE_URL: &str = "https://api.spotify.com/v1/me";

/// Separator used when joining scopes into the `scope` parameter.
pub const DEFAULT_SCOPE_SEPARATOR: &str = " ";
