//! Decoding and normalization of the Spotify `/v1/me` payload.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ProtocolError, StrategyError, StrategyResult},
    token::json_kind,
    types::{Email, Profile},
};

#[derive(Debug, Deserialize)]
struct SpotifyUser {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
    #[serde(default)]
    images: Option<Vec<Image>>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    followers: Option<Followers>,
    #[serde(default)]
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Followers {
    #[serde(default)]
    total: Option<u64>,
}

/// Builds a [`Profile`] from the raw profile endpoint body.
///
/// Body that is not JSON yields [`StrategyError::Decode`]; JSON that does not
/// look like a Spotify user yields [`ProtocolError::UnexpectedShape`].
/// Optional fields the payload omits (or sends as empty strings) stay `None`.
/// Bytes that are not UTF-8 fail decoding rather than being replaced.
pub fn parse_profile(body: impl AsRef<[u8]>) -> StrategyResult<Profile> {
    let body = body.as_ref();
    let value: Value =
        serde_json::from_slice(body).map_err(|err| StrategyError::decode("profile", err))?;
    let user = SpotifyUser::deserialize(&value)
        .map_err(|err| ProtocolError::UnexpectedShape(format!("profile: {err}")))?;
    let json = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ProtocolError::UnexpectedShape(format!(
                "profile must be a JSON object, got {}",
                json_kind(&other)
            ))
            .into());
        }
    };

    if user.id.is_empty() {
        return Err(ProtocolError::UnexpectedShape("profile id is empty".to_owned()).into());
    }

    // from_slice already rejected invalid UTF-8
    let raw = std::str::from_utf8(body)
        .map_err(|err| ProtocolError::UnexpectedShape(format!("profile body: {err}")))?;
    let mut profile = Profile::new(user.id, raw.to_owned(), json);
    profile.display_name = user.display_name;
    profile.profile_url = user.external_urls.and_then(|urls| urls.spotify);
    profile.photos = user
        .images
        .map(|images| images.into_iter().map(|image| image.url).collect());
    profile.emails = non_empty(user.email).map(|value| vec![Email { value, kind: None }]);
    profile.country = non_empty(user.country);
    profile.followers = user.followers.and_then(|followers| followers.total);
    profile.product = non_empty(user.product);

    Ok(profile)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
