use serde_json::{Map, Value};

use crate::{
    error::{ProtocolError, StrategyError, StrategyResult},
    types::TokenResult,
};

/// Parses a successful token endpoint body into a [`TokenResult`].
///
/// The body must be UTF-8 JSON; anything else is [`StrategyError::Decode`].
pub fn parse_token_response(body: impl AsRef<[u8]>) -> StrategyResult<TokenResult> {
    let value: Value = serde_json::from_slice(body.as_ref())
        .map_err(|err| StrategyError::decode("token", err))?;
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ProtocolError::UnexpectedShape(format!(
                "token response must be a JSON object, got {}",
                json_kind(&other)
            ))
            .into());
        }
    };

    if let Some(err) = oauth_error_from_fields(&fields, None) {
        return Err(err.into());
    }

    let access_token = match fields.get("access_token") {
        Some(Value::String(token)) if !token.is_empty() => token.clone(),
        _ => return Err(ProtocolError::MissingAccessToken.into()),
    };

    let refresh_token = match fields.remove("refresh_token") {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) => Some(token),
        Some(other) => {
            return Err(ProtocolError::UnexpectedShape(format!(
                "refresh_token must be a string, got {}",
                json_kind(&other)
            ))
            .into());
        }
    };

    Ok(TokenResult {
        access_token,
        refresh_token,
        extra_parameters: fields,
    })
}

/// Extracts an RFC 6749 error object from an error response body.
pub fn parse_oauth_error(body: &str, status: Option<u16>) -> Option<ProtocolError> {
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(fields) => oauth_error_from_fields(&fields, status),
        _ => None,
    }
}

fn oauth_error_from_fields(
    fields: &Map<String, Value>,
    status: Option<u16>,
) -> Option<ProtocolError> {
    let error = match fields.get("error")? {
        Value::String(code) => code.clone(),
        // Web API style: {"error": {"status": 401, "message": "..."}}
        Value::Object(inner) => {
            let message = inner.get("message").and_then(Value::as_str)?;
            return Some(ProtocolError::OAuth {
                error: message.to_owned(),
                description: None,
                status: status.or_else(|| {
                    inner
                        .get("status")
                        .and_then(Value::as_u64)
                        .and_then(|s| u16::try_from(s).ok())
                }),
            });
        }
        _ => return None,
    };
    let description = fields
        .get("error_description")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Some(ProtocolError::OAuth {
        error,
        description,
        status,
    })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
