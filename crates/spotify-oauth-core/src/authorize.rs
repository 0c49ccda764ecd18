//! Spotify-specific additions to the authorization request.

use std::collections::BTreeMap;

use crate::types::AuthorizeOptions;

/// Extra query parameters for the authorization redirect.
///
/// `show_dialog` is only emitted when explicitly requested; Spotify treats
/// its absence as "skip the dialog for returning users".
pub fn authorization_params(options: &AuthorizeOptions) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    if options.show_dialog == Some(true) {
        params.insert("show_dialog".to_owned(), "true".to_owned());
    }
    params
}

/// Joins configured scopes into a single `scope` value, `None` when empty.
pub fn scope_param(scopes: &[String], separator: &str) -> Option<String> {
    let scopes: Vec<&str> = scopes
        .iter()
        .map(|scope| scope.trim())
        .filter(|scope| !scope.is_empty())
        .collect();
    if scopes.is_empty() {
        None
    } else {
        Some(scopes.join(separator))
    }
}
