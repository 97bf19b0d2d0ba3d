//! Login exchange: username/password in, bearer token out.

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Username/password pair used once during login and never retained.
#[derive(Clone, Copy, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Build the POST to the authentication endpoint carrying the credentials
/// as a JSON object.
pub fn build_login_request(auth_url: &str, credentials: &Credentials<'_>) -> Result<HttpRequest> {
    let url = Url::parse(auth_url).map_err(|source| ApiError::InvalidUrl {
        url: auth_url.to_string(),
        source,
    })?;
    let body = serde_json::to_vec(credentials).map_err(ApiError::Serialization)?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: url.into(),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

/// Extract the bearer token from the authentication response.
///
/// Only a 200 response whose body is a JSON object with a string `token`
/// field succeeds; other fields are ignored.
pub fn parse_login_response(response: HttpResponse) -> Result<String> {
    if response.status != 200 {
        return Err(ApiError::AuthStatus {
            status: response.status,
        });
    }
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&response.body)
        .map_err(|source| ApiError::Deserialization {
            status: response.status,
            source,
        })?;
    match object.get("token") {
        Some(serde_json::Value::String(token)) => Ok(token.clone()),
        _ => Err(ApiError::TokenNotFound),
    }
}
