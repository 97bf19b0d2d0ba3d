//! Bearer-token REST client.
//!
//! # Design
//! `RestClient` logs in once and keeps the token for its whole lifetime; there
//! is no refresh, so an expired token shows up as 401 responses on every
//! later call. Each verb is split into a `build_*` step that produces an
//! `HttpRequest` and the shared execution step, which attaches the bearer
//! header, runs the request through the `Transport`, and decodes a 200 body
//! into the caller's `out` value. Any other status is an error carrying the
//! status and body, and `out` is left untouched.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::{self, Credentials};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{TlsPolicy, Transport};

/// Authenticated client for a JSON REST API.
///
/// Every request is sent to `base_url + endpoint` with
/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct RestClient {
    transport: Transport,
    base_url: String,
    token: String,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Configures transport and TLS policy before logging in.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    auth_url: String,
    tls: TlsPolicy,
    transport: Option<Transport>,
}

impl ClientBuilder {
    fn new(base_url: &str, auth_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            auth_url: auth_url.to_string(),
            tls: TlsPolicy::Verify,
            transport: None,
        }
    }

    /// Skip TLS certificate verification for every connection this client
    /// makes, login included.
    ///
    /// Ignored when an agent is injected with [`ClientBuilder::agent`].
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls = if accept {
            TlsPolicy::AcceptInvalidCerts
        } else {
            TlsPolicy::Verify
        };
        self
    }

    /// Send all requests through `agent` instead of a dedicated one.
    ///
    /// The agent's own TLS and timeout settings apply: neither
    /// [`ClientBuilder::danger_accept_invalid_certs`] nor `REQUEST_TIMEOUT`
    /// is imposed on it. Configure `timeout_global` and
    /// `http_status_as_error(false)` on the agent to keep the usual
    /// behaviour.
    pub fn agent(mut self, agent: ureq::Agent) -> Self {
        self.transport = Some(Transport::from_agent(agent));
        self
    }

    /// Exchange the credentials for a bearer token and return the client.
    pub fn login(self, username: &str, password: &str) -> Result<RestClient> {
        let transport = self.transport.unwrap_or_else(|| Transport::new(self.tls));

        let credentials = Credentials { username, password };
        let req = auth::build_login_request(&self.auth_url, &credentials)?;
        let token = auth::parse_login_response(transport.execute(&req)?)?;
        debug!(auth_url = %self.auth_url, "authenticated");

        Ok(RestClient {
            transport,
            base_url: self.base_url,
            token,
        })
    }
}

impl RestClient {
    /// Log in against `auth_url` and return a client for `base_url`.
    ///
    /// This trusts every TLS certificate presented by either endpoint. Use
    /// [`RestClient::builder`] to keep verification on.
    pub fn new(base_url: &str, auth_url: &str, username: &str, password: &str) -> Result<Self> {
        Self::builder(base_url, auth_url)
            .danger_accept_invalid_certs(true)
            .login(username, password)
    }

    /// Start configuring a client. Certificate verification is on by default.
    pub fn builder(base_url: &str, auth_url: &str) -> ClientBuilder {
        ClientBuilder::new(base_url, auth_url)
    }

    /// Assemble a client around a token obtained elsewhere, skipping login.
    pub fn from_parts(transport: Transport, base_url: &str, token: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token obtained at login.
    pub fn token(&self) -> &str {
        &self.token
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    /// GET `endpoint` with `params` as query parameters, decoding the 200
    /// body into `out`. Returns the status code.
    pub fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16> {
        let req = self.build_get(endpoint, params)?;
        self.send(req, out)
    }

    /// POST the raw JSON `body` to `endpoint`, decoding the 200 body into
    /// `out`.
    pub fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16> {
        let req = self.build_post(endpoint, body)?;
        self.send(req, out)
    }

    /// PUT the raw JSON `body` to `endpoint`, decoding the 200 body into
    /// `out`.
    pub fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16> {
        let req = self.build_put(endpoint, body)?;
        self.send(req, out)
    }

    /// DELETE `endpoint` with `params` as query parameters.
    pub fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16> {
        let req = self.build_delete(endpoint, params)?;
        self.send(req, out)
    }

    /// Like [`RestClient::post`], encoding `input` as JSON first.
    pub fn post_json<B, T>(&self, endpoint: &str, input: &B, out: &mut T) -> Result<u16>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(input).map_err(ApiError::Serialization)?;
        self.post(endpoint, &body, out)
    }

    /// Like [`RestClient::put`], encoding `input` as JSON first.
    pub fn put_json<B, T>(&self, endpoint: &str, input: &B, out: &mut T) -> Result<u16>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(input).map_err(ApiError::Serialization)?;
        self.put(endpoint, &body, out)
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    pub fn build_get(&self, endpoint: &str, params: &HashMap<String, String>) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.resolve(endpoint, params)?,
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn build_post(&self, endpoint: &str, body: &[u8]) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.resolve(endpoint, &HashMap::new())?,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body.to_vec()),
        })
    }

    pub fn build_put(&self, endpoint: &str, body: &[u8]) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.resolve(endpoint, &HashMap::new())?,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body.to_vec()),
        })
    }

    pub fn build_delete(&self, endpoint: &str, params: &HashMap<String, String>) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: self.resolve(endpoint, params)?,
            headers: Vec::new(),
            body: None,
        })
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Decode a 200 response into `out`; any other status is an error
    /// carrying the status and body text.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse, out: &mut T) -> Result<u16> {
        if response.status != 200 {
            return Err(ApiError::HttpStatus {
                status: response.status,
                body: response.body_text(),
            });
        }
        *out = serde_json::from_slice(&response.body).map_err(|source| ApiError::Deserialization {
            status: response.status,
            source,
        })?;
        Ok(response.status)
    }

    fn send<T: DeserializeOwned>(&self, mut req: HttpRequest, out: &mut T) -> Result<u16> {
        self.authorize(&mut req);
        let response = self.transport.execute(&req)?;
        self.parse_response(response, out)
    }

    fn authorize(&self, req: &mut HttpRequest) {
        req.headers
            .push(("authorization".to_string(), format!("Bearer {}", self.token)));
    }

    /// Join `base_url` and `endpoint`, then merge `params` into the query:
    /// each key in `params` replaces all existing values for that key, and
    /// the result is encoded with keys in sorted order.
    fn resolve(&self, endpoint: &str, params: &HashMap<String, String>) -> Result<String> {
        let raw = format!("{}{}", self.base_url, endpoint);
        let mut url = Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { url: raw, source })?;
        if params.is_empty() {
            return Ok(url.into());
        }

        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            query.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        for (key, value) in params {
            query.insert(key.clone(), vec![value.clone()]);
        }

        url.query_pairs_mut().clear().extend_pairs(
            query
                .iter()
                .flat_map(|(key, values)| values.iter().map(move |value| (key, value))),
        );
        Ok(url.into())
    }
}
