//! Blocking HTTP transport backed by a ureq agent.
//!
//! # Design
//! Each client owns its own `Transport` unless the caller injects an agent,
//! so TLS policy never leaks between clients through a process-wide value.
//! Status codes are never turned into transport errors here; the client
//! decides what a non-200 response means.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Client-wide timeout applied to every request, login included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Certificate policy for outgoing TLS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Verify server certificates against the platform roots.
    #[default]
    Verify,
    /// Trust every certificate, including self-signed and expired ones.
    /// Anyone on the network path can impersonate the server.
    AcceptInvalidCerts,
}

/// Executes `HttpRequest` values and returns fully-read `HttpResponse`s.
///
/// The wrapped agent is cheap to clone and may be shared across threads.
#[derive(Clone)]
pub struct Transport {
    agent: ureq::Agent,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    /// Build a dedicated agent with the given TLS policy and `REQUEST_TIMEOUT`.
    pub fn new(tls: TlsPolicy) -> Self {
        let tls_config = ureq::tls::TlsConfig::builder()
            .disable_verification(tls == TlsPolicy::AcceptInvalidCerts)
            .build();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .tls_config(tls_config)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-supplied agent as is.
    ///
    /// The agent should be configured with `http_status_as_error(false)`;
    /// otherwise non-2xx responses surface as `ApiError::Transport`. Its
    /// timeouts are used instead of `REQUEST_TIMEOUT`, so an agent built
    /// without `timeout_global` can block indefinitely.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    pub fn execute(&self, req: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = req.method.as_str(), url = %req.url, "sending request");

        let url = req.url.as_str();
        let sent = match (req.method, &req.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &req.headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &req.headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), &req.headers).send(body.as_slice())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &req.headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), &req.headers).send(body.as_slice())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &req.headers).send_empty(),
        };

        let mut response = sent.map_err(|err| match err {
            ureq::Error::Http(e) => ApiError::Request(e.to_string()),
            other => ApiError::Transport(other),
        })?;

        let status = response.status().as_u16();
        // Bodies are read in full; ureq caps `read_to_vec` at 10 MiB by default.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(ApiError::ReadBody)?;
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, body })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
