//! Blocking JSON REST client that authenticates with a bearer token.
//!
//! # Overview
//! `RestClient::new` posts a username/password to an authentication endpoint,
//! keeps the returned token, and then sends it as
//! `Authorization: Bearer <token>` on every GET/POST/PUT/DELETE against the
//! base URL. Successful (200) responses are decoded as JSON into a
//! caller-supplied value; every other outcome is an `ApiError`.
//!
//! # Design
//! - Requests are built as plain data (`HttpRequest`) and executed by a
//!   `Transport`, so URL and header construction is testable offline.
//! - One ureq agent per client with a fixed 10 second timeout. Certificate
//!   verification is only disabled when asked for, and `RestClient::new`
//!   asks for it explicitly.
//! - The token is never refreshed. Once it expires the server's 401s are
//!   returned to the caller as `ApiError::HttpStatus`.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use aip_client::RestClient;
//!
//! # fn main() -> aip_client::Result<()> {
//! let client = RestClient::new(
//!     "https://api.example.com",
//!     "https://api.example.com/auth/login",
//!     "admin",
//!     "secret",
//! )?;
//!
//! let mut items: Vec<serde_json::Value> = Vec::new();
//! let params = HashMap::from([("name".to_string(), "tea".to_string())]);
//! client.get("/items", &params, &mut items)?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod transport;

pub use api::RestApi;
pub use auth::Credentials;
pub use client::{ClientBuilder, RestClient};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{TlsPolicy, Transport, REQUEST_TIMEOUT};
