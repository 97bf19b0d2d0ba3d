//! Caller-facing interface of the authenticated client.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::client::RestClient;
use crate::error::Result;

/// The four JSON verbs. Each returns the status code (always 200 on success)
/// and writes the decoded body into `out`.
///
/// Code that only issues requests can depend on this trait and swap in a
/// fake in its own tests.
pub trait RestApi {
    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16>;

    fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16>;

    fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16>;

    fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16>;
}

impl RestApi for RestClient {
    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16> {
        RestClient::get(self, endpoint, params, out)
    }

    fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16> {
        RestClient::post(self, endpoint, body, out)
    }

    fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &[u8], out: &mut T) -> Result<u16> {
        RestClient::put(self, endpoint, body, out)
    }

    fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        out: &mut T,
    ) -> Result<u16> {
        RestClient::delete(self, endpoint, params, out)
    }
}
