//! Firebase-style REST client.
//!
//! Every document is addressed as `{base_url}/{path}.json`. When an auth
//! token is configured it is sent as the `auth` query parameter.
//!
//! The client does not retry. Each call is bounded by the configured
//! timeout and failures are returned to the caller, which logs them and
//! moves on.

use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{RemoteStore, Result, StoreConfig, StoreError};

/// REST client for the remote document store.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    timeout_ms: u64,
}

impl RestStore {
    /// Build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::transport(&config.base_url, e.to_string()))?;

        debug!(base_url = %config.base_url, "remote store client ready");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            timeout_ms: config.timeout.as_millis() as u64,
        })
    }

    /// Full document URL for a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    fn map_error(&self, path: &str, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout {
                path: path.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_decode() {
            StoreError::malformed(path, err.to_string())
        } else {
            StoreError::transport(path, err.to_string())
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response> {
        trace!(%method, path, "store request");
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(path, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                path: path.to_string(),
                code: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl RemoteStore for RestStore {
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self.send(Method::GET, path, None).await?;
        response.json().await.map_err(|e| self.map_error(path, e))
    }

    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        self.send(Method::PUT, path, Some(value)).await?;
        Ok(())
    }

    async fn patch(&self, path: &str, value: &Value) -> Result<()> {
        self.send(Method::PATCH, path, Some(value)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let store = RestStore::new(&StoreConfig::new("https://db.example.com/")).unwrap();
        assert_eq!(
            store.url("estado/lugares"),
            "https://db.example.com/estado/lugares.json"
        );
        assert_eq!(store.url("/estado/"), "https://db.example.com/estado.json");
    }
}
