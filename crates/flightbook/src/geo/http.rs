//! HTTP client abstraction for the lookup services.

use std::time::Duration;

use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Blocking HTTP GET, injectable so resolvers can be tested offline.
pub trait HttpClient: Send + Sync {
    /// Perform a GET request with the given query parameters and return the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Create a client sending `user_agent` and giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create a client from the `[http]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.timeout())
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        debug!(url, "HTTP GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| Error::http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("HTTP {status} from {url}")));
        }

        let body = response
            .bytes()
            .map_err(|e| Error::http(format!("failed to read response: {e}")))?;
        trace!(url, bytes = body.len(), "HTTP response received");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_client_from_default_config() {
        let client = ReqwestClient::from_config(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_unreachable_host_is_http_error() {
        let client = ReqwestClient::new("flightbook-test", Duration::from_millis(500)).unwrap();
        let err = client
            .get("http://127.0.0.1:9/nothing", &[])
            .unwrap_err();
        assert!(err.is_lookup_error());
    }
}
