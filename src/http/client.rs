use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{NymError, Result};

/// HTTP client shared by the catalog and the fetcher.
///
/// Requests are made once; failures surface immediately as [`NymError::Network`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request and deserializes the JSON response.
    ///
    /// Transport and status failures map to [`NymError::Network`], a body that is not
    /// the expected JSON to [`NymError::Format`].
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| network_error(url, &e))?;

        serde_json::from_slice(&body).map_err(|source| NymError::Format {
            url: url.to_string(),
            source,
        })
    }

    /// Starts a GET request and returns the response once its status is known to be a
    /// success. The body is left for the caller to stream.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, &e))?;

        response
            .error_for_status()
            .map_err(|e| network_error(url, &e))
    }
}

pub(crate) fn network_error(url: &str, error: &reqwest::Error) -> NymError {
    let message = match error.status() {
        Some(status) => format!("HTTP {}", status),
        None => error.to_string(),
    };
    NymError::Network {
        url: url.to_string(),
        message,
    }
}
