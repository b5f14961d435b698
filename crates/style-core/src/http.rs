//! HTTP fetcher backed by reqwest

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::collab::{FetchError, FetchOptions, Fetcher};
use crate::config::HttpSettings;
use crate::{Error, Result};

/// Fetches remote style sources over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_content_size: u64,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("stylecheck/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(client_error)?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build().map_err(client_error)?,
            max_content_size: settings.max_content_size,
        })
    }

    fn too_large(&self, size: u64) -> FetchError {
        tracing::warn!(size, max = self.max_content_size, "response body too large");
        FetchError::Status(StatusCode::PAYLOAD_TOO_LARGE.as_u16())
    }
}

fn client_error(err: reqwest::Error) -> Error {
    Error::HttpClient {
        message: err.to_string(),
    }
}

/// Errors without an HTTP status never reached a server.
fn transport_error(err: reqwest::Error) -> FetchError {
    match err.status() {
        Some(status) => FetchError::Status(status.as_u16()),
        None => {
            tracing::debug!(error = %err, "request failed");
            FetchError::Unreachable
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: FetchOptions) -> std::result::Result<String, FetchError> {
        let request = match options.body {
            Some(body) => self.client.post(url).body(body),
            None => self.client.get(url),
        };
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Check content length before downloading
        if let Some(len) = response.content_length() {
            if len > self.max_content_size {
                return Err(self.too_large(len));
            }
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.len() as u64 > self.max_content_size {
            return Err(self.too_large(bytes.len() as u64));
        }

        decode_body(bytes.to_vec())
    }
}

/// Style sources are text; a body that is not UTF-8 is rejected, not repaired.
fn decode_body(bytes: Vec<u8>) -> std::result::Result<String, FetchError> {
    String::from_utf8(bytes).map_err(|err| {
        tracing::warn!(error = %err, "response body is not valid UTF-8");
        FetchError::Status(StatusCode::UNSUPPORTED_MEDIA_TYPE.as_u16())
    })
}
