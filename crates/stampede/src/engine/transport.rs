use crate::error::EngineError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// What the engine sees of one request execution. The engine never reads
/// response bodies; status, latency, and an optional error string are the
/// whole contract.
#[derive(Debug, Clone)]
pub struct TransportOutcome {
    pub status: Option<u16>,
    pub duration: Duration,
    pub error: Option<String>,
}

/// The HTTP collaborator boundary. Connection pooling, TLS, and redirects
/// live behind this trait; retries do not exist on either side of it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, method: &str, path: &str) -> TransportOutcome;
}

/// Rejects unknown HTTP methods at configuration time so a bad profile
/// fails the run before any load is generated.
pub fn validate_method(method: &str) -> Result<(), EngineError> {
    Method::from_bytes(method.as_bytes())
        .map(|_| ())
        .map_err(|_| EngineError::Configuration(format!("invalid HTTP method '{}'", method)))
}

/// reqwest-backed transport. The profile's default headers are baked into
/// the client once at build time; every request from this transport
/// carries them.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        default_headers: &HashMap<String, String>,
    ) -> Result<Self, EngineError> {
        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                EngineError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                EngineError::Configuration(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EngineError::Configuration(format!("http client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, method: &str, path: &str) -> TransportOutcome {
        let started = Instant::now();
        let method = match Method::from_bytes(method.as_bytes()) {
            Ok(m) => m,
            // Methods are validated at startup; guard anyway rather than panic.
            Err(e) => {
                return TransportOutcome {
                    status: None,
                    duration: started.elapsed(),
                    error: Some(format!("invalid method: {}", e)),
                }
            }
        };
        let url = format!("{}{}", self.base_url, path);

        match self.client.request(method, &url).send().await {
            Ok(response) => TransportOutcome {
                status: Some(response.status().as_u16()),
                duration: started.elapsed(),
                error: None,
            },
            Err(e) => {
                debug!(url = %url, error = %e, "Request failed");
                TransportOutcome {
                    status: None,
                    duration: started.elapsed(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
