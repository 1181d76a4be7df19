//! Blocking HTTP transport backed by `reqwest`.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use super::{RawResponse, Transport};
use crate::config::Config;
use crate::error::TransportError;

const SOAP_ACTION_HEADER: &str = "SOAPAction";
const CONTENT_TYPE_XML: &str = "text/xml";

/// POSTs envelopes to the configured endpoint with basic auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    config: Config,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a transport reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(http: Client, config: Config) -> Self {
        Self { http, config }
    }

    /// Endpoint and credentials in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn send(&self, envelope: &[u8]) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(SOAP_ACTION_HEADER, &self.config.soap_action)
            .header(CONTENT_TYPE, CONTENT_TYPE_XML)
            .body(envelope.to_vec())
            .send()
            .map_err(|e| TransportError::ConnectionFailed {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportError::ConnectionFailed {
                message: format!("read response body: {e}"),
            })?
            .to_vec();

        tracing::debug!(
            endpoint = %self.config.endpoint,
            status,
            request_bytes = envelope.len(),
            response_bytes = body.len(),
            "query round trip"
        );
        Ok(RawResponse { status, body })
    }
}
