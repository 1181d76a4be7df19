//! Transport boundary for the query service.
//!
//! The client hands envelope bytes to a [`Transport`] and gets back the raw
//! status and body. Retries, timeouts and TLS belong to the transport.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use crate::error::TransportError;

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Returns the body if the status is `200`.
    ///
    /// # Errors
    ///
    /// See [`check_status`].
    pub fn into_body(self) -> Result<Vec<u8>, TransportError> {
        check_status(self.status)?;
        Ok(self.body)
    }
}

/// Sends one SOAP envelope and returns the response.
pub trait Transport {
    /// Performs a single blocking round trip.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionFailed` on I/O or connection
    /// failure. Non-200 statuses are returned as responses, not errors.
    fn send(&self, envelope: &[u8]) -> Result<RawResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&[u8]) -> Result<RawResponse, TransportError>,
{
    fn send(&self, envelope: &[u8]) -> Result<RawResponse, TransportError> {
        self(envelope)
    }
}

/// Classifies an HTTP status.
///
/// # Errors
///
/// `401` and `403` map to `Unauthorized`; any other non-200 status maps to
/// `HttpStatus`.
pub fn check_status(status: u16) -> Result<(), TransportError> {
    match status {
        200 => Ok(()),
        401 | 403 => Err(TransportError::Unauthorized { status }),
        _ => Err(TransportError::HttpStatus { status }),
    }
}
