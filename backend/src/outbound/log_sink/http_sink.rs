//! Reqwest-backed log-shipping sink.
//!
//! Posts one JSON record per event to an ingest endpoint using bearer-token
//! authentication. The adapter owns transport details only; retry and drop
//! policy live in the diagnostics worker, which simply logs failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::LogRecordDto;
use crate::domain::DiagnosticEvent;
use crate::domain::ports::{DiagnosticSink, DiagnosticSinkError};

/// Diagnostic sink shipping events to a remote log collector over HTTP.
pub struct HttpLogSink {
    client: Client,
    endpoint: Url,
    token: String,
}

impl HttpLogSink {
    /// Build a sink with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }
}

#[async_trait]
impl DiagnosticSink for HttpLogSink {
    async fn deliver(&self, event: &DiagnosticEvent) -> Result<(), DiagnosticSinkError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&LogRecordDto::from(event))
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())
    }
}

fn check_status(status: StatusCode) -> Result<(), DiagnosticSinkError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DiagnosticSinkError::rejected(status.as_u16()))
    }
}

fn map_transport_error(error: reqwest::Error) -> DiagnosticSinkError {
    // Drop the URL so the error text cannot echo query-string secrets.
    DiagnosticSinkError::transport(error.without_url().to_string())
}
