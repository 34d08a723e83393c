//! JSON-over-HTTP adjudicator.
//!
//! POSTs `{"nameA", "nameB", "context", "pairId", "composite"}` and returns
//! the response body for validation. Status mapping: 429 → rate limited,
//! other non-2xx → upstream (retryable when 5xx), connection and body read
//! failures → transport, non-JSON bodies → malformed.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::contract::Adjudicator;
use crate::error::{snippet, AdjudicatorError};
use crate::types::AdjudicationRequest;

pub struct HttpAdjudicator {
    name: String,
    endpoint: String,
    auth_header: Option<String>,
    client: reqwest::Client,
}

impl HttpAdjudicator {
    /// The per-call timeout is enforced by the client wrapper, not here.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        auth_header: Option<String>,
    ) -> Result<Self, AdjudicatorError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| AdjudicatorError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            name: name.into(),
            endpoint: endpoint.into(),
            auth_header,
            client,
        })
    }
}

#[async_trait]
impl Adjudicator for HttpAdjudicator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn adjudicate(&self, request: &AdjudicationRequest) -> Result<Value, AdjudicatorError> {
        let payload = json!({
            "pairId": request.pair_id.to_string(),
            "nameA": request.name_a,
            "nameB": request.name_b,
            "context": request.context,
            "composite": request.composite,
        });

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(header) = self.auth_header.as_deref() {
            builder = builder.header("Authorization", header);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AdjudicatorError::transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdjudicatorError::transport(format!("reading body failed: {e}")))?;

        if status.as_u16() == 429 {
            return Err(AdjudicatorError::rate_limited(format!(
                "HTTP 429: {}",
                snippet(&body)
            )));
        }
        if !status.is_success() {
            return Err(AdjudicatorError::Upstream {
                status: Some(status.as_u16()),
                message: snippet(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AdjudicatorError::malformed(format!("invalid JSON: {e}"), &body))
    }
}
