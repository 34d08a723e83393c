use async_trait::async_trait;
use serde_json::Value;

use crate::error::AdjudicatorError;
use crate::types::AdjudicationRequest;

/// An external service that judges whether two names are the same entity.
///
/// Implementations return the raw JSON body; the client validates it before
/// anything downstream trusts it. Implementations must not retry on their
/// own, since every attempt is charged to the tier budget by the client.
#[async_trait]
pub trait Adjudicator: Send + Sync {
    /// Label used in logs and breaker names.
    fn name(&self) -> &str;

    async fn adjudicate(&self, request: &AdjudicationRequest) -> Result<Value, AdjudicatorError>;
}
