//! Seam between the engines and the remote ledger service.
//!
//! Implementations never fail: every outcome is a [`Reply`] variant so callers
//! pattern-match instead of probing the body for fields.

use api_types::Operation;
use async_trait::async_trait;

use crate::EngineError;

const GENERIC_REJECTION: &str = "Error llamando al servidor";

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Parsed response body.
    Data(serde_json::Value),
    /// The service answered `{"error": message}`.
    Rejected(String),
    /// Transport failure, timeout, non-2xx status or malformed body.
    Unavailable(String),
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Sends `{fn: operation, params}` and returns the outcome.
    async fn invoke(&self, operation: &str, params: serde_json::Value) -> Reply;
}

/// Typed call: encodes `op`, invokes it and decodes the reply.
pub async fn call<G, O>(gateway: &G, op: &O) -> Result<O::Reply, EngineError>
where
    G: Gateway + ?Sized,
    O: Operation + Sync,
{
    let params = serde_json::to_value(op)
        .map_err(|err| EngineError::Transport(format!("cannot encode {}: {err}", O::NAME)))?;

    match gateway.invoke(O::NAME, params).await {
        Reply::Data(value) => serde_json::from_value(value).map_err(|err| {
            tracing::warn!(operation = O::NAME, "malformed reply: {err}");
            EngineError::Transport(format!("malformed {} reply: {err}", O::NAME))
        }),
        Reply::Rejected(message) => {
            tracing::warn!(operation = O::NAME, "rejected: {message}");
            let message = if message.trim().is_empty() {
                GENERIC_REJECTION.to_string()
            } else {
                message
            };
            Err(EngineError::Rejected(message))
        }
        Reply::Unavailable(reason) => {
            tracing::warn!(operation = O::NAME, "unavailable: {reason}");
            Err(EngineError::Transport(reason))
        }
    }
}
