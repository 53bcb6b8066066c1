//! Network-facing result types and error definitions.
//!
//! Responses decoded by the Solana client crates are narrowed into the
//! shapes below before they reach the submission flow, so mocks and the
//! confirmation race never depend on client response types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_client::rpc_response::RpcSimulateTransactionResult;
use solana_transaction_status::TransactionStatus;
use thiserror::Error;

use crate::blockchain::types::Commitment;

/// Errors that can occur while talking to the network.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection or HTTP-level failure.
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// Request exceeded its deadline.
    #[error("RPC timeout after {0} ms")]
    Timeout(u64),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC server error {code}: {message}")]
    Server { code: i64, message: String },

    /// The node answered with an unexpected shape.
    #[error("Unexpected {method} response: {reason}")]
    Schema { method: String, reason: String },

    /// Every configured endpoint failed.
    #[error("All RPC endpoints failed for {0}")]
    AllEndpointsFailed(String),

    /// Websocket subscription could not be established or was lost.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// An endpoint URL could not be used.
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RpcError {
    pub(crate) fn schema(method: &str, reason: impl fmt::Display) -> Self {
        RpcError::Schema {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Options for a broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    pub skip_preflight: bool,
}

impl SendOptions {
    pub fn skip_preflight() -> Self {
        Self {
            skip_preflight: true,
        }
    }
}

/// Error payload the network reports for a failed transaction.
///
/// Kept opaque; displayed as compact JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionErrorPayload(pub Value);

impl TransactionErrorPayload {
    /// Capture a typed error in its JSON wire form.
    pub fn from_error<E: Serialize + fmt::Display>(err: &E) -> Self {
        Self(serde_json::to_value(err).unwrap_or_else(|_| Value::String(err.to_string())))
    }
}

impl fmt::Display for TransactionErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmations: Option<u64>,
    pub err: Option<TransactionErrorPayload>,
    #[serde(default)]
    pub confirmation_status: Option<Commitment>,
}

impl SignatureStatus {
    /// Whether the status carries confirmation depth.
    ///
    /// Rooted transactions report `confirmations: null` together with a
    /// `finalized` status.
    pub fn is_confirmed(&self) -> bool {
        self.confirmations.is_some_and(|n| n > 0)
            || matches!(
                self.confirmation_status,
                Some(Commitment::Confirmed | Commitment::Finalized)
            )
    }
}

impl From<TransactionStatus> for SignatureStatus {
    fn from(status: TransactionStatus) -> Self {
        Self {
            slot: status.slot,
            confirmations: status.confirmations.map(|n| n as u64),
            err: status.err.as_ref().map(TransactionErrorPayload::from_error),
            confirmation_status: status.confirmation_status.map(Commitment::from),
        }
    }
}

/// Value of `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub err: Option<TransactionErrorPayload>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    #[serde(default)]
    pub units_consumed: Option<u64>,
}

impl From<RpcSimulateTransactionResult> for SimulationResult {
    fn from(result: RpcSimulateTransactionResult) -> Self {
        Self {
            err: result.err.as_ref().map(TransactionErrorPayload::from_error),
            logs: result.logs,
            units_consumed: result.units_consumed,
        }
    }
}

/// Push notification for a watched signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureNotification {
    pub slot: u64,
    pub err: Option<TransactionErrorPayload>,
}
