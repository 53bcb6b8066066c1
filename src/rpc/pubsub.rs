//! Websocket signature subscriptions.
//!
//! # Lifecycle
//! ```text
//! signature_subscribe
//!     → spawn subscription task, wait for its ready signal
//! subscription task
//!     → connect, signatureSubscribe, ready
//!     → first processed notification → one-shot channel → exit
//!     → subscriber dropped / stream ended → signatureUnsubscribe, exit
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use solana_client::rpc_config::RpcSignatureSubscribeConfig;
use solana_client::rpc_response::RpcSignatureResult;
use solana_pubsub_client::nonblocking::pubsub_client::PubsubClient as NodePubsubClient;
use tokio::sync::oneshot;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{Commitment, TxId};
use crate::config::RpcConfig;
use crate::rpc::types::{RpcError, RpcResult, SignatureNotification, TransactionErrorPayload};

/// Receiving end of a single signature subscription.
///
/// Dropping it cancels the subscription.
#[derive(Debug)]
pub struct SignatureSubscription {
    rx: oneshot::Receiver<SignatureNotification>,
}

impl SignatureSubscription {
    /// Create a subscription fed by the returned sender.
    pub fn channel() -> (oneshot::Sender<SignatureNotification>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait for the notification. `None` if the feed ended without one.
    pub async fn recv(self) -> Option<SignatureNotification> {
        self.rx.await.ok()
    }
}

/// Websocket client for the pubsub endpoint.
#[derive(Debug, Clone)]
pub struct PubsubClient {
    ws_url: Url,
    commitment: Commitment,
    timeout_duration: Duration,
}

impl PubsubClient {
    pub fn new(ws_url: Url, commitment: Commitment, timeout_duration: Duration) -> Self {
        Self {
            ws_url,
            commitment,
            timeout_duration,
        }
    }

    pub fn from_config(config: &RpcConfig) -> RpcResult<Self> {
        let ws_url = config.websocket_url().map_err(|e| RpcError::InvalidUrl {
            url: if config.ws_url.is_empty() {
                config.url.clone()
            } else {
                config.ws_url.clone()
            },
            reason: e.to_string(),
        })?;
        Ok(Self::new(
            ws_url,
            config.commitment,
            Duration::from_millis(config.request_timeout_ms),
        ))
    }

    /// Subscribe to the status of `txid`.
    ///
    /// Connection and acknowledgement share the request deadline.
    pub async fn signature_subscribe(&self, txid: &TxId) -> RpcResult<SignatureSubscription> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (sender, subscription) = SignatureSubscription::channel();
        tokio::spawn(run_subscription(
            self.ws_url.clone(),
            *txid,
            self.commitment,
            ready_tx,
            sender,
        ));

        match timeout(self.timeout_duration, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                tracing::debug!(txid = %txid, "Signature subscription established");
                Ok(subscription)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(RpcError::Subscription(
                "subscription task ended before acknowledgement".to_string(),
            )),
            Err(_) => Err(RpcError::Timeout(self.timeout_duration.as_millis() as u64)),
        }
    }
}

async fn run_subscription(
    ws_url: Url,
    txid: TxId,
    commitment: Commitment,
    mut ready: oneshot::Sender<RpcResult<()>>,
    mut sender: oneshot::Sender<SignatureNotification>,
) {
    let connect = tokio::select! {
        _ = ready.closed() => return,
        connect = NodePubsubClient::new(ws_url.as_str()) => connect,
    };
    let client = match connect {
        Ok(client) => client,
        Err(e) => {
            let _ = ready.send(Err(RpcError::Subscription(format!(
                "connect to {} failed: {}",
                ws_url, e
            ))));
            return;
        }
    };

    let config = RpcSignatureSubscribeConfig {
        commitment: Some(commitment.into()),
        enable_received_notification: Some(false),
    };
    let subscribe = tokio::select! {
        _ = ready.closed() => None,
        subscribe = client.signature_subscribe(&txid, Some(config)) => Some(subscribe),
    };
    let (mut stream, unsubscribe) = match { subscribe } {
        Some(Ok(subscribed)) => subscribed,
        Some(Err(e)) => {
            let _ = ready.send(Err(RpcError::Subscription(e.to_string())));
            return;
        }
        None => return,
    };

    let notification = if ready.send(Ok(())).is_err() {
        None
    } else {
        loop {
            let item = tokio::select! {
                _ = sender.closed() => {
                    tracing::debug!(txid = %txid, "Signature subscriber dropped");
                    break None;
                }
                item = stream.next() => item,
            };
            let Some(response) = item else {
                tracing::debug!(txid = %txid, "Pubsub stream ended");
                break None;
            };
            match response.value {
                RpcSignatureResult::ProcessedSignature(result) => {
                    break Some(SignatureNotification {
                        slot: response.context.slot,
                        err: result.err.as_ref().map(TransactionErrorPayload::from_error),
                    });
                }
                RpcSignatureResult::ReceivedSignature(_) => continue,
            }
        }
    };
    drop(stream);

    match notification {
        // The node drops signature subscriptions once they fire.
        Some(notification) => {
            let _ = sender.send(notification);
        }
        None => {
            if timeout(Duration::from_secs(5), unsubscribe()).await.is_err() {
                tracing::debug!(txid = %txid, "Unsubscribe not acknowledged");
            }
        }
    }
    if let Err(e) = client.shutdown().await {
        tracing::debug!(txid = %txid, error = %e, "Pubsub shutdown failed");
    }
}
