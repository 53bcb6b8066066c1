//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use tx_submitter::blockchain::types::{Hash, Pubkey, TxId};
use tx_submitter::blockchain::{AccountMeta, Instruction, Keypair, Signer, Transaction};
use tx_submitter::rpc::{
    Connection, RpcError, RpcResult, SendOptions, SignatureNotification, SignatureStatus,
    SignatureSubscription, SimulationResult, TransactionErrorPayload,
};

/// Subscription id handed out by [`start_pubsub_node`].
#[allow(dead_code)]
pub const SUB_ID: u64 = 7;

pub fn mock_blockhash() -> Hash {
    Hash::new_from_array([7; 32])
}

/// A memo-style transaction signed by a fresh keypair.
#[allow(dead_code)]
pub fn signed_tx() -> Transaction {
    let payer = Keypair::new();
    let memo = Instruction::new_with_bytes(
        Pubkey::new_from_array([42; 32]),
        b"gm",
        vec![AccountMeta::new_readonly(payer.pubkey(), true)],
    );
    Transaction::new_signed_with_payer(&[memo], Some(&payer.pubkey()), &[&payer], mock_blockhash())
}

/// Calls observed by a [`MockConnection`], as offsets from its creation.
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    pub sends: Vec<Duration>,
    pub skip_preflight: Vec<bool>,
    pub blockhash_fetches: usize,
    pub simulations: Vec<Duration>,
    pub polls: Vec<Duration>,
}

/// Scripted [`Connection`] driven by tokio's clock.
///
/// Create it at the start of a paused-time test; all offsets are measured
/// from that instant. Broadcasts answer with the transaction's first signature.
pub struct MockConnection {
    created: Instant,
    notification: Option<(Duration, Option<TransactionErrorPayload>)>,
    status: Option<(Duration, SignatureStatus)>,
    simulation: Option<SimulationResult>,
    failing_subscription: bool,
    failing_broadcast: bool,
    log: Mutex<CallLog>,
    held: Mutex<Vec<oneshot::Sender<SignatureNotification>>>,
}

#[allow(dead_code)]
impl MockConnection {
    /// Nothing ever confirms.
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
            notification: None,
            status: None,
            simulation: Some(SimulationResult::default()),
            failing_subscription: false,
            failing_broadcast: false,
            log: Mutex::new(CallLog::default()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// Push a notification at `after`; `err` makes it a failure.
    pub fn notify_after(mut self, after: Duration, err: Option<TransactionErrorPayload>) -> Self {
        self.notification = Some((after, err));
        self
    }

    /// Polls return `status` from `after` on, and no status before.
    pub fn status_after(mut self, after: Duration, status: SignatureStatus) -> Self {
        self.status = Some((after, status));
        self
    }

    /// `None` makes simulation fail.
    pub fn simulation(mut self, simulation: Option<SimulationResult>) -> Self {
        self.simulation = simulation;
        self
    }

    pub fn failing_subscription(mut self) -> Self {
        self.failing_subscription = true;
        self
    }

    pub fn failing_broadcast(mut self) -> Self {
        self.failing_broadcast = true;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.log.lock().unwrap().clone()
    }

    fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> RpcResult<TxId> {
        {
            let mut log = self.log.lock().unwrap();
            log.sends.push(self.elapsed());
            log.skip_preflight.push(options.skip_preflight);
        }
        if self.failing_broadcast {
            return Err(RpcError::Server {
                code: -32002,
                message: "Transaction simulation failed: Blockhash not found".to_string(),
            });
        }
        Ok(transaction.signatures[0])
    }

    async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
        self.log.lock().unwrap().blockhash_fetches += 1;
        Ok(mock_blockhash())
    }

    async fn on_signature(&self, _txid: &TxId) -> RpcResult<SignatureSubscription> {
        if self.failing_subscription {
            return Err(RpcError::Subscription("connection refused".to_string()));
        }

        let (tx, subscription) = SignatureSubscription::channel();
        match self.notification.clone() {
            Some((after, err)) => {
                let at = self.created + after;
                tokio::spawn(async move {
                    tokio::time::sleep_until(at).await;
                    let _ = tx.send(SignatureNotification { slot: 42, err });
                });
            }
            None => self.held.lock().unwrap().push(tx),
        }
        Ok(subscription)
    }

    async fn get_signature_statuses(
        &self,
        txids: &[TxId],
    ) -> RpcResult<Vec<Option<SignatureStatus>>> {
        let elapsed = self.elapsed();
        self.log.lock().unwrap().polls.push(elapsed);
        let status = match &self.status {
            Some((after, status)) if elapsed >= *after => Some(status.clone()),
            _ => None,
        };
        Ok(txids.iter().map(|_| status.clone()).collect())
    }

    async fn simulate_transaction(
        &self,
        _transaction: &Transaction,
    ) -> RpcResult<SimulationResult> {
        self.log.lock().unwrap().simulations.push(self.elapsed());
        self.simulation
            .clone()
            .ok_or_else(|| RpcError::Transport("simulation unavailable".to_string()))
    }
}

#[allow(dead_code)]
pub fn confirmed_status(slot: u64) -> SignatureStatus {
    SignatureStatus {
        slot,
        confirmations: Some(1),
        err: None,
        confirmation_status: None,
    }
}

#[allow(dead_code)]
pub fn failed_status(slot: u64, err: Value) -> SignatureStatus {
    SignatureStatus {
        slot,
        confirmations: Some(1),
        err: Some(TransactionErrorPayload(err)),
        confirmation_status: None,
    }
}

/// Start a JSON-RPC mock node on an ephemeral port.
///
/// `handler` receives each request body and returns the response body.
/// `getVersion` is answered by the node itself.
#[allow(dead_code)]
pub async fn start_rpc_backend<F>(handler: F) -> SocketAddr
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move {
                serve_one(socket, handler.as_ref()).await;
            });
        }
    });

    addr
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn serve_one<F>(mut socket: TcpStream, handler: &F)
where
    F: Fn(Value) -> Value,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let body = &buf[body_start..body_start + content_length];
    let request: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let response = if request["method"] == "getVersion" {
        json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": { "solana-core": "2.1.0", "feature-set": 1 }
        })
    } else {
        handler(request)
    };
    let body = response.to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Start a websocket pubsub mock node on an ephemeral port.
///
/// Every request the node receives is forwarded on the returned channel.
/// `signatureSubscribe` is acknowledged with [`SUB_ID`] and, when given,
/// followed by `notification` as the result of a `signatureNotification`.
/// `signatureUnsubscribe` is acknowledged with `true`.
#[allow(dead_code)]
pub async fn start_pubsub_node(
    notification: Option<Value>,
) -> (SocketAddr, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let seen = seen_tx.clone();
            let notification = notification.clone();
            tokio::spawn(async move {
                serve_pubsub(socket, notification, seen).await;
            });
        }
    });

    (addr, seen_rx)
}

async fn serve_pubsub(
    socket: TcpStream,
    notification: Option<Value>,
    seen: mpsc::UnboundedSender<Value>,
) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let _ = seen.send(request.clone());

        let mut replies = Vec::new();
        match request["method"].as_str() {
            Some("signatureSubscribe") => {
                replies.push(json!({ "jsonrpc": "2.0", "result": SUB_ID, "id": request["id"] }));
                if let Some(result) = &notification {
                    replies.push(json!({
                        "jsonrpc": "2.0",
                        "method": "signatureNotification",
                        "params": { "result": result, "subscription": SUB_ID }
                    }));
                }
            }
            Some("signatureUnsubscribe") => {
                replies.push(json!({ "jsonrpc": "2.0", "result": true, "id": request["id"] }));
            }
            _ => {}
        }

        for reply in replies {
            if ws.send(Message::text(reply.to_string())).await.is_err() {
                return;
            }
        }
    }
}
