//! The network capability used by the submission flow.

use async_trait::async_trait;
use solana_sdk::transaction::Transaction;

use crate::blockchain::types::{Hash, TxId};
use crate::config::RpcConfig;
use crate::rpc::client::RpcClient;
use crate::rpc::pubsub::{PubsubClient, SignatureSubscription};
use crate::rpc::types::{RpcResult, SendOptions, SignatureStatus, SimulationResult};

/// Operations the submission flow needs from the network.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Broadcast a signed transaction.
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> RpcResult<TxId>;

    /// Fetch a recency token for new transactions.
    async fn get_latest_blockhash(&self) -> RpcResult<Hash>;

    /// Subscribe once to the status of `txid`.
    async fn on_signature(&self, txid: &TxId) -> RpcResult<SignatureSubscription>;

    /// Poll statuses for a batch of ids, in request order.
    async fn get_signature_statuses(
        &self,
        txids: &[TxId],
    ) -> RpcResult<Vec<Option<SignatureStatus>>>;

    /// Dry-run a transaction against current state.
    async fn simulate_transaction(&self, transaction: &Transaction) -> RpcResult<SimulationResult>;
}

/// [`Connection`] over HTTP JSON-RPC plus websocket pubsub.
#[derive(Debug, Clone)]
pub struct RpcConnection {
    client: RpcClient,
    pubsub: PubsubClient,
}

impl RpcConnection {
    pub fn new(config: RpcConfig) -> RpcResult<Self> {
        let pubsub = PubsubClient::from_config(&config)?;
        let client = RpcClient::new(config)?;
        Ok(Self { client, pubsub })
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl Connection for RpcConnection {
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> RpcResult<TxId> {
        self.client.send_transaction(transaction, options).await
    }

    async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
        self.client.get_latest_blockhash().await
    }

    async fn on_signature(&self, txid: &TxId) -> RpcResult<SignatureSubscription> {
        self.pubsub.signature_subscribe(txid).await
    }

    async fn get_signature_statuses(
        &self,
        txids: &[TxId],
    ) -> RpcResult<Vec<Option<SignatureStatus>>> {
        self.client.get_signature_statuses(txids).await
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> RpcResult<SimulationResult> {
        self.client.simulate_transaction(transaction).await
    }
}
