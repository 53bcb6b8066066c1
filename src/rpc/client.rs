//! JSON-RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Send requests to the primary endpoint, falling back in order
//! - Enforce a per-request deadline
//! - Map client errors onto [`RpcError`]
//! - Provide health check for node connectivity

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use solana_account_decoder::UiAccountEncoding;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient as NodeClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
    RpcSimulateTransactionConfig,
};
use solana_client::rpc_filter::RpcFilterType;
use solana_client::rpc_request::RpcError as NodeRpcError;
use solana_client::rpc_response::Response;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::UiTransactionEncoding;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{Hash, Pubkey, TxId};
use crate::config::RpcConfig;
use crate::observability::metrics;
use crate::rpc::types::{RpcError, RpcResult, SendOptions, SignatureStatus, SimulationResult};

/// One node the client may talk to.
struct Endpoint {
    url: Url,
    node: Arc<NodeClient>,
}

/// JSON-RPC client wrapper with failover support.
#[derive(Clone)]
pub struct RpcClient {
    /// Primary endpoint followed by failovers.
    endpoints: Arc<Vec<Endpoint>>,
    config: RpcConfig,
    commitment: CommitmentConfig,
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a new client. Invalid failover URLs are skipped with a warning.
    pub fn new(config: RpcConfig) -> RpcResult<Self> {
        let timeout_duration = Duration::from_millis(config.request_timeout_ms);
        let commitment = CommitmentConfig::from(config.commitment);

        let primary: Url = config.url.parse().map_err(|e: url::ParseError| RpcError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        let mut urls = vec![primary];

        for url_str in &config.failover_urls {
            match url_str.parse::<Url>() {
                Ok(url) => urls.push(url),
                Err(e) => {
                    tracing::warn!(url = %url_str, error = %e, "Ignoring invalid failover RPC URL")
                }
            }
        }

        let endpoints: Vec<Endpoint> = urls
            .into_iter()
            .map(|url| Endpoint {
                node: Arc::new(NodeClient::new_with_timeout_and_commitment(
                    url.to_string(),
                    timeout_duration,
                    commitment,
                )),
                url,
            })
            .collect();

        tracing::info!(
            rpc_url = %config.url,
            failovers = endpoints.len() - 1,
            commitment = %config.commitment,
            "RPC client initialized"
        );

        Ok(Self {
            endpoints: Arc::new(endpoints),
            config,
            commitment,
            timeout_duration,
        })
    }

    /// Run `call` against each endpoint in order until one answers.
    ///
    /// Transport failures and timeouts move on to the next endpoint. A
    /// well-formed error answer from a node is returned immediately.
    async fn request<T, F, Fut>(&self, method: &'static str, call: F) -> RpcResult<T>
    where
        F: Fn(Arc<NodeClient>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let attempt = call(Arc::clone(&endpoint.node));
            let error = match timeout(self.timeout_duration, attempt).await {
                Ok(Ok(value)) => {
                    metrics::record_rpc_request(method, "ok");
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => {
                    metrics::record_rpc_request(method, "timeout");
                    tracing::warn!(endpoint_idx = i, method, "RPC timeout, trying next endpoint");
                    continue;
                }
            };

            match classify(method, &error) {
                Some(err) => {
                    let status = match &err {
                        RpcError::Server { .. } => "server_error",
                        _ => "schema_error",
                    };
                    metrics::record_rpc_request(method, status);
                    return Err(err);
                }
                None => {
                    metrics::record_rpc_request(method, "transport_error");
                    tracing::warn!(
                        endpoint_idx = i,
                        endpoint = %endpoint.url,
                        method,
                        error = %error,
                        "RPC error, trying next endpoint"
                    );
                }
            }
        }

        Err(RpcError::AllEndpointsFailed(method.to_string()))
    }

    /// Broadcast a signed transaction.
    pub async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> RpcResult<TxId> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSendTransactionConfig::default()
        };
        self.request("sendTransaction", |node| {
            let transaction = transaction.clone();
            let config = config.clone();
            async move { node.send_transaction_with_config(&transaction, config).await }
        })
        .await
    }

    /// Fetch a recent blockhash at the configured blockhash commitment.
    pub async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
        let commitment = CommitmentConfig::from(self.config.blockhash_commitment);
        let (blockhash, _last_valid_block_height) = self
            .request("getLatestBlockhash", move |node| async move {
                node.get_latest_blockhash_with_commitment(commitment).await
            })
            .await?;
        Ok(blockhash)
    }

    /// Query statuses for a batch of transaction ids, in request order.
    pub async fn get_signature_statuses(
        &self,
        txids: &[TxId],
    ) -> RpcResult<Vec<Option<SignatureStatus>>> {
        const METHOD: &str = "getSignatureStatuses";
        let response = self
            .request(METHOD, |node| {
                let txids = txids.to_vec();
                async move { node.get_signature_statuses(&txids).await }
            })
            .await?;
        if response.value.len() != txids.len() {
            return Err(RpcError::schema(
                METHOD,
                format!("asked for {} statuses, got {}", txids.len(), response.value.len()),
            ));
        }
        Ok(response
            .value
            .into_iter()
            .map(|status| status.map(SignatureStatus::from))
            .collect())
    }

    /// Dry-run a transaction against current state.
    ///
    /// Signatures are not verified and the blockhash is replaced, so a
    /// transaction whose blockhash has expired can still be diagnosed.
    pub async fn simulate_transaction(
        &self,
        transaction: &Transaction,
    ) -> RpcResult<SimulationResult> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .request("simulateTransaction", |node| {
                let transaction = transaction.clone();
                let config = config.clone();
                async move { node.simulate_transaction_with_config(&transaction, config).await }
            })
            .await?;
        Ok(SimulationResult::from(response.value))
    }

    /// Fetch several accounts in one round-trip, in request order.
    pub async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
    ) -> RpcResult<Response<Vec<Option<Account>>>> {
        const METHOD: &str = "getMultipleAccounts";
        let commitment = self.commitment;
        let response = self
            .request(METHOD, |node| {
                let pubkeys = pubkeys.to_vec();
                async move {
                    node.get_multiple_accounts_with_commitment(&pubkeys, commitment)
                        .await
                }
            })
            .await?;
        if response.value.len() != pubkeys.len() {
            return Err(RpcError::schema(
                METHOD,
                format!("asked for {} accounts, got {}", pubkeys.len(), response.value.len()),
            ));
        }
        Ok(response)
    }

    /// Fetch all accounts owned by `program_id` that match every filter.
    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> RpcResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };
        let program_id = *program_id;
        self.request("getProgramAccounts", |node| {
            let config = config.clone();
            async move {
                node.get_program_accounts_with_config(&program_id, config)
                    .await
            }
        })
        .await
    }

    /// Node health as reported by `getHealth`.
    pub async fn get_health(&self) -> RpcResult<()> {
        self.request("getHealth", |node| async move { node.get_health().await })
            .await
    }

    /// Check if the node is reachable and healthy.
    pub async fn is_healthy(&self) -> bool {
        self.get_health().await.is_ok()
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.config.url)
            .field("failover_urls", &self.config.failover_urls)
            .field("timeout_ms", &self.config.request_timeout_ms)
            .finish()
    }
}

/// `None` when the failure is worth retrying on the next endpoint.
fn classify(method: &str, error: &ClientError) -> Option<RpcError> {
    match error.kind() {
        ClientErrorKind::Io(_) => None,
        ClientErrorKind::Reqwest(e) if !e.is_decode() => None,
        ClientErrorKind::RpcError(NodeRpcError::RpcResponseError { code, message, .. }) => {
            Some(RpcError::Server {
                code: *code,
                message: message.clone(),
            })
        }
        _ => Some(RpcError::schema(method, error)),
    }
}
