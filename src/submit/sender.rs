//! Broadcast, rebroadcast and confirm a signed transaction.
//!
//! # Flow
//! ```text
//! "sending" notification
//!     → initial broadcast (skip preflight); error → SendError::Broadcast
//!     → rebroadcast loop every rebroadcast_interval until resolved or timed out
//!     → confirmation race
//!     → Confirmed: "confirmed" notification with txid
//!     → Failed / TimedOut: simulate, surface the reason, error notification
//! ```
//!
//! Rebroadcasts are detached sends; their results are only logged.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::blockchain::transaction::{self, ensure_signed};
use crate::blockchain::types::TxId;
use crate::blockchain::wallet::WalletAdapter;
use crate::blockchain::{Instruction, Keypair, Transaction};
use crate::config::{ConfirmationConfig, NotificationConfig, SubmitterConfig};
use crate::notify::{Notification, Notifier};
use crate::observability::metrics;
use crate::rpc::{Connection, SendOptions, TransactionErrorPayload};
use crate::submit::confirm::{
    await_signature_confirmation, ConfirmationOutcome, RaceSettings, MIN_INTERVAL,
};
use crate::submit::diagnosis::{simulate_for_diagnosis, Diagnosis};
use crate::submit::race::{stop_channel, StopSignal};
use crate::submit::signing;
use crate::submit::{SendError, SendResult};

/// Per-call overrides of the sender's configured messages and timeout.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub sending_message: Option<String>,
    pub success_message: Option<String>,
    pub timeout: Option<Duration>,
}

impl SubmitOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A transaction the network has accepted for processing.
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub txid: TxId,
    pub transaction: Arc<Transaction>,
    pub started_at: Instant,
}

pub struct TransactionSender {
    connection: Arc<dyn Connection>,
    notifier: Arc<dyn Notifier>,
    confirmation: ConfirmationConfig,
    notifications: NotificationConfig,
}

impl TransactionSender {
    pub fn new(connection: Arc<dyn Connection>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            connection,
            notifier,
            confirmation: ConfirmationConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    pub fn from_config(
        connection: Arc<dyn Connection>,
        notifier: Arc<dyn Notifier>,
        config: &SubmitterConfig,
    ) -> Self {
        Self::new(connection, notifier)
            .with_confirmation(config.confirmation.clone())
            .with_notifications(config.notifications.clone())
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationConfig) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Sign with `signers` and `wallet`, then send and confirm.
    pub async fn send_transaction(
        &self,
        instructions: &[Instruction],
        wallet: &dyn WalletAdapter,
        signers: &[&Keypair],
        options: &SubmitOptions,
    ) -> SendResult<TxId> {
        let signed =
            signing::sign_transaction(self.connection.as_ref(), wallet, instructions, signers)
                .await?;
        self.send_signed_transaction(signed, options).await
    }

    /// Send and confirm a fully signed transaction.
    pub async fn send_signed_transaction(
        &self,
        transaction: Transaction,
        options: &SubmitOptions,
    ) -> SendResult<TxId> {
        ensure_signed(&transaction)?;
        self.submit(Arc::new(transaction), options).await
    }

    /// Send and confirm a bincode-encoded signed transaction.
    pub async fn send_wire_transaction(
        &self,
        raw: &[u8],
        options: &SubmitOptions,
    ) -> SendResult<TxId> {
        let transaction = transaction::deserialize(raw)?;
        self.send_signed_transaction(transaction, options).await
    }

    async fn submit(
        &self,
        transaction: Arc<Transaction>,
        options: &SubmitOptions,
    ) -> SendResult<TxId> {
        let timeout = options
            .timeout
            .unwrap_or(Duration::from_millis(self.confirmation.timeout_ms));
        let sending = options
            .sending_message
            .as_deref()
            .unwrap_or(&self.notifications.sending_message);
        self.notifier.notify(Notification::info(sending));

        let started_at = Instant::now();
        let txid = match self
            .connection
            .send_transaction(&transaction, SendOptions::skip_preflight())
            .await
        {
            Ok(txid) => {
                metrics::record_broadcast("initial", true);
                txid
            }
            Err(e) => {
                metrics::record_broadcast("initial", false);
                let error = SendError::Broadcast(e);
                tracing::error!(error = %error, "Initial broadcast failed");
                self.notifier.notify(Notification::error(error.to_string()));
                return Err(error);
            }
        };
        tracing::info!(
            txid = %txid,
            timeout_ms = timeout.as_millis() as u64,
            "Transaction broadcast"
        );

        let submitted = SubmittedTransaction {
            txid,
            transaction,
            started_at,
        };

        let (stop_tx, stop) = stop_channel();
        let rebroadcaster = tokio::spawn(rebroadcast(
            Arc::clone(&self.connection),
            submitted.clone(),
            Duration::from_millis(self.confirmation.rebroadcast_interval_ms).max(MIN_INTERVAL),
            timeout,
            stop,
        ));

        let settings = RaceSettings {
            timeout,
            poll_interval: Duration::from_millis(self.confirmation.poll_interval_ms),
        };
        let outcome = await_signature_confirmation(
            Arc::clone(&self.connection),
            submitted.txid,
            settings,
        )
        .await;

        stop_tx.send_replace(true);
        if let Err(e) = rebroadcaster.await {
            tracing::warn!(txid = %submitted.txid, error = %e, "Rebroadcast task ended abnormally");
        }

        match outcome {
            ConfirmationOutcome::Confirmed(confirmation) => {
                let latency = submitted.started_at.elapsed();
                metrics::record_confirmation_latency(latency);
                tracing::info!(
                    txid = %submitted.txid,
                    slot = confirmation.slot,
                    source = confirmation.source.as_str(),
                    latency_ms = latency.as_millis() as u64,
                    "Transaction confirmed"
                );
                let success = options
                    .success_message
                    .as_deref()
                    .unwrap_or(&self.notifications.success_message);
                self.notifier
                    .notify(Notification::success(success).with_txid(submitted.txid));
                Ok(submitted.txid)
            }
            ConfirmationOutcome::Failed(err) => self.fail(&submitted, Some(err), timeout).await,
            ConfirmationOutcome::TimedOut => self.fail(&submitted, None, timeout).await,
        }
    }

    async fn fail(
        &self,
        submitted: &SubmittedTransaction,
        network_error: Option<TransactionErrorPayload>,
        timeout: Duration,
    ) -> SendResult<TxId> {
        let diagnosis = if self.confirmation.simulate_on_failure {
            let connection = self.connection.as_ref();
            simulate_for_diagnosis(connection, &submitted.txid, &submitted.transaction).await
        } else {
            Diagnosis::Inconclusive
        };

        let txid = submitted.txid;
        let error = match (diagnosis, network_error) {
            (Diagnosis::ProgramLog(detail), _) => SendError::OnChain { txid, detail },
            (Diagnosis::SimulationError(err), _) | (Diagnosis::Inconclusive, Some(err)) => {
                SendError::OnChain {
                    txid,
                    detail: err.to_string(),
                }
            }
            (Diagnosis::Inconclusive, None) => SendError::Timeout {
                txid,
                timeout_ms: timeout.as_millis() as u64,
            },
        };

        tracing::warn!(txid = %submitted.txid, error = %error, "Transaction not confirmed");
        self.notifier
            .notify(Notification::error(error.to_string()).with_txid(submitted.txid));
        Err(error)
    }
}

async fn rebroadcast(
    connection: Arc<dyn Connection>,
    submitted: SubmittedTransaction,
    interval: Duration,
    timeout: Duration,
    mut stop: StopSignal,
) {
    loop {
        tokio::select! {
            _ = stop.wait() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        if stop.is_stopped() || submitted.started_at.elapsed() >= timeout {
            break;
        }

        let connection = Arc::clone(&connection);
        let transaction = Arc::clone(&submitted.transaction);
        let txid = submitted.txid;
        let send_stop = stop.clone();
        tokio::spawn(async move {
            if send_stop.is_stopped() {
                return;
            }
            let result = connection
                .send_transaction(&transaction, SendOptions::skip_preflight())
                .await;
            metrics::record_broadcast("rebroadcast", result.is_ok());
            if let Err(e) = result {
                tracing::debug!(txid = %txid, error = %e, "Rebroadcast failed");
            }
        });
    }
}
