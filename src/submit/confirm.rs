//! Confirmation racer.
//!
//! # Race
//! ```text
//! await_signature_confirmation
//!     ├─ listener   subscribe once; notification → Failed | Confirmed
//!     ├─ poll loop  every poll_interval: status query (detached)
//!     │               err → Failed, confirmed → Confirmed, else keep going
//!     └─ timer      timeout → TimedOut
//! first resolution wins (race::Resolver), stop signal ends both loops,
//! loops are joined before returning.
//! ```
//!
//! # Best effort
//! Each status query runs in its own detached task so a slow RPC call never
//! delays the poll cadence. A query checks the stop signal before it is
//! issued; its result is dropped if the race has already resolved. A query
//! in flight at resolution is not cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::blockchain::types::TxId;
use crate::config::ConfirmationConfig;
use crate::observability::metrics;
use crate::rpc::{Connection, TransactionErrorPayload};
use crate::submit::race::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationSource {
    Subscription,
    Polling,
}

impl ConfirmationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSource::Subscription => "subscription",
            ConfirmationSource::Polling => "polling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub source: ConfirmationSource,
    pub slot: u64,
    /// Confirmation depth, when reported by a status poll.
    pub confirmations: Option<u64>,
}

/// Terminal result of one confirmation race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed(Confirmation),
    Failed(TransactionErrorPayload),
    TimedOut,
}

impl ConfirmationOutcome {
    fn label(&self) -> &'static str {
        match self {
            ConfirmationOutcome::Confirmed(_) => "confirmed",
            ConfirmationOutcome::Failed(_) => "failed",
            ConfirmationOutcome::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(300),
        }
    }
}

impl From<&ConfirmationConfig> for RaceSettings {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Floor for loop intervals; a zero period would spin or panic the ticker.
pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(1);

type Resolution = (ConfirmationOutcome, &'static str);

/// Race the subscription, the poll loop and the timer for `txid`.
pub async fn await_signature_confirmation(
    connection: Arc<dyn Connection>,
    txid: TxId,
    settings: RaceSettings,
) -> ConfirmationOutcome {
    let (resolver, outcome_rx) = Resolver::<Resolution>::new();

    let mut tasks = JoinSet::new();
    tasks.spawn(listen(
        Arc::clone(&connection),
        txid,
        Arc::clone(&resolver),
    ));
    tasks.spawn(poll(
        connection,
        txid,
        settings.poll_interval,
        Arc::clone(&resolver),
    ));

    let mut stop = resolver.stop_signal();
    tokio::select! {
        _ = tokio::time::sleep(settings.timeout) => {
            if resolver.resolve((ConfirmationOutcome::TimedOut, "timer")) {
                tracing::debug!(
                    txid = %txid,
                    timeout_ms = settings.timeout.as_millis() as u64,
                    "Confirmation timer fired"
                );
            }
        }
        _ = stop.wait() => {}
    }

    let (outcome, source) = outcome_rx
        .await
        .unwrap_or((ConfirmationOutcome::TimedOut, "timer"));

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::warn!(txid = %txid, error = %e, "Confirmation task ended abnormally");
        }
    }

    metrics::record_confirmation_outcome(outcome.label(), source);
    tracing::debug!(txid = %txid, outcome = outcome.label(), source, "Confirmation race resolved");
    outcome
}

async fn listen(
    connection: Arc<dyn Connection>,
    txid: TxId,
    resolver: Arc<Resolver<Resolution>>,
) {
    let mut stop = resolver.stop_signal();

    let subscription = tokio::select! {
        _ = stop.wait() => return,
        result = connection.on_signature(&txid) => match result {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(
                    txid = %txid,
                    error = %e,
                    "Signature subscription failed, relying on polling"
                );
                return;
            }
        },
    };

    let notification = tokio::select! {
        _ = stop.wait() => return,
        notification = subscription.recv() => notification,
    };

    let Some(notification) = notification else {
        tracing::debug!(txid = %txid, "Subscription closed without a notification");
        return;
    };

    let source = ConfirmationSource::Subscription;
    let outcome = match notification.err {
        Some(err) => {
            tracing::debug!(txid = %txid, error = %err, "Subscription reported failure");
            ConfirmationOutcome::Failed(err)
        }
        None => ConfirmationOutcome::Confirmed(Confirmation {
            source,
            slot: notification.slot,
            confirmations: None,
        }),
    };
    resolver.resolve((outcome, source.as_str()));
}

async fn poll(
    connection: Arc<dyn Connection>,
    txid: TxId,
    interval: Duration,
    resolver: Arc<Resolver<Resolution>>,
) {
    let mut stop = resolver.stop_signal();
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.wait() => break,
            _ = ticker.tick() => {}
        }
        if stop.is_stopped() {
            break;
        }
        tokio::spawn(query_status(
            Arc::clone(&connection),
            txid,
            Arc::clone(&resolver),
        ));
    }
}

async fn query_status(
    connection: Arc<dyn Connection>,
    txid: TxId,
    resolver: Arc<Resolver<Resolution>>,
) {
    if resolver.is_done() {
        return;
    }

    let status = match connection
        .get_signature_statuses(std::slice::from_ref(&txid))
        .await
    {
        Ok(statuses) => statuses.into_iter().next().flatten(),
        Err(e) => {
            if !resolver.is_done() {
                tracing::warn!(txid = %txid, error = %e, "Signature status poll failed");
            }
            return;
        }
    };

    let Some(status) = status else {
        tracing::trace!(txid = %txid, "No status yet");
        return;
    };

    let source = ConfirmationSource::Polling;
    if let Some(err) = status.err {
        tracing::debug!(txid = %txid, error = %err, "Status poll reported failure");
        resolver.resolve((ConfirmationOutcome::Failed(err), source.as_str()));
    } else if !status.is_confirmed() {
        tracing::trace!(txid = %txid, slot = status.slot, "Status has no confirmations yet");
    } else {
        resolver.resolve((
            ConfirmationOutcome::Confirmed(Confirmation {
                source,
                slot: status.slot,
                confirmations: status.confirmations,
            }),
            source.as_str(),
        ));
    }
}
