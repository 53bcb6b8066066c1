//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the submitter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::blockchain::types::Commitment;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Network endpoints and request settings.
    pub rpc: RpcConfig,

    /// Confirmation race timing.
    pub confirmation: ConfirmationConfig,

    /// Messages sent through the notification side channel.
    pub notifications: NotificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC HTTP endpoint.
    pub url: String,

    /// Websocket endpoint. Derived from `url` when empty.
    pub ws_url: String,

    /// Failover JSON-RPC endpoints, tried in order.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Commitment for statuses, subscriptions and simulation.
    pub commitment: Commitment,

    /// Commitment for recent blockhash fetches.
    pub blockhash_commitment: Commitment,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8899".to_string(),
            ws_url: String::new(),
            failover_urls: Vec::new(),
            request_timeout_ms: 10_000,
            commitment: Commitment::Confirmed,
            blockhash_commitment: Commitment::Finalized,
        }
    }
}

impl RpcConfig {
    /// The websocket endpoint.
    ///
    /// When not configured, the HTTP URL is reused with `ws`/`wss` and, if it
    /// names an explicit port, the next port up (8899 → 8900).
    pub fn websocket_url(&self) -> Result<Url, url::ParseError> {
        if !self.ws_url.is_empty() {
            return Url::parse(&self.ws_url);
        }

        let mut url = Url::parse(&self.url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => other,
        }
        .to_string();
        let _ = url.set_scheme(&scheme);
        if let Some(port) = url.port() {
            let _ = url.set_port(Some(port.saturating_add(1)));
        }
        Ok(url)
    }
}

/// Confirmation race configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Overall budget for one submission, in milliseconds.
    pub timeout_ms: u64,

    /// Rebroadcast cadence in milliseconds.
    pub rebroadcast_interval_ms: u64,

    /// Status poll cadence in milliseconds.
    pub poll_interval_ms: u64,

    /// Simulate failed or timed-out transactions to find the cause.
    pub simulate_on_failure: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            rebroadcast_interval_ms: 300,
            poll_interval_ms: 300,
            simulate_on_failure: true,
        }
    }
}

/// Notification message configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Sent when a submission starts.
    pub sending_message: String,

    /// Sent when a submission is confirmed.
    pub success_message: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sending_message: "Sending transaction...".to_string(),
            success_message: "Transaction confirmed".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SubmitterConfig::default();
        assert_eq!(config.confirmation.timeout_ms, 30_000);
        assert_eq!(config.confirmation.rebroadcast_interval_ms, 300);
        assert_eq!(config.confirmation.poll_interval_ms, 300);
        assert_eq!(config.rpc.blockhash_commitment, Commitment::Finalized);
        assert_eq!(config.notifications.sending_message, "Sending transaction...");
    }

    #[test]
    fn test_partial_toml() {
        let config: SubmitterConfig = toml::from_str(
            r#"
            [rpc]
            url = "https://rpc.example.com"
            commitment = "finalized"

            [confirmation]
            timeout_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc.commitment, Commitment::Finalized);
        assert_eq!(config.confirmation.timeout_ms, 5000);
        assert_eq!(config.confirmation.poll_interval_ms, 300);
    }

    #[test]
    fn test_websocket_url_derivation() {
        let config = RpcConfig::default();
        assert_eq!(config.websocket_url().unwrap().as_str(), "ws://127.0.0.1:8900/");

        let config = RpcConfig {
            url: "https://rpc.example.com".to_string(),
            ..RpcConfig::default()
        };
        assert_eq!(config.websocket_url().unwrap().as_str(), "wss://rpc.example.com/");

        let config = RpcConfig {
            ws_url: "ws://localhost:9000".to_string(),
            ..RpcConfig::default()
        };
        assert_eq!(config.websocket_url().unwrap().as_str(), "ws://localhost:9000/");
    }
}
