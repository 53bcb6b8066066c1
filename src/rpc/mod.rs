//! Network boundary.
//!
//! # Data Flow
//! ```text
//! submit/ → Connection (trait)
//!     → RpcConnection
//!         → client.rs (solana-client RpcClient per endpoint, failover, timeouts)
//!         → pubsub.rs (solana-pubsub-client signature subscriptions)
//!     → types.rs (narrowed result types, RpcError)
//! ```
//!
//! # Design Decisions
//! - Client failures are mapped onto `RpcError`; nothing past this layer sees client error types
//! - Node-reported errors are returned as-is and never retried on another endpoint
//! - The submission flow depends only on the `Connection` trait

pub mod client;
pub mod connection;
pub mod pubsub;
pub mod types;

pub use client::RpcClient;
pub use connection::{Connection, RpcConnection};
pub use pubsub::{PubsubClient, SignatureSubscription};
pub use types::{
    RpcError, RpcResult, SendOptions, SignatureNotification, SignatureStatus, SimulationResult,
    TransactionErrorPayload,
};
