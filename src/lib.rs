//! Transaction submission and confirmation for Solana-style JSON-RPC networks.

pub mod accounts;
pub mod blockchain;
pub mod config;
pub mod notify;
pub mod observability;
pub mod rpc;
pub mod submit;

pub use config::SubmitterConfig;
pub use rpc::{Connection, RpcConnection};
pub use submit::{SendError, SendResult, SubmitOptions, TransactionSender};
