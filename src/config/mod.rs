//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SubmitterConfig (validated, immutable)
//!     → RpcConfig to the connection, ConfirmationConfig to the sender
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ConfirmationConfig;
pub use schema::NotificationConfig;
pub use schema::ObservabilityConfig;
pub use schema::RpcConfig;
pub use schema::SubmitterConfig;
pub use validation::{validate_config, ValidationError};
