//! Logging setup.
//!
//! The engine only talks to the `log` facade; binaries pick the backend. This
//! module provides the `env_logger` setup the bundled tools use.

mod init;

pub use init::{init_logging, LoggingConfig};
