//! Logging setup.
//!
//! Everything logs through the `log` facade with a component target;
//! [`init_logging`] installs `env_logger` for binaries that want it.

mod init;

pub use init::{init_logging, LoggingConfig};
