//! Logger initialization.
//!
//! Library code only uses the `log` facade; `init_logging` installs
//! `env_logger` for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
