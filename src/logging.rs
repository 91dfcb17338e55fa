//! Logger setup for the binary.

use flexi_logger::{Logger, LoggerHandle};

/// Start logging to stderr at `level`, unless `RUST_LOG` is set.
///
/// Stdout carries protocol replies, so nothing is logged there. The returned
/// handle must stay alive for as long as logging is wanted.
pub fn init_logging(level: &str) -> anyhow::Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()?;
    Ok(handle)
}
