//! Tracing subscriber setup for binaries and tests embedding the index.
//!
//! The index itself only emits `tracing` events under these targets:
//!
//! * `elastic_bptree::split` - leaf and interior splits (trace)
//! * `elastic_bptree::root` - tree creation, root growth and clears (debug)
//! * `elastic_bptree::arena` - node allocation and release (trace)
//! * `elastic_bptree::stats` - counter snapshots (info)

use tracing_subscriber::EnvFilter;

use crate::types::{IndexError, Result};

/// Filter used when neither `RUST_LOG` nor the caller supplies one.
pub const DEFAULT_FILTER: &str = "elastic_bptree=info";

/// Installs a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `filter`. Returns `Ok(false)` when another global
/// subscriber was installed first.
pub fn init_logging(filter: &str) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|err| IndexError::Config(format!("invalid log filter: {err}")))?,
    };
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .is_ok())
}
