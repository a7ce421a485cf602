//! Log setup.
//!
//! The filter comes from `TWIN_LOG`, then `RUST_LOG`, then defaults to `info`.
//! Installing twice is harmless; the first subscriber stays.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TWIN_LOG";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
