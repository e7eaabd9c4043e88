pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Args;

pub use adapters::ledger::HttpLedgerClient;
pub use app::middleware::{DiMiddleware, To2Middleware};
pub use config::toml_config::ProxyConfig;
pub use crate::core::{chain::MiddlewareChain, proxy::ProxyState};
pub use utils::error::{LedgerError, ProxyError, Result};
