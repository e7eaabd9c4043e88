// Adapters layer: concrete implementations for external systems.

pub mod ledger;

pub use ledger::HttpLedgerClient;
