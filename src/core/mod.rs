pub mod chain;
pub mod classifier;
pub mod proxy;

pub use crate::domain::message::{Direction, MessageTag, MessageType, Phase};
pub use crate::domain::ports::{LedgerClient, Middleware};
pub use crate::utils::error::Result;
