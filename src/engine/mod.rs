// ============================================================================
// Engine Module
// Contains the core matching engine business logic
// ============================================================================

mod matching_engine;
mod order_queue;
mod settlement;
mod submitter;

pub mod factory;

pub use factory::{create_from_config, BookBuilder, OrderBook};
pub use matching_engine::{BookReport, MatchingEngine};
pub use order_queue::OrderQueue;
pub use settlement::{Ledger, LedgerReader, Settlement};
pub use submitter::{OrderSubmitter, SubmitError};
