// ============================================================================
// Order Book Library
// Single-instrument price-time priority matching with transaction settlement
// ============================================================================

//! # Order Book
//!
//! Matching core for one traded asset.
//!
//! ## Features
//!
//! - **Price-time priority**: better price first, then earlier submission
//! - **Symmetric double auction**: incoming buys and sells both cross
//! - **Settlement**: realized fill is `min` of both legs' pending shares,
//!   investor positions move by exactly that amount
//! - **Message passing**: many producers submit over one ordered channel, a
//!   single engine thread owns the queues and the ledger
//!
//! ## Example
//!
//! ```rust
//! use order_book::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let book = BookBuilder::new("ACME").build().unwrap();
//! let acme = Arc::new(Asset::new("ACME", "Acme Corp", 1_000_000));
//! let buyer = Arc::new(Investor::new("buyer"));
//! let seller = Arc::new(Investor::new("seller"));
//!
//! let engine = book.engine.spawn().unwrap();
//!
//! book.submitter
//!     .submit(Order::new(buyer.clone(), acme.clone(), Side::Buy, Decimal::new(1000, 2), 100))
//!     .unwrap();
//! book.submitter
//!     .submit(Order::new(seller.clone(), acme.clone(), Side::Sell, Decimal::new(1000, 2), 100))
//!     .unwrap();
//! drop(book.submitter);
//!
//! let report = engine.join().unwrap();
//! assert_eq!(report.transactions, 1);
//! assert_eq!(buyer.asset_position(&acme.id), 100);
//! assert_eq!(seller.asset_position(&acme.id), -100);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
#[cfg(feature = "logging")]
pub mod logging;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        Asset, AssetId, AssetPosition, BookConfig, Investor, InvestorId, Order, OrderId,
        OrderStatus, PositionOverflow, Side, TradeError, Transaction, TransactionId,
    };
    pub use crate::engine::{
        create_from_config, BookBuilder, BookReport, Ledger, LedgerReader, MatchingEngine,
        OrderBook, OrderQueue, OrderSubmitter, Settlement, SubmitError,
    };
    pub use crate::interfaces::{
        BookEvent, EventHandler, LoggingEventHandler, NoOpEventHandler, RecordingEventHandler,
    };
}
