// ============================================================================
// Order Book Factory
// Wires channels, configuration and event handler into a matching engine
// ============================================================================

use crate::domain::{BookConfig, Order};
use crate::engine::settlement::LedgerReader;
use crate::engine::{MatchingEngine, OrderSubmitter};
use crate::interfaces::{EventHandler, NoOpEventHandler};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Arc;

/// Everything a collaborator needs around one engine
pub struct OrderBook {
    /// The matching loop; call `run` or `spawn`
    pub engine: MatchingEngine,
    /// Inbound order stream producer
    pub submitter: OrderSubmitter,
    /// Outbound post-fill order snapshots, two per transaction
    pub fills: Receiver<Order>,
    /// Read access to the transaction ledger
    pub ledger: LedgerReader,
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates an order book from configuration
///
/// # Example
/// ```
/// use order_book::prelude::*;
/// use std::sync::Arc;
///
/// let config = BookConfig::new("ACME").with_outbound_capacity(64);
/// let book = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(book.engine.config().asset.as_str(), "ACME");
/// ```
pub fn create_from_config(
    config: BookConfig,
    event_handler: Arc<dyn EventHandler>,
) -> Result<OrderBook, String> {
    config.validate()?;

    let (orders_tx, orders_rx) = make_channel(config.inbound_capacity);
    let (fills_tx, fills_rx) = make_channel(config.outbound_capacity);

    let engine = MatchingEngine::new(config, orders_rx, fills_tx, event_handler);
    let ledger = engine.ledger();

    Ok(OrderBook {
        engine,
        submitter: OrderSubmitter::new(orders_tx),
        fills: fills_rx,
        ledger,
    })
}

fn make_channel<T>(capacity: Option<usize>) -> (Sender<T>, Receiver<T>) {
    match capacity {
        Some(capacity) => channel::bounded(capacity),
        None => channel::unbounded(),
    }
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating order books with fluent API
///
/// # Example
/// ```
/// use order_book::prelude::*;
/// use std::sync::Arc;
///
/// let book = BookBuilder::new("ACME")
///     .with_inbound_capacity(1024)
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
/// assert!(book.ledger.is_empty());
/// ```
pub struct BookBuilder {
    config: BookConfig,
    event_handler: Arc<dyn EventHandler>,
}

impl BookBuilder {
    /// Create a new builder for the specified asset
    pub fn new(asset: impl Into<String>) -> Self {
        Self::from_config(BookConfig::new(asset.into()))
    }

    /// Start from an existing configuration
    pub fn from_config(config: BookConfig) -> Self {
        Self {
            config,
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    /// Bound the inbound order channel
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.config.inbound_capacity = Some(capacity);
        self
    }

    /// Bound the outbound fill channel
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = Some(capacity);
        self
    }

    /// Set the engine thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = event_handler;
        self
    }

    /// Build the order book
    pub fn build(self) -> Result<OrderBook, String> {
        create_from_config(self.config, self.event_handler)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &BookConfig {
        &self.config
    }
}
