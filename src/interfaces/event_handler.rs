// ============================================================================
// Event Handler Interface
// Defines the contract for observing the matching loop
// ============================================================================

use crate::domain::{OrderId, Side, TradeError, Transaction};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Events emitted by the matching engine
#[derive(Debug, Clone)]
pub enum BookEvent {
    /// Order taken off the inbound stream and sequenced
    OrderReceived {
        order_id: OrderId,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// Order placed in its side's queue
    OrderRested {
        order_id: OrderId,
        side: Side,
        price: Decimal,
        pending_shares: u64,
        timestamp: DateTime<Utc>,
    },

    /// Malformed order kept out of the queues; it never crosses
    OrderParked {
        order_id: OrderId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Fully filled entry popped from a queue and dropped
    StaleOrderDiscarded {
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    },

    /// Transaction finalized and appended to the ledger
    TransactionSettled {
        transaction: Transaction,
        timestamp: DateTime<Utc>,
    },

    /// Proposed transaction discarded
    SettlementRejected {
        error: TradeError,
        timestamp: DateTime<Utc>,
    },

    /// Order has no pending shares left
    OrderFilled {
        order_id: OrderId,
        total_filled: u64,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing matching engine events.
/// Implementations can handle logging, metrics, auditing, etc.
pub trait EventHandler: Send + Sync {
    /// Handle a book event
    fn on_event(&self, event: BookEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<BookEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: BookEvent) {}
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: BookEvent) {
        tracing::debug!("Order book event: {:?}", event);
    }
}

/// Keeps every event in memory, in emission order
#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<BookEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BookEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventHandler for RecordingEventHandler {
    fn on_event(&self, event: BookEvent) {
        self.events.lock().push(event);
    }

    fn on_events(&self, events: Vec<BookEvent>) {
        self.events.lock().extend(events);
    }
}
