// ============================================================================
// Order Submitter
// Producer half of the inbound order stream
// ============================================================================

use crate::domain::Order;
use crossbeam::channel::Sender;
use std::fmt;

/// Returned when the engine has stopped; carries the rejected order back
#[derive(Debug)]
pub struct SubmitError(pub Order);

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order book is no longer accepting orders (order {})", self.0.id)
    }
}

impl std::error::Error for SubmitError {}

/// Cloneable handle for submitting orders from any thread.
///
/// Arrival order on the channel is the time priority the engine applies.
/// Dropping every submitter closes the stream and ends the matching loop.
#[derive(Debug, Clone)]
pub struct OrderSubmitter {
    sender: Sender<Order>,
}

impl OrderSubmitter {
    pub(crate) fn new(sender: Sender<Order>) -> Self {
        Self { sender }
    }

    /// Append an order to the inbound stream.
    /// Blocks while a bounded stream is full.
    pub fn submit(&self, order: Order) -> Result<(), SubmitError> {
        self.sender
            .send(order)
            .map_err(|err| SubmitError(err.into_inner()))
    }

    /// Orders queued but not yet taken in by the engine
    pub fn backlog(&self) -> usize {
        self.sender.len()
    }
}
