// ============================================================================
// Trade Errors
// Failures when pairing orders into a transaction or settling it
// ============================================================================

use std::fmt;

use super::{AssetId, OrderId, TransactionId};

/// Errors raised while building or settling a transaction.
///
/// None of these are fatal to the engine: the transaction is discarded and
/// matching continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeError {
    /// Both legs refer to the same order
    SameOrder(OrderId),
    /// Buy leg is not a buy order or sell leg is not a sell order
    WrongSide(OrderId),
    /// A leg has no pending shares left at settlement time
    LegClosed(OrderId),
    /// The transaction was already finalized
    AlreadySettled(TransactionId),
    /// Fill quantity does not fit a leg's investor position
    QuantityOverflow(TransactionId),
    /// `price × fill` does not fit a decimal total
    TotalOverflow(TransactionId),
}

impl fmt::Display for TradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeError::SameOrder(id) => write!(f, "order {} cannot trade with itself", id),
            TradeError::WrongSide(id) => {
                write!(f, "order {} is on the wrong side of the transaction", id)
            },
            TradeError::LegClosed(id) => write!(f, "order {} has no pending shares", id),
            TradeError::AlreadySettled(id) => {
                write!(f, "transaction {} is already settled", id)
            },
            TradeError::QuantityOverflow(id) => {
                write!(f, "transaction {} fill quantity overflows a position", id)
            },
            TradeError::TotalOverflow(id) => {
                write!(f, "transaction {} total overflows a decimal", id)
            },
        }
    }
}

impl std::error::Error for TradeError {}

/// A position change that would leave the signed share count out of range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOverflow {
    pub asset: AssetId,
    pub position: i64,
    pub delta: i64,
}

impl fmt::Display for PositionOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position {} in {} cannot move by {}",
            self.position, self.asset, self.delta
        )
    }
}

impl std::error::Error for PositionOverflow {}
