// ============================================================================
// Transaction Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::{Order, Side, TradeError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A matched trade between one buy order and one sell order
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,

    pub buy_order: Arc<Order>,

    pub sell_order: Arc<Order>,

    /// Quantity proposed when the cross was detected
    pub shares: u64,

    /// Execution price (the resting order's limit)
    pub price: Decimal,

    /// Time the cross was detected
    pub timestamp: DateTime<Utc>,

    filled_shares: u64,
    total: Decimal,
    buy_order_pending_shares_at_close: Option<u64>,
    sell_order_pending_shares_at_close: Option<u64>,
    settled: bool,
}

impl Transaction {
    /// Pair a buy leg with a sell leg.
    ///
    /// # Errors
    /// `SameOrder` if both legs are one order, `WrongSide` if a leg sits on
    /// the wrong side.
    pub fn new(
        buy_order: Arc<Order>,
        sell_order: Arc<Order>,
        shares: u64,
        price: Decimal,
    ) -> Result<Self, TradeError> {
        if buy_order.id == sell_order.id || Arc::ptr_eq(&buy_order, &sell_order) {
            return Err(TradeError::SameOrder(buy_order.id));
        }
        if buy_order.side != Side::Buy {
            return Err(TradeError::WrongSide(buy_order.id));
        }
        if sell_order.side != Side::Sell {
            return Err(TradeError::WrongSide(sell_order.id));
        }

        Ok(Self {
            id: TransactionId::new(),
            buy_order,
            sell_order,
            shares,
            price,
            timestamp: Utc::now(),
            filled_shares: 0,
            total: Decimal::ZERO,
            buy_order_pending_shares_at_close: None,
            sell_order_pending_shares_at_close: None,
            settled: false,
        })
    }

    /// Realized quantity; zero until settled
    pub fn filled_shares(&self) -> u64 {
        self.filled_shares
    }

    /// `filled_shares × price`; zero until settled
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn buy_order_pending_shares_at_close(&self) -> Option<u64> {
        self.buy_order_pending_shares_at_close
    }

    pub fn sell_order_pending_shares_at_close(&self) -> Option<u64> {
        self.sell_order_pending_shares_at_close
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Value of `shares` at the execution price
    ///
    /// # Errors
    /// `TotalOverflow` if the product does not fit a `Decimal`.
    pub fn notional_value(&self, shares: u64) -> Result<Decimal, TradeError> {
        self.price
            .checked_mul(Decimal::from(shares))
            .ok_or(TradeError::TotalOverflow(self.id))
    }

    pub(crate) fn record_fill(&mut self, filled_shares: u64, total: Decimal) {
        self.filled_shares = filled_shares;
        self.total = total;
    }

    pub(crate) fn close_buy_order(&mut self) {
        self.buy_order_pending_shares_at_close = Some(self.buy_order.pending_shares());
    }

    pub(crate) fn close_sell_order(&mut self) {
        self.sell_order_pending_shares_at_close = Some(self.sell_order.pending_shares());
    }

    pub(crate) fn mark_settled(&mut self) {
        self.settled = true;
    }
}
