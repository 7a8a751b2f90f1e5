// ============================================================================
// Settlement
// Turns a proposed match into realized fills, position changes and a ledger
// entry
// ============================================================================

use crate::domain::{TradeError, Transaction};
use parking_lot::RwLock;
use std::sync::Arc;

// ============================================================================
// Ledger
// ============================================================================

/// Append-only list of finalized transactions, in settlement order.
///
/// Only the settlement step appends. Collaborators read through a
/// [`LedgerReader`].
#[derive(Debug, Default)]
pub struct Ledger {
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read handle that stays valid while the engine runs
    pub fn reader(&self) -> LedgerReader {
        LedgerReader {
            transactions: Arc::clone(&self.transactions),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    fn append(&self, transaction: Transaction) {
        self.transactions.write().push(transaction);
    }
}

/// Read-only view of a [`Ledger`]
#[derive(Debug, Clone)]
pub struct LedgerReader {
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl LedgerReader {
    /// All finalized transactions, in settlement order
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<Transaction> {
        self.transactions.read().get(index).cloned()
    }

    pub fn last(&self) -> Option<Transaction> {
        self.transactions.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

// ============================================================================
// Settlement
// ============================================================================

/// Settles transactions into the ledger it owns
#[derive(Debug, Default)]
pub struct Settlement {
    ledger: Ledger,
}

impl Settlement {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Settle `transaction` and append it to the ledger.
    ///
    /// The realized quantity is `min(buy pending, sell pending)` read now, not
    /// the proposed `shares`. Both legs are decremented, the buyer's position
    /// grows and the seller's shrinks by that quantity, and the total is
    /// priced at the execution price.
    ///
    /// Returns the realized quantity.
    ///
    /// # Errors
    /// `AlreadySettled` on a second call for the same transaction,
    /// `LegClosed` if either leg has nothing pending, `QuantityOverflow` if
    /// the quantity cannot be applied to a position, `TotalOverflow` if the
    /// total does not fit a `Decimal`. Nothing is mutated on error.
    pub fn settle(&mut self, transaction: &mut Transaction) -> Result<u64, TradeError> {
        if transaction.is_settled() {
            return Err(TradeError::AlreadySettled(transaction.id));
        }

        let buy_order = Arc::clone(&transaction.buy_order);
        let sell_order = Arc::clone(&transaction.sell_order);

        let buying_shares = buy_order.pending_shares();
        if buying_shares == 0 {
            return Err(TradeError::LegClosed(buy_order.id));
        }
        let selling_shares = sell_order.pending_shares();
        if selling_shares == 0 {
            return Err(TradeError::LegClosed(sell_order.id));
        }

        let fill = buying_shares.min(selling_shares);
        let overflow = TradeError::QuantityOverflow(transaction.id);
        let delta = i64::try_from(fill).map_err(|_| overflow)?;
        let total = transaction.notional_value(fill)?;

        let buyer = &buy_order.investor;
        let seller = &sell_order.investor;
        let buy_asset = &buy_order.asset.id;
        let sell_asset = &sell_order.asset.id;
        if Arc::ptr_eq(buyer, seller) && buy_asset == sell_asset {
            // Self-trade nets to zero; only the intermediate step must fit
            buyer.checked_asset_position(buy_asset, delta).map_err(|_| overflow)?;
        } else {
            buyer.checked_asset_position(buy_asset, delta).map_err(|_| overflow)?;
            seller.checked_asset_position(sell_asset, -delta).map_err(|_| overflow)?;
        }

        if !buy_order.try_fill(fill) {
            return Err(TradeError::LegClosed(buy_order.id));
        }
        if !sell_order.try_fill(fill) {
            buy_order.refund(fill);
            return Err(TradeError::LegClosed(sell_order.id));
        }

        // Positions can still move between the check and the update if the
        // investor trades elsewhere; undo the legs in that case.
        if buyer.update_asset_position(buy_asset, delta).is_err() {
            buy_order.refund(fill);
            sell_order.refund(fill);
            return Err(overflow);
        }
        if seller.update_asset_position(sell_asset, -delta).is_err() {
            // Reverses an update that just succeeded, so it fits
            let _ = buyer.update_asset_position(buy_asset, -delta);
            buy_order.refund(fill);
            sell_order.refund(fill);
            return Err(overflow);
        }

        transaction.record_fill(fill, total);
        transaction.close_buy_order();
        transaction.close_sell_order();
        transaction.mark_settled();

        buy_order.record_transaction(transaction.id);
        sell_order.record_transaction(transaction.id);

        tracing::info!(
            transaction_id = %transaction.id,
            buy_order_id = %buy_order.id,
            sell_order_id = %sell_order.id,
            shares = fill,
            price = %transaction.price,
            total = %transaction.total(),
            "transaction settled"
        );

        self.ledger.append(transaction.clone());
        Ok(fill)
    }
}
