// ============================================================================
// Order Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::{Asset, Investor, TransactionId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// An order is open while it has pending shares and closed once fully filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderStatus {
    Open,
    Closed,
}

/// Sequence value of an order the engine has not taken in yet
pub const UNSEQUENCED: u64 = 0;

// ============================================================================
// Order Entity
// ============================================================================

/// Limit order for a single asset.
///
/// Identity, price and size are fixed at creation. Fill state lives in atomics
/// so one `Arc<Order>` can be held by the queues, the ledger and collaborators
/// at once; only settlement decrements `pending_shares`.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub limit_price: Decimal,
    pub original_shares: u64,
    pub investor: Arc<Investor>,
    pub asset: Arc<Asset>,
    pub timestamp: DateTime<Utc>,

    pending_shares: AtomicU64,
    submission_sequence: AtomicU64,
    transactions: Mutex<SmallVec<[TransactionId; 4]>>,
}

impl Order {
    pub fn new(
        investor: Arc<Investor>,
        asset: Arc<Asset>,
        side: Side,
        limit_price: Decimal,
        shares: u64,
    ) -> Self {
        Self {
            id: OrderId::new(),
            side,
            limit_price,
            original_shares: shares,
            investor,
            asset,
            timestamp: Utc::now(),
            pending_shares: AtomicU64::new(shares),
            submission_sequence: AtomicU64::new(UNSEQUENCED),
            transactions: Mutex::new(SmallVec::new()),
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn pending_shares(&self) -> u64 {
        self.pending_shares.load(Ordering::Acquire)
    }

    pub fn filled_shares(&self) -> u64 {
        self.original_shares.saturating_sub(self.pending_shares())
    }

    pub fn submission_sequence(&self) -> u64 {
        self.submission_sequence.load(Ordering::Acquire)
    }

    pub fn status(&self) -> OrderStatus {
        if self.is_filled() {
            OrderStatus::Closed
        } else {
            OrderStatus::Open
        }
    }

    pub fn is_filled(&self) -> bool {
        self.pending_shares() == 0
    }

    /// Transactions this order took part in, in settlement order
    pub fn transactions(&self) -> Vec<TransactionId> {
        self.transactions.lock().to_vec()
    }

    /// Positive price and size, and pending shares within the original size
    pub fn is_well_formed(&self) -> bool {
        self.limit_price > Decimal::ZERO
            && self.original_shares > 0
            && self.pending_shares() <= self.original_shares
    }

    // ========================================================================
    // Mutation (engine and settlement only)
    // ========================================================================

    pub(crate) fn set_submission_sequence(&self, seq: u64) {
        self.submission_sequence.store(seq, Ordering::Release);
    }

    /// Decrement pending shares by `shares`.
    /// Returns false and leaves the order untouched if fewer are pending.
    pub(crate) fn try_fill(&self, shares: u64) -> bool {
        self.pending_shares
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                pending.checked_sub(shares)
            })
            .is_ok()
    }

    /// Undo a fill whose counter-leg could not be applied
    pub(crate) fn refund(&self, shares: u64) {
        self.pending_shares.fetch_add(shares, Ordering::AcqRel);
    }

    pub(crate) fn record_transaction(&self, id: TransactionId) {
        self.transactions.lock().push(id);
    }
}

// Clone takes a point-in-time snapshot of the fill state
impl Clone for Order {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            side: self.side,
            limit_price: self.limit_price,
            original_shares: self.original_shares,
            investor: Arc::clone(&self.investor),
            asset: Arc::clone(&self.asset),
            timestamp: self.timestamp,
            pending_shares: AtomicU64::new(self.pending_shares()),
            submission_sequence: AtomicU64::new(self.submission_sequence()),
            transactions: Mutex::new(self.transactions.lock().clone()),
        }
    }
}
