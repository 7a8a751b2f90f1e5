// ============================================================================
// Order Queue
// One side of the book: resting orders ranked by price-time priority
// ============================================================================

use crate::domain::{Order, Side};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Heap entry. The ranking key is copied out of the order at push time; both
/// price and sequence are immutable, so a re-pushed order keeps its place.
#[derive(Debug)]
struct QueueEntry {
    side: Side,
    price: Decimal,
    sequence: u64,
    order: Arc<Order>,
}

impl Ord for QueueEntry {
    /// Greater means higher priority: better price, then earlier sequence
    fn cmp(&self, other: &Self) -> Ordering {
        let by_price = match self.side {
            Side::Buy => self.price.cmp(&other.price),
            Side::Sell => other.price.cmp(&self.price),
        };
        by_price.then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Binary heap over resting orders of one side.
///
/// Buy side: highest price first. Sell side: lowest price first. Ties go to
/// the earliest submission sequence. There is no removal by id; fully filled
/// orders are dropped by the engine when they surface.
#[derive(Debug)]
pub struct OrderQueue {
    side: Side,
    heap: BinaryHeap<QueueEntry>,
}

impl OrderQueue {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            heap: BinaryHeap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Insert an order, O(log n)
    pub fn push(&mut self, order: Arc<Order>) {
        debug_assert_eq!(order.side, self.side, "order pushed onto the wrong side");
        self.heap.push(QueueEntry {
            side: self.side,
            price: order.limit_price,
            sequence: order.submission_sequence(),
            order,
        });
    }

    /// Top of the queue without removing it, O(1)
    pub fn peek_best(&self) -> Option<&Arc<Order>> {
        self.heap.peek().map(|entry| &entry.order)
    }

    /// Remove and return the top of the queue, O(log n)
    pub fn pop_best(&mut self) -> Option<Arc<Order>> {
        self.heap.pop().map(|entry| entry.order)
    }

    /// Best price among entries, stale ones included
    pub fn best_price(&self) -> Option<Decimal> {
        self.heap.peek().map(|entry| entry.price)
    }

    /// Best price among orders with pending shares.
    /// O(1) when the top is live, otherwise one pass over the heap.
    pub fn best_live_price(&self) -> Option<Decimal> {
        match self.heap.peek() {
            Some(top) if top.order.pending_shares() > 0 => Some(top.price),
            Some(_) => self
                .heap
                .iter()
                .filter(|entry| entry.order.pending_shares() > 0)
                .max()
                .map(|entry| entry.price),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Orders that still have pending shares, best first
    pub fn resting(&self) -> Vec<Arc<Order>> {
        let mut entries: Vec<&QueueEntry> = self
            .heap
            .iter()
            .filter(|entry| entry.order.pending_shares() > 0)
            .collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|entry| Arc::clone(&entry.order)).collect()
    }

    /// Pending shares summed per price level, best level first
    pub fn depth(&self, num_levels: usize) -> Vec<(Decimal, u64)> {
        let mut levels: Vec<(Decimal, u64)> = Vec::new();
        for order in self.resting() {
            match levels.last_mut() {
                Some((price, shares)) if *price == order.limit_price => {
                    *shares = shares.saturating_add(order.pending_shares());
                },
                _ => {
                    if levels.len() == num_levels {
                        break;
                    }
                    levels.push((order.limit_price, order.pending_shares()));
                },
            }
        }
        levels
    }
}
