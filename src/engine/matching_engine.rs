// ============================================================================
// Matching Engine
// Single-consumer control loop: intake, crossing, settlement, fill emission
// ============================================================================

use crate::domain::{BookConfig, Order, Side, Transaction};
use crate::engine::order_queue::OrderQueue;
use crate::engine::settlement::{Ledger, LedgerReader, Settlement};
use crate::interfaces::{BookEvent, EventHandler};
use chrono::Utc;
use crossbeam::channel::{Receiver, Sender};
use rust_decimal::Decimal;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// State of the book once the inbound stream has closed
#[derive(Debug, Clone)]
pub struct BookReport {
    /// Unfilled buy orders still resting, best first
    pub resting_buys: Vec<Arc<Order>>,
    /// Unfilled sell orders still resting, best first
    pub resting_sells: Vec<Arc<Order>>,
    /// Malformed orders that were never allowed to cross
    pub parked: Vec<Arc<Order>>,
    /// Number of settled transactions
    pub transactions: usize,
}

/// Price-time priority matching engine for one asset.
///
/// Owns both queues and the ledger exclusively; the inbound order channel and
/// the outbound fill channel are its only shared state.
pub struct MatchingEngine {
    config: BookConfig,

    /// Bid side
    buy_orders: OrderQueue,

    /// Ask side
    sell_orders: OrderQueue,

    settlement: Settlement,

    /// Orders rejected as non-marketable at intake
    parked: Vec<Arc<Order>>,

    orders_in: Receiver<Order>,

    fills_out: Sender<Order>,

    event_handler: Arc<dyn EventHandler>,

    /// Last assigned submission sequence
    sequence_counter: u64,

    fills_disconnected: bool,
}

impl MatchingEngine {
    /// Create a new matching engine
    pub fn new(
        config: BookConfig,
        orders_in: Receiver<Order>,
        fills_out: Sender<Order>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            config,
            buy_orders: OrderQueue::new(Side::Buy),
            sell_orders: OrderQueue::new(Side::Sell),
            settlement: Settlement::new(Ledger::new()),
            parked: Vec::new(),
            orders_in,
            fills_out,
            event_handler,
            sequence_counter: 0,
            fills_disconnected: false,
        }
    }

    /// Drain the inbound stream until every submitter is dropped
    pub fn run(mut self) -> BookReport {
        tracing::info!(asset = %self.config.asset, "order book started");

        while let Ok(order) = self.orders_in.recv() {
            self.process(order);
        }

        let report = self.report();
        tracing::info!(
            asset = %self.config.asset,
            transactions = report.transactions,
            resting_buys = report.resting_buys.len(),
            resting_sells = report.resting_sells.len(),
            parked = report.parked.len(),
            "order book stopped"
        );
        report
    }

    /// Run the matching loop on a dedicated named thread
    pub fn spawn(self) -> io::Result<JoinHandle<BookReport>> {
        thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || self.run())
    }

    /// Take in one order and match it as far as it crosses.
    ///
    /// The order rests in its own queue before matching, so a fully filled
    /// incoming order leaves a stale entry behind that is dropped when it
    /// reaches the top.
    pub fn process(&mut self, order: Order) -> Arc<Order> {
        let order = Arc::new(order);
        let mut events = Vec::new();

        self.sequence_counter += 1;
        order.set_submission_sequence(self.sequence_counter);
        events.push(BookEvent::OrderReceived {
            order_id: order.id,
            sequence: self.sequence_counter,
            timestamp: Utc::now(),
        });

        if let Err(reason) = self.check_marketable(&order) {
            tracing::warn!(order_id = %order.id, %reason, "order parked");
            events.push(BookEvent::OrderParked {
                order_id: order.id,
                reason,
                timestamp: Utc::now(),
            });
            self.parked.push(Arc::clone(&order));
            self.event_handler.on_events(events);
            return order;
        }

        self.queue_mut(order.side).push(Arc::clone(&order));
        tracing::debug!(
            order_id = %order.id,
            side = ?order.side,
            price = %order.limit_price,
            shares = order.pending_shares(),
            sequence = self.sequence_counter,
            "order rested"
        );
        events.push(BookEvent::OrderRested {
            order_id: order.id,
            side: order.side,
            price: order.limit_price,
            pending_shares: order.pending_shares(),
            timestamp: Utc::now(),
        });

        self.match_order(&order, &mut events);

        if order.is_filled() {
            events.push(Self::filled_event(&order));
        }

        self.event_handler.on_events(events);
        order
    }

    /// Read handle on the transaction ledger
    pub fn ledger(&self) -> LedgerReader {
        self.settlement.ledger().reader()
    }

    /// Highest live bid
    pub fn best_bid(&self) -> Option<Decimal> {
        self.buy_orders.best_live_price()
    }

    /// Lowest live ask
    pub fn best_ask(&self) -> Option<Decimal> {
        self.sell_orders.best_live_price()
    }

    /// Pending shares per price level, best first
    pub fn depth(&self, side: Side, num_levels: usize) -> Vec<(Decimal, u64)> {
        self.queue(side).depth(num_levels)
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn report(&self) -> BookReport {
        BookReport {
            resting_buys: self.buy_orders.resting(),
            resting_sells: self.sell_orders.resting(),
            parked: self.parked.clone(),
            transactions: self.settlement.ledger().len(),
        }
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn match_order(&mut self, order: &Arc<Order>, events: &mut Vec<BookEvent>) {
        let opposite = order.side.opposite();

        while order.pending_shares() > 0 {
            let marketable = self
                .queue(opposite)
                .peek_best()
                .is_some_and(|best| crosses(order, best));
            if !marketable {
                break;
            }

            let best = match self.queue_mut(opposite).pop_best() {
                Some(best) => best,
                None => break,
            };

            if best.pending_shares() == 0 {
                tracing::debug!(order_id = %best.id, "stale order discarded");
                events.push(BookEvent::StaleOrderDiscarded {
                    order_id: best.id,
                    timestamp: Utc::now(),
                });
                continue;
            }

            // Incoming order trades at the resting order's price
            let price = best.limit_price;
            let (buy_order, sell_order) = match order.side {
                Side::Buy => (Arc::clone(order), Arc::clone(&best)),
                Side::Sell => (Arc::clone(&best), Arc::clone(order)),
            };

            let settled = Transaction::new(buy_order, sell_order, order.pending_shares(), price)
                .and_then(|mut transaction| {
                    self.settlement.settle(&mut transaction)?;
                    Ok(transaction)
                });

            match settled {
                Ok(transaction) => {
                    events.push(BookEvent::TransactionSettled {
                        transaction,
                        timestamp: Utc::now(),
                    });
                    self.emit(&best);
                    self.emit(order);
                },
                Err(error) => {
                    tracing::warn!(
                        order_id = %order.id,
                        resting_order_id = %best.id,
                        %error,
                        "transaction discarded"
                    );
                    events.push(BookEvent::SettlementRejected {
                        error,
                        timestamp: Utc::now(),
                    });
                    if best.pending_shares() > 0 {
                        self.queue_mut(opposite).push(best);
                    }
                    break;
                },
            }

            if best.pending_shares() > 0 {
                self.queue_mut(opposite).push(best);
            } else {
                events.push(Self::filled_event(&best));
            }
        }
    }

    /// Publish a post-fill snapshot. Blocks while a bounded channel is full.
    fn emit(&mut self, order: &Order) {
        if self.fills_out.send(order.clone()).is_err() && !self.fills_disconnected {
            self.fills_disconnected = true;
            tracing::warn!(
                asset = %self.config.asset,
                "fill stream has no subscribers; notifications are not delivered"
            );
        }
    }

    fn check_marketable(&self, order: &Order) -> Result<(), String> {
        if order.limit_price <= Decimal::ZERO {
            return Err("Price must be positive".to_string());
        }

        if order.original_shares == 0 {
            return Err("Shares must be positive".to_string());
        }

        if !order.is_well_formed() {
            return Err("Pending shares exceed original shares".to_string());
        }

        if order.asset.id != self.config.asset {
            return Err(format!(
                "Asset {} is not traded on this book ({})",
                order.asset.id, self.config.asset
            ));
        }

        Ok(())
    }

    fn filled_event(order: &Order) -> BookEvent {
        BookEvent::OrderFilled {
            order_id: order.id,
            total_filled: order.filled_shares(),
            timestamp: Utc::now(),
        }
    }

    fn queue(&self, side: Side) -> &OrderQueue {
        match side {
            Side::Buy => &self.buy_orders,
            Side::Sell => &self.sell_orders,
        }
    }

    fn queue_mut(&mut self, side: Side) -> &mut OrderQueue {
        match side {
            Side::Buy => &mut self.buy_orders,
            Side::Sell => &mut self.sell_orders,
        }
    }
}

/// Whether `resting` can trade against `incoming`
fn crosses(incoming: &Order, resting: &Order) -> bool {
    match incoming.side {
        Side::Buy => resting.limit_price <= incoming.limit_price,
        Side::Sell => resting.limit_price >= incoming.limit_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, Investor, OrderId, TradeError};
    use crate::interfaces::{NoOpEventHandler, RecordingEventHandler};
    use crossbeam::channel;

    struct Harness {
        engine: MatchingEngine,
        fills: Receiver<Order>,
        asset: Arc<Asset>,
        _orders: Sender<Order>,
    }

    impl Harness {
        fn new(handler: Arc<dyn EventHandler>) -> Self {
            let (orders_tx, orders_rx) = channel::unbounded();
            let (fills_tx, fills_rx) = channel::unbounded();
            Self {
                engine: MatchingEngine::new(BookConfig::new("ACME"), orders_rx, fills_tx, handler),
                fills: fills_rx,
                asset: Arc::new(Asset::new("ACME", "Acme Corp", 1_000_000)),
                _orders: orders_tx,
            }
        }

        fn order(&self, investor: &Arc<Investor>, side: Side, price: Decimal, shares: u64) -> Order {
            Order::new(
                Arc::clone(investor),
                Arc::clone(&self.asset),
                side,
                price,
                shares,
            )
        }
    }

    fn resting_ids(orders: &[Arc<Order>]) -> Vec<OrderId> {
        orders.iter().map(|order| order.id).collect()
    }

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_no_cross_rests_both_sides() {
        let mut h = Harness::new(Arc::new(NoOpEventHandler));
        let alice = Arc::new(Investor::new("alice"));

        h.engine.process(h.order(&alice, Side::Sell, price(1100), 100));
        h.engine.process(h.order(&alice, Side::Buy, price(1000), 100));

        assert_eq!(h.engine.best_bid(), Some(price(1000)));
        assert_eq!(h.engine.best_ask(), Some(price(1100)));
        assert!(h.engine.ledger().is_empty());
        assert!(h.fills.try_recv().is_err());
    }

    #[test]
    fn test_sell_crosses_resting_buy() {
        let mut h = Harness::new(Arc::new(NoOpEventHandler));
        let buyer = Arc::new(Investor::new("buyer"));
        let seller = Arc::new(Investor::new("seller"));

        let buy = h.engine.process(h.order(&buyer, Side::Buy, price(1000), 100));
        let sell = h.engine.process(h.order(&seller, Side::Sell, price(1000), 100));

        let ledger = h.engine.ledger();
        assert_eq!(ledger.len(), 1);
        let tx = ledger.last().unwrap();
        assert_eq!(tx.buy_order.id, buy.id);
        assert_eq!(tx.sell_order.id, sell.id);
        assert!(buy.is_filled() && sell.is_filled());
        assert_eq!(h.engine.best_bid(), None);
    }

    #[test]
    fn test_incoming_walks_the_book() {
        let mut h = Harness::new(Arc::new(NoOpEventHandler));
        let maker = Arc::new(Investor::new("maker"));
        let taker = Arc::new(Investor::new("taker"));

        h.engine.process(h.order(&maker, Side::Sell, price(1000), 30));
        h.engine.process(h.order(&maker, Side::Sell, price(1010), 30));
        h.engine.process(h.order(&maker, Side::Sell, price(1020), 30));

        let buy = h.engine.process(h.order(&taker, Side::Buy, price(1010), 100));

        let prices: Vec<Decimal> = h
            .engine
            .ledger()
            .transactions()
            .iter()
            .map(|tx| tx.price)
            .collect();
        assert_eq!(prices, vec![price(1000), price(1010)]);
        assert_eq!(buy.pending_shares(), 40);
        assert_eq!(h.engine.best_bid(), Some(price(1010)));
        assert_eq!(h.engine.best_ask(), Some(price(1020)));
        assert_eq!(taker.asset_position(&h.asset.id), 60);
        assert_eq!(maker.asset_position(&h.asset.id), -60);
    }

    #[test]
    fn test_two_fill_notifications_per_transaction() {
        let mut h = Harness::new(Arc::new(NoOpEventHandler));
        let alice = Arc::new(Investor::new("alice"));
        let bob = Arc::new(Investor::new("bob"));

        let resting = h.engine.process(h.order(&alice, Side::Sell, price(1000), 100));
        let incoming = h.engine.process(h.order(&bob, Side::Buy, price(1000), 40));

        let fills: Vec<Order> = h.fills.try_iter().collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].id, resting.id);
        assert_eq!(fills[0].pending_shares(), 60);
        assert_eq!(fills[1].id, incoming.id);
        assert_eq!(fills[1].pending_shares(), 0);
    }

    #[test]
    fn test_fully_filled_incoming_leaves_stale_entry() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut h = Harness::new(handler.clone());
        let alice = Arc::new(Investor::new("alice"));
        let bob = Arc::new(Investor::new("bob"));

        h.engine.process(h.order(&alice, Side::Sell, price(1000), 50));
        // Rests, fills completely, stays in the buy heap as a stale entry
        h.engine.process(h.order(&bob, Side::Buy, price(1000), 50));
        assert_eq!(h.engine.best_bid(), None);

        // The stale buy surfaces first and is dropped without a transaction
        h.engine.process(h.order(&alice, Side::Sell, price(900), 10));

        assert_eq!(h.engine.ledger().len(), 1);
        assert!(handler
            .events()
            .iter()
            .any(|e| matches!(e, BookEvent::StaleOrderDiscarded { .. })));
        assert_eq!(h.engine.best_ask(), Some(price(900)));
    }

    #[test]
    fn test_malformed_orders_never_cross() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut h = Harness::new(handler.clone());
        let alice = Arc::new(Investor::new("alice"));
        let bob = Arc::new(Investor::new("bob"));

        h.engine.process(h.order(&alice, Side::Buy, price(1000), 100));
        let zero_price = h.engine.process(h.order(&bob, Side::Sell, Decimal::ZERO, 100));
        let zero_shares = h.engine.process(h.order(&bob, Side::Sell, price(900), 0));
        let other_asset = h.engine.process(Order::new(
            Arc::clone(&bob),
            Arc::new(Asset::new("OTHER", "Other Inc", 10)),
            Side::Sell,
            price(900),
            100,
        ));

        assert!(h.engine.ledger().is_empty());
        let report = h.engine.report();
        assert_eq!(
            resting_ids(&report.parked),
            vec![zero_price.id, zero_shares.id, other_asset.id]
        );
        assert_eq!(report.resting_buys.len(), 1);
        assert_eq!(
            handler
                .events()
                .iter()
                .filter(|e| matches!(e, BookEvent::OrderParked { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn test_sequence_follows_arrival() {
        let mut h = Harness::new(Arc::new(NoOpEventHandler));
        let alice = Arc::new(Investor::new("alice"));

        let first = h.engine.process(h.order(&alice, Side::Buy, price(1000), 1));
        let second = h.engine.process(h.order(&alice, Side::Sell, price(2000), 1));

        assert_eq!(first.submission_sequence(), 1);
        assert_eq!(second.submission_sequence(), 2);
    }

    #[test]
    fn test_settled_event_carries_transaction() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut h = Harness::new(handler.clone());
        let alice = Arc::new(Investor::new("alice"));
        let bob = Arc::new(Investor::new("bob"));

        h.engine.process(h.order(&alice, Side::Sell, price(1000), 10));
        h.engine.process(h.order(&bob, Side::Buy, price(1000), 10));

        let settled: Vec<Transaction> = handler
            .events()
            .into_iter()
            .filter_map(|e| match e {
                BookEvent::TransactionSettled { transaction, .. } => Some(transaction),
                _ => None,
            })
            .collect();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].filled_shares(), 10);
        assert_eq!(
            handler
                .events()
                .iter()
                .filter(|e| matches!(e, BookEvent::OrderFilled { .. }))
                .count(),
            2
        );
        assert!(!handler
            .events()
            .iter()
            .any(|e| matches!(
                e,
                BookEvent::SettlementRejected {
                    error: TradeError::LegClosed(_),
                    ..
                }
            )));
    }

    #[test]
    fn test_run_ends_when_stream_closes() {
        let (orders_tx, orders_rx) = channel::bounded(4);
        let (fills_tx, fills_rx) = channel::unbounded();
        let engine = MatchingEngine::new(
            BookConfig::new("ACME"),
            orders_rx,
            fills_tx,
            Arc::new(NoOpEventHandler),
        );
        let asset = Arc::new(Asset::new("ACME", "Acme Corp", 1_000_000));
        let alice = Arc::new(Investor::new("alice"));

        let handle = engine.spawn().unwrap();
        for (side, cents) in [(Side::Buy, 1000), (Side::Sell, 1000), (Side::Sell, 1200)] {
            orders_tx
                .send(Order::new(
                    Arc::clone(&alice),
                    Arc::clone(&asset),
                    side,
                    price(cents),
                    5,
                ))
                .unwrap();
        }
        drop(orders_tx);

        let report = handle.join().unwrap();
        assert_eq!(report.transactions, 1);
        assert!(report.resting_buys.is_empty());
        assert_eq!(report.resting_sells.len(), 1);
        assert_eq!(fills_rx.try_iter().count(), 2);
    }

    #[test]
    fn test_disconnected_fill_stream_does_not_stop_matching() {
        let (_orders_tx, orders_rx) = channel::unbounded();
        let (fills_tx, fills_rx) = channel::unbounded();
        drop(fills_rx);
        let mut engine = MatchingEngine::new(
            BookConfig::new("ACME"),
            orders_rx,
            fills_tx,
            Arc::new(NoOpEventHandler),
        );
        let asset = Arc::new(Asset::new("ACME", "Acme Corp", 1_000_000));
        let alice = Arc::new(Investor::new("alice"));

        for side in [Side::Buy, Side::Sell] {
            engine.process(Order::new(
                Arc::clone(&alice),
                Arc::clone(&asset),
                side,
                price(1000),
                5,
            ));
        }

        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_overflowing_total_leaves_book_intact() {
        let handler = Arc::new(RecordingEventHandler::new());
        let mut h = Harness::new(handler.clone());
        let buyer = Arc::new(Investor::new("buyer"));
        let seller = Arc::new(Investor::new("seller"));
        let shares = i64::MAX as u64;
        let huge = Decimal::from(10_000_000_000u64);

        let buy = h.engine.process(h.order(&buyer, Side::Buy, huge, shares));
        let sell = h.engine.process(h.order(&seller, Side::Sell, huge, shares));

        assert!(handler.events().iter().any(|e| matches!(
            e,
            BookEvent::SettlementRejected {
                error: TradeError::TotalOverflow(_),
                ..
            }
        )));
        assert_eq!(buy.pending_shares(), shares);
        assert_eq!(sell.pending_shares(), shares);
        assert_eq!(buyer.asset_position(&h.asset.id), 0);
        assert_eq!(seller.asset_position(&h.asset.id), 0);
        assert!(h.engine.ledger().is_empty());
        assert!(h.fills.try_recv().is_err());

        // The engine keeps matching ordinary flow
        h.engine.process(h.order(&seller, Side::Sell, price(100), 10));
        assert_eq!(h.engine.ledger().len(), 1);
        assert_eq!(buyer.asset_position(&h.asset.id), 10);
    }
}
