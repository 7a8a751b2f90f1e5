// ============================================================================
// Basic Usage Example
// ============================================================================

use order_book::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;

fn main() {
    println!("=== Order Book Example ===\n");

    let book = BookBuilder::new("ACME")
        .with_outbound_capacity(16)
        .with_event_handler(Arc::new(LoggingEventHandler))
        .build()
        .expect("valid configuration");

    let acme = Arc::new(Asset::new("ACME", "Acme Corp", 1_000_000));
    let sellers: Vec<Arc<Investor>> = (0..3)
        .map(|i| Arc::new(Investor::new(format!("seller_{}", i))))
        .collect();
    let buyer = Arc::new(Investor::new("buyer"));

    let engine = book.engine.spawn().expect("engine thread");

    // Fill subscriber
    let fills = book.fills;
    let subscriber = thread::spawn(move || {
        for order in fills.iter() {
            println!(
                "  Fill: {:?} order {} pending {}/{}",
                order.side,
                order.id,
                order.pending_shares(),
                order.original_shares
            );
        }
    });

    println!("Submitting sell orders...");
    for (i, seller) in sellers.iter().enumerate() {
        let sell = Order::new(
            Arc::clone(seller),
            Arc::clone(&acme),
            Side::Sell,
            Decimal::new(1000 + i as i64 * 10, 2),
            100,
        );
        book.submitter.submit(sell).expect("engine running");
    }

    println!("Submitting a buy order that crosses two levels...");
    let buy = Order::new(
        Arc::clone(&buyer),
        Arc::clone(&acme),
        Side::Buy,
        Decimal::new(1010, 2),
        150,
    );
    book.submitter.submit(buy).expect("engine running");

    drop(book.submitter);
    let report = engine.join().expect("engine thread panicked");
    subscriber.join().expect("subscriber thread panicked");

    println!("\n=== Ledger ===");
    for tx in book.ledger.transactions() {
        println!(
            "  Transaction {}: {} @ {} (total {})",
            tx.id,
            tx.filled_shares(),
            tx.price,
            tx.total()
        );
    }

    println!("\n=== Positions ===");
    println!("  {}: {}", buyer.name, buyer.asset_position(&acme.id));
    for seller in &sellers {
        println!("  {}: {}", seller.name, seller.asset_position(&acme.id));
    }

    println!("\n=== Resting ===");
    for order in report.resting_sells {
        println!("  Sell {} @ {}", order.pending_shares(), order.limit_price);
    }
}
