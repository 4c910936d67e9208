// ============================================================================
// Basic Usage Example
// ============================================================================

use bytes::Bytes;
use dex_matching_engine::prelude::*;
use dex_matching_engine::telemetry;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    telemetry::init_tracing_with("dex_matching_engine=debug");

    println!("=== DEX Matching Engine Example ===\n");

    let store = Arc::new(InMemoryOrderBookStore::new());
    let bus = Arc::new(InMemoryMessageBus::new());

    let engine = MatchingEngineBuilder::new()
        .with_pair(PairConfig::new("WETH", "DAI").with_tick_size(Decimal::new(1, 2)))
        .per_pair_locking()
        .build(store, bus.clone())?;

    // Print every response as a websocket notification
    let printer = handler_fn(|response: Response| async move {
        let notification = WebsocketMessage::from_response(&response);
        println!(
            "  [{}] {} {}",
            notification.channel,
            notification.event.event_type,
            notification.event.hash.unwrap_or_default()
        );
        Ok::<(), HandlerError>(())
    });
    engine.subscribe_response_queue(Arc::new(printer)).await?;
    engine.start().await?;

    println!("Started matching engine for WETH/DAI\n");

    let pair = Pair::new("WETH", "DAI");
    let mut intents = Vec::new();

    // Sell orders at different prices
    for i in 0i64..5 {
        intents.push(Order::new(
            format!("0xseller{}", i),
            pair.clone(),
            Side::Sell,
            Decimal::from(2000 + i * 10),
            Decimal::ONE,
        ));
    }

    // Buy orders below the asks
    for i in 0i64..5 {
        intents.push(Order::new(
            format!("0xbuyer{}", i),
            pair.clone(),
            Side::Buy,
            Decimal::from(1990 - i * 10),
            Decimal::ONE,
        ));
    }

    println!("Publishing order intents...");
    for order in &intents {
        let body = OrderMessage::new_order(order)
            .and_then(|m| m.to_vec())
            .map_err(|e| EngineError::decode("order", e))?;
        bus.publish(DEFAULT_ORDER_QUEUE, Bytes::from(body)).await?;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("\n=== Order Book Snapshot ===");
    let snapshot = engine.get_order_book(&pair).await?;

    println!("\nBids:");
    for level in &snapshot.bids {
        println!("  {} @ {}", level.amount, level.price);
    }

    println!("\nAsks:");
    for level in &snapshot.asks {
        println!("  {} @ {}", level.amount, level.price);
    }

    println!("\nSpread: {:?}", snapshot.spread());
    println!("Mid Price: {:?}", snapshot.mid_price());

    // Crosses the first 3 ask levels
    println!("\n=== Submitting Marketable Order ===");
    let taker = Order::new("0xtaker", pair.clone(), Side::Buy, Decimal::from(2020), Decimal::from(2));
    let responses = engine.new_order(taker).await?;

    println!("\nResponses generated:");
    for response in &responses {
        match response {
            Response::OrderAccepted { trade, .. } => {
                println!("  Trade: {} @ {} (amount: {})", trade.id, trade.price, trade.amount);
            },
            Response::OrderFilled { order } => {
                println!("  Order {} filled", order.hash);
            },
            _ => {},
        }
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Final snapshot
    println!("\n=== Final Order Book ===");
    let final_snapshot = engine.get_order_book(&pair).await?;
    println!("Bids: {} levels", final_snapshot.bids.len());
    println!("Asks: {} levels", final_snapshot.asks.len());
    println!("Spread: {:?}", final_snapshot.spread());

    engine.shutdown().await;
    Ok(())
}
