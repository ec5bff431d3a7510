//! Stream the order book and ticker for a symbol, with order toasts when
//! a session token is available.
//!
//! ```bash
//! cargo run --example watch_market --features native -- BTCUSDT
//! ```

use std::sync::Arc;
use std::time::Duration;

use dwanj_cex_sdk::prelude::*;
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCUSDT".to_string());

    let storage: SharedStore = Arc::new(FileStore::open(".cex-session.json")?);
    let client = CexClientBuilder::from_env().storage(storage).build()?;

    let toasts = ToastBoard::new();
    let mut rt = client.realtime(Arc::new(toasts.clone()));
    rt.connect(symbol.as_str())?;

    let mut events = rt.events();
    let deadline = tokio::time::sleep(Duration::from_secs(60));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.next() => match event {
                Some(WsEvent::Connected) => {
                    if let Some(token) = client.auth().token() {
                        rt.authenticate(token)?;
                    }
                }
                Some(WsEvent::Message(Kind::OrderBook { .. })) => {
                    let book = rt.orderbook();
                    println!(
                        "book  bid {:?}  ask {:?}  spread {:?}",
                        book.best_bid(),
                        book.best_ask(),
                        book.spread()
                    );
                }
                Some(WsEvent::Message(Kind::Ticker { .. })) => {
                    let ticker = rt.ticker();
                    println!("tick  {} ({:?})", ticker.price, ticker.direction());
                }
                Some(WsEvent::Message(Kind::Private { .. })) => {
                    for toast in toasts.visible() {
                        println!("toast [{}] {}", toast.kind, toast.message);
                    }
                }
                Some(WsEvent::Disconnected { .. }) | Some(WsEvent::ConnectionFailed(_)) | None => break,
                Some(_) => {}
            },
        }
    }

    drop(events);
    rt.disconnect().await?;
    Ok(())
}
