//! Log in, top up a test balance, place and cancel a limit order.
//!
//! ```bash
//! CEX_USERNAME=alice CEX_PASSWORD=secret cargo run --example login_and_orders --features native
//! ```

use std::str::FromStr;

use dwanj_cex_sdk::prelude::*;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let username = std::env::var("CEX_USERNAME")?;
    let password = std::env::var("CEX_PASSWORD")?;

    // Token survives restarts in ./.cex-session.json
    let storage: SharedStore = std::sync::Arc::new(FileStore::open(".cex-session.json")?);
    let client = CexClientBuilder::from_env().storage(storage).build()?;

    if !client.auth().is_authenticated() {
        client.auth().login(&username, &password).await?;
    }

    client.wallet().deposit("USDT", Decimal::from(1_000)).await?;
    for balance in client.wallet().balances().await? {
        println!(
            "{:>6}  available {:>14}  frozen {:>14}",
            balance.asset_symbol, balance.available, balance.frozen
        );
    }

    let request = PlaceOrderRequest::limit(
        "BTCUSDT",
        Side::Buy,
        Decimal::from_str("20000")?,
        Decimal::from_str("0.001")?,
    );
    let order = client.orders().place(&request).await?;
    println!("placed #{} {} {}", order.id, order.side, order.status);

    let open = client.orders().open_orders().await?;
    println!("{} open order(s)", open.len());

    client.orders().cancel(order.id).await?;
    println!("cancelled #{}", order.id);

    Ok(())
}
