// Offline Card Wallet - Web Server
// REST API with Axum over an in-memory wallet

use anyhow::{Context, Result};
use card_wallet::{api, CardRegistry, Settings};
use log::info;

const ADDR_ENV: &str = "CARD_WALLET_ADDR";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    println!("🌐 Offline Card Wallet - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let settings_path = Settings::default_path();
    let settings = Settings::load(&settings_path)?;
    info!("Loaded settings from {:?}: {:?}", settings_path, settings);

    // Cards live for the lifetime of the process only
    let app = api::router(CardRegistry::new());

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/cards", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
