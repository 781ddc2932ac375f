//! Example: Activate a subscription session and print its state
//!
//! Run with: cargo run -p vtnpush --example activate_session
//!
//! Uses the in-memory token provider, so this works without a real push
//! environment; the server side still needs to be reachable at the
//! configured base URL for the views to populate.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vtnpush::Session;
use vtntoken::{MemoryTokenProvider, PermissionState};

/// Console logging driven by the `host.logger` config section
fn init_logging(config: &vtnconfig::Config) {
    if !config.get_log_enable_console().unwrap_or(true) {
        return;
    }
    let level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "INFO".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = vtnconfig::get_config();
    init_logging(&config);

    let provider = Arc::new(MemoryTokenProvider::new(PermissionState::Granted));
    let session = Session::from_config(provider)?;

    println!("Activating session...\n");
    let snapshot = session.activate().await;

    println!("Phase: {:?}", snapshot.phase);
    println!("Song notifications: {}", snapshot.preferences.song);
    println!("Info notifications: {}", snapshot.preferences.info);

    println!(
        "\n=== Registered topics ({}/{}) ===",
        snapshot.registered.len(),
        snapshot.max_topics
    );
    for topic in &snapshot.registered {
        println!("  {} ({})", topic.name, topic.id);
    }

    println!("\n=== Available topics ===");
    for topic in snapshot.catalog_available() {
        println!("  {} ({})", topic.name, topic.id);
    }

    if snapshot.degraded.any() {
        println!("\nSome views could not be loaded: {:?}", snapshot.degraded);
    }

    Ok(())
}
