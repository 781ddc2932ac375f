//! Example: Register or remove a topic from the command line
//!
//! Run with: cargo run -p vtnpush --example manage_topics -- add anime
//! Or: cargo run -p vtnpush --example manage_topics -- remove anime

use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vtnpush::{Intent, Notice, Session};
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

    let action = env::args().nth(1).unwrap_or_else(|| "add".to_string());
    let topic_id = env::args().nth(2).unwrap_or_else(|| "anime".to_string());

    let provider = Arc::new(MemoryTokenProvider::new(PermissionState::Granted));
    let session = Session::from_config(provider)?;
    session.activate().await;

    let intent = match action.as_str() {
        "add" => Intent::RegisterTopic(topic_id),
        "remove" => Intent::UnregisterTopic(topic_id),
        other => {
            eprintln!("Unknown action: {} (use add or remove)", other);
            std::process::exit(1);
        }
    };

    let outcome = session.dispatch(intent).await;
    for notice in &outcome.notices {
        match notice {
            Notice::Toast(msg) => println!("{}", msg),
            Notice::Alert(msg) => eprintln!("Error: {}", msg),
        }
    }

    println!(
        "\nRegistered topics ({}/{}):",
        outcome.snapshot.registered.len(),
        outcome.snapshot.max_topics
    );
    for topic in &outcome.snapshot.registered {
        println!("  {} ({})", topic.name, topic.id);
    }

    Ok(())
}
