//! # Gradebook - Student Grade Tracker
//!
//! The main binary for the gradebook.
//!
//! This application provides:
//! - HTTP API server (axum-based)
//! - CLI interface for managing students and grades
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              apps/gradebook                   │
//! │                                               │
//! │   ┌─────────────┐        ┌─────────────┐      │
//! │   │    CLI      │        │  HTTP API   │      │
//! │   │   (clap)    │        │   (axum)    │      │
//! │   └──────┬──────┘        └──────┬──────┘      │
//! │          └───────────┬──────────┘             │
//! │                      ▼                        │
//! │              ┌────────────────┐               │
//! │              │ gradebook-core │               │
//! │              └────────────────┘               │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! gradebook server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! gradebook add --name "Ana Cruz" --grade "PE=1.25,1.5,1.75,2"
//! gradebook list --subject PE
//! gradebook show 1
//! ```

use clap::Parser;
use gradebook::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // GRADEBOOK_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("GRADEBOOK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gradebook=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  Gradebook v{}
  Quarterly grades, averages, and standing
"#,
        env!("CARGO_PKG_VERSION")
    );
}
