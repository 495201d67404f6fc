//! # PharmaDesk Terminal
//!
//! An interactive front-end for the billing counter.
//!
//! ## Module Organization
//! ```text
//! pharmadesk_terminal/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── shell.rs        ◄─── Input loop, prompts, toasts
//! ├── commands/       ◄─── Parsing + one handler per command family
//! ├── render.rs       ◄─── Plain-text views
//! └── error.rs        ◄─── ApiError shown to the user
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize logging (stderr, RUST_LOG or "info,pharmadesk=debug")   │
//! │  2. Load ClientConfig (file, then PHARMADESK_* environment)            │
//! │  3. Build AppContext (opens the saved session, if any)                 │
//! │  4. Run the shell on stdin/stdout until "quit" or end of input         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod render;
pub mod shell;

use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pharmadesk_client::{AppContext, ClientConfig};

use crate::shell::Shell;

/// Runs the terminal application.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting PharmaDesk terminal");

    let config = ClientConfig::load_or_default(None);
    let ctx = Arc::new(AppContext::new(config)?);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    Shell::new(ctx).run(stdin, &mut stdout).await?;

    info!("PharmaDesk terminal stopped");
    Ok(())
}

/// Logs go to stderr so they never mix with the shell's output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - everything
/// - `RUST_LOG=pharmadesk_client=trace` - one crate only
/// - Default: `info,pharmadesk=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharmadesk=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
