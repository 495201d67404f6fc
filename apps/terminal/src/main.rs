//! # PharmaDesk Terminal Entry Point
//!
//! The actual setup is in lib.rs so it can be tested.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match pharmadesk_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pharmadesk: {}", e);
            ExitCode::FAILURE
        }
    }
}
