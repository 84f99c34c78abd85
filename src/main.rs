//! Tokenscan - honeypot token scanner
//!
//! Takes a token deployment transaction hash, classifies the deployed
//! bytecode statically, then measures dead blocks and buy fees on a
//! forked chain session.

use tokenscan::{is_transaction_hash, Scanner, ScannerConfig};

use eyre::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const EXAMPLE_HASH: &str = "0xfe898b7b3d151929ae8e96745340e4ced6af6695b994403d178584202c6dc44f";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let tx_hash = match args.get(1) {
        Some(hash) if is_transaction_hash(hash) => hash.clone(),
        _ => {
            eprintln!("Usage : tokenscan [token deploy transaction hash]");
            eprintln!("Example: tokenscan {}", EXAMPLE_HASH);
            std::process::exit(1);
        }
    };

    let config = ScannerConfig::from_env()?;
    let scanner = Scanner::new(config);

    if let Err(e) = scanner.run(&tx_hash).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
