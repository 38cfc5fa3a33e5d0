// Shopscout CLI: one-shot product search across the configured retailers.
//
// Usage: shopscout <query...>
// Configuration comes from SHOPSCOUT_* environment variables; the result
// aggregate is printed as JSON on stdout.

use anyhow::{Context, Result};
use shopscout::{EngineConfig, SearchEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shopscout=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    // A few leaf modules log through the `log` facade; give them a sink.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let query: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        eprintln!("usage: shopscout <query...>");
        std::process::exit(2);
    }

    let config = EngineConfig::from_env().context("invalid configuration")?;
    let engine = SearchEngine::new(config).context("failed to build engine")?;
    engine.start().await;

    let result = engine.search(&query).await;

    // Shut browsers down before reporting so Chrome never outlives us.
    engine.shutdown().await;

    let result = result.context("search failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
