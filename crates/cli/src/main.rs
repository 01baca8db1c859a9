use anyhow::Context;
use tokio::io::BufReader;

use stockroom_cli::Console;
use stockroom_infra::{CatalogConfig, CatalogGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = CatalogConfig::from_env().context("failed to read catalog configuration")?;
    let gateway = CatalogGateway::connect(&config)
        .await
        .with_context(|| format!("failed to open catalog at {}", config.database_url))?;

    tracing::info!(database_url = %config.database_url, "console session started");

    let mut console = Console::new(gateway, tokio::io::stdout());
    let session = console.run(BufReader::new(tokio::io::stdin())).await;

    // Release the database on every path out of the loop, then report any console error.
    let (gateway, _) = console.into_parts();
    gateway.shutdown().await;

    session.context("console input/output failed")
}
