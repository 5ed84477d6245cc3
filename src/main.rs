use clap::Parser;

use clipsync::bootstrap::{self, tracing::init_tracing_subscriber};
use clipsync::cli::{execute, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = bootstrap::resolve_config(args.config.as_deref())?;
    init_tracing_subscriber(&config.logging.level)?;

    let deps = bootstrap::wire_dependencies(&config).await?;
    execute(args.command, &deps).await
}
