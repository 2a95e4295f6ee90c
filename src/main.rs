use clap::Parser;
use smart_ocr::config::{Args, Config};
use smart_ocr::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    // Must happen before the runtime starts its worker threads
    config.export_tessdata();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            tracing::info!("Starting smart-ocr v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}:{}", config.host, config.port);

            server::run(config).await
        })
}
