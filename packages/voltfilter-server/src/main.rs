use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voltfilter_rs::{process_csv, FilteredSignal, PipelineConfig};
use voltfilter_server::{
    cli::{Cli, Commands, ServeArgs},
    config::ServerConfig,
    create_router,
    state::ServerState,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Filter {
            file,
            output,
            pretty,
            pipeline,
        }) => {
            // Offline runs never bind, so bad server settings only cost the log level
            let config = ServerConfig::from_env().unwrap_or_default();
            init_tracing(&config);
            filter_file(&file, output.as_deref(), pretty, &pipeline.to_config())
        }
        Some(Commands::Serve(args)) => serve(args.apply(ServerConfig::from_env()?)).await,
        None => serve(ServeArgs::default().apply(ServerConfig::from_env()?)).await,
    }
}

fn init_tracing(config: &ServerConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config);

    info!("Starting voltfilter server v{}", VERSION);
    info!("Configuration loaded:");
    info!("   Bind address: {}", config.bind_address());
    info!("   Debug: {}", config.debug);
    info!("   Max upload size: {} bytes", config.max_upload_size);
    info!("   CORS origins: {:?}", config.cors_origins);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let state = Arc::new(ServerState::new(config));
    let app = create_router(state.clone());

    info!("Listening on http://{}", addr);
    info!("Upload endpoint: POST http://{}/upload", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped after {}s", state.uptime_seconds());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn filter_file(
    file: &Path,
    output: Option<&Path>,
    pretty: bool,
    pipeline: &PipelineConfig,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

    let report = process_csv(&bytes, pipeline)
        .with_context(|| format!("failed to filter {}", file.display()))?;
    info!(
        "Filtered {} samples in {:.2}ms",
        report.data.len(),
        report.processing_time_ms
    );

    let signal = FilteredSignal::from(report);
    let json = if pretty {
        serde_json::to_string_pretty(&signal)?
    } else {
        serde_json::to_string(&signal)?
    };

    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
