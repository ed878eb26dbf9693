use clap::Parser;
use estate_console::adapters::metrics_handler::MetricsCollector;
use estate_console::address::AddressResolver;
use estate_console::cli::Cli;
use estate_console::config::Settings;
use estate_console::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Estate Console on {}:{}", host, port);

    let metrics = Arc::new(MetricsCollector::new()?);
    let resolver = AddressResolver::from_settings(&settings.address)?.with_metrics(metrics.clone());
    info!(
        providers = ?resolver.provider_names(),
        timeout_seconds = settings.address.timeout_seconds,
        "Address provider chain ready"
    );

    let state = AppState {
        settings: Arc::new(RwLock::new(settings)),
        resolver: Arc::new(resolver),
        metrics,
    };
    let app = estate_console::create_app(state).await;

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
