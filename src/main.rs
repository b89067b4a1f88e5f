use std::sync::Arc;

use streamy_server::{config::Config, error::AppResult, hub, routes, state::Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cfg = Arc::new(Config::from_env()?);
    let (hub, _hub_task) = hub::spawn(Registry::new(cfg.history_limit));

    let app = routes::app(cfg.clone(), hub);

    let listener = tokio::net::TcpListener::bind(cfg.addr()).await?;
    tracing::info!(
        "Streamy signaling v{} on http://{} (static: {})",
        env!("CARGO_PKG_VERSION"),
        cfg.addr(),
        cfg.static_dir.display()
    );
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn init_logging() {
    // RUST_LOG wins over the default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "streamy_server=info,tower_http=info".into());

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
