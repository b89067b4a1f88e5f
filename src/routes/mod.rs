use std::{path::Path, sync::Arc};

use axum::{Extension, Router};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{config::Config, hub::HubHandle};

pub mod ws;

/// `/ws` for signaling; everything else is a static asset, unknown paths get
/// `index.html`.
pub fn router(static_dir: &Path) -> Router {
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
    Router::new()
        .merge(ws::router())
        .fallback_service(spa)
}

pub fn app(cfg: Arc<Config>, hub: HubHandle) -> Router {
    router(&cfg.static_dir)
        .layer(Extension(hub))
        .layer(Extension(cfg))
        .layer(TraceLayer::new_for_http())
}
