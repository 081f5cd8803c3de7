//! Dashboard Module
//!
//! REST API over the premium aggregator for a local monitoring UI.
//! Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use anyhow::Context;
use std::sync::Arc;

use crate::oracle::PremiumAggregator;

/// Start the dashboard server
pub async fn start_server(aggregator: Arc<PremiumAggregator>, bind_addr: &str) -> anyhow::Result<()> {
    let app = create_router(aggregator);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind dashboard on {bind_addr}"))?;

    tracing::info!("Dashboard API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Dashboard server error")?;

    Ok(())
}
