use super::common::HandlerContext;
use crate::api::{self, ApiState};
use crate::cli::output::OutputFormatter;
use crate::error::{LostFoundError, Result};
use crate::notify::LocatorBuilder;
use crate::storage::TicketRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const DISPATCH_DRAIN: Duration = Duration::from_secs(10);

/// Handle the serve command
pub fn handle_serve_command(
    host: Option<String>,
    port: Option<u16>,
    ctx: HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = port.unwrap_or(ctx.config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| LostFoundError::Config(format!("Invalid listen address {host}:{port}: {e}")))?;

    let notifier = ctx.notifier()?;
    let locator = LocatorBuilder::new(&ctx.config.notification.base_url);
    let store = Arc::new(ctx.store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lost-found-api")
        .build()?;

    runtime.block_on(async move {
        let dispatcher = notifier.map(|n| n.spawn(store.subscribe_created()));
        formatter.info(&format!("Serving lost-found API on http://{addr}"));

        let state = ApiState {
            repository: Arc::clone(&store) as Arc<dyn TicketRepository>,
            locator,
        };
        let served = api::serve(addr, state).await;

        drop(store);
        if let Some(handle) = dispatcher {
            match tokio::time::timeout(DISPATCH_DRAIN, handle).await {
                Ok(Ok(stats)) => tracing::info!(?stats, "notifications drained"),
                Ok(Err(e)) => tracing::error!(error = %e, "notification task failed"),
                Err(_) => tracing::warn!("gave up waiting for pending notifications"),
            }
        }
        served
    })
}
