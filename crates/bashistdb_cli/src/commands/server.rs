//! Server command implementation.

use crate::context::Context;
use bashistdb_server::{ServerConfig, SyncServer};
use std::error::Error;
use std::net::SocketAddr;
use tracing::{info, warn};

/// Opens the store and serves until interrupted.
pub fn run(ctx: &Context, bind: SocketAddr, reverse_lookup: bool) -> Result<(), Box<dyn Error>> {
    let key = ctx.shared_key()?;
    let db = ctx.db_path();
    info!("opening store at {:?}", db);
    let store = ctx.open_store()?;

    let config = ServerConfig::new(bind).with_reverse_lookup(reverse_lookup);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let server = SyncServer::bind(config, store, key).await?;
        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
    })?;
    Ok(())
}
