//! The accept loop.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::ConnectionHandler;
use crate::rlookup::{spawn_reverse_lookup, ReverseResolver, SystemResolver};
use bashistdb_protocol::SharedKey;
use bashistdb_store::Store;
use chrono::Utc;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, info_span, warn, Span};

/// Pause after a failed accept. Errors such as running out of file
/// descriptors persist until some connection closes.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The sync server.
///
/// Every accepted connection is logged, optionally reverse-resolved, and
/// handled on its own task. Connections never share state except the store.
pub struct SyncServer {
    listener: TcpListener,
    store: Store,
    key: Arc<SharedKey>,
    resolver: Option<Arc<dyn ReverseResolver>>,
    span: Span,
}

impl SyncServer {
    /// Binds the listening socket.
    pub async fn bind(config: ServerConfig, store: Store, key: SharedKey) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local = listener.local_addr()?;
        let span = info_span!("server", addr = %local);
        let resolver: Option<Arc<dyn ReverseResolver>> = if config.reverse_lookup {
            Some(Arc::new(SystemResolver))
        } else {
            None
        };
        info!(parent: &span, "listening");

        Ok(Self {
            listener,
            store,
            key: Arc::new(key),
            resolver,
            span,
        })
    }

    /// Replaces the reverse resolver. Has no effect on whether lookups are
    /// enabled.
    pub fn with_resolver(mut self, resolver: Arc<dyn ReverseResolver>) -> Self {
        if self.resolver.is_some() {
            self.resolver = Some(resolver);
        }
        self
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the process ends.
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes.
    ///
    /// Connections already accepted run to completion on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let listener = &self.listener;
        loop {
            tokio::select! {
                (stream, peer) = accept_with_backoff(|| listener.accept(), ACCEPT_BACKOFF, &self.span) => {
                    self.spawn_connection(stream, peer);
                }
                () = &mut shutdown => {
                    info!(parent: &self.span, "shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let span = info_span!(parent: &self.span, "conn", peer = %peer);
        let store = self.store.clone();
        let key = Arc::clone(&self.key);
        let resolver = self.resolver.clone();

        tokio::spawn(async move {
            let ip = peer.ip();
            let log_store = store.clone();
            let remote = ip.to_string();
            match tokio::task::spawn_blocking(move || log_store.log_connection(Utc::now(), &remote))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(parent: &span, error = %e, "failed to log connection"),
                Err(e) => warn!(parent: &span, error = %e, "connection log task failed"),
            }

            if let Some(resolver) = resolver {
                drop(spawn_reverse_lookup(
                    store.clone(),
                    resolver,
                    ip,
                    span.clone(),
                ));
            }

            let mut handler = ConnectionHandler::new(store, key, span.clone());
            let outcome = handler.handle(stream).await;
            debug!(parent: &span, ?outcome, "connection closed");
        });
    }
}

/// Retries `accept` until it yields a connection, sleeping `backoff` after
/// each failure.
async fn accept_with_backoff<A, Fut, T>(mut accept: A, backoff: Duration, span: &Span) -> T
where
    A: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                error!(parent: span, error = %e, "accept failed");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
