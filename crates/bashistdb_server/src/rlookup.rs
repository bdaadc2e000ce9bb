//! Best-effort reverse DNS of connecting addresses.

use bashistdb_store::Store;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, Span};

/// Resolves an address to host names.
pub trait ReverseResolver: Send + Sync + 'static {
    /// Returns the names of `ip`. An empty list means no names.
    fn lookup(&self, ip: IpAddr) -> io::Result<Vec<String>>;
}

/// Resolver backed by the system's name service.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl ReverseResolver for SystemResolver {
    fn lookup(&self, ip: IpAddr) -> io::Result<Vec<String>> {
        dns_lookup::lookup_addr(&ip).map(|name| vec![name])
    }
}

/// Resolves `ip` in the background and caches the result in `store`.
///
/// Addresses already cached are not looked up again. Failures are logged at
/// debug level and otherwise ignored. Callers normally drop the returned
/// handle.
pub fn spawn_reverse_lookup(
    store: Store,
    resolver: Arc<dyn ReverseResolver>,
    ip: IpAddr,
    span: Span,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let key = ip.to_string();
        match store.has_reverse_lookup(&key) {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                debug!(parent: &span, %ip, error = %e, "reverse lookup cache check failed");
                return;
            }
        }

        let names = match resolver.lookup(ip) {
            Ok(names) if !names.is_empty() => names,
            Ok(_) => return,
            Err(e) => {
                debug!(parent: &span, %ip, error = %e, "reverse lookup failed");
                return;
            }
        };

        match store.record_reverse_lookup(&key, &names) {
            Ok(()) => debug!(parent: &span, %ip, names = %names.join(","), "cached reverse lookup"),
            Err(e) => debug!(parent: &span, %ip, error = %e, "failed to cache reverse lookup"),
        }
    })
}
