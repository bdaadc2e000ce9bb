//! Settings shared by all commands.

use crate::commands::local::LocalTransport;
use bashistdb_client::{ClientConfig, Intent, SyncSession, TcpTransport};
use bashistdb_protocol::SharedKey;
use bashistdb_store::{Store, StoreConfig};
use std::error::Error;
use std::path::PathBuf;

/// File name of the store in the home directory.
pub const DEFAULT_DB_NAME: &str = ".bashistdb.sqlite3";

/// Global options after environment fallbacks.
#[derive(Debug, Default)]
pub struct Context {
    pub key: Option<String>,
    pub server: Option<String>,
    pub db: Option<PathBuf>,
    pub user: Option<String>,
    pub hostname: Option<String>,
    pub local: bool,
}

impl Context {
    pub fn shared_key(&self) -> Result<SharedKey, Box<dyn Error>> {
        let passphrase = self
            .key
            .as_deref()
            .ok_or("no key given: use --key or set BASHISTDB_KEY")?;
        Ok(SharedKey::from_passphrase(passphrase)?)
    }

    pub fn db_path(&self) -> PathBuf {
        match &self.db {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_DB_NAME))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_NAME)),
        }
    }

    pub fn open_store(&self) -> Result<Store, Box<dyn Error>> {
        Ok(Store::open(StoreConfig::new(self.db_path()))?)
    }

    pub fn user(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .user
            .clone()
            .ok_or("user unknown: use --user or set USER")?)
    }

    pub fn hostname(&self) -> Result<String, Box<dyn Error>> {
        match &self.hostname {
            Some(name) => Ok(name.clone()),
            None => Ok(dns_lookup::get_hostname()?),
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig, Box<dyn Error>> {
        Ok(ClientConfig::new(self.user()?, self.hostname()?))
    }

    /// Runs one session, against the local store with `--local`, otherwise
    /// against the server.
    pub fn run(&self, intent: Intent) -> Result<String, Box<dyn Error>> {
        let config = self.client_config()?;
        if self.local {
            let session = SyncSession::new(config, LocalTransport::new(self.open_store()?));
            return Ok(session.run(intent)?);
        }

        let server = self
            .server
            .as_deref()
            .ok_or("no server given: use --server, set BASHISTDB_SERVER, or pass --local")?;
        let session = SyncSession::new(config, TcpTransport::new(server, self.shared_key()?));
        Ok(session.run(intent)?)
    }
}
