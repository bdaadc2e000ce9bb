//! bashistdb CLI
//!
//! Stores bash history from many machines in one encrypted, queryable place.
//!
//! # Commands
//!
//! - `server` - Serve a history store over TCP
//! - `import` - Upload `history` output read from stdin
//! - `stats` - Show the most frequent and the latest commands
//! - `query` - Search history
//! - `restore` - Print this user@host's history in bash_history format
//! - `connections` - Show the server's connection log
//! - `schema` - Show the store's schema version and migrations
//!
//! Client commands talk to `--server`, or with `--local` work directly on
//! the store at `--db`.

mod commands;
mod context;

use bashistdb_protocol::{OutputFormat, QueryOrder, DEFAULT_PORT};
use clap::{Parser, Subcommand};
use commands::inspect::ConnectionsFormat;
use context::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Encrypted bash history database.
#[derive(Parser, Debug)]
#[command(name = "bashistdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Shared passphrase
    #[arg(global = true, short, long, env = "BASHISTDB_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Server address, host[:port]
    #[arg(global = true, short, long, env = "BASHISTDB_SERVER")]
    server: Option<String>,

    /// Path of the history store
    #[arg(global = true, long, env = "BASHISTDB_DB")]
    db: Option<PathBuf>,

    /// User name to record and query as
    #[arg(global = true, short, long, env = "USER")]
    user: Option<String>,

    /// Host name to record and query as
    #[arg(global = true, long)]
    hostname: Option<String>,

    /// Work on the local store instead of a server
    #[arg(global = true, short, long)]
    local: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve a history store over TCP
    Server {
        /// Address to listen on
        #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
        bind: SocketAddr,

        /// Do not resolve client addresses to names
        #[arg(long)]
        no_reverse_lookup: bool,
    },

    /// Upload `history` output read from stdin
    Import,

    /// Show the most frequent and the latest commands
    Stats,

    /// Search history
    Query {
        /// User pattern (SQL LIKE)
        #[arg(long, default_value = "%")]
        query_user: String,

        /// Host pattern (SQL LIKE)
        #[arg(long, default_value = "%")]
        query_host: String,

        /// Command pattern (SQL LIKE)
        #[arg(short, long, default_value = "%")]
        command: String,

        /// Maximum number of rows, 0 for all
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: u32,

        /// Output format (plain, restore, json)
        #[arg(short, long, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,

        /// Ordering (recent, frequent, oldest)
        #[arg(short, long, default_value_t = QueryOrder::Recent)]
        order: QueryOrder,
    },

    /// Print this user@host's history in bash_history format
    Restore,

    /// Show the server's connection log
    Connections {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ConnectionsFormat::Text)]
        format: ConnectionsFormat,
    },

    /// Show the store's schema version and migrations
    Schema,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context {
        key: cli.key,
        server: cli.server,
        db: cli.db,
        user: cli.user,
        hostname: cli.hostname,
        local: cli.local,
    };

    match cli.command {
        Commands::Server {
            bind,
            no_reverse_lookup,
        } => commands::server::run(&ctx, bind, !no_reverse_lookup)?,
        Commands::Import => commands::client::import(&ctx)?,
        Commands::Stats => commands::client::stats(&ctx)?,
        Commands::Query {
            query_user,
            query_host,
            command,
            limit,
            format,
            order,
        } => {
            let params = bashistdb_protocol::QueryParams::new()
                .with_user(query_user)
                .with_host(query_host)
                .with_command(command)
                .with_limit(limit)
                .with_format(format)
                .with_order(order);
            commands::client::query(&ctx, params)?
        }
        Commands::Restore => commands::client::restore(&ctx)?,
        Commands::Connections { format } => commands::inspect::connections(&ctx, format)?,
        Commands::Schema => commands::inspect::schema(&ctx)?,
        Commands::Version => {
            println!("bashistdb v{}", env!("CARGO_PKG_VERSION"));
            println!("Store schema v{}", bashistdb_store::CURRENT_VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults() {
        let cli = Cli::try_parse_from(["bashistdb", "query"]).unwrap();
        match cli.command {
            Commands::Query {
                query_user,
                limit,
                format,
                order,
                ..
            } => {
                assert_eq!(query_user, "%");
                assert_eq!(limit, 10);
                assert_eq!(format, OutputFormat::Plain);
                assert_eq!(order, QueryOrder::Recent);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn query_options() {
        let cli = Cli::try_parse_from([
            "bashistdb",
            "--local",
            "query",
            "--query-user",
            "alice",
            "-n",
            "0",
            "--format",
            "bash_history",
            "--order",
            "frequent",
        ])
        .unwrap();
        assert!(cli.local);
        match cli.command {
            Commands::Query {
                query_user,
                limit,
                format,
                order,
                ..
            } => {
                assert_eq!(query_user, "alice");
                assert_eq!(limit, 0);
                assert_eq!(format, OutputFormat::Restore);
                assert_eq!(order, QueryOrder::Frequent);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn server_defaults() {
        let cli = Cli::try_parse_from(["bashistdb", "server"]).unwrap();
        match cli.command {
            Commands::Server {
                bind,
                no_reverse_lookup,
            } => {
                assert_eq!(bind.port(), DEFAULT_PORT);
                assert!(!no_reverse_lookup);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bashistdb",
            "stats",
            "--server",
            "history.example.org",
            "--key",
            "pw",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("history.example.org"));
        assert_eq!(cli.key.as_deref(), Some("pw"));
    }

    #[test]
    fn connections_format() {
        let cli = Cli::try_parse_from(["bashistdb", "connections"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Connections {
                format: ConnectionsFormat::Text
            }
        ));

        let cli = Cli::try_parse_from(["bashistdb", "connections", "-f", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Connections {
                format: ConnectionsFormat::Json
            }
        ));

        assert!(Cli::try_parse_from(["bashistdb", "connections", "-f", "yaml"]).is_err());
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(Cli::try_parse_from(["bashistdb", "query", "--format", "xml"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
