//! orientwire - command-line client for OrientDB binary protocol 15 servers.
//!
//! Each invocation opens one session, authenticates as the command requires,
//! runs a single operation and closes the session.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use orientwire_client::Client;
use orientwire_protocol::RecordId;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orientwire")]
#[command(about = "Command-line client for the OrientDB binary protocol")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true, env = "ORIENTWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long, global = true, env = "ORIENTWIRE_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, global = true, env = "ORIENTWIRE_PORT")]
    port: Option<u16>,

    /// Server user (CONNECT, SHUTDOWN)
    #[arg(short, long, global = true, env = "ORIENTWIRE_USER")]
    user: Option<String>,

    /// Server password
    #[arg(long, global = true, env = "ORIENTWIRE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database for database-level commands
    #[arg(short, long, global = true, env = "ORIENTWIRE_DATABASE")]
    database: Option<String>,

    /// Database user (DB_OPEN)
    #[arg(long, global = true, env = "ORIENTWIRE_DB_USER")]
    db_user: Option<String>,

    /// Database password
    #[arg(long, global = true, env = "ORIENTWIRE_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(user) = &self.user {
            config.server.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.server.password = password.clone();
        }
        if let Some(database) = &self.database {
            config.database.name = Some(database.clone());
        }
        if let Some(user) = &self.db_user {
            config.database.user = user.clone();
        }
        if let Some(password) = &self.db_password {
            config.database.password = password.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate against the server and print the session id
    Connect,

    /// Shut the server down
    Shutdown,

    /// Check whether a database exists
    DbExist {
        /// Database name
        name: String,
    },

    /// Create a database
    DbCreate {
        /// Database name
        name: String,

        /// Database type (document, graph)
        #[arg(short = 't', long = "type")]
        database_type: Option<String>,

        /// Storage type (local, memory)
        #[arg(short, long)]
        storage: Option<String>,
    },

    /// Drop a database
    DbDrop {
        /// Database name
        name: String,
    },

    /// Print the size of the open database
    DbSize,

    /// Count the records of the open database
    DbCount,

    /// List the clusters of the open database
    DbReload,

    /// Add a cluster
    ClusterAdd {
        /// Cluster name
        name: String,

        /// Cluster type
        #[arg(short = 't', long = "type")]
        cluster_type: Option<String>,

        /// Cluster location
        #[arg(short, long)]
        location: Option<String>,

        /// Data segment name
        #[arg(long)]
        segment: Option<String>,
    },

    /// Drop a cluster
    ClusterDrop {
        /// Cluster id
        id: i16,
    },

    /// Count the records in clusters
    ClusterCount {
        /// Cluster ids
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<i16>,
    },

    /// Print the first and last position of a cluster
    ClusterRange {
        /// Cluster id
        id: i16,
    },

    /// Add a data segment
    SegmentAdd {
        /// Segment name
        name: String,

        /// Segment location
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Drop a data segment
    SegmentDrop {
        /// Segment name
        name: String,
    },

    /// Load a record by id (#cluster:position)
    RecordLoad {
        /// Record id
        #[arg(value_parser = commands::parse_rid)]
        rid: RecordId,

        /// Fetch plan
        #[arg(short, long, default_value = "")]
        fetch_plan: String,

        /// Bypass the server cache
        #[arg(long)]
        ignore_cache: bool,
    },
}

/// How a command authenticates before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// The operation carries its own credentials, or is CONNECT itself.
    None,
    /// CONNECT with the server user.
    Server,
    /// DB_OPEN with the database user.
    Database,
}

impl Commands {
    pub fn session(&self) -> Session {
        match self {
            Commands::Connect | Commands::Shutdown => Session::None,
            Commands::DbExist { .. } | Commands::DbCreate { .. } | Commands::DbDrop { .. } => {
                Session::Server
            }
            _ => Session::Database,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).map_err(|e| {
        eprintln!("{}: {}", "Config error".red(), e);
        e
    })?;
    cli.apply(&mut config);
    config.validate()?;

    let session = cli.command.session();
    let client = Client::new(match session {
        Session::Database => config.database_connection(),
        Session::None | Session::Server => config.server_connection(),
    });

    client.connect().await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    let result: Result<(), Box<dyn std::error::Error>> = match session {
        Session::None => Ok(()),
        Session::Server => client.connect_server().await.map(|_| ()).map_err(Into::into),
        Session::Database => match config.database.name.as_deref() {
            Some(name) => client.open_database(name).await.map(|_| ()).map_err(Into::into),
            None => Err("no database given; use --database or ORIENTWIRE_DATABASE".into()),
        },
    };

    let result = match result {
        Ok(()) => commands::execute(&client, cli.command, cli.json).await,
        Err(e) => Err(e),
    };

    if let Err(e) = client.close().await {
        tracing::debug!("Close failed: {}", e);
    }

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}
