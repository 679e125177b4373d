//! # Settings
//!
//! Every setting is a command-line argument that falls back to an environment
//! variable (a `.env` file is loaded first via `dotenvy`) and then to a default:
//!
//! - `MONGO_URI`, `MONGO_DB`, `MONGO_COLLECTION`, `MONGO_COLLECTION_OPS`
//! - `SERVER_HOST`, `SERVER_PORT`: ledger server bind address, or the address
//!   the interactive client connects to
//! - `GATEWAY_ADDRESS`, `GATEWAY_PORT`: HTTP gateway bind address
//! - `SOCKET_HOST`, `SOCKET_PORT`, `SOCKET_TIMEOUT_SECS`: ledger server as
//!   seen from the gateway

use std::time::Duration;

use clap::{Arg, ArgMatches, value_parser};

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "clientes_db";
pub const DEFAULT_CUSTOMERS: &str = "personas";
pub const DEFAULT_OPERATIONS: &str = "operaciones";
pub const DEFAULT_SERVER_PORT: u16 = 50007;
pub const DEFAULT_GATEWAY_PORT: u16 = 8000;
pub const DEFAULT_SOCKET_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub customers: String,
    pub operations: String,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            customers: DEFAULT_CUSTOMERS.to_string(),
            operations: DEFAULT_OPERATIONS.to_string(),
        }
    }
}

impl MongoSettings {
    pub fn args() -> Vec<Arg> {
        vec![
            Arg::new("mongo-uri")
                .long("mongo-uri")
                .env("MONGO_URI")
                .value_name("URI")
                .default_value(DEFAULT_MONGO_URI)
                .help("MongoDB connection string"),
            Arg::new("database")
                .long("database")
                .env("MONGO_DB")
                .value_name("NAME")
                .default_value(DEFAULT_DATABASE)
                .help("Database holding the customer collections"),
            Arg::new("collection")
                .long("collection")
                .env("MONGO_COLLECTION")
                .value_name("NAME")
                .default_value(DEFAULT_CUSTOMERS)
                .help("Customer collection"),
        ]
    }

    /// Only the ledger server writes operation records, so only `serve`
    /// takes this flag.
    pub fn operations_arg() -> Arg {
        Arg::new("operations-collection")
            .long("operations-collection")
            .env("MONGO_COLLECTION_OPS")
            .value_name("NAME")
            .default_value(DEFAULT_OPERATIONS)
            .help("Collection receiving one audit record per balance operation")
    }

    /// The operations collection falls back to its default when
    /// [`Self::operations_arg`] is not part of the command.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let defaults = Self::default();
        Self {
            uri: string_arg(matches, "mongo-uri").unwrap_or(defaults.uri),
            database: string_arg(matches, "database").unwrap_or(defaults.database),
            customers: string_arg(matches, "collection").unwrap_or(defaults.customers),
            operations: matches
                .try_get_one::<String>("operations-collection")
                .ok()
                .flatten()
                .cloned()
                .unwrap_or(defaults.operations),
        }
    }
}

/// Address of the ledger server, either to bind or to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketSettings {
    pub host: String,
    pub port: u16,
}

impl SocketSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `--host`/`--port` backed by `SERVER_HOST`/`SERVER_PORT`.
    pub fn server_args(default_host: &'static str) -> Vec<Arg> {
        vec![
            Arg::new("host")
                .long("host")
                .env("SERVER_HOST")
                .value_name("HOST")
                .default_value(default_host)
                .help("Ledger server host"),
            Arg::new("port")
                .long("port")
                .env("SERVER_PORT")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .default_value("50007")
                .help("Ledger server port"),
        ]
    }

    pub fn from_matches(matches: &ArgMatches, default_host: &str) -> Self {
        Self {
            host: string_arg(matches, "host").unwrap_or_else(|| default_host.to_string()),
            port: matches
                .get_one::<u16>("port")
                .copied()
                .unwrap_or(DEFAULT_SERVER_PORT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub address: String,
    pub port: u16,
    pub upstream: SocketSettings,
    pub timeout: Duration,
}

impl GatewaySettings {
    pub fn args() -> Vec<Arg> {
        vec![
            Arg::new("address")
                .long("address")
                .env("GATEWAY_ADDRESS")
                .value_name("ADDR")
                .default_value("0.0.0.0")
                .help("Address the HTTP gateway listens on"),
            Arg::new("port")
                .long("port")
                .env("GATEWAY_PORT")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .default_value("8000")
                .help("Port the HTTP gateway listens on"),
            Arg::new("socket-host")
                .long("socket-host")
                .env("SOCKET_HOST")
                .value_name("HOST")
                .default_value("localhost")
                .help("Ledger server host"),
            Arg::new("socket-port")
                .long("socket-port")
                .env("SOCKET_PORT")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .default_value("50007")
                .help("Ledger server port"),
            Arg::new("timeout")
                .long("timeout")
                .env("SOCKET_TIMEOUT_SECS")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .default_value("10")
                .help("Seconds to wait for the ledger server per request"),
        ]
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            address: string_arg(matches, "address").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: matches
                .get_one::<u16>("port")
                .copied()
                .unwrap_or(DEFAULT_GATEWAY_PORT),
            upstream: SocketSettings {
                host: string_arg(matches, "socket-host")
                    .unwrap_or_else(|| "localhost".to_string()),
                port: matches
                    .get_one::<u16>("socket-port")
                    .copied()
                    .unwrap_or(DEFAULT_SERVER_PORT),
            },
            timeout: Duration::from_secs(
                matches
                    .get_one::<u64>("timeout")
                    .copied()
                    .unwrap_or(DEFAULT_SOCKET_TIMEOUT_SECS),
            ),
        }
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}
