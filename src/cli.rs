use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::config::{GatewaySettings, MongoSettings, SocketSettings};
use crate::db::ClientesDb;
use crate::ledger::Ledger;
use crate::seed::{self, SeedMode};
use crate::store::{CustomerStore, MemoryStore, MongoStore};
use crate::{client, gateway, server};

pub fn cli() -> Command {
    Command::new("clientes")
        .about("Customer balance store: seeding, ledger server, client and HTTP gateway")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("More log output (repeat for trace)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Only log errors"),
        )
        .subcommand(
            Command::new("seed")
                .about("Create the customer collection and insert the sample customers")
                .args(MongoSettings::args())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_name("MODE")
                        .value_parser(value_parser!(SeedMode))
                        .default_value("skip-existing")
                        .help("How to treat customers that already exist"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the TCP ledger server")
                .args(SocketSettings::server_args("0.0.0.0"))
                .args(MongoSettings::args())
                .arg(MongoSettings::operations_arg())
                .arg(
                    Arg::new("memory")
                        .long("memory")
                        .action(ArgAction::SetTrue)
                        .help("Serve from an in-process store holding the sample customers"),
                ),
        )
        .subcommand(
            Command::new("client")
                .about("Interactive prompt sending commands to the ledger server")
                .args(SocketSettings::server_args("127.0.0.1")),
        )
        .subcommand(
            Command::new("gateway")
                .about("Run the HTTP gateway in front of the ledger server")
                .args(GatewaySettings::args()),
        )
}

pub async fn handle_cli(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("seed", sub_matches)) => {
            let settings = MongoSettings::from_matches(sub_matches);
            let mode = sub_matches
                .get_one::<SeedMode>("mode")
                .copied()
                .unwrap_or_default();

            let db = ClientesDb::connect(&settings).await?;
            let report = seed::run(&db, mode, &mut std::io::stdout()).await?;
            tracing::debug!(?report, "seed finished");
        }
        Some(("serve", sub_matches)) => {
            let socket = SocketSettings::from_matches(sub_matches, "0.0.0.0");

            let store: Arc<dyn CustomerStore> = if sub_matches.get_flag("memory") {
                tracing::info!("serving from in-memory store");
                Arc::new(MemoryStore::with_customers(seed::sample_customers()))
            } else {
                let settings = MongoSettings::from_matches(sub_matches);
                let db = ClientesDb::connect(&settings).await?;
                db.ensure_operation_indexes().await?;
                tracing::info!(
                    uri = %settings.uri,
                    database = %settings.database,
                    collection = %settings.customers,
                    "serving from mongodb"
                );
                Arc::new(MongoStore::new(db))
            };

            server::serve(&socket, Ledger::new(store)).await?;
        }
        Some(("client", sub_matches)) => {
            let socket = SocketSettings::from_matches(sub_matches, "127.0.0.1");
            client::repl(&socket.address()).await?;
        }
        Some(("gateway", sub_matches)) => {
            let settings = GatewaySettings::from_matches(sub_matches);
            let _ = gateway::build(&settings)?.launch().await?;
        }
        _ => {
            cli().print_help()?;
        }
    }

    Ok(())
}
