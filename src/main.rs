//! # Clientes
//!
//! ## Environment Variables
//!
//! - `MONGO_URI`, `MONGO_DB`, `MONGO_COLLECTION`, `MONGO_COLLECTION_OPS`
//! - `SERVER_HOST`, `SERVER_PORT`
//! - `GATEWAY_ADDRESS`, `GATEWAY_PORT`
//! - `SOCKET_HOST`, `SOCKET_PORT`, `SOCKET_TIMEOUT_SECS`
//! - `RUST_LOG`
//!
//! A `.env` file in the working directory is read first.

use clientes::{
    cli,
    logging::{Verbosity, init_logging},
};

#[rocket::main]
async fn main() {
    dotenvy::dotenv().ok();

    let matches = cli::cli().get_matches();
    init_logging(Verbosity::from_flags(
        matches.get_flag("quiet"),
        matches.get_count("verbose"),
    ));

    if let Err(e) = cli::handle_cli(&matches).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
