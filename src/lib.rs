//! # Clientes
//!
//! Customer balance store backed by MongoDB:
//!
//! - `seed`: creates the `personas` collection with three sample customers
//! - `serve`: TCP ledger server speaking a newline-delimited protocol
//! - `client`: interactive prompt for the ledger server
//! - `gateway`: HTTP/JSON facade over the ledger server

pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod seed;
pub mod server;
pub mod store;
