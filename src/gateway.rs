//! # HTTP gateway
//!
//! A Rocket application translating REST calls into ledger protocol lines.
//! Each request opens its own TCP connection to the ledger server.
//!
//! | Route | Forwarded as |
//! |---|---|
//! | `GET /health` | not forwarded |
//! | `GET /clientes/<cedula>` | `GET:<cedula>` |
//! | `PUT /clientes` | `PUT:<cedula>:<nombres>:<apellidos>:<saldo>` |
//! | `POST /clientes/<cedula>/add` | `ADD:<cedula>:<monto>` |
//! | `POST /clientes/<cedula>/sub` | `SUB:<cedula>:<monto>` |

use std::time::Duration;

use rocket::{Build, Rocket, catchers, http::Method, serde::json::Json};
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use serde_json::Value;

use crate::{
    client,
    config::{GatewaySettings, SocketSettings},
    errors::GatewayError,
    handlers,
    protocol::Command,
};

/// Where the ledger server lives, as managed Rocket state.
#[derive(Debug, Clone)]
pub struct Upstream {
    address: String,
    timeout: Duration,
}

impl Upstream {
    pub fn new(settings: &SocketSettings, timeout: Duration) -> Self {
        Self {
            address: settings.address(),
            timeout,
        }
    }

    /// Sends `command` and parses the reply line as JSON.
    pub async fn forward(&self, command: &Command) -> Result<Json<Value>, GatewayError> {
        let raw = client::send_once(&self.address, command, self.timeout)
            .await?
            .ok_or(GatewayError::Timeout)?;

        serde_json::from_str(&raw)
            .map(Json)
            .map_err(|_| GatewayError::InvalidReply { raw })
    }
}

fn cors() -> Result<rocket_cors::Cors, rocket_cors::Error> {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::all())
        .allow_credentials(false)
        .to_cors()
}

pub fn build(settings: &GatewaySettings) -> Result<Rocket<Build>, rocket_cors::Error> {
    let figment = rocket::Config::figment()
        .merge(("address", settings.address.as_str()))
        .merge(("port", settings.port));

    let upstream = Upstream::new(&settings.upstream, settings.timeout);
    tracing::info!(upstream = %upstream.address, "gateway forwarding to ledger server");

    Ok(rocket::custom(figment)
        .manage(upstream)
        .attach(cors()?)
        .register(
            "/",
            catchers![
                handlers::catch400,
                handlers::catch404,
                handlers::catch422,
                handlers::catch500
            ],
        )
        .mount("/", handlers::misc::routes())
        .mount("/clientes", handlers::clientes::routes()))
}
