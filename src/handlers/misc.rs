use rocket::{get, routes as rocket_routes, serde::json::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "rocket::serde")]
pub struct HealthStatus {
    pub ok: bool,
    pub message: String,
}

/// Liveness of the gateway itself; the ledger server is not contacted.
#[get("/health")]
pub fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        ok: true,
        message: "gateway up".to_string(),
    })
}

pub fn routes() -> Vec<rocket::Route> {
    rocket_routes![health]
}
