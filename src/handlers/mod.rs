//! HTTP routes of the gateway. Every customer route forwards one protocol
//! command to the ledger server and relays its JSON reply.

use rocket::{Request, catch, serde::json::Json};
use serde_json::{Value, json};

pub mod clientes;
pub mod misc;

#[catch(400)]
pub fn catch400(_: &Request) -> Json<Value> {
    Json(json!({ "detail": "Bad Request" }))
}

#[catch(404)]
pub fn catch404(req: &Request) -> Json<Value> {
    Json(json!({ "detail": "Not Found", "path": req.uri().path().to_string() }))
}

#[catch(422)]
pub fn catch422(_: &Request) -> Json<Value> {
    Json(json!({ "detail": "Unprocessable Entity" }))
}

#[catch(500)]
pub fn catch500(_: &Request) -> Json<Value> {
    Json(json!({ "detail": "Internal Server Error" }))
}
