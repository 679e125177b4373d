use {
    crate::{errors::GatewayError, gateway::Upstream, models::Customer, protocol::Command},
    rocket::{State, get, post, put, routes, serde::json::Json},
    serde::Deserialize,
    serde_json::Value,
};

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CustomerBody {
    pub cedula: String,
    pub nombres: String,
    pub apellidos: String,
    pub saldo: f64,
}

impl From<CustomerBody> for Customer {
    fn from(body: CustomerBody) -> Self {
        Customer::new(body.cedula, body.nombres, body.apellidos, body.saldo)
    }
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AmountBody {
    pub monto: f64,
}

#[get("/<cedula>")]
pub async fn get_customer(
    upstream: &State<Upstream>,
    cedula: &str,
) -> Result<Json<Value>, GatewayError> {
    upstream.forward(&Command::get(cedula)).await
}

#[put("/", format = "json", data = "<body>")]
pub async fn put_customer(
    upstream: &State<Upstream>,
    body: Json<CustomerBody>,
) -> Result<Json<Value>, GatewayError> {
    let customer = Customer::from(body.into_inner());
    upstream.forward(&Command::put(&customer)).await
}

#[post("/<cedula>/add", format = "json", data = "<body>")]
pub async fn add_balance(
    upstream: &State<Upstream>,
    cedula: &str,
    body: Json<AmountBody>,
) -> Result<Json<Value>, GatewayError> {
    upstream.forward(&Command::add(cedula, body.monto)).await
}

#[post("/<cedula>/sub", format = "json", data = "<body>")]
pub async fn sub_balance(
    upstream: &State<Upstream>,
    cedula: &str,
    body: Json<AmountBody>,
) -> Result<Json<Value>, GatewayError> {
    upstream.forward(&Command::sub(cedula, body.monto)).await
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get_customer, put_customer, add_balance, sub_balance]
}
