//! Line protocol spoken between the ledger server and its clients.
//!
//! Requests are single lines terminated by `\n`:
//!
//! - `GET:<cedula>`
//! - `PUT:<cedula>:<nombres>:<apellidos>:<saldo>`
//! - `ADD:<cedula>:<monto>`
//! - `SUB:<cedula>:<monto>`
//!
//! Every request gets exactly one JSON object back, also terminated by `\n`.

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;
use crate::models::Customer;

pub const MSG_FOUND: &str = "Registro encontrado";
pub const MSG_UPSERTED: &str = "Registro creado/actualizado";
pub const MSG_CREDITED: &str = "Saldo incrementado";
pub const MSG_DEBITED: &str = "Saldo decrementado";
pub const MSG_INSUFFICIENT: &str = "Saldo insuficiente";
pub const MSG_INVALID_BALANCE: &str = "Saldo inválido";
pub const MSG_INVALID_AMOUNT: &str = "Monto inválido";
pub const MSG_INVALID_COMMAND: &str = "Comando inválido o argumentos incorrectos";
pub const MSG_INTERNAL: &str = "Error interno del servidor";

pub fn not_found_message(id_number: &str) -> String {
    format!("No existe registro para cédula {id_number}")
}

/// A parsed request line. Numeric arguments are kept as sent so the ledger
/// can answer a bad number with its own message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get {
        id_number: String,
    },
    Put {
        id_number: String,
        given_names: String,
        family_names: String,
        balance: String,
    },
    Add {
        id_number: String,
        amount: String,
    },
    Sub {
        id_number: String,
        amount: String,
    },
}

impl Command {
    /// Parses one request line. Returns `None` for an unknown command or a
    /// wrong number of arguments.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split(':');
        let name = parts.next().unwrap_or_default().to_uppercase();
        let args: Vec<&str> = parts.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("GET", [id_number]) => Command::Get {
                id_number: id_number.to_string(),
            },
            ("PUT", [id_number, given_names, family_names, balance]) => Command::Put {
                id_number: id_number.to_string(),
                given_names: given_names.to_string(),
                family_names: family_names.to_string(),
                balance: balance.to_string(),
            },
            ("ADD", [id_number, amount]) => Command::Add {
                id_number: id_number.to_string(),
                amount: amount.to_string(),
            },
            ("SUB", [id_number, amount]) => Command::Sub {
                id_number: id_number.to_string(),
                amount: amount.to_string(),
            },
            _ => return None,
        };
        Some(command)
    }

    pub fn get(id_number: impl Into<String>) -> Self {
        Command::Get {
            id_number: id_number.into(),
        }
    }

    pub fn put(customer: &Customer) -> Self {
        Command::Put {
            id_number: customer.id_number.clone(),
            given_names: customer.given_names.clone(),
            family_names: customer.family_names.clone(),
            balance: customer.balance.to_string(),
        }
    }

    pub fn add(id_number: impl Into<String>, amount: f64) -> Self {
        Command::Add {
            id_number: id_number.into(),
            amount: amount.to_string(),
        }
    }

    pub fn sub(id_number: impl Into<String>, amount: f64) -> Self {
        Command::Sub {
            id_number: id_number.into(),
            amount: amount.to_string(),
        }
    }

    /// Encodes the command as a request line, without the trailing newline.
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let line = match self {
            Command::Get { id_number } => {
                format!("GET:{}", field("cedula", id_number)?)
            }
            Command::Put {
                id_number,
                given_names,
                family_names,
                balance,
            } => format!(
                "PUT:{}:{}:{}:{}",
                field("cedula", id_number)?,
                field("nombres", given_names)?,
                field("apellidos", family_names)?,
                field("saldo", balance)?,
            ),
            Command::Add { id_number, amount } => {
                format!("ADD:{}:{}", field("cedula", id_number)?, field("monto", amount)?)
            }
            Command::Sub { id_number, amount } => {
                format!("SUB:{}:{}", field("cedula", id_number)?, field("monto", amount)?)
            }
        };
        Ok(line)
    }
}

fn field<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ProtocolError> {
    if value.contains([':', '\n', '\r']) {
        Err(ProtocolError::InvalidField { field: name })
    } else {
        Ok(value)
    }
}

/// Parses a balance or amount argument. Surrounding whitespace is ignored;
/// non-finite values are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReplyData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyData {
    pub cedula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombres: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellidos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saldo: Option<f64>,
}

impl ReplyData {
    pub fn full(customer: &Customer) -> Self {
        Self {
            cedula: customer.id_number.clone(),
            nombres: Some(customer.given_names.clone()),
            apellidos: Some(customer.family_names.clone()),
            saldo: Some(customer.balance),
        }
    }

    pub fn balance(id_number: &str, balance: f64) -> Self {
        Self {
            cedula: id_number.to_string(),
            nombres: None,
            apellidos: None,
            saldo: Some(balance),
        }
    }

    pub fn names(customer: &Customer) -> Self {
        Self {
            saldo: None,
            ..Self::full(customer)
        }
    }
}

impl Reply {
    pub fn success(message: impl Into<String>, data: ReplyData) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure_with(message: impl Into<String>, data: ReplyData) -> Self {
        Self {
            ok: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Encodes the reply as one JSON line, newline included.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode reply");
            format!(r#"{{"ok":false,"message":"{MSG_INTERNAL}"}}"#)
        });
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_command() {
        assert_eq!(Command::parse("GET:1234567890"), Some(Command::get("1234567890")));
        assert_eq!(
            Command::parse("PUT:1234567890:Juan:Nieve:150.75"),
            Some(Command::Put {
                id_number: "1234567890".into(),
                given_names: "Juan".into(),
                family_names: "Nieve".into(),
                balance: "150.75".into(),
            })
        );
        assert_eq!(
            Command::parse("ADD:1234567890:50"),
            Some(Command::Add {
                id_number: "1234567890".into(),
                amount: "50".into(),
            })
        );
        assert_eq!(
            Command::parse("SUB:1234567890:25"),
            Some(Command::Sub {
                id_number: "1234567890".into(),
                amount: "25".into(),
            })
        );
    }

    #[test]
    fn command_name_is_case_insensitive_and_line_is_trimmed() {
        assert_eq!(Command::parse("  get:1111111111\r"), Some(Command::get("1111111111")));
        assert!(matches!(Command::parse("sub:1:2"), Some(Command::Sub { .. })));
    }

    #[test]
    fn rejects_wrong_arity_and_unknown_commands() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("GET"), None);
        assert_eq!(Command::parse("GET:1:2"), None);
        assert_eq!(Command::parse("PUT:1:Juan:Nieve"), None);
        assert_eq!(Command::parse("ADD:1"), None);
        assert_eq!(Command::parse("DEL:1"), None);
    }

    #[test]
    fn numbers_are_trimmed_and_must_be_finite() {
        assert_eq!(parse_number(" 50 "), Some(50.0));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn encodes_lines_that_parse_back() {
        let customer = Customer::new("2222222222", "Luis", "Gómez", 80.5);
        let line = Command::put(&customer).to_line().unwrap();
        assert_eq!(line, "PUT:2222222222:Luis:Gómez:80.5");
        assert_eq!(Command::add("1", 50.0).to_line().unwrap(), "ADD:1:50");
        assert_eq!(Command::parse(&line), Some(Command::put(&customer)));
    }

    #[test]
    fn encoding_rejects_separator_in_fields() {
        let customer = Customer::new("1", "Juan:Carlos", "Nieve", 1.0);
        let err = Command::put(&customer).to_line().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { field: "nombres" }));
        assert!(Command::get("1\n2").to_line().is_err());
    }

    #[test]
    fn reply_omits_missing_data_and_keeps_accents() {
        let line = Reply::failure(not_found_message("9")).to_line();
        assert_eq!(
            line,
            "{\"ok\":false,\"message\":\"No existe registro para cédula 9\"}\n"
        );

        let customer = Customer::new("1111111111", "Ana", "Pérez", 300.0);
        let reply: Reply = serde_json::from_str(&Reply::success(MSG_FOUND, ReplyData::full(&customer)).to_line()).unwrap();
        let data = reply.data.unwrap();
        assert_eq!(data.apellidos.as_deref(), Some("Pérez"));
        assert_eq!(data.saldo, Some(300.0));
    }

    #[test]
    fn names_only_data_has_no_balance() {
        let customer = Customer::new("1", "Ana", "Pérez", 3.0);
        let value = serde_json::to_value(ReplyData::names(&customer)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"cedula": "1", "nombres": "Ana", "apellidos": "Pérez"})
        );
    }
}
