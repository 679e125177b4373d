use rocket::Request;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("field `{field}` must not contain ':' or line breaks")]
    InvalidField { field: &'static str },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed before a reply was received")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("socket server unavailable: {0}")]
    Unavailable(std::io::Error),
    #[error("socket server did not answer in time")]
    Timeout,
    #[error("invalid reply from socket server")]
    InvalidReply { raw: String },
    #[error(transparent)]
    InvalidField(#[from] ProtocolError),
}

impl From<ClientError> for GatewayError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Io(e) => GatewayError::Unavailable(e),
            ClientError::Closed => GatewayError::InvalidReply { raw: String::new() },
            ClientError::Protocol(e) => GatewayError::InvalidField(e),
        }
    }
}

impl GatewayError {
    pub fn status(&self) -> Status {
        match self {
            GatewayError::InvalidField(_) => Status::BadRequest,
            _ => Status::BadGateway,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            GatewayError::InvalidReply { raw } => json!({
                "detail": {
                    "ok": false,
                    "message": "Respuesta inválida del servidor de sockets",
                    "raw": raw,
                }
            }),
            GatewayError::Unavailable(e) => json!({
                "detail": {
                    "ok": false,
                    "message": "Servidor de sockets no disponible",
                    "raw": e.to_string(),
                }
            }),
            GatewayError::Timeout => json!({
                "detail": {
                    "ok": false,
                    "message": "Tiempo de espera agotado con el servidor de sockets",
                    "raw": "",
                }
            }),
            GatewayError::InvalidField(e) => json!({
                "detail": {
                    "ok": false,
                    "message": e.to_string(),
                }
            }),
        }
    }
}

impl<'r> Responder<'r, 'static> for GatewayError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::BadGateway {
            tracing::warn!(error = %self, "upstream request failed");
        }

        let body = self.body().to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), std::io::Cursor::new(body))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_reply_keeps_raw_text() {
        let err = GatewayError::InvalidReply {
            raw: "not json".into(),
        };
        assert_eq!(err.status(), Status::BadGateway);
        assert_eq!(err.body()["detail"]["raw"], "not json");
        assert_eq!(err.body()["detail"]["ok"], false);
    }

    #[test]
    fn invalid_field_is_a_client_error() {
        let err = GatewayError::from(ProtocolError::InvalidField { field: "nombres" });
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn refused_connection_maps_to_unavailable() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let err = GatewayError::from(ClientError::Io(io));
        assert!(matches!(err, GatewayError::Unavailable(_)));
        assert_eq!(err.status(), Status::BadGateway);
    }
}
