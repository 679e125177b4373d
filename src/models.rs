use {
    chrono::{DateTime, Utc},
    mongodb::bson::DateTime as BsonDateTime,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// A customer record as stored in the customers collection.
///
/// Stored and wire field names are the Spanish ones (`cedula`, `nombres`,
/// `apellidos`, `saldo`). Missing names read as empty strings and a missing
/// balance reads as zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Customer {
    #[serde(rename = "cedula")]
    pub id_number: String,
    #[serde(rename = "nombres", default)]
    pub given_names: String,
    #[serde(rename = "apellidos", default)]
    pub family_names: String,
    #[serde(rename = "saldo", default)]
    pub balance: f64,
}

impl Customer {
    pub fn new(
        id_number: impl Into<String>,
        given_names: impl Into<String>,
        family_names: impl Into<String>,
        balance: f64,
    ) -> Self {
        Self {
            id_number: id_number.into(),
            given_names: given_names.into(),
            family_names: family_names.into(),
            balance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Put,
    Add,
    Sub,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Put => "PUT",
            OperationKind::Add => "ADD",
            OperationKind::Sub => "SUB",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    #[serde(rename = "APROBADO")]
    Approved,
    #[serde(rename = "RECHAZADO")]
    Rejected,
}

/// Audit entry appended to the operations collection for every mutation
/// attempt made through the ledger.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OperationRecord {
    #[serde(rename = "cedula")]
    pub id_number: String,
    #[serde(rename = "tipo")]
    pub kind: OperationKind,
    /// `None` for `PUT`, stored as null.
    #[serde(rename = "monto")]
    pub amount: Option<f64>,
    #[serde(rename = "saldo_nuevo")]
    pub new_balance: f64,
    #[serde(rename = "nombres")]
    pub given_names: String,
    #[serde(rename = "apellidos")]
    pub family_names: String,
    #[serde(rename = "estado")]
    pub status: OperationStatus,
    pub ts: BsonDateTime,
}

impl OperationRecord {
    pub fn new(
        customer: &Customer,
        kind: OperationKind,
        amount: Option<f64>,
        status: OperationStatus,
    ) -> Self {
        Self::at(customer, kind, amount, status, Utc::now())
    }

    pub fn at(
        customer: &Customer,
        kind: OperationKind,
        amount: Option<f64>,
        status: OperationStatus,
        when: DateTime<Utc>,
    ) -> Self {
        Self {
            id_number: customer.id_number.clone(),
            kind,
            amount,
            new_balance: customer.balance,
            given_names: customer.given_names.clone(),
            family_names: customer.family_names.clone(),
            status,
            ts: BsonDateTime::from_millis(when.timestamp_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{Bson, doc};

    #[test]
    fn customer_uses_stored_field_names() {
        let customer = Customer::new("1234567890", "Juan", "Nieve", 150.75);
        let document = mongodb::bson::to_document(&customer).unwrap();

        assert_eq!(
            document,
            doc! {
                "cedula": "1234567890",
                "nombres": "Juan",
                "apellidos": "Nieve",
                "saldo": 150.75,
            }
        );
    }

    #[test]
    fn customer_reads_integer_balance_and_missing_fields() {
        let customer: Customer = mongodb::bson::from_document(doc! {
            "_id": mongodb::bson::oid::ObjectId::new(),
            "cedula": "1111111111",
            "saldo": 300_i32,
        })
        .unwrap();

        assert_eq!(customer.id_number, "1111111111");
        assert_eq!(customer.given_names, "");
        assert_eq!(customer.family_names, "");
        assert_eq!(customer.balance, 300.0);
    }

    #[test]
    fn operation_record_serializes_null_amount_for_put() {
        let customer = Customer::new("2222222222", "Luis", "Gómez", 80.5);
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = OperationRecord::at(
            &customer,
            OperationKind::Put,
            None,
            OperationStatus::Approved,
            when,
        );
        let document = mongodb::bson::to_document(&record).unwrap();

        assert_eq!(document.get("tipo"), Some(&Bson::String("PUT".into())));
        assert_eq!(document.get("monto"), Some(&Bson::Null));
        assert_eq!(document.get("estado"), Some(&Bson::String("APROBADO".into())));
        assert_eq!(document.get_f64("saldo_nuevo").unwrap(), 80.5);
        assert_eq!(
            document.get_datetime("ts").unwrap().timestamp_millis(),
            when.timestamp_millis()
        );
    }

    #[test]
    fn rejected_status_name() {
        let value = serde_json::to_value(OperationStatus::Rejected).unwrap();
        assert_eq!(value, serde_json::json!("RECHAZADO"));
        assert_eq!(OperationKind::Sub.to_string(), "SUB");
    }
}
