use std::sync::Arc;

use crate::{
    errors::StoreError,
    models::{Customer, OperationKind, OperationRecord, OperationStatus},
    protocol::{self, Command, Reply, ReplyData},
    store::{CustomerStore, Debit},
};

/// Executes protocol commands against a [`CustomerStore`] and keeps the
/// audit trail of every balance change.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn CustomerStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Answers one raw request line.
    pub async fn handle_line(&self, raw: &str) -> Reply {
        match Command::parse(raw) {
            Some(command) => self.execute(command).await,
            None => Reply::failure(protocol::MSG_INVALID_COMMAND),
        }
    }

    pub async fn execute(&self, command: Command) -> Reply {
        let result = match command {
            Command::Get { id_number } => self.get(&id_number).await,
            Command::Put {
                id_number,
                given_names,
                family_names,
                balance,
            } => {
                self.put(id_number, given_names, family_names, &balance)
                    .await
            }
            Command::Add { id_number, amount } => self.add(&id_number, &amount).await,
            Command::Sub { id_number, amount } => self.sub(&id_number, &amount).await,
        };

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "store operation failed");
            Reply::failure(protocol::MSG_INTERNAL)
        })
    }

    async fn get(&self, id_number: &str) -> Result<Reply, StoreError> {
        let reply = match self.store.find(id_number).await? {
            Some(customer) => Reply::success(protocol::MSG_FOUND, ReplyData::full(&customer)),
            None => Reply::failure(protocol::not_found_message(id_number)),
        };
        Ok(reply)
    }

    async fn put(
        &self,
        id_number: String,
        given_names: String,
        family_names: String,
        balance: &str,
    ) -> Result<Reply, StoreError> {
        let Some(balance) = protocol::parse_number(balance) else {
            return Ok(Reply::failure(protocol::MSG_INVALID_BALANCE));
        };

        let customer = Customer {
            id_number,
            given_names,
            family_names,
            balance,
        };
        self.store.upsert(&customer).await?;
        self.audit(&customer, OperationKind::Put, None, OperationStatus::Approved)
            .await;

        Ok(Reply::success(
            protocol::MSG_UPSERTED,
            ReplyData::balance(&customer.id_number, customer.balance),
        ))
    }

    async fn add(&self, id_number: &str, amount: &str) -> Result<Reply, StoreError> {
        let Some(amount) = protocol::parse_number(amount) else {
            return Ok(Reply::failure(protocol::MSG_INVALID_AMOUNT));
        };

        let Some(customer) = self.store.credit(id_number, amount).await? else {
            return Ok(Reply::failure(protocol::not_found_message(id_number)));
        };
        self.audit(
            &customer,
            OperationKind::Add,
            Some(amount),
            OperationStatus::Approved,
        )
        .await;

        Ok(Reply::success(
            protocol::MSG_CREDITED,
            ReplyData::full(&customer),
        ))
    }

    async fn sub(&self, id_number: &str, amount: &str) -> Result<Reply, StoreError> {
        let Some(amount) = protocol::parse_number(amount) else {
            return Ok(Reply::failure(protocol::MSG_INVALID_AMOUNT));
        };

        let reply = match self.store.debit(id_number, amount).await? {
            Debit::Applied(customer) => {
                self.audit(
                    &customer,
                    OperationKind::Sub,
                    Some(amount),
                    OperationStatus::Approved,
                )
                .await;
                Reply::success(protocol::MSG_DEBITED, ReplyData::full(&customer))
            }
            Debit::Insufficient(customer) => {
                self.audit(
                    &customer,
                    OperationKind::Sub,
                    Some(amount),
                    OperationStatus::Rejected,
                )
                .await;
                Reply::failure_with(protocol::MSG_INSUFFICIENT, ReplyData::names(&customer))
            }
            Debit::Missing => Reply::failure(protocol::not_found_message(id_number)),
        };
        Ok(reply)
    }

    /// Audit failures are logged and never fail the request.
    async fn audit(
        &self,
        customer: &Customer,
        kind: OperationKind,
        amount: Option<f64>,
        status: OperationStatus,
    ) {
        let record = OperationRecord::new(customer, kind, amount, status);
        if let Err(e) = self.store.record(&record).await {
            tracing::warn!(
                error = %e,
                cedula = %customer.id_number,
                %kind,
                "failed to record operation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{seed::sample_customers, store::MemoryStore};

    fn ledger() -> (Ledger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_customers(sample_customers()));
        (Ledger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn get_returns_full_record() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("GET:1234567890").await;

        assert!(reply.ok);
        assert_eq!(reply.message, "Registro encontrado");
        let data = reply.data.unwrap();
        assert_eq!(data.nombres.as_deref(), Some("Juan"));
        assert_eq!(data.apellidos.as_deref(), Some("Nieve"));
        assert_eq!(data.saldo, Some(150.75));
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn get_unknown_customer() {
        let (ledger, _) = ledger();
        let reply = ledger.handle_line("GET:0000000000").await;

        assert!(!reply.ok);
        assert_eq!(reply.message, "No existe registro para cédula 0000000000");
        assert!(reply.data.is_none());
    }

    #[tokio::test]
    async fn put_creates_customer_and_records_operation() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("PUT:3333333333:Eva:Luna:42.5").await;

        assert!(reply.ok);
        assert_eq!(reply.message, "Registro creado/actualizado");
        assert_eq!(
            reply.data,
            Some(ReplyData::balance("3333333333", 42.5))
        );

        let stored = store.find("3333333333").await.unwrap().unwrap();
        assert_eq!(stored, Customer::new("3333333333", "Eva", "Luna", 42.5));

        let ops = store.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Put);
        assert_eq!(ops[0].amount, None);
        assert_eq!(ops[0].new_balance, 42.5);
        assert_eq!(ops[0].status, OperationStatus::Approved);
    }

    #[tokio::test]
    async fn put_rejects_bad_balance() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("PUT:1:Eva:Luna:mucho").await;

        assert!(!reply.ok);
        assert_eq!(reply.message, "Saldo inválido");
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn add_increments_balance() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("ADD:1234567890:50").await;

        assert!(reply.ok);
        assert_eq!(reply.message, "Saldo incrementado");
        assert_eq!(reply.data.unwrap().saldo, Some(200.75));

        let ops = store.operations();
        assert_eq!(ops[0].kind, OperationKind::Add);
        assert_eq!(ops[0].amount, Some(50.0));
        assert_eq!(ops[0].given_names, "Juan");
    }

    #[tokio::test]
    async fn add_rejects_bad_amount_and_unknown_customer() {
        let (ledger, _) = ledger();

        let reply = ledger.handle_line("ADD:1234567890:x").await;
        assert_eq!(reply.message, "Monto inválido");

        let reply = ledger.handle_line("ADD:9:1").await;
        assert!(!reply.ok);
        assert_eq!(reply.message, "No existe registro para cédula 9");
    }

    #[tokio::test]
    async fn sub_decrements_when_funds_suffice() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("SUB:1111111111:100").await;

        assert!(reply.ok);
        assert_eq!(reply.message, "Saldo decrementado");
        assert_eq!(reply.data.unwrap().saldo, Some(200.0));
        assert_eq!(store.operations()[0].status, OperationStatus::Approved);
    }

    #[tokio::test]
    async fn sub_rejects_insufficient_funds_and_records_rejection() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("SUB:2222222222:100").await;

        assert!(!reply.ok);
        assert_eq!(reply.message, "Saldo insuficiente");
        let data = reply.data.unwrap();
        assert_eq!(data.nombres.as_deref(), Some("Luis"));
        assert_eq!(data.saldo, None);

        let ops = store.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].status, OperationStatus::Rejected);
        assert_eq!(ops[0].new_balance, 80.5);

        let luis = store.find("2222222222").await.unwrap().unwrap();
        assert_eq!(luis.balance, 80.5);
    }

    #[tokio::test]
    async fn sub_unknown_customer_is_not_recorded() {
        let (ledger, store) = ledger();
        let reply = ledger.handle_line("SUB:9:1").await;

        assert_eq!(reply.message, "No existe registro para cédula 9");
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn invalid_lines_get_generic_error() {
        let (ledger, _) = ledger();
        for line in ["", "HELLO", "GET", "PUT:1:2", "SUB:1:2:3"] {
            let reply = ledger.handle_line(line).await;
            assert!(!reply.ok);
            assert_eq!(reply.message, "Comando inválido o argumentos incorrectos");
        }
    }
}
