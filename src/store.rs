use {
    crate::{
        db::ClientesDb,
        errors::StoreError,
        models::{Customer, OperationRecord},
    },
    mongodb::{bson::doc, options::ReturnDocument},
    std::{
        collections::HashMap,
        sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    },
};

/// Outcome of a conditional debit.
#[derive(Debug, Clone, PartialEq)]
pub enum Debit {
    /// The balance covered the amount; carries the updated customer.
    Applied(Customer),
    /// The balance did not cover the amount; carries the unchanged customer.
    Insufficient(Customer),
    Missing,
}

/// Persistence used by the ledger.
#[rocket::async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find(&self, id_number: &str) -> Result<Option<Customer>, StoreError>;

    /// Creates or replaces the customer keyed by `id_number`.
    async fn upsert(&self, customer: &Customer) -> Result<(), StoreError>;

    /// Adds `amount` to the balance and returns the updated customer.
    async fn credit(&self, id_number: &str, amount: f64) -> Result<Option<Customer>, StoreError>;

    /// Subtracts `amount` only if the balance is at least `amount`, as one
    /// atomic step.
    async fn debit(&self, id_number: &str, amount: f64) -> Result<Debit, StoreError>;

    async fn record(&self, operation: &OperationRecord) -> Result<(), StoreError>;
}

pub struct MongoStore {
    db: ClientesDb,
}

impl MongoStore {
    pub fn new(db: ClientesDb) -> Self {
        Self { db }
    }
}

#[rocket::async_trait]
impl CustomerStore for MongoStore {
    async fn find(&self, id_number: &str) -> Result<Option<Customer>, StoreError> {
        let customer = self
            .db
            .customers()
            .find_one(doc! { "cedula": id_number })
            .await?;
        Ok(customer)
    }

    async fn upsert(&self, customer: &Customer) -> Result<(), StoreError> {
        let fields = mongodb::bson::to_document(customer)?;
        self.db
            .customers()
            .update_one(doc! { "cedula": &customer.id_number }, doc! { "$set": fields })
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn credit(&self, id_number: &str, amount: f64) -> Result<Option<Customer>, StoreError> {
        let customer = self
            .db
            .customers()
            .find_one_and_update(
                doc! { "cedula": id_number },
                doc! { "$inc": { "saldo": amount } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(customer)
    }

    async fn debit(&self, id_number: &str, amount: f64) -> Result<Debit, StoreError> {
        let customers = self.db.customers();

        let applied = customers
            .find_one_and_update(
                doc! { "cedula": id_number, "saldo": { "$gte": amount } },
                doc! { "$inc": { "saldo": -amount } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(customer) = applied {
            return Ok(Debit::Applied(customer));
        }

        let debit = match customers.find_one(doc! { "cedula": id_number }).await? {
            Some(customer) => Debit::Insufficient(customer),
            None => Debit::Missing,
        };
        Ok(debit)
    }

    async fn record(&self, operation: &OperationRecord) -> Result<(), StoreError> {
        self.db.operations().insert_one(operation).await?;
        Ok(())
    }
}

/// Process-local store used by `serve --memory` and by tests.
#[derive(Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<String, Customer>>,
    operations: Mutex<Vec<OperationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let store = Self::new();
        store
            .write_customers()
            .extend(customers.into_iter().map(|c| (c.id_number.clone(), c)));
        store
    }

    pub fn operations(&self) -> Vec<OperationRecord> {
        self.lock_operations().clone()
    }

    pub fn len(&self) -> usize {
        self.read_customers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while a guard was held leaves the data itself consistent: every
    // mutation below is a single insert or field update.
    fn read_customers(&self) -> RwLockReadGuard<'_, HashMap<String, Customer>> {
        self.customers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_customers(&self) -> RwLockWriteGuard<'_, HashMap<String, Customer>> {
        self.customers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_operations(&self) -> MutexGuard<'_, Vec<OperationRecord>> {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[rocket::async_trait]
impl CustomerStore for MemoryStore {
    async fn find(&self, id_number: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.read_customers().get(id_number).cloned())
    }

    async fn upsert(&self, customer: &Customer) -> Result<(), StoreError> {
        self.write_customers()
            .insert(customer.id_number.clone(), customer.clone());
        Ok(())
    }

    async fn credit(&self, id_number: &str, amount: f64) -> Result<Option<Customer>, StoreError> {
        let mut map = self.write_customers();
        Ok(map.get_mut(id_number).map(|customer| {
            customer.balance += amount;
            customer.clone()
        }))
    }

    async fn debit(&self, id_number: &str, amount: f64) -> Result<Debit, StoreError> {
        let mut map = self.write_customers();
        let debit = match map.get_mut(id_number) {
            Some(customer) if customer.balance >= amount => {
                customer.balance -= amount;
                Debit::Applied(customer.clone())
            }
            Some(customer) => Debit::Insufficient(customer.clone()),
            None => Debit::Missing,
        };
        Ok(debit)
    }

    async fn record(&self, operation: &OperationRecord) -> Result<(), StoreError> {
        self.lock_operations().push(operation.clone());
        Ok(())
    }
}
