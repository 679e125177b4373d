//! # MongoDB connection
//!
//! [`ClientesDb`] wraps a pooled `mongodb::Client` together with the database
//! and collection names from [`MongoSettings`]. Clones share the same pool.

use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    error::ErrorKind,
    options::{ClientOptions, IndexOptions},
};

use crate::{
    config::MongoSettings,
    errors::StoreError,
    models::{Customer, OperationRecord},
};

/// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;

#[derive(Clone, Debug)]
pub struct ClientesDb {
    client: Client,
    settings: MongoSettings,
}

impl ClientesDb {
    pub async fn connect(settings: &MongoSettings) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&settings.uri).await?;
        options.app_name = Some("clientes".to_string());
        let client = Client::with_options(options)?;

        tracing::debug!(database = %settings.database, "mongodb client ready");

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    pub fn settings(&self) -> &MongoSettings {
        &self.settings
    }

    pub fn database(&self) -> Database {
        self.client.database(&self.settings.database)
    }

    pub fn customers(&self) -> Collection<Customer> {
        self.database().collection(&self.settings.customers)
    }

    pub fn operations(&self) -> Collection<OperationRecord> {
        self.database().collection(&self.settings.operations)
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let names = self
            .database()
            .list_collection_names()
            .filter(doc! { "name": name })
            .await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Creates the customer collection. Returns `false` when it already
    /// existed, whether seen by the listing or reported by the server when
    /// another client created it in between.
    pub async fn create_customers_collection(&self) -> Result<bool, StoreError> {
        let name = &self.settings.customers;
        if self.collection_exists(name).await? {
            return Ok(false);
        }

        match self.database().create_collection(name).await {
            Ok(()) => Ok(true),
            Err(e) if is_namespace_exists(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Index backing "latest operations for a customer" lookups.
    pub async fn ensure_operation_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "cedula": 1, "ts": -1 })
            .options(
                IndexOptions::builder()
                    .name("cedula_ts".to_string())
                    .build(),
            )
            .build();

        self.operations().create_index(index).await?;
        Ok(())
    }
}

fn is_namespace_exists(e: &mongodb::error::Error) -> bool {
    matches!(*e.kind, ErrorKind::Command(ref cmd) if cmd.code == NAMESPACE_EXISTS)
}
