//! One-shot initialization of the customer collection with three sample
//! customers.

use std::io::Write;

use clap::ValueEnum;
use mongodb::bson::doc;

use crate::{db::ClientesDb, errors::StoreError, models::Customer};

/// How records are written when the seed runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SeedMode {
    /// Insert a record only when no customer with its cedula exists.
    #[default]
    SkipExisting,
    /// Bulk insert all records unconditionally.
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub collection_created: bool,
    pub inserted: usize,
}

pub fn sample_customers() -> Vec<Customer> {
    vec![
        Customer::new("1234567890", "Juan", "Nieve", 150.75),
        Customer::new("1111111111", "Ana", "Pérez", 300.0),
        Customer::new("2222222222", "Luis", "Gómez", 80.5),
    ]
}

pub fn confirmation_message(database: &str, collection: &str) -> String {
    format!("Base de datos '{database}' inicializada con colección '{collection}'.")
}

/// Creates the customer collection and writes the sample customers. The
/// confirmation line goes to `out` only once every write has been
/// acknowledged.
pub async fn run(
    db: &ClientesDb,
    mode: SeedMode,
    out: &mut impl Write,
) -> Result<SeedReport, StoreError> {
    let settings = db.settings();

    let collection_created = db.create_customers_collection().await?;
    if !collection_created {
        tracing::info!(
            collection = %settings.customers,
            "collection already exists, keeping it"
        );
    }

    let customers = db.customers();
    let samples = sample_customers();

    let inserted = match mode {
        SeedMode::Insert => customers.insert_many(&samples).await?.inserted_ids.len(),
        SeedMode::SkipExisting => {
            let mut inserted = 0;
            for customer in &samples {
                let fields = mongodb::bson::to_document(customer)?;
                let result = customers
                    .update_one(
                        doc! { "cedula": &customer.id_number },
                        doc! { "$setOnInsert": fields },
                    )
                    .upsert(true)
                    .await?;

                if result.upserted_id.is_some() {
                    inserted += 1;
                } else {
                    tracing::debug!(cedula = %customer.id_number, "customer already present");
                }
            }
            inserted
        }
    };

    tracing::info!(
        database = %settings.database,
        collection = %settings.customers,
        inserted,
        ?mode,
        "seed complete"
    );
    writeln!(
        out,
        "{}",
        confirmation_message(&settings.database, &settings.customers)
    )?;
    out.flush()?;

    Ok(SeedReport {
        collection_created,
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seeds_exactly_three_customers() {
        assert_eq!(sample_customers().len(), 3);
    }

    #[test]
    fn sample_values_match_literals() {
        let customers = sample_customers();

        assert_eq!(customers[0], Customer::new("1234567890", "Juan", "Nieve", 150.75));
        assert_eq!(customers[1], Customer::new("1111111111", "Ana", "Pérez", 300.0));
        assert_eq!(customers[2], Customer::new("2222222222", "Luis", "Gómez", 80.5));
    }

    #[test]
    fn sample_identifiers_are_ten_digit_codes() {
        let customers = sample_customers();
        let ids: HashSet<_> = customers.iter().map(|c| c.id_number.as_str()).collect();

        assert_eq!(ids.len(), customers.len());
        assert!(
            customers
                .iter()
                .all(|c| c.id_number.len() == 10 && c.id_number.chars().all(|ch| ch.is_ascii_digit()))
        );
    }

    #[test]
    fn confirmation_names_database_and_collection() {
        assert_eq!(
            confirmation_message("clientes_db", "personas"),
            "Base de datos 'clientes_db' inicializada con colección 'personas'."
        );
    }

    #[test]
    fn default_mode_skips_existing() {
        assert_eq!(SeedMode::default(), SeedMode::SkipExisting);
        assert_eq!(
            SeedMode::from_str("insert", true).unwrap(),
            SeedMode::Insert
        );
        assert_eq!(
            SeedMode::from_str("skip-existing", true).unwrap(),
            SeedMode::SkipExisting
        );
    }
}
