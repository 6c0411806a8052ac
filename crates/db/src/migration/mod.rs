//! Database migrations.
//!
//! Written with the schema builder so the same migrations run on PostgreSQL
//! in production and on SQLite in the integration tests.

pub use sea_orm_migration::prelude::*;

mod m20260901_000001_stock_ledger;
mod m20260901_000002_documents;

/// Applies the Stockflow schema.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_stock_ledger::Migration),
            Box::new(m20260901_000002_documents::Migration),
        ]
    }
}
