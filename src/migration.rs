pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_session_table;
mod m20240101_000002_create_site_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Keep our bookkeeping table apart from anything else sharing the database
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("wanderlust_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_session_table::Migration),
            Box::new(m20240101_000002_create_site_tables::Migration),
        ]
    }
}
