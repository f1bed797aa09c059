use std::sync::Arc;

use anyhow::Context;
use rusqlite::Connection;

use self::{
    manager::{LinearMigrationManager, MigrationManager},
    migration::{V0, V1},
};

pub mod manager;
pub mod migration;
pub mod tables;

/// Bring the schema of `conn` up to the latest registered migration, in one transaction.
pub fn migrate(conn: &mut Connection) -> anyhow::Result<()> {
    let mut migration_manager = LinearMigrationManager::new();
    migration_manager.register_migration(Arc::new(V0));
    migration_manager.register_migration(Arc::new(V1));

    let txn = conn.transaction()?;
    migration_manager.initialize(&txn)?;

    let current_schema_version = migration_manager.get_current_schema_version(&txn)?;
    let target_schema_version = migration_manager.get_target_schema_version();
    migration_manager.upgrade_schema(&txn, current_schema_version, target_schema_version)?;

    txn.commit().context("failed to commit schema migration")
}
