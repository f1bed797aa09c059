//! Package for MigrationManager, which depends on a set of `Migration`s

use log::info;
use std::sync::Arc;

use anyhow::Context;
use rusqlite::{OptionalExtension, Transaction};
use thiserror::Error;

use super::migration::Migration;

pub trait MigrationManager<'a> {
    fn register_migration(&mut self, migration: Arc<dyn Migration>);

    /// Initialize the migration system in the database
    fn initialize(&self, conn: &'a Transaction) -> anyhow::Result<()>;

    /// Get the current schema version number from the DB, or 0 for a fresh database
    fn get_current_schema_version(&self, conn: &'a Transaction) -> anyhow::Result<u64>;

    fn get_target_schema_version(&self) -> u64;

    fn upgrade_schema(&self, conn: &'a Transaction, from: u64, to: u64) -> anyhow::Result<()>;
}

/// Applies migrations in registration order. Schema version `n` means the first `n` migrations ran.
pub struct LinearMigrationManager {
    pub migrations: Vec<Arc<dyn Migration>>,
}

impl LinearMigrationManager {
    pub fn new() -> Self {
        LinearMigrationManager {
            migrations: Vec::new(),
        }
    }
}

impl Default for LinearMigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MigrationManager<'a> for LinearMigrationManager {
    fn register_migration(&mut self, migration: Arc<dyn Migration>) {
        self.migrations.push(migration);
    }

    fn initialize(&self, conn: &'a Transaction) -> anyhow::Result<()> {
        conn.execute_batch(
            r"
            create table if not exists schema_versions (
                version INTEGER NOT NULL,
                is_current INTEGER NOT NULL,
                PRIMARY KEY (version)
            );
        ",
        )?;

        Ok(())
    }

    fn get_current_schema_version(&self, conn: &'a Transaction) -> anyhow::Result<u64> {
        let version = conn
            .query_row(
                "select version from schema_versions where is_current = 1",
                [],
                |row| row.get::<usize, i64>(0),
            )
            .optional()
            .context("failed to read current schema version")?;

        match version {
            None => Ok(0),
            Some(v) => u64::try_from(v).context("negative schema version"),
        }
    }

    fn get_target_schema_version(&self) -> u64 {
        self.migrations.len() as u64
    }

    fn upgrade_schema(&self, conn: &'a Transaction, from: u64, to: u64) -> anyhow::Result<()> {
        info!("Executing upgrade from {} to {}", from, to);
        // Enforce version ranges are valid
        if from > self.get_target_schema_version() || to > self.get_target_schema_version() {
            return Err(MigrationError::InvalidSchemaVersion.into());
        }

        if to < from {
            return Err(MigrationError::InvalidSchemaRange.into());
        }

        for i in from..to {
            let migration = &self.migrations[i as usize];
            info!("starting migration {}", &i);
            migration.forward(conn)?;
            info!("migration {} complete", &i);
        }

        if to > from {
            conn.execute("update schema_versions set is_current = 0", [])?;
            conn.execute(
                "insert or replace into schema_versions (version, is_current) values (?1, 1)",
                [to as i64],
            )?;
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("schema version is beyond the newest registered migration")]
    InvalidSchemaVersion,
    #[error("schema versions can only move forward")]
    InvalidSchemaRange,
}
