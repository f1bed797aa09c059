use rusqlite::Transaction;

/// A single forward-only schema step.
pub trait Migration: Send + Sync {
    fn forward(&self, txn: &Transaction) -> anyhow::Result<()>;
}

/// Base catalog table.
pub struct V0;

impl Migration for V0 {
    fn forward(&self, txn: &Transaction) -> anyhow::Result<()> {
        txn.execute_batch(
            r"
            create table if not exists images (
                id              integer primary key autoincrement,
                name            text not null,
                google_drive_id text,
                size            integer,
                mime_type       text,
                storage_url     text,
                source          text default 'google_drive'
            );
        ",
        )?;

        Ok(())
    }
}

/// Import bookkeeping columns, plus a unique drive id so re-importing a folder is a no-op.
pub struct V1;

impl Migration for V1 {
    fn forward(&self, txn: &Transaction) -> anyhow::Result<()> {
        txn.execute_batch(
            r"
            alter table images add column created_at datetime;
            alter table images add column status text not null default 'imported';
            create unique index if not exists images_google_drive_id
                on images (google_drive_id);
        ",
        )?;

        Ok(())
    }
}
