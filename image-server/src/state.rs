use std::sync::Arc;

use crate::{db::tables::DB, import::Importer};

type DBHandle = Arc<DB>;
type ImporterHandle = Arc<dyn Importer + Sync + Send>;

#[derive(Clone)]
pub struct AppState {
    pub db: DBHandle,
    pub importer: ImporterHandle,
}
