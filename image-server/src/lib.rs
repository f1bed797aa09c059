//! HTTP service that imports images from public Google Drive folders into a SQLite catalog
//! and lists them back to clients.

pub mod api_types;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod router;
pub mod state;
