//! CouchDB-backed session store. Documents are stored whole and replaced
//! whole, matching the engine's last-write-wins reconciliation contract.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::{CouchDaoError, CouchResult};
pub use store::CouchSessionStore;
