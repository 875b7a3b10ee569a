pub mod manager;
pub mod models;
pub mod repository;
pub mod sql;

pub use manager::{DatabaseError, DatabaseManager, MIGRATOR};
pub use repository::{CompanyStore, JobStore, PgStore};
