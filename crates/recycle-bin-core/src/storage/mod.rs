pub mod models;
mod queries;
pub mod sqlite;

pub use models::{NewRecord, Record};
pub use sqlite::TrackingStore;
