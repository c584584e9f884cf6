pub mod config;
pub mod engine;
pub mod error;
pub mod holding;
pub mod paths;
pub mod scheduler;
pub mod storage;

pub use config::RecycleConfig;
pub use engine::{AuditReport, Deleted, Listing, PurgeSummary, RecycleEngine, Restored};
pub use error::Error;
pub use holding::{HoldingArea, Removal};
pub use scheduler::Scheduler;
pub use storage::{NewRecord, Record, TrackingStore};
