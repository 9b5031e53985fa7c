//! Export layer: CSV tables and JSON filing snapshots.

pub mod export;
pub mod snapshot;

pub use snapshot::{AuditTrail, FilingSnapshot, export_snapshot};
