//! Core types for dustpan.
//!
//! This crate provides the data model shared by the scanner and the
//! analyzers: file records, validated record sets, content hashes,
//! configuration and the error taxonomy.

mod config;
mod error;
mod record;
mod record_set;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{AnalysisError, ScanError, ScanWarning, SkipReason, SkippedRecord};
pub use record::{ContentHash, FileRecord, RecordKind, SavedRecord};
pub use record_set::{RecordSet, RecordStats, SavedRecords};
