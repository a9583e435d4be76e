#![forbid(unsafe_code)]

pub mod fs;
pub mod repository;

pub use fs::JsonFileStore;
pub use repository::{InMemoryResultStore, OutcomeRecord, ReportRecord, ResultStore, StorageError};
