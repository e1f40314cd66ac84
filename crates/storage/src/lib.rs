//! Storage abstraction and implementations for Pulse.
//!
//! This crate provides a trait-based storage interface with in-memory and
//! JSON file implementations, plus backup snapshots and a cloud backup client.

#![warn(missing_docs)]

pub mod trait_;
pub mod backup;
pub mod memory;
pub mod json_storage;
pub mod cloud;

pub use trait_::{Storage, StorageError, Result};
pub use backup::{BackupSnapshot, BACKUP_VERSION, export_to_file, import_from_file};
pub use memory::MemoryStorage;
pub use json_storage::JsonStorage;
pub use cloud::CloudBackupClient;
