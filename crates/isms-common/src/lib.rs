//! ISMS Common - Storage boundary shared by the ISMS toolkit
//!
//! This crate provides:
//! - Storage keys under which every ISMS artifact is persisted
//! - A key-value store seam with in-memory and JSON-file backends
//! - A typed store that parses values into records at the boundary
//! - A change bus notifying subscribers after every write
//! - Interval-driven auto-save of dirty models
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        IsmsStore                           │
//! │   read::<T>() ── parse ──▶ Ok(Some(T)) | Err(Corrupt)      │
//! │   write(&T)  ── size guard ──▶ backend ──▶ ChangeBus       │
//! └───────────────┬──────────────────────────────┬─────────────┘
//!                 │                              │
//!        ┌────────▼────────┐            ┌────────▼────────┐
//!        │  KeyValueStore  │            │    ChangeBus    │
//!        │ Memory │ File   │            │  subscribers    │
//!        └─────────────────┘            └─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod autosave;
pub mod error;
pub mod events;
pub mod keys;
pub mod storage;
pub mod store;

pub use autosave::{AutoSaveHandle, AutoSaveRecord, AutoSaver};
pub use error::*;
pub use events::{ChangeBus, ChangeEvent, ChangeOrigin, Subscription};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
pub use store::IsmsStore;
