//! Annotation module
//!
//! Persistence for captured highlights and notes.
//!
//! - `types`: the record and the draft a capture surface submits
//! - `store`: ordered list with single-writer mutations
//! - `kv`: key/value backends (memory, SQLite)

mod error;
mod kv;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use kv::{KeyValueStore, MemoryKv, SqliteKv};
pub use store::{AnnotationStore, StoreConfig, DEFAULT_STORAGE_KEY};
pub use types::{AnnotationRecord, AnnotationType, NewAnnotation, PageInfo};
