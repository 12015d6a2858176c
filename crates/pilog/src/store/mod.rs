// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Reading store abstraction
//!
//! The store is the only component that opens write transactions. Each
//! operation is its own short transaction so the poll loop and concurrent
//! query handlers never hold the store across an adapter call.
//!
//! # Implementations
//!
//! - [`SqliteStore`] -- SQLite file (WAL) or in-memory database

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StorageResult;
use crate::reading::Reading;
use chrono::{DateTime, Utc};

/// Append-only reading store.
pub trait ReadingStore: Send + Sync {
    /// Append one reading. No uniqueness is enforced.
    fn insert(&self, reading: &Reading) -> StorageResult<()>;

    /// Append many readings in a single transaction. Returns rows written.
    fn insert_batch(&self, readings: &[Reading]) -> StorageResult<usize>;

    /// All readings strictly newer than `since`, oldest first.
    ///
    /// An empty vector means nothing matched; it is not an error.
    fn query_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<Reading>>;

    /// The most recent reading by timestamp; on equal timestamps the row
    /// inserted last wins. `None` on an empty store.
    fn query_latest(&self) -> StorageResult<Option<Reading>>;

    /// Total number of stored readings.
    fn count(&self) -> StorageResult<usize>;
}
