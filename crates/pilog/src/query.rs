// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Query façade
//!
//! Turns external request parameters into store reads and shapes the
//! result for the wire. "Nothing found" is a normal response, distinct
//! from a storage failure.

use crate::error::StorageError;
use crate::reading::Reading;
use crate::store::ReadingStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Message body returned when a query matches nothing.
pub const NO_RESULTS_MESSAGE: &str = "query returns no results";

/// Query failures.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("cannot parse timestamp '{0}'")]
    BadTimestamp(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    Readings(Vec<Reading>),
    Latest(Reading),
    NoResults,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

impl QueryResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoResults)
    }

    /// Wire form: an array of readings, one reading object, or
    /// `{"message": "query returns no results"}`.
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Self::Readings(readings) => serde_json::to_value(readings),
            Self::Latest(reading) => serde_json::to_value(reading),
            Self::NoResults => serde_json::to_value(Message {
                message: NO_RESULTS_MESSAGE,
            }),
        };
        // Readings hold only strings, numbers and RFC 3339 timestamps
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Read-only access to the store for request handlers.
pub struct QueryFacade<S: ReadingStore> {
    store: Arc<S>,
}

impl<S: ReadingStore> Clone for QueryFacade<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReadingStore> QueryFacade<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Readings strictly after the timestamp in `raw`.
    pub fn since(&self, raw: &str) -> Result<QueryResponse, QueryError> {
        let since = parse_timestamp(raw)?;
        let readings = self.store.query_since(since)?;

        Ok(if readings.is_empty() {
            QueryResponse::NoResults
        } else {
            QueryResponse::Readings(readings)
        })
    }

    /// The single most recent reading.
    pub fn latest(&self) -> Result<QueryResponse, QueryError> {
        Ok(match self.store.query_latest()? {
            Some(reading) => QueryResponse::Latest(reading),
            None => QueryResponse::NoResults,
        })
    }
}

/// Parse a request timestamp. Accepts RFC 3339 and the naive forms
/// `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD`;
/// naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, QueryError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| QueryError::BadTimestamp(raw.to_string()))
}
