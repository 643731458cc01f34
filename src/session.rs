//! Caller-owned cache of the last analyzed upload.
//!
//! A session holds at most one entry. Storing a new upload replaces the old
//! one; nothing is memoized implicitly.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use crate::{ingest::LogTable, model::AnalysisResult};

/// Content hash of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadFingerprint(u64);

impl UploadFingerprint {
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(xxh3_64(bytes))
    }
}

impl std::fmt::Display for UploadFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub fingerprint: UploadFingerprint,
    pub table: Arc<LogTable>,
    pub result: Arc<AnalysisResult>,
    pub analyzed_at: DateTime<Utc>,
}

impl SessionEntry {
    #[must_use]
    pub fn new(fingerprint: UploadFingerprint, table: LogTable, result: AnalysisResult) -> Self {
        Self {
            fingerprint,
            table: Arc::new(table),
            result: Arc::new(result),
            analyzed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalysisSession {
    current: Option<SessionEntry>,
}

impl AnalysisSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&SessionEntry> {
        self.current.as_ref()
    }

    /// Returns the cached entry only when it was built from the same upload.
    #[must_use]
    pub fn lookup(&self, fingerprint: UploadFingerprint) -> Option<&SessionEntry> {
        self.current
            .as_ref()
            .filter(|entry| entry.fingerprint == fingerprint)
    }

    /// Replaces whatever was cached, returning the previous entry.
    pub fn store(&mut self, entry: SessionEntry) -> Option<SessionEntry> {
        self.current.replace(entry)
    }

    pub fn invalidate(&mut self) -> Option<SessionEntry> {
        self.current.take()
    }
}
