//! The persistence port consumed by the attendance engine.
//!
//! Backends (e.g. `rollcall-store`'s SQLite implementation) load the full
//! state once at startup and then apply row-level write-through operations
//! inline with each mutation. The matching and ledger logic never depends
//! on a concrete storage technology.

use thiserror::Error;
use uuid::Uuid;

use crate::types::{AttendanceRecord, Student};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Durable state failed validation on load. Fatal to startup for the
    /// affected store; falling back to empty state would silently erase
    /// prior enrollments and attendance.
    #[error("corrupt state: {0}")]
    Corrupt(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Full persisted state, in insertion order.
#[derive(Debug, Default)]
pub struct StoreSnapshot {
    pub students: Vec<Student>,
    pub records: Vec<AttendanceRecord>,
}

/// Durable storage for roster and ledger state.
///
/// Implementations must round-trip signature vectors exactly (no lossy
/// re-quantization) and must tolerate attendance rows whose `student_id`
/// no longer resolves — student deletion leaves past records dangling by
/// design. Methods take `&mut self`: the engine is the single writer and
/// calls them from one thread.
pub trait AttendanceStore: Send {
    /// Load and validate all state. Malformed rows (non-numeric or empty
    /// signature payloads, inconsistent signature lengths, unparsable ids
    /// or timestamps) must surface as [`StoreError::Corrupt`], never as
    /// silently coerced defaults.
    fn load(&mut self) -> Result<StoreSnapshot, StoreError>;

    fn insert_student(&mut self, student: &Student) -> Result<(), StoreError>;
    fn update_student(&mut self, student: &Student) -> Result<(), StoreError>;
    fn delete_student(&mut self, id: Uuid) -> Result<(), StoreError>;
    fn append_record(&mut self, record: &AttendanceRecord) -> Result<(), StoreError>;
}
