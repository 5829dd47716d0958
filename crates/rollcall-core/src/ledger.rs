//! Append-only attendance ledger with at-most-one-mark-per-day dedup.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::types::AttendanceRecord;

/// Outcome of a mark attempt. `AlreadyMarked` is a normal branch, not an
/// error: the caller renders different feedback for it.
#[derive(Debug, Clone)]
pub enum MarkOutcome {
    Marked(AttendanceRecord),
    AlreadyMarked,
}

/// Calendar day of a timestamp under the fixed UTC policy.
///
/// The original system truncated ISO-8601 strings, which is UTC truncation;
/// keeping that policy here means the write-time dedup check and every
/// day-scoped query agree on which events share a day.
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Append-only log of presence events, in insertion order.
///
/// Records are never mutated or deleted; they may reference students that
/// have since been renamed or removed, which is why each record carries a
/// name snapshot.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<AttendanceRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a loaded snapshot. Order is preserved.
    pub fn from_records(records: Vec<AttendanceRecord>) -> Self {
        Self { records }
    }

    /// Mark `student_id` present at `now`, unless a record already exists
    /// for the same student on `now`'s UTC day.
    ///
    /// The dedup check is date-scoped, not order-scoped: any prior record
    /// on the day suppresses a new one regardless of position in the log.
    pub fn mark(&mut self, student_id: Uuid, student_name: &str, now: DateTime<Utc>) -> MarkOutcome {
        if self.is_present(student_id, day_of(now)) {
            return MarkOutcome::AlreadyMarked;
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            student_id,
            student_name: student_name.to_string(),
            marked_at: now,
        };
        tracing::info!(student = %student_id, at = %now, "attendance marked");
        self.records.push(record.clone());
        MarkOutcome::Marked(record)
    }

    /// Undo the most recent append. Used by the engine to keep memory and
    /// disk in step when a write-through fails.
    pub fn pop_last(&mut self) -> Option<AttendanceRecord> {
        self.records.pop()
    }

    pub fn is_present(&self, student_id: Uuid, day: NaiveDate) -> bool {
        self.records
            .iter()
            .any(|r| r.student_id == student_id && day_of(r.marked_at) == day)
    }

    /// Records on `day`, most recent first (display order).
    pub fn events_for_day(&self, day: NaiveDate) -> Vec<&AttendanceRecord> {
        let mut events: Vec<&AttendanceRecord> = self
            .records
            .iter()
            .filter(|r| day_of(r.marked_at) == day)
            .collect();
        events.sort_by(|a, b| b.marked_at.cmp(&a.marked_at));
        events
    }

    /// Full log in insertion order.
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Per-day event counts, recomputed on demand.
    pub fn summary_by_day(&self) -> BTreeMap<NaiveDate, usize> {
        let mut summary = BTreeMap::new();
        for record in &self.records {
            *summary.entry(day_of(record.marked_at)).or_insert(0) += 1;
        }
        summary
    }

    /// Up to `limit` most recent records on `day`, for the scanning panel.
    pub fn recent_for_day(&self, day: NaiveDate, limit: usize) -> Vec<&AttendanceRecord> {
        let mut events = self.events_for_day(day);
        events.truncate(limit);
        events
    }
}
