//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `attendance.student_id` deliberately carries no foreign key: deleting a
/// student must leave their past records in place, so dangling references
/// are expected and tolerated by readers.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS students (
    student_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT NOT NULL UNIQUE,
    signature   BLOB NOT NULL,   -- little-endian f64 elements, bit-exact
    enrolled_at TEXT NOT NULL    -- RFC 3339 UTC
);

-- Attendance rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS attendance (
    record_id    TEXT PRIMARY KEY,
    student_id   TEXT NOT NULL,
    student_name TEXT NOT NULL,  -- snapshot at marking time
    marked_at    TEXT NOT NULL   -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS attendance_marked_idx  ON attendance(marked_at);
CREATE INDEX IF NOT EXISTS attendance_student_idx ON attendance(student_id);

PRAGMA user_version = 1;
";
