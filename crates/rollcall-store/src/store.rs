//! [`SqliteStore`] — the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use rollcall_core::{AttendanceRecord, AttendanceStore, StoreError, StoreSnapshot, Student};
use uuid::Uuid;

use crate::encode::{
    decode_dt, decode_signature, decode_uuid, encode_dt, encode_signature, encode_uuid,
};
use crate::schema::SCHEMA;

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

/// Attendance store backed by a single SQLite file.
pub struct SqliteStore {
    pub(crate) conn: rusqlite::Connection,
}

impl SqliteStore {
    /// Open (or create) a store at `path` and run schema initialisation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path).map_err(backend)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store — useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: rusqlite::Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self { conn })
    }

    fn load_students(&self) -> Result<Vec<Student>, StoreError> {
        let mut stmt = self
            .conn
            // rowid preserves insertion order.
            .prepare(
                "SELECT student_id, name, code, signature, enrolled_at
                 FROM students ORDER BY rowid",
            )
            .map_err(backend)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;

        let mut students = Vec::with_capacity(rows.len());
        for (id, name, code, signature_blob, enrolled_at) in rows {
            students.push(Student {
                id: decode_uuid("students.student_id", &id)?,
                name,
                code,
                signature: decode_signature(&signature_blob)?,
                enrolled_at: decode_dt("students.enrolled_at", &enrolled_at)?,
            });
        }

        // All stored signatures must share one length or nearest-match
        // comparisons are meaningless.
        if let Some(expected) = students.first().map(|s| s.signature.len()) {
            for student in &students {
                if student.signature.len() != expected {
                    return Err(StoreError::Corrupt(format!(
                        "student {}: signature length {} differs from established length {}",
                        student.id,
                        student.signature.len(),
                        expected
                    )));
                }
            }
        }

        Ok(students)
    }

    fn load_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT record_id, student_id, student_name, marked_at
                 FROM attendance ORDER BY rowid",
            )
            .map_err(backend)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend)?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, student_id, student_name, marked_at) in rows {
            records.push(AttendanceRecord {
                id: decode_uuid("attendance.record_id", &id)?,
                // May dangle after a student deletion; tolerated by design.
                student_id: decode_uuid("attendance.student_id", &student_id)?,
                student_name,
                marked_at: decode_dt("attendance.marked_at", &marked_at)?,
            });
        }
        Ok(records)
    }
}

impl AttendanceStore for SqliteStore {
    fn load(&mut self) -> Result<StoreSnapshot, StoreError> {
        let students = self.load_students()?;
        let records = self.load_records()?;
        tracing::info!(
            students = students.len(),
            records = records.len(),
            "state loaded"
        );
        Ok(StoreSnapshot { students, records })
    }

    fn insert_student(&mut self, student: &Student) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO students (student_id, name, code, signature, enrolled_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    encode_uuid(student.id),
                    student.name,
                    student.code,
                    encode_signature(&student.signature),
                    encode_dt(student.enrolled_at),
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn update_student(&mut self, student: &Student) -> Result<(), StoreError> {
        // Signature and enrolled_at are immutable; only the mutable fields
        // are written back.
        self.conn
            .execute(
                "UPDATE students SET name = ?2, code = ?3 WHERE student_id = ?1",
                rusqlite::params![encode_uuid(student.id), student.name, student.code],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn delete_student(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM students WHERE student_id = ?1",
                rusqlite::params![encode_uuid(id)],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn append_record(&mut self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO attendance (record_id, student_id, student_name, marked_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    encode_uuid(record.id),
                    encode_uuid(record.student_id),
                    record.student_name,
                    encode_dt(record.marked_at),
                ],
            )
            .map_err(backend)?;
        Ok(())
    }
}
