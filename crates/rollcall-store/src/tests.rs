//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use rollcall_core::{AttendanceRecord, AttendanceStore, Signature, StoreError, Student};
use uuid::Uuid;

use crate::SqliteStore;

fn store() -> SqliteStore {
    SqliteStore::open_in_memory().expect("in-memory store")
}

fn student(code: &str, values: Vec<f64>) -> Student {
    Student {
        id: Uuid::new_v4(),
        name: format!("student {code}"),
        code: code.to_string(),
        signature: Signature::new(values),
        enrolled_at: Utc.with_ymd_and_hms(2026, 8, 27, 8, 30, 0).unwrap(),
    }
}

fn record(student: &Student) -> AttendanceRecord {
    AttendanceRecord {
        id: Uuid::new_v4(),
        student_id: student.id,
        student_name: student.name.clone(),
        marked_at: Utc.with_ymd_and_hms(2026, 8, 27, 9, 15, 30).unwrap(),
    }
}

#[test]
fn round_trip_preserves_state_bit_exact() {
    let mut s = store();

    // Values chosen to shake out any lossy encoding: subnormals, extremes,
    // negative zero, repeating binary fractions.
    let ada = student(
        "S001",
        vec![0.1, -0.2, f64::MIN_POSITIVE, 1e300, -0.0, 1.0 / 3.0],
    );
    let grace = student("S002", vec![0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
    s.insert_student(&ada).unwrap();
    s.insert_student(&grace).unwrap();

    let rec = record(&ada);
    s.append_record(&rec).unwrap();

    let snapshot = s.load().unwrap();
    assert_eq!(snapshot.students.len(), 2);
    assert_eq!(snapshot.records.len(), 1);

    let loaded = &snapshot.students[0];
    assert_eq!(loaded.id, ada.id);
    assert_eq!(loaded.name, ada.name);
    assert_eq!(loaded.code, ada.code);
    assert_eq!(loaded.enrolled_at, ada.enrolled_at);
    for (a, b) in loaded
        .signature
        .values
        .iter()
        .zip(ada.signature.values.iter())
    {
        assert_eq!(a.to_bits(), b.to_bits(), "signature must round-trip bit-exact");
    }

    let loaded_rec = &snapshot.records[0];
    assert_eq!(loaded_rec.id, rec.id);
    assert_eq!(loaded_rec.student_id, rec.student_id);
    assert_eq!(loaded_rec.student_name, rec.student_name);
    assert_eq!(loaded_rec.marked_at, rec.marked_at);
}

#[test]
fn load_preserves_insertion_order() {
    let mut s = store();
    for i in 0..5 {
        s.insert_student(&student(&format!("S{i:03}"), vec![i as f64, 0.0]))
            .unwrap();
    }

    let snapshot = s.load().unwrap();
    let codes: Vec<_> = snapshot.students.iter().map(|st| st.code.clone()).collect();
    assert_eq!(codes, ["S000", "S001", "S002", "S003", "S004"]);
}

#[test]
fn update_and_delete_are_visible_on_reload() {
    let mut s = store();
    let mut ada = student("S001", vec![0.1, 0.2]);
    let grace = student("S002", vec![0.3, 0.4]);
    s.insert_student(&ada).unwrap();
    s.insert_student(&grace).unwrap();

    ada.name = "Ada Lovelace".into();
    ada.code = "S042".into();
    s.update_student(&ada).unwrap();
    s.delete_student(grace.id).unwrap();

    let snapshot = s.load().unwrap();
    assert_eq!(snapshot.students.len(), 1);
    assert_eq!(snapshot.students[0].name, "Ada Lovelace");
    assert_eq!(snapshot.students[0].code, "S042");
}

#[test]
fn dangling_student_reference_is_tolerated() {
    let mut s = store();
    let ada = student("S001", vec![0.1, 0.2]);
    s.insert_student(&ada).unwrap();
    s.append_record(&record(&ada)).unwrap();
    s.delete_student(ada.id).unwrap();

    let snapshot = s.load().unwrap();
    assert!(snapshot.students.is_empty());
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].student_id, ada.id);
}

#[test]
fn truncated_signature_blob_is_corrupt() {
    let mut s = store();
    s.conn
        .execute(
            "INSERT INTO students (student_id, name, code, signature, enrolled_at)
             VALUES (?1, 'Ada', 'S001', ?2, ?3)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                vec![0u8; 7], // not a multiple of 8
                "2026-08-27T08:30:00+00:00",
            ],
        )
        .unwrap();

    assert!(matches!(s.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn empty_signature_blob_is_corrupt() {
    let mut s = store();
    s.conn
        .execute(
            "INSERT INTO students (student_id, name, code, signature, enrolled_at)
             VALUES (?1, 'Ada', 'S001', ?2, ?3)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                Vec::<u8>::new(),
                "2026-08-27T08:30:00+00:00",
            ],
        )
        .unwrap();

    assert!(matches!(s.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn inconsistent_signature_lengths_are_corrupt() {
    let mut s = store();
    s.insert_student(&student("S001", vec![0.1, 0.2, 0.3])).unwrap();
    s.insert_student(&student("S002", vec![0.1, 0.2])).unwrap();

    assert!(matches!(s.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn unparsable_timestamp_is_corrupt() {
    let mut s = store();
    s.conn
        .execute(
            "INSERT INTO attendance (record_id, student_id, student_name, marked_at)
             VALUES (?1, ?2, 'Ada', 'yesterday-ish')",
            rusqlite::params![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()],
        )
        .unwrap();

    assert!(matches!(s.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn unparsable_uuid_is_corrupt() {
    let mut s = store();
    s.conn
        .execute(
            "INSERT INTO attendance (record_id, student_id, student_name, marked_at)
             VALUES ('not-a-uuid', ?1, 'Ada', ?2)",
            rusqlite::params![Uuid::new_v4().to_string(), "2026-08-27T09:00:00+00:00"],
        )
        .unwrap();

    assert!(matches!(s.load(), Err(StoreError::Corrupt(_))));
}
