//! The enrolled-student roster: insertion-ordered identity store.
//!
//! Enforces roll-number uniqueness and signature-length consistency at
//! write time. All signatures in the roster share one length, established
//! by the first enrollment, so Euclidean comparisons stay valid.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::matcher::{Matcher, NearestMatcher};
use crate::types::{Signature, SignatureError, Student};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("signature must not be empty")]
    EmptySignature,
    #[error("signature length {got} does not match enrolled length {expected}")]
    SignatureLength { expected: usize, got: usize },
    #[error("roll number {0:?} is already enrolled")]
    DuplicateCode(String),
    #[error("no student with id {0}")]
    NotFound(Uuid),
}

/// In-memory store of enrolled students, in enrollment order.
///
/// The roster itself never touches storage; the owning engine writes
/// through to its [`AttendanceStore`](crate::store::AttendanceStore) around
/// each mutation.
#[derive(Debug, Default)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a loaded snapshot. Order is preserved.
    pub fn from_students(students: Vec<Student>) -> Self {
        Self { students }
    }

    /// Enroll a new student. Validates before any mutation: blank fields,
    /// empty signature, length inconsistent with the established roster
    /// length, or a duplicate roll number all leave the roster untouched.
    pub fn enroll(
        &mut self,
        name: &str,
        code: &str,
        signature: Signature,
        now: DateTime<Utc>,
    ) -> Result<&Student, RosterError> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(RosterError::BlankField("name"));
        }
        if code.is_empty() {
            return Err(RosterError::BlankField("code"));
        }
        if signature.is_empty() {
            return Err(RosterError::EmptySignature);
        }
        if let Some(expected) = self.signature_len() {
            if signature.len() != expected {
                return Err(RosterError::SignatureLength {
                    expected,
                    got: signature.len(),
                });
            }
        }
        if self.students.iter().any(|s| s.code == code) {
            return Err(RosterError::DuplicateCode(code.to_string()));
        }

        let student = Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            signature,
            enrolled_at: now,
        };
        tracing::info!(id = %student.id, code = %student.code, "student enrolled");
        self.students.push(student);
        Ok(self.students.last().unwrap())
    }

    /// Update a student's mutable fields, preserving signature and
    /// enrollment timestamp.
    pub fn rename(&mut self, id: Uuid, name: &str, code: &str) -> Result<&Student, RosterError> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(RosterError::BlankField("name"));
        }
        if code.is_empty() {
            return Err(RosterError::BlankField("code"));
        }
        if self.students.iter().any(|s| s.code == code && s.id != id) {
            return Err(RosterError::DuplicateCode(code.to_string()));
        }

        let student = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RosterError::NotFound(id))?;
        student.name = name.to_string();
        student.code = code.to_string();
        Ok(student)
    }

    /// Remove a student. Past ledger entries are unaffected; a second
    /// remove of the same id reports `NotFound`.
    pub fn remove(&mut self, id: Uuid) -> Result<Student, RosterError> {
        let idx = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(RosterError::NotFound(id))?;
        let student = self.students.remove(idx);
        tracing::info!(id = %id, code = %student.code, "student removed");
        Ok(student)
    }

    pub fn get(&self, id: Uuid) -> Result<&Student, RosterError> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .ok_or(RosterError::NotFound(id))
    }

    /// All students in enrollment order.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Signature length established by the first enrollment, if any.
    pub fn signature_len(&self) -> Option<usize> {
        self.students.first().map(|s| s.signature.len())
    }

    /// Case-insensitive substring filter over name and roll number.
    pub fn search(&self, term: &str) -> Vec<&Student> {
        let needle = term.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.code.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Nearest enrolled student strictly closer than `threshold`.
    ///
    /// `Ok(None)` is the normal "unrecognized" outcome: an empty roster or
    /// no candidate below the threshold. Ties resolve to the student
    /// enrolled first.
    pub fn find_nearest(
        &self,
        probe: &Signature,
        threshold: f64,
    ) -> Result<Option<&Student>, SignatureError> {
        let result = NearestMatcher.compare(probe, &self.students, threshold)?;
        Ok(result
            .student_id
            .and_then(|id| self.students.iter().find(|s| s.id == id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DEFAULT_MATCH_THRESHOLD;

    fn sig(values: &[f64]) -> Signature {
        Signature::new(values.to_vec())
    }

    fn roster_with_ada() -> (Roster, Uuid) {
        let mut roster = Roster::new();
        let id = roster
            .enroll("Ada", "S001", sig(&[0.1, 0.2, 0.3]), Utc::now())
            .unwrap()
            .id;
        (roster, id)
    }

    #[test]
    fn enroll_assigns_id_and_preserves_order() {
        let mut roster = Roster::new();
        roster
            .enroll("Ada", "S001", sig(&[0.1, 0.2]), Utc::now())
            .unwrap();
        roster
            .enroll("Grace", "S002", sig(&[0.3, 0.4]), Utc::now())
            .unwrap();

        let codes: Vec<_> = roster.students().iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["S001", "S002"]);
    }

    #[test]
    fn duplicate_code_leaves_roster_untouched() {
        let (mut roster, ada_id) = roster_with_ada();

        let err = roster
            .enroll("Bob", "S001", sig(&[0.9, 0.8, 0.7]), Utc::now())
            .unwrap_err();
        assert_eq!(err, RosterError::DuplicateCode("S001".into()));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(ada_id).unwrap().name, "Ada");
    }

    #[test]
    fn blank_fields_rejected() {
        let mut roster = Roster::new();
        assert_eq!(
            roster
                .enroll("  ", "S001", sig(&[0.1]), Utc::now())
                .unwrap_err(),
            RosterError::BlankField("name")
        );
        assert_eq!(
            roster
                .enroll("Ada", "", sig(&[0.1]), Utc::now())
                .unwrap_err(),
            RosterError::BlankField("code")
        );
        assert_eq!(
            roster
                .enroll("Ada", "S001", sig(&[]), Utc::now())
                .unwrap_err(),
            RosterError::EmptySignature
        );
        assert!(roster.is_empty());
    }

    #[test]
    fn signature_length_must_stay_consistent() {
        let (mut roster, _) = roster_with_ada();
        let err = roster
            .enroll("Grace", "S002", sig(&[0.1, 0.2]), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            RosterError::SignatureLength {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn rename_preserves_signature_and_enrollment() {
        let (mut roster, id) = roster_with_ada();
        let before = roster.get(id).unwrap().clone();

        roster.rename(id, "Ada Lovelace", "S042").unwrap();
        let after = roster.get(id).unwrap();
        assert_eq!(after.name, "Ada Lovelace");
        assert_eq!(after.code, "S042");
        assert_eq!(after.signature, before.signature);
        assert_eq!(after.enrolled_at, before.enrolled_at);
    }

    #[test]
    fn rename_to_own_code_is_allowed() {
        let (mut roster, id) = roster_with_ada();
        roster.rename(id, "Ada L.", "S001").unwrap();
        assert_eq!(roster.get(id).unwrap().name, "Ada L.");
    }

    #[test]
    fn rename_rejects_collision_with_other_student() {
        let (mut roster, _) = roster_with_ada();
        let grace_id = roster
            .enroll("Grace", "S002", sig(&[0.4, 0.5, 0.6]), Utc::now())
            .unwrap()
            .id;

        assert_eq!(
            roster.rename(grace_id, "Grace", "S001").unwrap_err(),
            RosterError::DuplicateCode("S001".into())
        );
    }

    #[test]
    fn remove_is_exact_and_second_remove_fails() {
        let (mut roster, id) = roster_with_ada();
        roster
            .enroll("Grace", "S002", sig(&[0.4, 0.5, 0.6]), Utc::now())
            .unwrap();

        roster.remove(id).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.remove(id).unwrap_err(), RosterError::NotFound(id));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn find_nearest_empty_roster_is_no_match() {
        let roster = Roster::new();
        let probe = sig(&[0.1, 0.2, 0.3]);
        assert!(roster.find_nearest(&probe, f64::MAX).unwrap().is_none());
    }

    #[test]
    fn find_nearest_respects_threshold() {
        let (roster, id) = roster_with_ada();

        let near = sig(&[0.1, 0.2, 0.31]);
        let found = roster
            .find_nearest(&near, DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);

        let far = sig(&[5.0, 5.0, 5.0]);
        assert!(roster
            .find_nearest(&far, DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn search_matches_name_and_code() {
        let (mut roster, _) = roster_with_ada();
        roster
            .enroll("Grace", "S002", sig(&[0.4, 0.5, 0.6]), Utc::now())
            .unwrap();

        assert_eq!(roster.search("ada").len(), 1);
        assert_eq!(roster.search("s00").len(), 2);
        assert!(roster.search("turing").is_empty());
    }
}
