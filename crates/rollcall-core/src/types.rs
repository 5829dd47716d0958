use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature length {got} does not match enrolled length {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("signature must not be empty")]
    Empty,
}

/// Face signature vector produced by the external recognition model
/// (typically 128-dimensional for face-api style descriptors).
///
/// Opaque to this crate beyond its length and numeric comparability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<f64>,
}

impl Signature {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compute Euclidean distance to another signature.
    ///
    /// Lower = more similar. Rejects mismatched lengths rather than
    /// truncating or padding; a distance over unequal dimensions is
    /// meaningless.
    pub fn distance(&self, other: &Signature) -> Result<f64, SignatureError> {
        if self.values.len() != other.values.len() {
            return Err(SignatureError::LengthMismatch {
                expected: self.values.len(),
                got: other.values.len(),
            });
        }

        let sum: f64 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        Ok(sum.sqrt())
    }
}

impl From<Vec<f64>> for Signature {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

/// An enrolled student with face signature and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Stable internal id; never reused.
    pub id: Uuid,
    /// Display name, mutable.
    pub name: String,
    /// User-facing roll number; unique across live students, mutable.
    pub code: String,
    pub signature: Signature,
    /// Set once at enrollment.
    pub enrolled_at: DateTime<Utc>,
}

/// A single presence event in the attendance ledger.
///
/// `student_id` is a relation, not ownership: the student may later be
/// renamed or deleted, which is why the name is snapshotted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub marked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_identical_is_zero() {
        let a = Signature::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(a.distance(&a).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Signature::new(vec![0.1, 0.2, 0.3]);
        let b = Signature::new(vec![0.4, -0.1, 0.9]);
        assert_eq!(a.distance(&b).unwrap(), b.distance(&a).unwrap());
    }

    #[test]
    fn distance_known_value() {
        let a = Signature::new(vec![0.0, 0.0]);
        let b = Signature::new(vec![3.0, 4.0]);
        assert!((a.distance(&b).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn distance_rejects_length_mismatch() {
        let a = Signature::new(vec![1.0, 2.0]);
        let b = Signature::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(
            a.distance(&b),
            Err(SignatureError::LengthMismatch {
                expected: 2,
                got: 3
            })
        );
    }
}
