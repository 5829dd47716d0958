//! Nearest-match classification of a probe signature against the roster.

use uuid::Uuid;

use crate::types::{Signature, SignatureError, Student};

/// Maximum Euclidean distance for a positive match.
///
/// Domain-tuned for face-api style descriptors, not derived analytically;
/// override via `ROLLCALL_MATCH_THRESHOLD` on the daemon.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Result of matching a probe signature against the enrolled roster.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Euclidean distance of the best candidate; infinite on an empty roster.
    pub distance: f64,
    pub student_id: Option<Uuid>,
}

/// Strategy for comparing a probe signature against enrolled students.
pub trait Matcher {
    fn compare(
        &self,
        probe: &Signature,
        roster: &[Student],
        threshold: f64,
    ) -> Result<MatchResult, SignatureError>;
}

/// Euclidean nearest-neighbour matcher with a strict distance threshold.
///
/// Ties keep the first student in enrollment order: the comparison is a
/// strict improvement, so a later equal distance never displaces an earlier
/// candidate. Deterministic for any fixed roster.
pub struct NearestMatcher;

impl Matcher for NearestMatcher {
    fn compare(
        &self,
        probe: &Signature,
        roster: &[Student],
        threshold: f64,
    ) -> Result<MatchResult, SignatureError> {
        let mut best_distance = f64::INFINITY;
        let mut best_id: Option<Uuid> = None;

        for student in roster {
            // Enrolled length is the reference; a bad probe reports its own
            // length as the mismatch.
            let distance = student.signature.distance(probe)?;
            if distance < best_distance {
                best_distance = distance;
                best_id = Some(student.id);
            }
        }

        match best_id {
            // Strictly below threshold; an exact-threshold distance is a miss.
            Some(id) if best_distance < threshold => Ok(MatchResult {
                matched: true,
                distance: best_distance,
                student_id: Some(id),
            }),
            _ => Ok(MatchResult {
                matched: false,
                distance: best_distance,
                student_id: None,
            }),
        }
    }
}
