//! rollcall-core — Identity matching and attendance ledger engine.
//!
//! Face signatures arrive pre-computed from an external recognition model;
//! this crate decides which enrolled student (if any) a signature belongs to
//! and keeps an append-only, duplicate-proof log of daily presence.

pub mod ledger;
pub mod matcher;
pub mod roster;
pub mod store;
pub mod types;

pub use ledger::{Ledger, MarkOutcome};
pub use matcher::{MatchResult, Matcher, NearestMatcher, DEFAULT_MATCH_THRESHOLD};
pub use roster::{Roster, RosterError};
pub use store::{AttendanceStore, StoreError, StoreSnapshot};
pub use types::{AttendanceRecord, Signature, SignatureError, Student};
