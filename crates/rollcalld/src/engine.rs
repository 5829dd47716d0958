//! The attendance engine: a single-writer thread owning roster, ledger,
//! and storage.
//!
//! Every request — mutating or read-only — is processed one at a time on
//! one dedicated OS thread, so a scan's match-decision and mark-decision
//! always see a single consistent snapshot: two near-simultaneous scans of
//! the same student can never both mark. Storage writes happen inline
//! before a request is acknowledged; a failed write rolls the in-memory
//! change back.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use rollcall_core::{
    AttendanceStore, Ledger, MarkOutcome, Roster, RosterError, Signature, SignatureError,
    StoreError, Student,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Student metadata without the signature vector — what crosses the wire
/// to the UI collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<&Student> for StudentSummary {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            code: s.code.clone(),
            enrolled_at: s.enrolled_at,
        }
    }
}

/// Outcome of one scan transaction. All three are normal results; the UI
/// renders different feedback for each.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Unrecognized,
    AlreadyPresent {
        student: StudentSummary,
    },
    Marked {
        student: StudentSummary,
        marked_at: DateTime<Utc>,
    },
}

/// One attendance event in a day report. `code` is the student's *current*
/// roll number and goes missing once the student is deleted; the name
/// snapshot always renders.
#[derive(Debug, Clone, Serialize)]
pub struct DayReportEvent {
    pub record_id: Uuid,
    pub student_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub marked_at: DateTime<Utc>,
}

/// Attendance report for one calendar day (UTC).
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub day: NaiveDate,
    /// Most recent first.
    pub events: Vec<DayReportEvent>,
    pub total_students: usize,
    pub present_count: usize,
    /// round(present / total × 100); 0 when no students are enrolled.
    pub present_percent: u32,
}

/// Daemon diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub students: usize,
    pub records: usize,
    pub match_threshold: f64,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Enroll {
        name: String,
        code: String,
        signature: Vec<f64>,
        reply: oneshot::Sender<Result<StudentSummary, EngineError>>,
    },
    Rename {
        id: Uuid,
        name: String,
        code: String,
        reply: oneshot::Sender<Result<StudentSummary, EngineError>>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Scan {
        signature: Vec<f64>,
        reply: oneshot::Sender<Result<ScanOutcome, EngineError>>,
    },
    ListStudents {
        reply: oneshot::Sender<Vec<StudentSummary>>,
    },
    Search {
        term: String,
        reply: oneshot::Sender<Vec<StudentSummary>>,
    },
    DayReport {
        day: NaiveDate,
        reply: oneshot::Sender<DayReport>,
    },
    Summary {
        reply: oneshot::Sender<BTreeMap<NaiveDate, usize>>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Enroll a new student from a confirmed signature.
    pub async fn enroll(
        &self,
        name: String,
        code: String,
        signature: Vec<f64>,
    ) -> Result<StudentSummary, EngineError> {
        self.request(|reply| EngineRequest::Enroll {
            name,
            code,
            signature,
            reply,
        })
        .await?
    }

    /// Update a student's name and roll number.
    pub async fn rename(
        &self,
        id: Uuid,
        name: String,
        code: String,
    ) -> Result<StudentSummary, EngineError> {
        self.request(|reply| EngineRequest::Rename {
            id,
            name,
            code,
            reply,
        })
        .await?
    }

    /// Remove a student. Past attendance records are untouched.
    pub async fn remove(&self, id: Uuid) -> Result<(), EngineError> {
        self.request(|reply| EngineRequest::Remove { id, reply })
            .await?
    }

    /// One scan transaction: classify the signature, then mark or reject.
    pub async fn scan(&self, signature: Vec<f64>) -> Result<ScanOutcome, EngineError> {
        self.request(|reply| EngineRequest::Scan { signature, reply })
            .await?
    }

    pub async fn list_students(&self) -> Result<Vec<StudentSummary>, EngineError> {
        self.request(|reply| EngineRequest::ListStudents { reply })
            .await
    }

    pub async fn search(&self, term: String) -> Result<Vec<StudentSummary>, EngineError> {
        self.request(|reply| EngineRequest::Search { term, reply })
            .await
    }

    pub async fn day_report(&self, day: NaiveDate) -> Result<DayReport, EngineError> {
        self.request(|reply| EngineRequest::DayReport { day, reply })
            .await
    }

    pub async fn summary(&self) -> Result<BTreeMap<NaiveDate, usize>, EngineError> {
        self.request(|reply| EngineRequest::Summary { reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Loads the persisted state up front and fails fast — corrupt durable
/// state aborts startup instead of silently starting empty.
pub fn spawn_engine(
    mut store: Box<dyn AttendanceStore>,
    match_threshold: f64,
) -> Result<EngineHandle, EngineError> {
    let snapshot = store.load()?;
    tracing::info!(
        students = snapshot.students.len(),
        records = snapshot.records.len(),
        match_threshold,
        "engine state loaded"
    );

    let mut engine = Engine {
        roster: Roster::from_students(snapshot.students),
        ledger: Ledger::from_records(snapshot.records),
        store,
        match_threshold,
    };

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);

    std::thread::Builder::new()
        .name("rollcall-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                engine.handle(req);
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}

struct Engine {
    roster: Roster,
    ledger: Ledger,
    store: Box<dyn AttendanceStore>,
    match_threshold: f64,
}

impl Engine {
    fn handle(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::Enroll {
                name,
                code,
                signature,
                reply,
            } => {
                let _ = reply.send(self.enroll(&name, &code, signature));
            }
            EngineRequest::Rename {
                id,
                name,
                code,
                reply,
            } => {
                let _ = reply.send(self.rename(id, &name, &code));
            }
            EngineRequest::Remove { id, reply } => {
                let _ = reply.send(self.remove(id));
            }
            EngineRequest::Scan { signature, reply } => {
                let _ = reply.send(self.scan(signature));
            }
            EngineRequest::ListStudents { reply } => {
                let _ = reply.send(self.roster.students().iter().map(Into::into).collect());
            }
            EngineRequest::Search { term, reply } => {
                let _ = reply.send(
                    self.roster
                        .search(&term)
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                );
            }
            EngineRequest::DayReport { day, reply } => {
                let _ = reply.send(self.day_report(day));
            }
            EngineRequest::Summary { reply } => {
                let _ = reply.send(self.ledger.summary_by_day());
            }
            EngineRequest::Status { reply } => {
                let _ = reply.send(EngineStatus {
                    students: self.roster.len(),
                    records: self.ledger.records().len(),
                    match_threshold: self.match_threshold,
                });
            }
        }
    }

    fn enroll(
        &mut self,
        name: &str,
        code: &str,
        signature: Vec<f64>,
    ) -> Result<StudentSummary, EngineError> {
        let student = self
            .roster
            .enroll(name, code, Signature::new(signature), Utc::now())?
            .clone();

        if let Err(e) = self.store.insert_student(&student) {
            // Keep memory and disk in step: an unacknowledged write must
            // not leave the student enrolled.
            let _ = self.roster.remove(student.id);
            return Err(e.into());
        }
        Ok((&student).into())
    }

    fn rename(&mut self, id: Uuid, name: &str, code: &str) -> Result<StudentSummary, EngineError> {
        let before = self.roster.get(id)?.clone();
        let updated = self.roster.rename(id, name, code)?.clone();

        if let Err(e) = self.store.update_student(&updated) {
            let _ = self.roster.rename(id, &before.name, &before.code);
            return Err(e.into());
        }
        Ok((&updated).into())
    }

    fn remove(&mut self, id: Uuid) -> Result<(), EngineError> {
        // Existence check before the write-through, so the memory removal
        // below cannot fail after the row is gone.
        self.roster.get(id)?;
        self.store.delete_student(id)?;
        let _ = self.roster.remove(id);
        Ok(())
    }

    fn scan(&mut self, signature: Vec<f64>) -> Result<ScanOutcome, EngineError> {
        let probe = Signature::new(signature);
        let student = match self.roster.find_nearest(&probe, self.match_threshold)? {
            Some(s) => s.clone(),
            None => {
                tracing::debug!("scan: no enrolled signature within threshold");
                return Ok(ScanOutcome::Unrecognized);
            }
        };

        match self.ledger.mark(student.id, &student.name, Utc::now()) {
            MarkOutcome::AlreadyMarked => {
                tracing::debug!(student = %student.id, "scan: already present today");
                Ok(ScanOutcome::AlreadyPresent {
                    student: (&student).into(),
                })
            }
            MarkOutcome::Marked(record) => {
                if let Err(e) = self.store.append_record(&record) {
                    let _ = self.ledger.pop_last();
                    return Err(e.into());
                }
                Ok(ScanOutcome::Marked {
                    student: (&student).into(),
                    marked_at: record.marked_at,
                })
            }
        }
    }

    fn day_report(&self, day: NaiveDate) -> DayReport {
        let events: Vec<DayReportEvent> = self
            .ledger
            .events_for_day(day)
            .into_iter()
            .map(|r| DayReportEvent {
                record_id: r.id,
                student_id: r.student_id,
                name: r.student_name.clone(),
                code: self.roster.get(r.student_id).ok().map(|s| s.code.clone()),
                marked_at: r.marked_at,
            })
            .collect();

        let total_students = self.roster.len();
        let present_count = events.len();
        let present_percent = if total_students == 0 {
            0
        } else {
            ((present_count as f64 / total_students as f64) * 100.0).round() as u32
        };

        DayReport {
            day,
            events,
            total_students,
            present_count,
            present_percent,
        }
    }
}
