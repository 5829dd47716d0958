//! D-Bus interface for the Rollcall attendance daemon.
//!
//! Bus name: org.rollcall.Rollcall1
//! Object path: /org/rollcall/Rollcall1
//!
//! Structured results cross the bus as JSON strings; signatures arrive as
//! plain `f64` arrays from the upstream recognizer collaborator.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;
use zbus::interface;

use crate::engine::{EngineError, EngineHandle};
use rollcall_core::RosterError;

pub struct RollcallService {
    engine: EngineHandle,
}

impl RollcallService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

fn to_fdo(e: EngineError) -> zbus::fdo::Error {
    match &e {
        EngineError::Roster(RosterError::NotFound(_)) => zbus::fdo::Error::Failed(e.to_string()),
        EngineError::Roster(_) | EngineError::Signature(_) => {
            zbus::fdo::Error::InvalidArgs(e.to_string())
        }
        EngineError::Store(_) | EngineError::ChannelClosed => {
            zbus::fdo::Error::Failed(e.to_string())
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
}

fn parse_id(id: &str) -> zbus::fdo::Result<Uuid> {
    Uuid::parse_str(id).map_err(|e| zbus::fdo::Error::InvalidArgs(format!("bad student id: {e}")))
}

/// Empty string means today (UTC).
fn parse_day(day: &str) -> zbus::fdo::Result<NaiveDate> {
    if day.is_empty() {
        return Ok(Utc::now().date_naive());
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("bad day {day:?}: {e}")))
}

#[interface(name = "org.rollcall.Rollcall1")]
impl RollcallService {
    /// Enroll a new student from a confirmed face signature.
    async fn enroll(
        &self,
        name: &str,
        code: &str,
        signature: Vec<f64>,
    ) -> zbus::fdo::Result<String> {
        tracing::info!(name, code, dims = signature.len(), "enroll requested");
        let student = self
            .engine
            .enroll(name.to_string(), code.to_string(), signature)
            .await
            .map_err(to_fdo)?;
        to_json(&student)
    }

    /// Update a student's name and roll number.
    async fn rename(&self, id: &str, name: &str, code: &str) -> zbus::fdo::Result<String> {
        tracing::info!(id, name, code, "rename requested");
        let student = self
            .engine
            .rename(parse_id(id)?, name.to_string(), code.to_string())
            .await
            .map_err(to_fdo)?;
        to_json(&student)
    }

    /// Remove a student. Past attendance records survive.
    async fn remove(&self, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(id, "remove requested");
        self.engine.remove(parse_id(id)?).await.map_err(to_fdo)?;
        Ok(true)
    }

    /// One scan transaction: classify the signature, mark if new today.
    async fn scan(&self, signature: Vec<f64>) -> zbus::fdo::Result<String> {
        let outcome = self.engine.scan(signature).await.map_err(to_fdo)?;
        to_json(&outcome)
    }

    /// List enrolled students (without signature vectors).
    async fn list_students(&self) -> zbus::fdo::Result<String> {
        let students = self.engine.list_students().await.map_err(to_fdo)?;
        to_json(&students)
    }

    /// Filter students by name or roll-number substring.
    async fn search(&self, term: &str) -> zbus::fdo::Result<String> {
        let students = self.engine.search(term.to_string()).await.map_err(to_fdo)?;
        to_json(&students)
    }

    /// Attendance report for a day (`YYYY-MM-DD`, empty = today UTC).
    async fn day_report(&self, day: &str) -> zbus::fdo::Result<String> {
        let report = self
            .engine
            .day_report(parse_day(day)?)
            .await
            .map_err(to_fdo)?;
        to_json(&report)
    }

    /// Per-day event counts for date navigation.
    async fn summary(&self) -> zbus::fdo::Result<String> {
        let summary = self.engine.summary().await.map_err(to_fdo)?;
        to_json(&summary)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(to_fdo)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "students": status.students,
            "records": status.records,
            "match_threshold": status.match_threshold,
        })
        .to_string())
    }
}
