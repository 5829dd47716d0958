//! rollcall — thin D-Bus client for the attendance daemon.
//!
//! Signatures come from the upstream recognizer as JSON number arrays;
//! this tool never computes them. It also acts as the CSV formatting
//! collaborator for day exports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use zbus::proxy;

#[proxy(
    interface = "org.rollcall.Rollcall1",
    default_service = "org.rollcall.Rollcall1",
    default_path = "/org/rollcall/Rollcall1"
)]
trait Rollcall {
    fn enroll(&self, name: &str, code: &str, signature: Vec<f64>) -> zbus::Result<String>;
    fn rename(&self, id: &str, name: &str, code: &str) -> zbus::Result<String>;
    fn remove(&self, id: &str) -> zbus::Result<bool>;
    fn scan(&self, signature: Vec<f64>) -> zbus::Result<String>;
    fn list_students(&self) -> zbus::Result<String>;
    fn search(&self, term: &str) -> zbus::Result<String>;
    fn day_report(&self, day: &str) -> zbus::Result<String>;
    fn summary(&self) -> zbus::Result<String>;
    fn status(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a new student
    Enroll {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Roll number (unique)
        #[arg(short, long)]
        code: String,
        /// JSON file holding the face signature as an array of numbers
        #[arg(short, long)]
        signature: PathBuf,
    },
    /// Scan a signature and mark attendance
    Scan {
        /// JSON file holding the face signature as an array of numbers
        #[arg(short, long)]
        signature: PathBuf,
    },
    /// List enrolled students
    List,
    /// Filter students by name or roll number
    Search { term: String },
    /// Update a student's name and roll number
    Rename {
        /// Student id
        id: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        code: String,
    },
    /// Remove a student (past attendance records survive)
    Remove {
        /// Student id
        id: String,
    },
    /// Attendance report for a day
    Report {
        /// Day as YYYY-MM-DD (default: today, UTC)
        #[arg(short, long, default_value = "")]
        date: String,
    },
    /// Export a day's attendance as CSV (code, name, time)
    Export {
        /// Day as YYYY-MM-DD (default: today, UTC)
        #[arg(short, long, default_value = "")]
        date: String,
    },
    /// Per-day attendance counts
    Summary,
    /// Show daemon status
    Status,
}

// Wire shapes of the daemon's JSON replies; unknown fields are ignored.

#[derive(Deserialize)]
struct StudentSummary {
    id: String,
    name: String,
    code: String,
    enrolled_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct DayReport {
    day: String,
    events: Vec<DayReportEvent>,
    total_students: usize,
    present_count: usize,
    present_percent: u32,
}

#[derive(Deserialize)]
struct DayReportEvent {
    name: String,
    code: Option<String>,
    marked_at: DateTime<Utc>,
}

fn read_signature(path: &Path) -> Result<Vec<f64>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading signature file {}", path.display()))?;
    let values: Vec<f64> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {} as a JSON number array", path.display()))?;
    Ok(values)
}

fn print_students(json: &str) -> Result<()> {
    let students: Vec<StudentSummary> = serde_json::from_str(json)?;
    if students.is_empty() {
        println!("No students enrolled");
        return Ok(());
    }
    for s in students {
        println!(
            "{}  {:<10} {:<24} enrolled {}",
            s.id,
            s.code,
            s.name,
            s.enrolled_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let connection = zbus::Connection::session()
        .await
        .context("connecting to the session bus — is rollcalld running?")?;
    let daemon = RollcallProxy::new(&connection).await?;

    match cli.command {
        Commands::Enroll {
            name,
            code,
            signature,
        } => {
            let values = read_signature(&signature)?;
            let reply = daemon.enroll(&name, &code, values).await?;
            let student: StudentSummary = serde_json::from_str(&reply)?;
            println!("Enrolled {} ({}) as {}", student.name, student.code, student.id);
        }
        Commands::Scan { signature } => {
            let values = read_signature(&signature)?;
            let reply = daemon.scan(values).await?;
            let outcome: serde_json::Value = serde_json::from_str(&reply)?;
            match outcome["outcome"].as_str() {
                Some("marked") => println!(
                    "Marked {} present at {}",
                    outcome["student"]["name"].as_str().unwrap_or("?"),
                    outcome["marked_at"].as_str().unwrap_or("?"),
                ),
                Some("already_present") => println!(
                    "{} is already marked present today",
                    outcome["student"]["name"].as_str().unwrap_or("?"),
                ),
                _ => println!("Face not recognized — student may not be enrolled"),
            }
        }
        Commands::List => print_students(&daemon.list_students().await?)?,
        Commands::Search { term } => print_students(&daemon.search(&term).await?)?,
        Commands::Rename { id, name, code } => {
            let reply = daemon.rename(&id, &name, &code).await?;
            let student: StudentSummary = serde_json::from_str(&reply)?;
            println!("Updated {} ({})", student.name, student.code);
        }
        Commands::Remove { id } => {
            daemon.remove(&id).await?;
            println!("Removed {id}");
        }
        Commands::Report { date } => {
            let report: DayReport = serde_json::from_str(&daemon.day_report(&date).await?)?;
            println!(
                "{}: {} of {} present ({}%)",
                report.day, report.present_count, report.total_students, report.present_percent
            );
            for event in &report.events {
                println!(
                    "  {}  {:<10} {}",
                    event.marked_at.format("%H:%M:%S"),
                    event.code.as_deref().unwrap_or("-"),
                    event.name
                );
            }
        }
        Commands::Export { date } => {
            let report: DayReport = serde_json::from_str(&daemon.day_report(&date).await?)?;
            println!("Student ID,Student Name,Time");
            for event in &report.events {
                println!(
                    "{},{},{}",
                    event.code.as_deref().unwrap_or(""),
                    event.name,
                    event.marked_at.format("%H:%M:%S")
                );
            }
        }
        Commands::Summary => {
            let summary: std::collections::BTreeMap<String, usize> =
                serde_json::from_str(&daemon.summary().await?)?;
            if summary.is_empty() {
                println!("No attendance recorded");
            }
            for (day, count) in summary {
                println!("{day}  {count}");
            }
        }
        Commands::Status => {
            let status: serde_json::Value = serde_json::from_str(&daemon.status().await?)?;
            println!("{status:#}");
        }
    }

    Ok(())
}
