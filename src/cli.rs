//! This module contains the command-line interface [`Cli`] parser for running the attendance
//! service and inspecting its records.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{Department, Division, RecordFilter, SessionStatus};

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Database to use instead of the configured one.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// The different commands available for running and inspecting attendance.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve,

    /// Create the database tables if they do not exist.
    InitDb,

    /// List a faculty member's sessions, newest first.
    Sessions {
        faculty_id: String,

        #[arg(long)]
        status: Option<SessionStatus>,

        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print attendance records matching the given filters.
    Report(ReportArgs),

    /// Print one student's attendance with per-subject statistics.
    Student { student_id: String },
}

#[derive(clap::Args, Debug, Default)]
pub struct ReportArgs {
    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub division: Option<Division>,

    #[arg(long)]
    pub department: Option<Department>,

    #[arg(long)]
    pub semester: Option<i32>,

    #[arg(long)]
    pub faculty: Option<String>,

    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl From<ReportArgs> for RecordFilter {
    fn from(args: ReportArgs) -> Self {
        RecordFilter {
            subject_id: args.subject,
            division: args.division,
            department: args.department,
            semester: args.semester,
            faculty_id: args.faculty,
            start_date: args.from,
            end_date: args.to,
        }
    }
}
