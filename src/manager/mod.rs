//! The manager for opening sessions, recording attendance, and reading it back.
//!
//! All reads and writes go through [`AttendanceManager`], which owns one SQLite connection.
//! Multi-step writes run inside immediate transactions so that several managers sharing one
//! database file still keep the one-record-per-student-per-session rule.

use diesel::{connection::SimpleConnection, prelude::*};
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{Cohort, Role, Subject, User, validate_id, validate_semester},
    schema::{subjects, users},
};

mod records;
mod sessions;

pub use records::{HistoryEntry, Marked, StudentHistory};
pub use sessions::{DEFAULT_SESSION_LIMIT, SessionDetail};

/// Tables and indexes, created on connect if missing.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    email TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('student', 'faculty', 'admin')),
    department TEXT,
    division TEXT,
    semester INTEGER,
    enrollment_number TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_users_cohort
    ON users (role, department, division, semester, is_active);

CREATE TABLE IF NOT EXISTS subjects (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    credits INTEGER NOT NULL,
    department TEXT NOT NULL,
    semester INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY NOT NULL,
    subject_id TEXT NOT NULL REFERENCES subjects (id),
    faculty_id TEXT NOT NULL REFERENCES users (id),
    division TEXT NOT NULL,
    department TEXT NOT NULL,
    semester INTEGER NOT NULL,
    date DATE NOT NULL,
    start_time TIMESTAMP NOT NULL,
    end_time TIMESTAMP,
    total_students INTEGER NOT NULL,
    present_count INTEGER,
    absent_count INTEGER,
    status TEXT NOT NULL CHECK (status IN ('active', 'completed')),
    created_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_faculty ON sessions (faculty_id, created_at);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    student_id TEXT NOT NULL REFERENCES users (id),
    session_id TEXT NOT NULL REFERENCES sessions (id),
    status TEXT NOT NULL CHECK (status IN ('present', 'absent', 'late')),
    confidence DOUBLE NOT NULL DEFAULT 0,
    remark TEXT,
    subject_id TEXT NOT NULL,
    subject_name TEXT NOT NULL,
    faculty_id TEXT NOT NULL,
    faculty_name TEXT NOT NULL,
    student_name TEXT NOT NULL,
    enrollment_number TEXT,
    division TEXT NOT NULL,
    department TEXT NOT NULL,
    semester INTEGER NOT NULL,
    date DATE NOT NULL,
    marked_at TIMESTAMP NOT NULL,
    UNIQUE (student_id, session_id)
);

CREATE INDEX IF NOT EXISTS idx_attendance_report ON attendance (faculty_id, date);
"#;

/// How long a connection waits on a locked database before giving up, in milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// The manager for recording, modifying, and retrieving attendance data.
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url` and makes sure the schema exists.
    pub fn open(database_url: &str) -> AppResult<Self> {
        let mut db = SqliteConnection::establish(database_url)?;

        db.batch_execute(&format!(
            "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};
             PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;"
        ))?;
        db.batch_execute(SCHEMA)?;

        debug!("Connected to {database_url}");

        Ok(Self { db })
    }

    /// Inserts users into the registry.
    pub fn insert_users(&mut self, new_users: &[User]) -> AppResult<usize> {
        if new_users.is_empty() {
            return Ok(0);
        }

        let inserted = diesel::insert_into(users::table)
            .values(new_users)
            .execute(&mut self.db)?;

        info!("Inserted {inserted} users");

        Ok(inserted)
    }

    pub fn insert_subjects(&mut self, new_subjects: &[Subject]) -> AppResult<usize> {
        if new_subjects.is_empty() {
            return Ok(0);
        }

        let inserted = diesel::insert_into(subjects::table)
            .values(new_subjects)
            .execute(&mut self.db)?;

        info!("Inserted {inserted} subjects");

        Ok(inserted)
    }

    /// Retrieves a user by ID, if registered.
    pub fn get_user(&mut self, user_id: &str) -> AppResult<Option<User>> {
        find_user(&mut self.db, user_id)
    }

    /// Retrieves every student account, active or not.
    pub fn get_roster(&mut self) -> AppResult<Vec<User>> {
        Ok(users::table
            .filter(users::role.eq(Role::Student))
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut self.db)?)
    }

    /// Marks a user inactive so they stop counting towards new sessions. Their records stay.
    pub fn deactivate_user(&mut self, user_id: &str) -> AppResult<()> {
        let updated = diesel::update(users::table.find(user_id))
            .set(users::is_active.eq(false))
            .execute(&mut self.db)?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("User '{user_id}'")));
        }

        Ok(())
    }

    /// Active students of a cohort, ordered by enrollment number.
    pub fn cohort(&mut self, cohort: &Cohort) -> AppResult<Vec<User>> {
        validate_semester(cohort.semester)?;

        Ok(cohort_students(cohort)
            .order((users::enrollment_number.asc(), users::username.asc()))
            .select(User::as_select())
            .load(&mut self.db)?)
    }
}

/// Active students belonging to `cohort`.
fn cohort_students(cohort: &Cohort) -> users::BoxedQuery<'static, diesel::sqlite::Sqlite> {
    users::table
        .filter(users::role.eq(Role::Student))
        .filter(users::department.eq(cohort.department))
        .filter(users::division.eq(cohort.division))
        .filter(users::semester.eq(cohort.semester))
        .filter(users::is_active.eq(true))
        .into_boxed()
}

fn find_user(conn: &mut SqliteConnection, user_id: &str) -> AppResult<Option<User>> {
    validate_id("user", user_id)?;

    Ok(users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

fn find_subject(conn: &mut SqliteConnection, subject_id: &str) -> AppResult<Option<Subject>> {
    validate_id("subject", subject_id)?;

    Ok(subjects::table
        .find(subject_id)
        .select(Subject::as_select())
        .first(conn)
        .optional()?)
}
