use chrono::Utc;
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{AttendanceManager, cohort_students, find_subject, find_user};
use crate::{
    access::Caller,
    error::{AppError, AppResult},
    models::{
        AttendanceRecord, AttendanceStatus, Cohort, OpenSession, Role, Session, SessionStatus,
        validate_id,
    },
    schema::{attendance, sessions},
    stats::{SessionSummary, summarize_session},
};

/// Number of sessions listed when the caller gives no limit.
pub const DEFAULT_SESSION_LIMIT: i64 = 10;

/// A session together with its records and their counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: Session,
    pub records: Vec<AttendanceRecord>,
    pub summary: SessionSummary,
}

/// A fresh session identifier: creation time for readability, a random UUID for uniqueness.
fn new_session_id() -> String {
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

impl AttendanceManager {
    /// Opens an attendance session for `faculty_id`, snapshotting how many active students the
    /// cohort has right now.
    pub fn open_session(&mut self, faculty_id: &str, request: &OpenSession) -> AppResult<Session> {
        request.validate()?;

        self.db.immediate_transaction(|conn| {
            if find_subject(conn, &request.subject_id)?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Subject '{}'",
                    request.subject_id
                )));
            }

            match find_user(conn, faculty_id)? {
                Some(user) if user.role == Role::Faculty => {}
                _ => return Err(AppError::NotFound(format!("Faculty '{faculty_id}'"))),
            }

            let cohort = Cohort {
                department: request.department,
                division: request.division,
                semester: request.semester,
            };
            let total_students: i64 = cohort_students(&cohort).count().get_result(conn)?;

            let now = Utc::now().naive_utc();
            let session = Session {
                id: new_session_id(),
                subject_id: request.subject_id.clone(),
                faculty_id: faculty_id.to_string(),
                division: request.division,
                department: request.department,
                semester: request.semester,
                date: now.date(),
                start_time: now,
                end_time: None,
                total_students: i32::try_from(total_students)
                    .map_err(|_| AppError::Internal("student count overflow".to_string()))?,
                present_count: None,
                absent_count: None,
                status: SessionStatus::Active,
                created_at: now,
            };

            insert_session(conn, &session)?;

            info!(
                "Opened session {} for subject {} by {} ({} students)",
                session.id, session.subject_id, session.faculty_id, session.total_students
            );

            Ok(session)
        })
    }

    /// Closes an active session owned by `faculty_id` and records its counts.
    ///
    /// Late students are neither present nor absent here: `absent = total - present`.
    pub fn close_session(&mut self, session_id: &str, faculty_id: &str) -> AppResult<Session> {
        validate_id("session", session_id)?;
        validate_id("faculty", faculty_id)?;

        self.db.immediate_transaction(|conn| {
            let session = find_active_session(conn, session_id, faculty_id)?
                .ok_or_else(|| AppError::NotFound(format!("Active session '{session_id}'")))?;

            let present: i64 = attendance::table
                .filter(attendance::session_id.eq(session_id))
                .filter(attendance::status.eq(AttendanceStatus::Present))
                .count()
                .get_result(conn)?;
            let present = i32::try_from(present)
                .map_err(|_| AppError::Internal("present count overflow".to_string()))?;
            let absent = session.total_students - present;

            let closed = diesel::update(
                sessions::table
                    .filter(sessions::id.eq(session_id))
                    .filter(sessions::status.eq(SessionStatus::Active)),
            )
            .set((
                sessions::end_time.eq(Some(Utc::now().naive_utc())),
                sessions::present_count.eq(Some(present)),
                sessions::absent_count.eq(Some(absent)),
                sessions::status.eq(SessionStatus::Completed),
            ))
            .execute(conn)?;

            if closed != 1 {
                return Err(AppError::NotFound(format!("Active session '{session_id}'")));
            }

            info!("Closed session {session_id}: {present} present, {absent} absent");

            Ok(sessions::table
                .find(session_id)
                .select(Session::as_select())
                .first(conn)?)
        })
    }

    /// Lists a faculty member's sessions, newest first.
    pub fn list_sessions(
        &mut self,
        faculty_id: &str,
        status: Option<SessionStatus>,
        limit: i64,
    ) -> AppResult<Vec<Session>> {
        validate_id("faculty", faculty_id)?;
        if limit < 1 {
            return Err(AppError::Validation(format!(
                "limit must be positive, got {limit}"
            )));
        }

        let mut query = sessions::table
            .filter(sessions::faculty_id.eq(faculty_id))
            .into_boxed();

        if let Some(status) = status {
            query = query.filter(sessions::status.eq(status));
        }

        Ok(query
            .order((sessions::created_at.desc(), sessions::id.desc()))
            .limit(limit)
            .select(Session::as_select())
            .load(&mut self.db)?)
    }

    /// A session with its records, visible to the faculty member who owns it and to admins.
    pub fn session_detail(&mut self, session_id: &str, caller: &Caller) -> AppResult<SessionDetail> {
        validate_id("session", session_id)?;

        let session = sessions::table
            .find(session_id)
            .select(Session::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("Session '{session_id}'")))?;

        let owner = caller.role == Role::Faculty && caller.id == session.faculty_id;
        if !owner && caller.role != Role::Admin {
            return Err(AppError::AccessDenied(format!(
                "session '{session_id}' belongs to another faculty member"
            )));
        }

        let records = attendance::table
            .filter(attendance::session_id.eq(session_id))
            .order(attendance::student_name.asc())
            .select(AttendanceRecord::as_select())
            .load(&mut self.db)?;

        let summary = summarize_session(&session, &records);

        Ok(SessionDetail {
            session,
            records,
            summary,
        })
    }
}

fn insert_session(conn: &mut SqliteConnection, session: &Session) -> AppResult<()> {
    match diesel::insert_into(sessions::table)
        .values(session)
        .execute(conn)
    {
        Ok(_) => Ok(()),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
            AppError::Conflict(format!("session id '{}' already exists, retry", session.id)),
        ),
        Err(e) => Err(e.into()),
    }
}

pub(super) fn find_active_session(
    conn: &mut SqliteConnection,
    session_id: &str,
    faculty_id: &str,
) -> AppResult<Option<Session>> {
    Ok(sessions::table
        .filter(sessions::id.eq(session_id))
        .filter(sessions::faculty_id.eq(faculty_id))
        .filter(sessions::status.eq(SessionStatus::Active))
        .select(Session::as_select())
        .first(conn)
        .optional()?)
}
