use std::collections::HashMap;

use chrono::Utc;
use diesel::{prelude::*, upsert::excluded};
use serde::Serialize;
use tracing::{debug, info};

use super::{AttendanceManager, find_subject, find_user, sessions::find_active_session};
use crate::{
    access::Caller,
    error::{AppError, AppResult},
    models::{
        AttendanceRecord, HistoryFilter, MarkAttendance, NewAttendanceRecord, RecordFilter, Role,
        Subject, validate_id,
    },
    schema::{attendance, subjects},
    stats::{SubjectStats, per_subject},
};

/// Result of marking one student: the stored record and whether this mark created it.
#[derive(Debug, Clone, Serialize)]
pub struct Marked {
    pub record: AttendanceRecord,
    pub created: bool,
}

/// An attendance record with display data from the subject registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub subject_code: Option<String>,
    pub subject_credits: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentHistory {
    pub student_id: String,
    pub records: Vec<HistoryEntry>,
    pub stats: Vec<SubjectStats>,
}

impl AttendanceManager {
    /// Records `mark.status` for a student in an active session owned by `faculty_id`.
    ///
    /// A second mark for the same student and session overwrites status, confidence and remark
    /// of the existing record; it never creates another one.
    ///
    /// Any registered student may be marked, not only members of the session's cohort. Such
    /// marks still count when the session closes, so `absent_count` can go below zero.
    pub fn mark(&mut self, faculty_id: &str, mark: &MarkAttendance) -> AppResult<Marked> {
        mark.validate()?;
        validate_id("faculty", faculty_id)?;

        self.db.immediate_transaction(|conn| {
            let session = find_active_session(conn, &mark.session_id, faculty_id)?
                .ok_or_else(|| {
                    AppError::InvalidSession(format!(
                        "session '{}' is not active or not owned by '{faculty_id}'",
                        mark.session_id
                    ))
                })?;

            let student = match find_user(conn, &mark.student_id)? {
                Some(user) if user.role == Role::Student => user,
                _ => {
                    return Err(AppError::InvalidStudent(format!(
                        "'{}' is not a registered student",
                        mark.student_id
                    )));
                }
            };

            let existing = attendance::table
                .filter(attendance::student_id.eq(&mark.student_id))
                .filter(attendance::session_id.eq(&mark.session_id))
                .select(attendance::id)
                .first::<i32>(conn)
                .optional()?;

            let confidence = mark.confidence.unwrap_or(0.0);
            let remark = mark.remark.as_deref();

            if let Some(record_id) = existing {
                let record = diesel::update(attendance::table.find(record_id))
                    .set((
                        attendance::status.eq(mark.status),
                        attendance::confidence.eq(confidence),
                        attendance::remark.eq(remark),
                    ))
                    .returning(AttendanceRecord::as_returning())
                    .get_result(conn)?;

                debug!(
                    "Updated {} in session {} to {}",
                    record.student_id, record.session_id, record.status
                );

                return Ok(Marked {
                    record,
                    created: false,
                });
            }

            let subject = find_subject(conn, &session.subject_id)?
                .ok_or_else(|| AppError::NotFound(format!("Subject '{}'", session.subject_id)))?;
            let faculty = find_user(conn, faculty_id)?
                .ok_or_else(|| AppError::NotFound(format!("Faculty '{faculty_id}'")))?;

            let new_record = NewAttendanceRecord {
                student_id: &student.id,
                session_id: &session.id,
                status: mark.status,
                confidence,
                remark,
                subject_id: &subject.id,
                subject_name: &subject.name,
                faculty_id: &faculty.id,
                faculty_name: &faculty.username,
                student_name: &student.username,
                enrollment_number: student.enrollment_number.as_deref(),
                division: session.division,
                department: session.department,
                semester: session.semester,
                date: session.date,
                marked_at: Utc::now().naive_utc(),
            };

            // The unique (student_id, session_id) index turns a racing insert into an update.
            diesel::insert_into(attendance::table)
                .values(&new_record)
                .on_conflict((attendance::student_id, attendance::session_id))
                .do_update()
                .set((
                    attendance::status.eq(excluded(attendance::status)),
                    attendance::confidence.eq(excluded(attendance::confidence)),
                    attendance::remark.eq(excluded(attendance::remark)),
                ))
                .execute(conn)?;

            let record = attendance::table
                .filter(attendance::student_id.eq(&mark.student_id))
                .filter(attendance::session_id.eq(&mark.session_id))
                .select(AttendanceRecord::as_select())
                .first(conn)?;

            info!(
                "Marked {} as {} in session {}",
                record.student_id, record.status, record.session_id
            );

            Ok(Marked {
                record,
                created: true,
            })
        })
    }

    /// A student's records, newest first, with per-subject statistics.
    ///
    /// Students may only read their own history.
    pub fn student_history(
        &mut self,
        caller: &Caller,
        student_id: &str,
        filter: HistoryFilter,
    ) -> AppResult<StudentHistory> {
        validate_id("student", student_id)?;
        caller.require_access(student_id)?;

        let filter = RecordFilter::from(filter);
        filter.validate()?;

        match find_user(&mut self.db, student_id)? {
            Some(user) if user.role == Role::Student => {}
            _ => return Err(AppError::NotFound(format!("Student '{student_id}'"))),
        }

        let records = load_records(&mut self.db, Some(student_id), &filter)?;
        let stats = per_subject(&records);
        let records = self.enrich(records)?;

        Ok(StudentHistory {
            student_id: student_id.to_string(),
            records,
            stats,
        })
    }

    /// Records matching `filter`, newest first then by student name.
    ///
    /// Faculty callers only ever see their own sessions.
    pub fn report(
        &mut self,
        caller: &Caller,
        mut filter: RecordFilter,
    ) -> AppResult<Vec<AttendanceRecord>> {
        filter.faculty_id = caller.report_scope(filter.faculty_id.take())?;
        filter.validate()?;

        load_records(&mut self.db, None, &filter)
    }

    /// Attaches subject code and credits to each record.
    fn enrich(&mut self, records: Vec<AttendanceRecord>) -> AppResult<Vec<HistoryEntry>> {
        let mut subject_ids: Vec<&str> = records.iter().map(|r| r.subject_id.as_str()).collect();
        subject_ids.sort_unstable();
        subject_ids.dedup();

        let known: HashMap<String, Subject> = subjects::table
            .filter(subjects::id.eq_any(subject_ids))
            .select(Subject::as_select())
            .load(&mut self.db)?
            .into_iter()
            .map(|subject| (subject.id.clone(), subject))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let subject = known.get(&record.subject_id);

                HistoryEntry {
                    subject_code: subject.map(|s| s.code.clone()),
                    subject_credits: subject.map(|s| s.credits),
                    record,
                }
            })
            .collect())
    }
}

fn load_records(
    conn: &mut SqliteConnection,
    student_id: Option<&str>,
    filter: &RecordFilter,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut query = attendance::table.into_boxed();

    if let Some(student_id) = student_id {
        query = query.filter(attendance::student_id.eq(student_id));
    }
    if let Some(subject_id) = &filter.subject_id {
        query = query.filter(attendance::subject_id.eq(subject_id));
    }
    if let Some(division) = filter.division {
        query = query.filter(attendance::division.eq(division));
    }
    if let Some(department) = filter.department {
        query = query.filter(attendance::department.eq(department));
    }
    if let Some(semester) = filter.semester {
        query = query.filter(attendance::semester.eq(semester));
    }
    if let Some(faculty_id) = &filter.faculty_id {
        query = query.filter(attendance::faculty_id.eq(faculty_id));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(attendance::date.ge(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(attendance::date.le(end));
    }

    Ok(query
        .order((
            attendance::date.desc(),
            attendance::student_name.asc(),
            attendance::marked_at.desc(),
        ))
        .select(AttendanceRecord::as_select())
        .load(conn)?)
}
