use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
    sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    schema::{attendance, sessions, subjects, users},
};

/// Highest semester a programme runs to.
pub const MAX_SEMESTER: i32 = 8;

/// Longest identifier accepted for users, subjects and sessions.
pub const MAX_ID_LEN: usize = 64;

/// Declares a closed set of values stored as `Text` columns and exchanged as JSON strings.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "invalid {} '{}', expected one of: {}",
                        $label,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(value: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                text.parse().map_err(|e: AppError| e.into())
            }
        }
    };
}

text_enum!(
    /// The role an authenticated caller acts under.
    Role, "role" {
        Student => "student",
        Faculty => "faculty",
        Admin => "admin",
    }
);

text_enum!(
    /// Outcome of one student in one session.
    AttendanceStatus, "attendance status" {
        Present => "present",
        Absent => "absent",
        Late => "late",
    }
);

text_enum!(
    SessionStatus, "session status" {
        Active => "active",
        Completed => "completed",
    }
);

text_enum!(
    /// Sub-group of students within a department and semester.
    Division, "division" {
        A => "A",
        B => "B",
        C => "C",
    }
);

text_enum!(
    Department, "department" {
        Computer => "computer",
        It => "it",
        Mechanical => "mechanical",
        Civil => "civil",
        Electrical => "electrical",
        Electronics => "electronics",
    }
);

/// Checks that an identifier is non-empty, bounded, and made of `[A-Za-z0-9_-]`.
pub fn validate_id(kind: &str, value: &str) -> AppResult<()> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(AppError::Validation(format!("malformed {kind} id '{value}'")))
    }
}

pub fn validate_semester(semester: i32) -> AppResult<()> {
    if (1..=MAX_SEMESTER).contains(&semester) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "semester must be between 1 and {MAX_SEMESTER}, got {semester}"
        )))
    }
}

fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(AppError::Validation(format!(
            "start date {start} is after end date {end}"
        ))),
        _ => Ok(()),
    }
}

fn default_active() -> bool {
    true
}

/// A registered account: student, faculty member or administrator.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: Option<Department>,
    pub division: Option<Division>,
    pub semester: Option<i32>,
    pub enrollment_number: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub credits: i32,
    pub department: Department,
    pub semester: i32,
}

/// One attendance-taking window opened by a faculty member.
///
/// `present_count` and `absent_count` stay `None` until the session is closed.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub subject_id: String,
    pub faculty_id: String,
    pub division: Division,
    pub department: Department,
    pub semester: i32,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub total_students: i32,
    pub present_count: Option<i32>,
    pub absent_count: Option<i32>,
    pub status: SessionStatus,
    pub created_at: NaiveDateTime,
}

/// One student's outcome for one session, with display fields copied from the session, subject
/// and users so reports need no joins.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i32,
    pub student_id: String,
    pub session_id: String,
    pub status: AttendanceStatus,
    pub confidence: f64,
    pub remark: Option<String>,
    pub subject_id: String,
    pub subject_name: String,
    pub faculty_id: String,
    pub faculty_name: String,
    pub student_name: String,
    pub enrollment_number: Option<String>,
    pub division: Division,
    pub department: Department,
    pub semester: i32,
    pub date: NaiveDate,
    pub marked_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendanceRecord<'a> {
    pub student_id: &'a str,
    pub session_id: &'a str,
    pub status: AttendanceStatus,
    pub confidence: f64,
    pub remark: Option<&'a str>,
    pub subject_id: &'a str,
    pub subject_name: &'a str,
    pub faculty_id: &'a str,
    pub faculty_name: &'a str,
    pub student_name: &'a str,
    pub enrollment_number: Option<&'a str>,
    pub division: Division,
    pub department: Department,
    pub semester: i32,
    pub date: NaiveDate,
    pub marked_at: NaiveDateTime,
}

/// Request to open a session. The faculty member is the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSession {
    pub subject_id: String,
    pub division: Division,
    pub department: Department,
    pub semester: i32,
}

impl OpenSession {
    pub fn validate(&self) -> AppResult<()> {
        validate_id("subject", &self.subject_id)?;
        validate_semester(self.semester)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub session_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub confidence: Option<f64>,
    pub remark: Option<String>,
}

impl MarkAttendance {
    pub fn validate(&self) -> AppResult<()> {
        validate_id("session", &self.session_id)?;
        validate_id("student", &self.student_id)?;

        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(AppError::Validation(format!(
                    "confidence must be between 0 and 1, got {confidence}"
                )));
            }
        }

        Ok(())
    }
}

/// Filters for the attendance report. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    pub subject_id: Option<String>,
    pub division: Option<Division>,
    pub department: Option<Department>,
    pub semester: Option<i32>,
    pub faculty_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(subject_id) = &self.subject_id {
            validate_id("subject", subject_id)?;
        }
        if let Some(faculty_id) = &self.faculty_id {
            validate_id("faculty", faculty_id)?;
        }
        if let Some(semester) = self.semester {
            validate_semester(semester)?;
        }
        validate_date_range(self.start_date, self.end_date)
    }
}

/// Filters for one student's history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    pub subject_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<HistoryFilter> for RecordFilter {
    fn from(filter: HistoryFilter) -> Self {
        RecordFilter {
            subject_id: filter.subject_id,
            start_date: filter.start_date,
            end_date: filter.end_date,
            ..Default::default()
        }
    }
}

/// Identifies a cohort of students: everyone in one department, division and semester.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub department: Department,
    pub division: Division,
    pub semester: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_values() {
        assert_eq!("late".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Late);
        assert_eq!("B".parse::<Division>().unwrap(), Division::B);
        assert_eq!("faculty".parse::<Role>().unwrap(), Role::Faculty);
    }

    #[test]
    fn rejects_unknown_division() {
        let err = "D".parse::<Division>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("A, B, C"));
    }

    #[test]
    fn enum_json_uses_wire_names() {
        let json = serde_json::to_string(&Department::Electronics).unwrap();
        assert_eq!(json, "\"electronics\"");

        let status: SessionStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, SessionStatus::Completed);
    }

    #[test]
    fn id_validation() {
        assert!(validate_id("student", "stu-001_a").is_ok());
        assert!(validate_id("student", "").is_err());
        assert!(validate_id("student", "has space").is_err());
        assert!(validate_id("student", &"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn semester_bounds() {
        assert!(validate_semester(1).is_ok());
        assert!(validate_semester(MAX_SEMESTER).is_ok());
        assert!(validate_semester(0).is_err());
        assert!(validate_semester(MAX_SEMESTER + 1).is_err());
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        let mark = MarkAttendance {
            session_id: "s1".to_string(),
            student_id: "stu1".to_string(),
            status: AttendanceStatus::Present,
            confidence: Some(1.5),
            remark: None,
        };
        assert!(matches!(mark.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let filter = RecordFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
