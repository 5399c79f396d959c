use tabled::{Table, Tabled, settings::Style};

use crate::{
    manager::StudentHistory,
    models::{AttendanceRecord, Session},
    stats::SubjectStats,
};

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[derive(Tabled)]
struct SessionRow {
    id: String,
    subject: String,
    cohort: String,
    date: String,
    status: String,
    total: i32,
    present: String,
    absent: String,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            subject: session.subject_id.clone(),
            cohort: format!(
                "{} {} sem {}",
                session.department, session.division, session.semester
            ),
            date: session.date.to_string(),
            status: session.status.to_string(),
            total: session.total_students,
            present: or_dash(session.present_count),
            absent: or_dash(session.absent_count),
        }
    }
}

#[derive(Tabled)]
struct RecordRow {
    date: String,
    student: String,
    enrollment: String,
    subject: String,
    faculty: String,
    status: String,
    remark: String,
}

impl From<&AttendanceRecord> for RecordRow {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            date: record.date.to_string(),
            student: record.student_name.clone(),
            enrollment: or_dash(record.enrollment_number.as_deref()),
            subject: record.subject_name.clone(),
            faculty: record.faculty_name.clone(),
            status: record.status.to_string(),
            remark: or_dash(record.remark.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct StatsRow {
    subject: String,
    total: u32,
    present: u32,
    late: u32,
    absent: u32,
    percentage: String,
    standing: String,
}

impl From<&SubjectStats> for StatsRow {
    fn from(stats: &SubjectStats) -> Self {
        Self {
            subject: stats.subject_name.clone(),
            total: stats.tally.total,
            present: stats.tally.present,
            late: stats.tally.late,
            absent: stats.tally.absent,
            percentage: format!("{:.1}%", stats.percentage),
            standing: stats.status.to_string(),
        }
    }
}

/// Renders sessions as a table.
pub fn sessions_table(sessions: &[Session]) -> String {
    let mut table = Table::new(sessions.iter().map(SessionRow::from));
    table.with(Style::modern());
    table.to_string()
}

/// Renders attendance records as a table.
pub fn records_table(records: &[AttendanceRecord]) -> String {
    let mut table = Table::new(records.iter().map(RecordRow::from));
    table.with(Style::modern());
    table.to_string()
}

/// Pretty prints a student's history: every record, then the per-subject summary.
pub fn show_student_history(history: &StudentHistory) {
    let records: Vec<AttendanceRecord> = history
        .records
        .iter()
        .map(|entry| entry.record.clone())
        .collect();

    let mut stats = Table::new(history.stats.iter().map(StatsRow::from));
    stats.with(Style::modern());

    println!(
        "Attendance of {}:\n{}\nBy subject:\n{stats}",
        history.student_id,
        records_table(&records)
    );
}
