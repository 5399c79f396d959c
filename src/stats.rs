//! Attendance statistics, per subject and per session.
//!
//! Late arrivals count as attended when computing percentages.

use std::fmt;

use serde::Serialize;

use crate::models::{AttendanceRecord, AttendanceStatus, Session};

/// Percentage at or above which attendance is [`Standing::Excellent`].
pub const EXCELLENT_THRESHOLD: f64 = 90.0;

/// Percentage at or above which attendance is [`Standing::Good`].
pub const GOOD_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Excellent,
    Good,
    Bad,
}

impl Standing {
    pub fn classify(percentage: f64) -> Self {
        if percentage >= EXCELLENT_THRESHOLD {
            Standing::Excellent
        } else if percentage >= GOOD_THRESHOLD {
            Standing::Good
        } else {
            Standing::Bad
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Standing::Excellent => "excellent",
            Standing::Good => "good",
            Standing::Bad => "bad",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

impl Tally {
    pub fn add(&mut self, status: AttendanceStatus) {
        self.total += 1;
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
        }
    }

    /// `(present + late) / total * 100`, rounded to one decimal place. Zero when empty.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let attended = f64::from(self.present + self.late);
        let raw = attended / f64::from(self.total) * 100.0;

        (raw * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_id: String,
    pub subject_name: String,
    #[serde(flatten)]
    pub tally: Tally,
    pub percentage: f64,
    pub status: Standing,
}

/// Groups records by subject, keeping the order in which subjects first appear.
pub fn per_subject(records: &[AttendanceRecord]) -> Vec<SubjectStats> {
    let mut groups: Vec<(&str, &str, Tally)> = Vec::new();

    for record in records {
        let index = match groups
            .iter()
            .position(|(subject_id, _, _)| *subject_id == record.subject_id)
        {
            Some(index) => index,
            None => {
                groups.push((&record.subject_id, &record.subject_name, Tally::default()));
                groups.len() - 1
            }
        };

        groups[index].2.add(record.status);
    }

    groups
        .into_iter()
        .map(|(subject_id, subject_name, tally)| {
            let percentage = tally.percentage();

            SubjectStats {
                subject_id: subject_id.to_string(),
                subject_name: subject_name.to_string(),
                tally,
                percentage,
                status: Standing::classify(percentage),
            }
        })
        .collect()
}

/// Counts over the records of one session, next to the enrolment snapshot taken when it opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_students: i32,
    pub marked: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub percentage: f64,
}

pub fn summarize_session(session: &Session, records: &[AttendanceRecord]) -> SessionSummary {
    let mut tally = Tally::default();
    records
        .iter()
        .filter(|record| record.session_id == session.id)
        .for_each(|record| tally.add(record.status));

    SessionSummary {
        total_students: session.total_students,
        marked: tally.total,
        present: tally.present,
        absent: tally.absent,
        late: tally.late,
        percentage: tally.percentage(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Department, Division, SessionStatus};

    fn record(subject: &str, status: AttendanceStatus) -> AttendanceRecord {
        let date = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();

        AttendanceRecord {
            id: 0,
            student_id: "stu1".to_string(),
            session_id: "ses1".to_string(),
            status,
            confidence: 0.0,
            remark: None,
            subject_id: subject.to_string(),
            subject_name: format!("{subject} name"),
            faculty_id: "fac1".to_string(),
            faculty_name: "Faculty".to_string(),
            student_name: "Student".to_string(),
            enrollment_number: None,
            division: Division::A,
            department: Department::Computer,
            semester: 3,
            date,
            marked_at: date.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    fn records(subject: &str, present: usize, late: usize, absent: usize) -> Vec<AttendanceRecord> {
        let mut out = Vec::new();
        out.extend((0..present).map(|_| record(subject, AttendanceStatus::Present)));
        out.extend((0..late).map(|_| record(subject, AttendanceStatus::Late)));
        out.extend((0..absent).map(|_| record(subject, AttendanceStatus::Absent)));
        out
    }

    #[test]
    fn late_counts_as_attended() {
        let stats = per_subject(&records("math", 7, 2, 1));

        assert_eq!(stats.len(), 1);
        assert_eq!(
            stats[0].tally,
            Tally {
                total: 10,
                present: 7,
                absent: 1,
                late: 2
            }
        );
        assert_eq!(stats[0].percentage, 90.0);
        assert_eq!(stats[0].status, Standing::Excellent);
    }

    #[test]
    fn exactly_seventy_five_is_good() {
        let stats = per_subject(&records("math", 3, 0, 1));
        assert_eq!(stats[0].percentage, 75.0);
        assert_eq!(stats[0].status, Standing::Good);
    }

    #[test]
    fn just_below_seventy_five_is_bad() {
        assert_eq!(Standing::classify(74.9), Standing::Bad);

        let stats = per_subject(&records("math", 749, 0, 251));
        assert_eq!(stats[0].percentage, 74.9);
        assert_eq!(stats[0].status, Standing::Bad);
    }

    #[test]
    fn rounds_to_one_decimal() {
        // 2 of 3 attended.
        let stats = per_subject(&records("math", 1, 1, 1));
        assert_eq!(stats[0].percentage, 66.7);
    }

    #[test]
    fn groups_in_first_seen_order() {
        let mut all = records("physics", 1, 0, 0);
        all.extend(records("math", 0, 0, 2));
        all.extend(records("physics", 0, 0, 1));

        let stats = per_subject(&all);
        let order: Vec<&str> = stats.iter().map(|s| s.subject_id.as_str()).collect();

        assert_eq!(order, ["physics", "math"]);
        assert_eq!(stats[0].tally.total, 2);
        assert_eq!(stats[1].percentage, 0.0);
        assert_eq!(stats[1].status, Standing::Bad);
    }

    #[test]
    fn empty_input_has_no_stats() {
        assert!(per_subject(&[]).is_empty());
        assert_eq!(Tally::default().percentage(), 0.0);
    }

    #[test]
    fn session_summary_counts_its_own_records() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let session = Session {
            id: "ses1".to_string(),
            subject_id: "math".to_string(),
            faculty_id: "fac1".to_string(),
            division: Division::A,
            department: Department::Computer,
            semester: 3,
            date,
            start_time: date.and_hms_opt(9, 0, 0).unwrap(),
            end_time: None,
            total_students: 5,
            present_count: None,
            absent_count: None,
            status: SessionStatus::Active,
            created_at: date.and_hms_opt(9, 0, 0).unwrap(),
        };

        let mut all = records("math", 2, 1, 1);
        let mut foreign = record("math", AttendanceStatus::Present);
        foreign.session_id = "ses2".to_string();
        all.push(foreign);

        let summary = summarize_session(&session, &all);

        assert_eq!(summary.total_students, 5);
        assert_eq!(summary.marked, 4);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.percentage, 75.0);
    }
}
