use std::thread;

use attendance::error::AppError;
use attendance::manager::AttendanceManager;
use attendance::models::{AttendanceStatus, MarkAttendance, RecordFilter};

mod common;
use common::{FACULTY, OTHER_FACULTY, admin, open_math, seeded_manager};

fn mark(session_id: &str, student_id: &str, status: AttendanceStatus) -> MarkAttendance {
    MarkAttendance {
        session_id: session_id.to_string(),
        student_id: student_id.to_string(),
        status,
        confidence: None,
        remark: None,
    }
}

fn session_records(manager: &mut AttendanceManager, session_id: &str, student_id: &str) -> usize {
    manager
        .report(&admin(), RecordFilter::default())
        .unwrap()
        .into_iter()
        .filter(|r| r.session_id == session_id && r.student_id == student_id)
        .count()
}

#[test]
fn test_mark_creates_denormalized_record() {
    let (mut manager, _) = seeded_manager("mark_creates");
    let session = open_math(&mut manager);

    let marked = manager
        .mark(FACULTY, &mark(&session.id, "stu1", AttendanceStatus::Present))
        .unwrap();

    assert!(marked.created);
    let record = marked.record;
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.confidence, 0.0);
    assert_eq!(record.remark, None);
    assert_eq!(record.subject_name, "Engineering Mathematics III");
    assert_eq!(record.faculty_name, "Dr. Mehta");
    assert_eq!(record.student_name, "Asha Rao");
    assert_eq!(record.enrollment_number.as_deref(), Some("EN-stu1"));
    assert_eq!(record.division, session.division);
    assert_eq!(record.semester, 3);
    assert_eq!(record.date, session.date);
}

#[test]
fn test_repeated_marks_update_one_record() {
    let (mut manager, _) = seeded_manager("mark_upsert");
    let session = open_math(&mut manager);

    let first = manager
        .mark(FACULTY, &mark(&session.id, "stu2", AttendanceStatus::Present))
        .unwrap();

    let with_remark = MarkAttendance {
        confidence: Some(0.8),
        remark: Some("arrived 10 minutes late".to_string()),
        ..mark(&session.id, "stu2", AttendanceStatus::Late)
    };
    let second = manager.mark(FACULTY, &with_remark).unwrap();

    let third = manager
        .mark(FACULTY, &mark(&session.id, "stu2", AttendanceStatus::Absent))
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert!(!third.created);
    assert_eq!(second.record.confidence, 0.8);
    assert_eq!(second.record.remark.as_deref(), Some("arrived 10 minutes late"));

    // Same record throughout, ending with the last call's values.
    assert_eq!(first.record.id, third.record.id);
    assert_eq!(third.record.status, AttendanceStatus::Absent);
    assert_eq!(third.record.confidence, 0.0);
    assert_eq!(third.record.remark, None);

    assert_eq!(session_records(&mut manager, &session.id, "stu2"), 1);
}

#[test]
fn test_mark_closed_session_is_invalid() {
    let (mut manager, _) = seeded_manager("mark_closed");
    let session = open_math(&mut manager);
    manager.close_session(&session.id, FACULTY).unwrap();

    assert!(matches!(
        manager.mark(FACULTY, &mark(&session.id, "stu1", AttendanceStatus::Present)),
        Err(AppError::InvalidSession(_))
    ));
}

#[test]
fn test_mark_other_faculty_session_is_invalid() {
    let (mut manager, _) = seeded_manager("mark_other_faculty");
    let session = open_math(&mut manager);

    assert!(matches!(
        manager.mark(
            OTHER_FACULTY,
            &mark(&session.id, "stu1", AttendanceStatus::Present)
        ),
        Err(AppError::InvalidSession(_))
    ));
    assert!(matches!(
        manager.mark(FACULTY, &mark("missing-session", "stu1", AttendanceStatus::Present)),
        Err(AppError::InvalidSession(_))
    ));
}

#[test]
fn test_mark_non_student_is_invalid() {
    let (mut manager, _) = seeded_manager("mark_non_student");
    let session = open_math(&mut manager);

    assert!(matches!(
        manager.mark(FACULTY, &mark(&session.id, OTHER_FACULTY, AttendanceStatus::Present)),
        Err(AppError::InvalidStudent(_))
    ));
    assert!(matches!(
        manager.mark(FACULTY, &mark(&session.id, "nobody", AttendanceStatus::Present)),
        Err(AppError::InvalidStudent(_))
    ));
}

#[test]
fn test_mark_rejects_out_of_range_confidence() {
    let (mut manager, _) = seeded_manager("mark_confidence");
    let session = open_math(&mut manager);

    let request = MarkAttendance {
        confidence: Some(1.5),
        ..mark(&session.id, "stu1", AttendanceStatus::Present)
    };

    assert!(matches!(
        manager.mark(FACULTY, &request),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_concurrent_marks_never_duplicate() {
    let (mut manager, db_path) = seeded_manager("mark_concurrent");
    let session = open_math(&mut manager);

    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
    ];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db_path = db_path.clone();
            let request = mark(&session.id, "stu3", statuses[i % statuses.len()]);

            thread::spawn(move || {
                let mut manager = AttendanceManager::open(&db_path).expect("open db");
                manager.mark(FACULTY, &request).expect("mark")
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .filter(|marked| marked.created)
        .count();

    assert_eq!(created, 1);
    assert_eq!(session_records(&mut manager, &session.id, "stu3"), 1);
}
