#![allow(dead_code)]
use std::env;
use std::fs;
use std::path::PathBuf;

use attendance::access::Caller;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use attendance::manager::AttendanceManager;
use attendance::models::{
    Department, Division, OpenSession, Role, Session, Subject, User,
};

pub const FACULTY: &str = "fac1";
pub const OTHER_FACULTY: &str = "fac2";
pub const ADMIN: &str = "adm1";
pub const MATH: &str = "math301";
pub const DBMS: &str = "dbms302";

/// Create a unique test DB path inside the system temp dir and remove any existing files
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_attendance.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    for suffix in ["", "-wal", "-shm"] {
        fs::remove_file(format!("{db_path}{suffix}")).ok();
    }
    db_path
}

pub fn user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        username: name.to_string(),
        email: format!("{id}@college.edu"),
        role,
        department: Some(Department::Computer),
        division: None,
        semester: None,
        enrollment_number: None,
        is_active: true,
    }
}

pub fn student(id: &str, name: &str, division: Division, active: bool) -> User {
    User {
        division: Some(division),
        semester: Some(3),
        enrollment_number: Some(format!("EN-{id}")),
        is_active: active,
        ..user(id, name, Role::Student)
    }
}

fn subject(id: &str, name: &str, code: &str) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        credits: 4,
        department: Department::Computer,
        semester: 3,
    }
}

/// Open a fresh database with two faculty members, an admin, two subjects and a cohort of
/// computer / A / semester 3 with four active students (plus one inactive and one in division B).
pub fn seeded_manager(name: &str) -> (AttendanceManager, String) {
    let db_path = setup_test_db(name);
    let mut manager = AttendanceManager::open(&db_path).expect("open db");

    manager
        .insert_subjects(&[
            subject(MATH, "Engineering Mathematics III", "MATH301"),
            subject(DBMS, "Database Systems", "DBMS302"),
        ])
        .expect("insert subjects");

    manager
        .insert_users(&[
            user(FACULTY, "Dr. Mehta", Role::Faculty),
            user(OTHER_FACULTY, "Dr. Iyer", Role::Faculty),
            user(ADMIN, "Registrar", Role::Admin),
            student("stu1", "Asha Rao", Division::A, true),
            student("stu2", "Bilal Khan", Division::A, true),
            student("stu3", "Chitra Nair", Division::A, true),
            student("stu4", "Dev Patel", Division::A, true),
            student("stu5", "Esha Gupta", Division::A, false),
            student("stu6", "Farhan Ali", Division::B, true),
        ])
        .expect("insert users");

    (manager, db_path)
}

pub fn math_request() -> OpenSession {
    OpenSession {
        subject_id: MATH.to_string(),
        division: Division::A,
        department: Department::Computer,
        semester: 3,
    }
}

pub fn open_math(manager: &mut AttendanceManager) -> Session {
    manager
        .open_session(FACULTY, &math_request())
        .expect("open session")
}

pub fn faculty() -> Caller {
    Caller::new(FACULTY, Role::Faculty)
}

pub fn admin() -> Caller {
    Caller::new(ADMIN, Role::Admin)
}

/// Runs raw SQL against the database file through a second connection.
pub fn run_sql(db_path: &str, sql: &str) {
    let mut conn = SqliteConnection::establish(db_path).expect("open second connection");
    conn.batch_execute(sql).expect("run sql");
}
