//! Reading the user and subject registries from CSV exports.
//!
//! Both files carry a header row whose column names match the JSON field names
//! (`id,username,email,role,department,division,semester,enrollmentNumber,isActive` for users,
//! `id,name,code,credits,department,semester` for subjects). Empty optional cells are `None`.

use std::{fs::File, io::Read, path::Path};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    error::AppResult,
    models::{Role, Subject, User},
};

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> AppResult<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .map(|row| row.map_err(Into::into))
        .collect()
}

/// Reads users from a CSV file.
pub fn read_users(path: impl AsRef<Path>) -> AppResult<Vec<User>> {
    let path = path.as_ref();
    let users: Vec<User> = read_rows(File::open(path)?)?;
    info!("Read {} users from {}", users.len(), path.display());
    Ok(users)
}

pub fn read_subjects(path: impl AsRef<Path>) -> AppResult<Vec<Subject>> {
    let path = path.as_ref();
    let subjects: Vec<Subject> = read_rows(File::open(path)?)?;
    info!("Read {} subjects from {}", subjects.len(), path.display());
    Ok(subjects)
}

/// Students to add and to deactivate when replacing `current` with `incoming`.
#[derive(Debug, Default, PartialEq)]
pub struct RosterDiff {
    pub added: Vec<User>,
    pub dropped: Vec<String>,
}

/// Compares rosters by student ID. Non-student rows in `incoming` are ignored, and students who
/// are already inactive are not dropped again.
pub fn diff_roster(current: &[User], incoming: &[User]) -> RosterDiff {
    let incoming: Vec<&User> = incoming
        .iter()
        .filter(|user| user.role == Role::Student)
        .collect();

    let dropped = current
        .iter()
        .filter(|student| student.is_active)
        .filter(|student| !incoming.iter().any(|new| new.id == student.id))
        .map(|student| student.id.clone())
        .collect();

    let added = incoming
        .into_iter()
        .filter(|new| !current.iter().any(|student| student.id == new.id))
        .cloned()
        .collect();

    RosterDiff { added, dropped }
}
