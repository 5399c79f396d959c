//! Seeds the registries.
//!
//! Creates the schema, then imports subjects and users from the CSV files at [`SUBJECTS_PATH`]
//! and [`USERS_PATH`] (override with the first and second arguments).

use std::env;

use attendance::{config::Settings, error::AppResult, roster};

/// The default path to the subject list.
const SUBJECTS_PATH: &str = "subjects.csv";

/// The default path to the user list.
const USERS_PATH: &str = "users.csv";

pub fn main() -> AppResult<()> {
    attendance::init_tracing();

    let mut args = env::args().skip(1);
    let subjects_path = args.next().unwrap_or_else(|| SUBJECTS_PATH.to_string());
    let users_path = args.next().unwrap_or_else(|| USERS_PATH.to_string());

    let settings = Settings::load()?;
    let mut manager = attendance::create_default_manager(&settings)?;

    let subjects = roster::read_subjects(&subjects_path)?;
    manager.insert_subjects(&subjects)?;

    let users = roster::read_users(&users_path)?;
    manager.insert_users(&users)?;

    let roster = manager.get_roster()?;
    println!("{} students on the roster", roster.len());

    Ok(())
}
