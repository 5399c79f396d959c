//! Updates the roster of students.
//!
//! This binary will look at the user list provided in [`USERS_PATH`] (or the first argument) and
//! look at the diff with the students currently stored in the database. Students missing from the
//! list are deactivated, so they stop counting towards new sessions but keep their records; new
//! students are inserted.

use std::env;

use attendance::{config::Settings, error::AppResult, roster};

/// The default path to the user list.
const USERS_PATH: &str = "users.csv";

pub fn main() -> AppResult<()> {
    attendance::init_tracing();

    let users_path = env::args().nth(1).unwrap_or_else(|| USERS_PATH.to_string());

    let settings = Settings::load()?;
    let mut manager = attendance::create_default_manager(&settings)?;

    let new_roster = roster::read_users(&users_path)?;
    let curr_roster = manager.get_roster()?;

    let diff = roster::diff_roster(&curr_roster, &new_roster);

    println!("Students dropped: {:#?}", diff.dropped);
    for student_id in &diff.dropped {
        manager.deactivate_user(student_id)?;
    }

    let added_ids: Vec<&str> = diff.added.iter().map(|s| s.id.as_str()).collect();
    println!("Students added: {:#?}", added_ids);
    manager.insert_users(&diff.added)?;

    Ok(())
}
