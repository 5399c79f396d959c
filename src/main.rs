use attendance::{
    access::Caller,
    cli::{Cli, Command},
    config::Settings,
    display,
    error::AppResult,
    models::{HistoryFilter, Role},
    server,
};
use clap::Parser;
use tracing::info;

/// Operator identity for commands run locally against the database.
const OPERATOR_ID: &str = "cli-operator";

#[tokio::main]
async fn main() -> AppResult<()> {
    attendance::init_tracing();

    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(database) = cli.database {
        settings.database.url = database;
    }

    let operator = Caller::new(OPERATOR_ID, Role::Admin);

    match cli.command {
        Command::Serve => server::start_server(settings).await?,
        Command::InitDb => {
            attendance::create_default_manager(&settings)?;
            info!("Database ready at {}", settings.database.url);
        }
        Command::Sessions {
            faculty_id,
            status,
            limit,
        } => {
            let mut manager = attendance::create_default_manager(&settings)?;
            let sessions =
                manager.list_sessions(&faculty_id, status, settings.session_limit(limit))?;

            println!(
                "Sessions of {faculty_id}:\n{}",
                display::sessions_table(&sessions)
            );
        }
        Command::Report(args) => {
            let mut manager = attendance::create_default_manager(&settings)?;
            let records = manager.report(&operator, args.into())?;

            println!(
                "{} records:\n{}",
                records.len(),
                display::records_table(&records)
            );
        }
        Command::Student { student_id } => {
            let mut manager = attendance::create_default_manager(&settings)?;
            let history =
                manager.student_history(&operator, &student_id, HistoryFilter::default())?;

            display::show_student_history(&history);
        }
    }

    Ok(())
}
