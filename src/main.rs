use clap::Parser;
use color_eyre::Result;
use log::info;
use std::path::PathBuf;
use tagpost::{Config, Database, DatabaseError, Profile, cli::{self, Cli, CliError, Commands}, logging, utils};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();
    let profile = Profile::from_dev_flag(cli.dev);

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(&utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // Logging is best effort; the app still runs without a writable log file
    match logging::init(&config, profile) {
        Ok(path) => info!("logging to {}", path.display()),
        Err(e) => eprintln!("Warning: {}", e),
    }

    let db_path: PathBuf = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;
    info!("using database {} ({:?} profile)", db_path.display(), profile);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = tagpost::tui::App::new(config, db)?;
            tagpost::tui::run_event_loop(app)?;
        }
        command => match run_command(command, &db) {
            Err(CliError::DatabaseError(DatabaseError::Validation(errors))) => {
                for error in &errors.errors {
                    eprintln!("{}", error);
                }
                std::process::exit(1);
            }
            other => other?,
        },
    }

    Ok(())
}

fn run_command(command: Commands, db: &Database) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();

    match command {
        Commands::Tui => {}
        Commands::New { title, description, tags } => {
            cli::handle_new(title, description, tags, db, &mut stdout)?;
        }
        Commands::Edit { id, title, description, tags } => {
            cli::handle_edit(id, title, description, tags, db, &mut stdout)?;
        }
        Commands::Show { id, json } => cli::handle_show(id, json, db, &mut stdout)?,
        Commands::Delete { id } => cli::handle_delete(id, db, &mut stdout)?,
        Commands::List { keyword, tag, json } => {
            cli::handle_list(keyword, tag, json, db, &mut stdout)?;
        }
        Commands::Tags { json } => cli::handle_tags(json, db, &mut stdout)?,
        Commands::DeleteTag { name } => cli::handle_delete_tag(&name, db, &mut stdout)?,
        Commands::Seed => cli::handle_seed(db, &mut stdout)?,
    }

    Ok(())
}
