//! Operator CLI for the VLE membership mirror.
//!
//! # Responsibility
//! - Load config, open the mirror database and start logging.
//! - Trigger a full sync, a single push-API call, or an expansion query.
//!
//! Exit status is non-zero whenever the requested operation did not succeed.

use clap::{Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use vle_core::{
    expand_user_ids, handle, init_logging, open_db, ExpandQuery, FileSnapshotSource,
    HttpSnapshotSource, Route, SnapshotSource, SyncEngine, VleConfig,
};

#[derive(Debug, Parser)]
#[command(name = "vle", version, about = "Mirror VLE course and group membership")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "VLE_CONFIG", default_value = "vle.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile the mirror with the VLE snapshot.
    Sync {
        /// Replay a saved snapshot instead of fetching one.
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Also print per-entity counters as JSON.
        #[arg(long)]
        report: bool,
    },
    /// Run one push-API call, e.g. `call add/tutor/ '{"vle_course_id": "001", "username": "jaime"}'`.
    Call { route: String, body: String },
    /// Print every user id reachable from the given users, groups and courses.
    Expand {
        #[arg(long, default_value = "|")]
        delimiter: String,
        #[arg(long = "user")]
        users: Vec<i64>,
        /// `<course><delimiter><group>`
        #[arg(long = "group")]
        groups: Vec<String>,
        #[arg(long = "course")]
        courses: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = VleConfig::load(&cli.config).map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level(), log_dir)?;
    }
    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;

    match cli.command {
        Command::Sync { snapshot, report } => {
            let source: Box<dyn SnapshotSource> = match snapshot {
                Some(path) => Box::new(FileSnapshotSource::new(path)),
                None => Box::new(
                    HttpSnapshotSource::from_config(&config).map_err(|err| err.to_string())?,
                ),
            };
            let outcome = SyncEngine::new(&conn)
                .full_sync(source.as_ref())
                .map_err(|err| err.to_string())?;
            println!("{}", outcome.message());
            if report {
                let counters =
                    serde_json::to_string_pretty(&outcome).map_err(|err| err.to_string())?;
                println!("{counters}");
            }
            Ok(())
        }
        Command::Call { route, body } => {
            let Some(route) = Route::from_path(&route) else {
                return Err(format!("unknown route `{route}`"));
            };
            let response = handle(&conn, route, &body);
            println!("{}", response.body);
            if response.is_success() {
                Ok(())
            } else {
                error!(
                    "event=cli_call module=cli status=error route={} http_status={}",
                    route.path(),
                    response.status
                );
                Err(format!("call failed with status {}", response.status))
            }
        }
        Command::Expand {
            delimiter,
            users,
            groups,
            courses,
        } => {
            let query = ExpandQuery {
                delimiter,
                user_ids: users,
                group_ids: groups,
                course_ids: courses,
            };
            let user_ids = expand_user_ids(&conn, &query).map_err(|err| err.to_string())?;
            for user_id in user_ids {
                println!("{user_id}");
            }
            Ok(())
        }
    }
}
