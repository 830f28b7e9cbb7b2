//! Operator probe for the feed engine.
//!
//! # Responsibility
//! - Verify `shelter_feed_core` linkage (`ping`, `version`).
//! - Print one activity feed page as JSON for a database, caller and group.

use clap::{Parser, Subcommand};
use shelter_feed_core::db::open_db;
use shelter_feed_core::{
    core_version, default_log_level, init_logging, ping, FeedServiceError, GroupId,
    SqliteFeedService, UserId,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "shelter-feed")]
#[command(version)]
#[command(about = "Group activity feed probe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,

    /// Print the core version
    Version,

    /// Print one activity feed page as JSON
    Feed {
        /// SQLite database file
        #[arg(long, env = "SHELTER_FEED_DB_PATH")]
        db: PathBuf,

        /// Requesting user id
        #[arg(long)]
        caller: UserId,

        /// Group whose feed is read
        #[arg(long)]
        group: GroupId,

        /// Raw query string, e.g. `limit=10&type=comments&tags=medical`
        #[arg(long, default_value = "")]
        query: String,

        /// trace|debug|info|warn|error; needs `--log-dir`
        #[arg(long, requires = "log_dir")]
        log_level: Option<String>,

        /// Absolute directory for log files; logging stays off when omitted
        #[arg(long)]
        log_dir: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ping => {
            println!("shelter_feed_core ping={}", ping());
            ExitCode::SUCCESS
        }
        Commands::Version => {
            println!("shelter_feed_core version={}", core_version());
            ExitCode::SUCCESS
        }
        Commands::Feed {
            db,
            caller,
            group,
            query,
            log_level,
            log_dir,
        } => {
            if let Some(log_dir) = log_dir {
                let level = log_level.as_deref().unwrap_or(default_log_level());
                if let Err(err) = init_logging(level, &log_dir) {
                    eprintln!("error: logging: {err}");
                    return ExitCode::from(2);
                }
            }
            run_feed(&db, caller, group, &query)
        }
    }
}

fn run_feed(db: &Path, caller: UserId, group: GroupId, query: &str) -> ExitCode {
    let conn = match open_db(db) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("error: storage_error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let service = match SqliteFeedService::try_from_conn(&conn) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("error: storage_error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match service.activity_feed_query(caller, group, query) {
        Ok(page) => match serde_json::to_string_pretty(&page.to_body()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: serialize: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("error: {}: {err}", err.code());
            match err {
                FeedServiceError::PermissionDenied { .. } => ExitCode::from(3),
                FeedServiceError::Validation(_) => ExitCode::from(2),
                FeedServiceError::Repo(_) => ExitCode::FAILURE,
            }
        }
    }
}
