//! Command-line adapter over the vehicle store.
//!
//! # Responsibility
//! - Load configuration from flags, environment and an optional `.env`.
//! - Open the database, run one store operation and print JSON.
//! - Map error kinds to exit codes without printing storage internals.

use carbook_core::db::open_db;
use carbook_core::{
    default_log_level, init_logging, CancelSignal, ErrorKind, NewVehicle, OwnerName, RepoError,
    SqliteVehicleRepository, VehiclePatch, VehicleService,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use uuid::Uuid;

/// Vehicle and owner registry.
#[derive(Parser)]
#[command(name = "carbook", version, about, long_about = None)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "CARBOOK_DB_PATH", default_value = "carbook.sqlite3", global = true)]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "CARBOOK_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "CARBOOK_LOG_DIR", global = true)]
    log_dir: Option<String>,

    /// Per-operation timeout in milliseconds; 0 disables it.
    #[arg(long, env = "CARBOOK_TIMEOUT_MS", default_value_t = 5_000, global = true)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a vehicle, reusing an owner with the same name.
    Insert {
        #[arg(long)]
        reg_number: String,
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        owner_name: String,
        #[arg(long)]
        owner_surname: String,
    },
    /// List vehicles with an optional equality filter and pagination.
    Search {
        /// One of id|registration_number|make|model|year|owner.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 0)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one vehicle.
    Get { id: Uuid },
    /// List the vehicles of one owner.
    ByOwner { owner_id: Uuid },
    /// Change only the given fields of a vehicle.
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: UpdateFields,
    },
    /// Delete a vehicle; its owner is kept.
    Delete { id: Uuid },
}

#[derive(Args)]
struct UpdateFields {
    #[arg(long)]
    reg_number: Option<String>,
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    /// Requires `--owner-surname` as well.
    #[arg(long, requires = "owner_surname")]
    owner_name: Option<String>,
    #[arg(long, requires = "owner_name")]
    owner_surname: Option<String>,
}

impl UpdateFields {
    fn into_patch(self) -> VehiclePatch {
        VehiclePatch {
            registration_number: self.reg_number,
            make: self.make,
            model: self.model,
            year: self.year,
            owner: self
                .owner_name
                .zip(self.owner_surname)
                .map(|(given, family)| OwnerName::new(given, family)),
        }
    }
}

fn main() -> ExitCode {
    // Missing `.env` is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let conn = match open_db(&cli.db) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open database `{}`: {err}", cli.db.display());
            return ExitCode::FAILURE;
        }
    };
    let service = VehicleService::new(SqliteVehicleRepository::new(&conn));
    let signal = if cli.timeout_ms == 0 {
        CancelSignal::new()
    } else {
        CancelSignal::with_timeout(Duration::from_millis(cli.timeout_ms))
    };

    match run(&service, cli.command, &signal) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            info!(
                "event=cli_command module=cli status=error error_kind={}",
                err.kind().as_str()
            );
            eprintln!("error: {}", err.public_message());
            ExitCode::from(exit_code(err.kind()))
        }
    }
}

fn run(
    service: &VehicleService<SqliteVehicleRepository<'_>>,
    command: Command,
    signal: &CancelSignal,
) -> Result<String, RepoError> {
    let value = match command {
        Command::Insert {
            reg_number,
            make,
            model,
            year,
            owner_name,
            owner_surname,
        } => {
            let vehicle = NewVehicle::new(
                reg_number,
                make,
                model,
                year,
                OwnerName::new(owner_name, owner_surname),
            );
            to_json(&service.insert(&vehicle, signal)?)
        }
        Command::Search {
            filter,
            search,
            limit,
            offset,
        } => to_json(&service.search_by(
            filter.as_deref(),
            search.as_deref(),
            limit,
            offset,
            signal,
        )?),
        Command::Get { id } => to_json(&service.get_by_id(id, signal)?),
        Command::ByOwner { owner_id } => to_json(&service.get_by_owner(owner_id, signal)?),
        Command::Update { id, fields } => {
            service.update(id, &fields.into_patch(), signal)?;
            // The update is committed; its read-back must not trip the deadline.
            to_json(&service.get_by_id(id, &CancelSignal::new())?)
        }
        Command::Delete { id } => {
            service.delete(id, signal)?;
            serde_json::json!({ "deleted": id }).to_string()
        }
    };
    Ok(value)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Cancelled => 5,
        ErrorKind::Persistence => 1,
    }
}
