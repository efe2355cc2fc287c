//! Parcel tracker demonstration driver.
//!
//! # Responsibility
//! - Run the fixed register / re-address / advance / delete scenario against
//!   a SQLite file.
//! - Print client parcel listings between steps.

use clap::Parser;
use log::info;
use parcel_core::db::open_db;
use parcel_core::{
    default_log_level, init_logging, ClientId, GuardOutcome, Parcel, ParcelNumber,
    ParcelRepository, RepoResult, SqliteParcelRepository, StatusChange, TrackingService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEMO_CLIENT: ClientId = 1;
const DEMO_ADDRESS: &str = "Pskov, Pushkin St., Kolotushkin House, 5";
const DEMO_NEW_ADDRESS: &str = "Saratov, Verkhnie Zori, Kozlov St., 25";

#[derive(Parser)]
#[command(name = "parcel-tracker")]
#[command(about = "Register, advance and delete parcels in a SQLite tracker database")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, default_value = "tracker.db")]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error); needs --log-dir
    #[arg(long, requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let conn = open_db(&cli.db)?;
    let service = TrackingService::new(SqliteParcelRepository::try_new(&conn)?);
    run_scenario(&service)?;
    info!(
        "event=scenario_done module=cli status=ok db={} core_version={}",
        cli.db.display(),
        parcel_core::core_version()
    );
    Ok(())
}

fn run_scenario<R: ParcelRepository>(service: &TrackingService<R>) -> RepoResult<()> {
    let parcel = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    print_registered(&parcel);

    match service.change_address(parcel.number, DEMO_NEW_ADDRESS)? {
        GuardOutcome::Applied => println!(
            "Parcel #{} redirected to {}",
            parcel.number, DEMO_NEW_ADDRESS
        ),
        GuardOutcome::Rejected { status } => println!(
            "Parcel #{} cannot be redirected, status {}",
            parcel.number, status
        ),
    }

    if let StatusChange::Advanced { to, .. } = service.advance(parcel.number)? {
        println!("Parcel #{} has a new status: {}", parcel.number, to);
    }
    print_client_parcels(service, DEMO_CLIENT)?;

    // Sent parcels stay in place.
    print_removal(parcel.number, service.remove(parcel.number)?);
    print_client_parcels(service, DEMO_CLIENT)?;

    let second = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    print_registered(&second);
    print_removal(second.number, service.remove(second.number)?);
    print_client_parcels(service, DEMO_CLIENT)?;

    Ok(())
}

fn print_registered(parcel: &Parcel) {
    println!(
        "New parcel #{} to {} from client {} registered at {}",
        parcel.number, parcel.address, parcel.client, parcel.created_at
    );
}

fn print_removal(number: ParcelNumber, outcome: GuardOutcome) {
    match outcome {
        GuardOutcome::Applied => println!("Parcel #{number} deleted"),
        GuardOutcome::Rejected { status } => {
            println!("Parcel #{number} kept, status {status} no longer allows deletion")
        }
    }
}

fn print_client_parcels<R: ParcelRepository>(
    service: &TrackingService<R>,
    client: ClientId,
) -> RepoResult<()> {
    let parcels = service.list_for_client(client)?;

    println!("Parcels of client {client}:");
    for parcel in &parcels {
        println!(
            "Parcel #{} to {} from client {} registered at {}, status {}",
            parcel.number, parcel.address, parcel.client, parcel.created_at, parcel.status
        );
    }
    println!();

    Ok(())
}
