mod db;
mod errors;
mod models;
mod operations;
mod store;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::db::storage::SqliteStorage;
use crate::operations::tracker::run_tracker;
use crate::store::TransactionStore;

/// Terminal personal finance tracker: record income and expenses, watch
/// the balance, see the income-vs-expense breakdown.
#[derive(Parser, Debug)]
#[command(name = "duit", version, about)]
struct Args {
    /// Path to the SQLite file holding the persisted transaction list
    #[arg(long, default_value = "tracker.db")]
    db: String,
}

fn main() {
    let args = Args::parse();

    // Quiet by default; RUST_LOG=duit=debug for chart/store internals.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let conn = db::connection::establish_connection(&args.db)
        .map_err(|e| format!("Failed to open database {}: {}", args.db, e))?;
    let store = TransactionStore::load(SqliteStorage::new(conn))
        .map_err(|e| format!("Failed to load transactions: {}", e))?;
    info!(count = store.all().len(), "loaded transaction list");

    run_tracker(store)
}
