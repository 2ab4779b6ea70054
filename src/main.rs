use anyhow::{Context, Result};
use bulkload::load::{build_insert, BulkLoader, LoadStrategy, DEFAULT_CHUNK_SIZE};
use bulkload::{report, schema, source::CsvSource};
use clap::Parser;
use rusqlite::Connection;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "bulkload",
    about = "Load a CSV file into a relational table under one of four commit/batching strategies"
)]
struct Args {
    /// CSV file to load; the first record is the header
    #[arg(long, default_value = "FL_insurance_sample.csv")]
    csv: PathBuf,

    /// SQLite database file
    #[arg(long, default_value = "fl_insurance.db")]
    db: PathBuf,

    /// Where to write the HTML report
    #[arg(long, default_value = "load_report.html")]
    report: PathBuf,

    /// Also write the report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Strategy choice 1-4; omit for the interactive menu
    #[arg(long)]
    choice: Option<String>,
}

fn main() -> Result<()> {
    // ─── logging ─────────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // ─── destination table ───────────────────────────────────────────
    let conn = Connection::open(&args.db)
        .with_context(|| format!("opening database {}", args.db.display()))?;
    schema::ensure_table(&conn)?;

    // ─── strategy selection ──────────────────────────────────────────
    let strategy = match &args.choice {
        Some(token) => LoadStrategy::from_token(token)
            .with_context(|| format!("invalid choice `{}`, expected 1-4", token))?,
        None => menu()?,
    };
    info!(
        strategy = strategy.name(),
        auto_commit = strategy.auto_commit(),
        "strategy selected"
    );

    // ─── load ────────────────────────────────────────────────────────
    let start = Instant::now();
    let source = CsvSource::open(&args.csv)?;
    let stmt = build_insert(schema::TABLE, source.header())?;
    let summary = BulkLoader::new(&conn, strategy).load(&stmt, source)?;
    info!(elapsed = ?start.elapsed(), "load finished");

    // ─── inspect & report ────────────────────────────────────────────
    schema::preview(&conn, 10)?;
    report::write_html(&args.report, strategy.name(), &summary)?;
    if let Some(path) = &args.json {
        report::write_json(path, strategy.name(), &summary)?;
    }
    Ok(())
}

/// Present the four load options until a valid choice is entered. The
/// token-to-strategy mapping itself is pure; only this loop re-prompts.
fn menu() -> Result<LoadStrategy> {
    let stdin = io::stdin();
    loop {
        println!(" _________________________________________________________________");
        println!("| To load the CSV file into the database choose option:           |");
        println!("| 1. Row by row, committing each INSERT separately                |");
        println!("| 2. Row by row, committed as one unit                            |");
        println!("| 3. One single batch                                             |");
        println!("| 4. Batches of {:<4} rows                                         |", DEFAULT_CHUNK_SIZE);
        println!("|_________________________________________________________________|");
        print!("Enter choice: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("stdin closed before a strategy was chosen");
        }
        match LoadStrategy::from_token(&line) {
            Some(strategy) => return Ok(strategy),
            None => println!("Invalid input!"),
        }
    }
}
