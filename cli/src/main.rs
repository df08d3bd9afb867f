use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sqlmigrate_core::MigrationScript;
use sqlmigrate_source::{DatabaseConfig, MigrateConfig, MigrationSet};
use sqlmigrate_sqlite::{MigrationStatus, Migrator, open_database};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlmigrate")]
#[command(about = "Apply and inspect forward-only SQLite schema migrations")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply all pending migrations.
    Up(TargetArgs),
    /// Show applied, pending, and orphaned migrations.
    Status(StatusArgs),
    /// Print the statements a migration file would execute.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Database file path (overrides the configured candidates).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Migrations directory (overrides the configured directory).
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Print status as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Migration file to inspect.
    file: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Up(args) => run_up(args),
        Command::Status(args) => run_status(args),
        Command::Show(args) => run_show(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// up
// ---------------------------------------------------------------------------

fn run_up(args: TargetArgs) -> Result<(), String> {
    let config = load_config(&args)?;
    let set = load_migrations(&config)?;
    let db_path = resolve_db_path(&config)?;
    let mut conn = open_database(&db_path, &config.pragmas)
        .map_err(|e| format!("Failed to open database '{}': {e}", db_path.display()))?;

    let report = Migrator::new(&mut conn)
        .run(&set)
        .map_err(|e| format!("Migration failed: {e}"))?;

    for applied in &report.applied {
        if applied.statements_skipped > 0 {
            println!(
                "Applied {} ({} statements, {} skipped)",
                applied.version, applied.statements_executed, applied.statements_skipped
            );
        } else {
            println!(
                "Applied {} ({} statements)",
                applied.version, applied.statements_executed
            );
        }
    }
    if report.is_noop() {
        println!(
            "Database '{}' is up to date ({} migrations applied).",
            db_path.display(),
            report.already_applied.len()
        );
    } else {
        println!(
            "Migrated '{}': {} applied, {} already applied.",
            db_path.display(),
            report.applied.len(),
            report.already_applied.len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn run_status(args: StatusArgs) -> Result<(), String> {
    let config = load_config(&args.target)?;
    let set = load_migrations(&config)?;
    let db_path = resolve_db_path(&config)?;
    let mut conn = open_database(&db_path, &config.pragmas)
        .map_err(|e| format!("Failed to open database '{}': {e}", db_path.display()))?;

    let status = Migrator::new(&mut conn)
        .status(&set)
        .map_err(|e| format!("Failed to get migration status: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| format!("Failed to serialize status: {e}"))?;
        println!("{json}");
    } else {
        print_status(&db_path, &status);
    }
    Ok(())
}

fn print_status(db_path: &Path, status: &MigrationStatus) {
    println!("Migration Status for '{}':", db_path.display());
    println!("  Applied: {}", status.applied.len());
    for entry in &status.applied {
        match entry.applied_at {
            Some(at) => println!("    {}  {at}", entry.version),
            None => println!("    {}", entry.version),
        }
    }
    println!("  Pending: {}", status.pending.len());
    for version in &status.pending {
        println!("    {version}");
    }
    if !status.orphaned.is_empty() {
        println!("  Orphaned (recorded, no file): {}", status.orphaned.len());
        for version in &status.orphaned {
            println!("    {version}");
        }
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn run_show(args: ShowArgs) -> Result<(), String> {
    let content = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read '{}': {e}", args.file.display()))?;
    let script = MigrationScript::parse(&content)
        .map_err(|e| format!("Invalid migration '{}': {e}", args.file.display()))?;

    let statements = script.statements();
    for (index, statement) in statements.iter().enumerate() {
        println!("-- statement {}", index + 1);
        println!("{statement};");
    }
    if statements.is_empty() {
        println!("-- no executable statements");
    }
    if script.revert.is_some() {
        println!("-- revert section present (not executed)");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loads the configuration file, if any, and applies command-line overrides.
fn load_config(args: &TargetArgs) -> Result<MigrateConfig, String> {
    let mut config = match &args.config {
        Some(path) => MigrateConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => MigrateConfig::default(),
    };
    if let Some(db) = &args.db {
        config.database = DatabaseConfig::single(db.clone());
    }
    if let Some(dir) = &args.dir {
        config.migrations.dir = dir.clone();
    }
    debug!(?config, "Resolved configuration");
    Ok(config)
}

fn load_migrations(config: &MigrateConfig) -> Result<MigrationSet, String> {
    MigrationSet::from_dir(&config.migrations.dir).map_err(|e| {
        format!(
            "Failed to load migrations from '{}': {e}",
            config.migrations.dir.display()
        )
    })
}

fn resolve_db_path(config: &MigrateConfig) -> Result<PathBuf, String> {
    config
        .database
        .resolve_path()
        .map_err(|e| format!("Failed to resolve database path: {e}"))
}
