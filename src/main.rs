use clap::{Parser, Subcommand, builder::styling};
use duckload::cli::{RunOptions, check_work_list, run_work_list, show_table};
use duckload::config::Settings;
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::Path;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// duckload: clean CSV snapshots and load them into DuckDB tables, replacing prior contents
#[derive(Parser)]
#[command(name = "duckload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, clean and load every entity in the work list
    Run {
        /// The YAML work list naming entities and their CSV snapshots
        #[arg(default_value = "worklist.yml")]
        worklist: String,

        /// Database file to load into (overrides DUCKLOAD_DATABASE and the work list)
        #[arg(short, long)]
        database: Option<String>,

        /// Process every entity even after one fails, then report all failures
        #[arg(short, long)]
        keep_going: bool,

        /// Only process entities whose name matches this regex
        #[arg(short, long)]
        include: Option<String>,

        /// Skip entities whose name matches this regex
        #[arg(short = 'x', long)]
        exclude: Option<String>,
    },

    /// Validate the work list and its cleaning rules without touching any data
    Check {
        /// The YAML work list to validate
        #[arg(default_value = "worklist.yml")]
        worklist: String,
    },

    /// Print rows of a loaded table as NDJSON
    Show {
        /// Table (entity) name
        table: String,

        /// Database file to read from
        #[arg(short, long)]
        database: Option<String>,

        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Run {
            worklist,
            database,
            keep_going,
            include,
            exclude,
        } => {
            log::info!("Running work list {}", worklist.bright_black());
            let options = RunOptions {
                database,
                keep_going,
                include,
                exclude,
            };
            let report = run_work_list(&worklist, &options, &settings)?;
            for (entity, rows) in &report.loaded {
                log::info!("✓ {} ({} rows)", entity.green(), rows);
            }
            log::info!(
                "Loaded {} entit(ies), {} rows in total",
                report.loaded.len(),
                report.total_rows().cyan()
            );
        }
        Commands::Check { worklist } => {
            log::info!("Checking work list {}", worklist.bright_black());
            let count = check_work_list(&worklist)?;
            log::info!("✓ {} entit(ies) ready to run", count.green());
        }
        Commands::Show {
            table,
            database,
            limit,
        } => {
            let database = settings.database(database.as_deref(), None);
            log::debug!("Reading {} from {}", table, database.bright_black());
            for row in show_table(&database, &table, limit)? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
    }

    Ok(())
}
