//! OpenSASE Forms CLI
//!
//! Command-line interface for the OpenSASE form builder engine.
//!
//! # Usage
//!
//! ```bash
//! opensase-forms forms list
//! opensase-forms forms import -f signup.json
//! opensase-forms forms check 3f6c...
//! opensase-forms eval --formula "{qty} * {price}" --value qty=3 --value price=4
//! opensase-forms fill 3f6c... --set email=jane@example.com --submit
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "opensase-forms")]
#[command(author = "OpenSASE")]
#[command(version)]
#[command(about = "OpenSASE Forms Command Line Interface", long_about = None)]
struct Cli {
    /// Config file (default ~/.opensase/forms.toml)
    #[arg(long, env = "OPENSASE_FORMS_CONFIG")]
    config: Option<PathBuf>,

    /// Saved forms collection (default ~/.opensase/forms.json)
    #[arg(long, env = "OPENSASE_FORMS_STORE")]
    store: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Log filter, e.g. `debug` or `sase_forms=trace`
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Evaluate a formula against ad-hoc values
    Eval {
        #[arg(long)]
        formula: String,
        /// Field value as id=value (JSON literal or plain text)
        #[arg(long = "value", value_name = "ID=VALUE")]
        values: Vec<String>,
        /// Date used by age_from_date (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },
    /// Fill a saved form and optionally submit it
    Fill {
        id: String,
        /// Field value as id=value, applied in order
        #[arg(long = "set", value_name = "ID=VALUE")]
        set: Vec<String>,
        /// Apply field default values first
        #[arg(long)]
        defaults: bool,
        /// Validate every field and submit
        #[arg(long)]
        submit: bool,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum FormCommands {
    /// List saved forms
    List,
    /// Show a form's fields
    Show { id: String },
    /// Import forms from a JSON or YAML file
    Import {
        #[arg(short, long)]
        file: String,
    },
    /// Delete a saved form
    Delete { id: String },
    /// Field statistics of a form
    Stats { id: String },
    /// Check derived field formulas and structure
    Check { id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}; using defaults", e);
            config::Config::default()
        }
    };

    let filter = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "warn".into());
    init_tracing(&filter);

    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| output::OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or_default();

    if let Err(e) = run(cli, config, format).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: config::Config, format: output::OutputFormat) -> Result<(), String> {
    let context = || -> Result<commands::Context, String> {
        let store = config.store_path(cli.store.as_deref())?;
        tracing::debug!(store = %store.display(), "using form store");
        Ok(commands::Context::new(store, config.engine.clone(), format))
    };

    match cli.command {
        Commands::Forms { action } => commands::forms::handle(action, &context()?).await,
        Commands::Eval { formula, values, today } => commands::eval::handle(&formula, &values, today, format),
        Commands::Fill { id, set, defaults, submit } => {
            commands::fill::handle(&context()?, &id, &set, defaults, submit).await
        }
        Commands::Config { action } => commands::config::handle(action, cli.config.as_deref()),
    }
}
