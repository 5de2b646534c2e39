//! The command line interface for normalising model results.
use crate::config::NormalisationConfig;
use crate::log;
use crate::normalise::{NormalisedData, Normaliser};
use crate::output::{OUTPUT_FILE_NAME, create_output_directory, write_table};
use crate::settings::Settings;
use ::log::info;
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The folder in which results are written if no output directory is given
const DEFAULT_OUTPUT_DIR: &str = "cross_compare_results";

/// The command line interface for normalising model results.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands which read results
#[derive(Args)]
pub struct InputOpts {
    /// Path to the normalisation config file. The built-in rules are used if omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Paths to the results files
    #[arg(required = true)]
    pub results: Vec<PathBuf>,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Normalise results and write them to a CSV file.
    Run {
        /// Config and results files
        #[command(flatten)]
        input: InputOpts,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Check that results files can be read and normalised.
    Validate {
        /// Config and results files
        #[command(flatten)]
        input: InputOpts,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { input, opts } => handle_run_command(&input, &opts, None),
            Self::Validate { input } => handle_validate_command(&input, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Load the config file and results files and normalise the results
fn load_and_normalise(input: &InputOpts) -> Result<NormalisedData> {
    let config = if let Some(config_path) = &input.config {
        let config = NormalisationConfig::from_path(config_path)
            .context("Failed to load normalisation config.")?;
        info!("Loaded normalisation config from {}", config_path.display());
        config
    } else {
        info!("No normalisation config given: using built-in rules");
        NormalisationConfig::default()
    };

    Normaliser::new(config)
        .load_and_normalise(input.results.as_slice())
        .context("Failed to normalise results.")
}

/// Handle the `run` command.
pub fn handle_run_command(
    input: &InputOpts,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let output_path = opts
        .output_dir
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_OUTPUT_DIR));

    // The setting can be overridden by command-line argument
    let overwrite = opts.overwrite || settings.overwrite;
    create_output_directory(output_path, overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    if !log::is_logger_initialised() {
        log::init(Some(&settings.log_level), Some(output_path))
            .context("Failed to initialise logging.")?;
    }
    info!("Output folder: {}", output_path.display());

    let data = load_and_normalise(input)?;

    let file_path = output_path.join(OUTPUT_FILE_NAME);
    write_table(data.table(), &file_path).context("Failed to write normalised results.")?;
    info!(
        "Wrote {} normalised values to {}",
        data.table().len(),
        file_path.display()
    );

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(input: &InputOpts, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    if !log::is_logger_initialised() {
        log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;
    }

    let data = load_and_normalise(input)?;
    info!(
        "Validation successful: {} values from {} models",
        data.table().len(),
        data.models().count()
    );

    Ok(())
}
