mod cli;
mod error;
mod exporter;
mod filter;
mod fmt;
mod importer;
mod logging;
mod models;
mod reports;
mod session;
mod settings;
#[cfg(feature = "dashboard")]
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let settings = settings::load_settings();
    let level = if cli.verbose { "debug" } else { settings.log_level.as_str() };
    #[cfg(feature = "dashboard")]
    let log_file = matches!(cli.command, Commands::Dashboard { .. })
        .then(|| settings::config_dir().join("franchise-dashboard.log"));
    #[cfg(not(feature = "dashboard"))]
    let log_file: Option<std::path::PathBuf> = None;
    if let Err(e) = logging::init(level, log_file.as_deref()) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let result = match cli.command {
        Commands::Init { force } => cli::init::run(force),
        Commands::Options { file } => cli::options::run(&file),
        Commands::Summary { file, selection } => cli::summary::run(&file, selection.into()),
        Commands::Export {
            file,
            selection,
            output,
        } => cli::export::run(&file, selection.into(), output).map(|_| ()),
        #[cfg(feature = "dashboard")]
        Commands::Dashboard { file } => cli::dashboard::run(&file),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
