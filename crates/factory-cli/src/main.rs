//! Factory CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "factory")]
#[command(about = "Factory CI/CD CLI", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "FACTORY_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration files in a directory without running them
    Validate {
        /// File or directory to validate
        #[arg(env = "FACTORY_CONFIG_DIR", default_value = factory_config::DEFAULT_CONFIG_DIR)]
        path: PathBuf,
        /// Also validate all subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the decoded configuration
    Show {
        /// File or directory to load
        #[arg(env = "FACTORY_CONFIG_DIR", default_value = factory_config::DEFAULT_CONFIG_DIR)]
        path: PathBuf,
        /// Also load all subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let valid = match cli.command {
        Commands::Validate {
            path,
            recursive,
            format,
        } => commands::validate(&path, recursive, format)?,
        Commands::Show { path, recursive } => commands::show(&path, recursive)?,
    };

    if !valid {
        std::process::exit(1);
    }
    Ok(())
}
