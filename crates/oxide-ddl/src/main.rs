//! oxide-ddl CLI
//!
//! Prints the DDL of a JSON model file for one dialect.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_ddl::ModelFile;

/// Computes the DDL a model set migrates to, without a database.
#[derive(Parser)]
#[command(name = "oxide-ddl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target dialect: mysql, postgres, sqlite or sqlserver.
    #[arg(short, long, env = "OXIDE_DDL_DIALECT", default_value = "mysql")]
    dialect: String,

    /// JSON model file.
    models: PathBuf,

    /// Write the DDL here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let models = ModelFile::from_path(&cli.models)?;
    let ddl = models.load(&cli.dialect)?;

    if let Some(path) = cli.output {
        fs::write(&path, &ddl)?;
        info!(path = %path.display(), "wrote DDL");
    } else {
        print!("{ddl}");
    }
    Ok(())
}
