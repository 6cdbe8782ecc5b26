//! Cairn CLI: inspect dead-letter records of graph batch writes.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cairn::dlq::FailureStats;
use cairn::{CliArgs, Command, Config, DeadLetterReader, PipelineError, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let result = match args.command {
        Command::Inspect { config } => inspect(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn inspect(config_path: &Path) -> Result<(), PipelineError> {
    info!("Loading config from {}", config_path.display());
    let config = Config::from_file(config_path)?;

    let reader = DeadLetterReader::from_config(&config.dead_letter).await?;
    let records = reader.read_all().await?;

    let mut stats = FailureStats::default();
    for stored in &records {
        stats.increment(stored.record.target_kind());
        println!("{}\t{}", stored.path, stored.record);
    }

    println!(
        "{} records in {} (node={}, relationship={}, query={}, unspecified={})",
        stats.total(),
        config.dead_letter.path,
        stats.node,
        stats.relationship,
        stats.query,
        stats.unspecified
    );

    Ok(())
}
