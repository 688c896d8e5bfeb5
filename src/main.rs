//! finsight - Main Entry Point

use clap::Parser;
use finsight::cli::{cmd_export_code, cmd_info, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finsight=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { data, target } => {
            cmd_info(&data, target.as_deref())?;
        }
        Commands::Train {
            data,
            preset,
            target,
            task,
            max_epochs,
            output,
        } => {
            cmd_train(
                data.as_ref(),
                preset,
                target.as_deref(),
                task,
                max_epochs,
                output.as_ref(),
            )?;
        }
        Commands::ExportCode {
            data,
            target,
            task,
            output,
        } => {
            cmd_export_code(&data, &target, task, &output)?;
        }
    }

    Ok(())
}
