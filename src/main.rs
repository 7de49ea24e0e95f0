use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3kit::cli::{commands, Cli, Commands};
use s3kit::{config, S3Client};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Every command is a short sequence of round trips; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Load configuration
    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())?;
    // load_config already made the requested profile the default
    let profile = config.get_profile(None).context("No profile configured")?;

    let client = S3Client::new(profile).context("Invalid client configuration")?;

    match cli.command {
        Commands::Ls { path } => {
            commands::cmd_ls(&client, &path).await?;
        }
        Commands::Get { path, dest } => {
            commands::cmd_get(&client, &path, dest.as_deref()).await?;
        }
        Commands::Put {
            source,
            path,
            stream,
        } => {
            commands::cmd_put(&client, &source, &path, stream).await?;
        }
        Commands::Rm { path } => {
            commands::cmd_rm(&client, &path).await?;
        }
        Commands::Stat { path } => {
            commands::cmd_stat(&client, &path).await?;
        }
        Commands::Mb { bucket } => {
            commands::cmd_mb(&client, &bucket).await?;
        }
        Commands::Rb { bucket } => {
            commands::cmd_rb(&client, &bucket).await?;
        }
        Commands::Url { path, expires_in } => {
            commands::cmd_url(&client, &path, expires_in).await?;
        }
    }

    Ok(())
}
