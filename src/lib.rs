pub mod backup;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod destination;
pub mod error;
pub mod export;
pub mod report;

use std::time::Duration;

pub use error::BackupError;

pub async fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let args = cli::Cli::parse();

    // Configure logger based on debug flag
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        log::debug!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if args.quiet {
        console::set_colors_enabled(false);
    }

    let options = backup::BackupOptions {
        tool: args.tool.clone(),
        started_at: chrono::Local::now(),
        unique: args.unique,
        timeout: args.timeout.map(Duration::from_secs),
    };
    let config = config::ProcessEnv;
    let bases = destination::PlatformDirs::new(config);
    let runner = export::SystemRunner::new(&args.tool, args.quiet);

    let result = backup::run_backup(&config, &bases, &runner, &options).await?;

    if args.quiet {
        return Ok(());
    }

    // The listing is informational only, a failure here does not fail the backup
    match report::list_entries(&result.destination.path) {
        Ok(entries) => print!("{}", report::render_listing(&result, &entries)),
        Err(e) => log::warn!(
            "Backup written to {} but its contents could not be listed: {}",
            result.destination.path.display(),
            e
        ),
    }

    Ok(())
}
