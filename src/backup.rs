use std::time::Duration;

use chrono::{DateTime, Local};
use log::debug;

use crate::config::ConfigSource;
use crate::credentials;
use crate::destination::{self, BaseDirs};
use crate::error::BackupError;
use crate::export::{self, DumpRunner, ExportResult};

/// Per-run settings that do not come from the configuration source
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Tool name as given by the user, used in diagnostics
    pub tool: String,
    pub started_at: DateTime<Local>,
    pub unique: bool,
    pub timeout: Option<Duration>,
}

/// Run one backup: tool check, credentials, destination, export.
///
/// Every stage either yields its value or ends the run with its error.
pub async fn run_backup<C, B, R>(
    config: &C,
    bases: &B,
    runner: &R,
    options: &BackupOptions,
) -> Result<ExportResult, BackupError>
where
    C: ConfigSource,
    B: BaseDirs,
    R: DumpRunner,
{
    let program = export::locate_tool(runner, &options.tool)?;
    let creds = credentials::resolve(config)?;
    debug!("Credentials resolved from environment");

    let candidates = bases.candidates();
    let dest = destination::select(&candidates, || {
        let token = options.unique.then(destination::unique_token);
        destination::backup_dir_name(options.started_at, token.as_deref())
    })?;

    export::invoke(runner, &program, &dest, &creds, options.timeout).await
}
