use std::path::PathBuf;

use thiserror::Error;

/// Terminal failures of a backup run.
///
/// Messages name variables, paths and exit codes only. Credential values and
/// the connection string never appear in them.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(
        "Missing required environment variable(s): {}. Set them before running, e.g. `export {}=...`",
        .missing.join(", "),
        .missing.first().copied().unwrap_or("MONGODB_USERNAME")
    )]
    MissingCredentials { missing: Vec<&'static str> },

    #[error("Could not create backup directory in any location: {}", format_attempts(.attempts))]
    DirectoryCreationFailed { attempts: Vec<(PathBuf, String)> },

    #[error(
        "'{tool}' was not found on PATH. Install the MongoDB Database Tools \
         (https://www.mongodb.com/try/download/database-tools) or pass --tool <path>"
    )]
    ToolNotFound { tool: String },

    #[error("Export failed: {reason}")]
    ExportFailed { code: Option<i32>, reason: String },
}

impl BackupError {
    /// Exit code reported by the dump tool, when it got that far
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BackupError::ExportFailed { code, .. } => *code,
            _ => None,
        }
    }
}

fn format_attempts(attempts: &[(PathBuf, String)]) -> String {
    if attempts.is_empty() {
        return "no candidate base directory could be resolved".to_string();
    }
    attempts
        .iter()
        .map(|(path, err)| format!("{} ({})", path.display(), err))
        .collect::<Vec<_>>()
        .join("; ")
}
