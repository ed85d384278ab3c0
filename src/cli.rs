use clap::Parser;

/// Default name of the dump executable looked up on PATH
pub const DEFAULT_TOOL: &str = "mongodump";

#[derive(Parser, Debug, Clone)]
#[clap(
    author,
    version,
    about = "Back up a MongoDB instance into a timestamped directory using mongodump",
    after_help = "Credentials are read from MONGODB_USERNAME and MONGODB_PASSWORD.\n\
                  MONGODB_HOST (default 192.168.1.10) and MONGODB_PORT (default 27018) are optional."
)]
pub struct Cli {
    /// Dump executable name or path
    #[clap(long, default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Kill the dump tool if it runs longer than this many seconds (no limit by default)
    #[clap(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Append a random token to the backup directory name
    #[clap(long)]
    pub unique: bool,

    /// Quiet mode, discard the dump tool's output and skip the listing
    #[clap(long)]
    pub quiet: bool,

    /// Debug mode, enable verbose logging
    #[clap(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mongobackup"]).unwrap();
        assert_eq!(cli.tool, "mongodump");
        assert_eq!(cli.timeout, None);
        assert!(!cli.unique);
        assert!(!cli.quiet);
        assert!(!cli.debug);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "mongobackup",
            "--tool",
            "/opt/mongo/bin/mongodump",
            "--timeout",
            "600",
            "--unique",
            "--quiet",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.tool, "/opt/mongo/bin/mongodump");
        assert_eq!(cli.timeout, Some(600));
        assert!(cli.unique && cli.quiet && cli.debug);
    }

    #[test]
    fn test_help_is_reported_as_display_help() {
        let err = Cli::try_parse_from(["mongobackup", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
