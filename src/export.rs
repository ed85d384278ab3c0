use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::Command;
use url::Url;

use crate::credentials::Credentials;
use crate::destination::BackupDestination;
use crate::error::BackupError;

/// How the dump subprocess ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exited(i32),
    /// Ended without an exit code (killed by a signal)
    Terminated,
    TimedOut(Duration),
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub exit_code: i32,
    pub destination: BackupDestination,
}

/// Locates and runs the external dump tool
pub trait DumpRunner {
    /// Resolve the tool to an executable path, `None` when it is not installed
    fn locate(&self) -> Option<PathBuf>;

    /// Run `program` with `args` and wait for it to finish
    fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> impl Future<Output = io::Result<RunOutcome>> + Send;
}

/// Runs the real tool through `tokio::process`
#[derive(Debug, Clone)]
pub struct SystemRunner {
    tool: String,
    quiet: bool,
}

impl SystemRunner {
    pub fn new(tool: impl Into<String>, quiet: bool) -> Self {
        Self {
            tool: tool.into(),
            quiet,
        }
    }
}

impl DumpRunner for SystemRunner {
    fn locate(&self) -> Option<PathBuf> {
        find_executable(&self.tool, std::env::var_os("PATH"))
    }

    fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> impl Future<Output = io::Result<RunOutcome>> + Send {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if self.quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        async move {
            let mut child = cmd.spawn()?;
            let status = match timeout {
                Some(limit) => {
                    let waited = tokio::time::timeout(limit, child.wait()).await;
                    match waited {
                        Ok(status) => status?,
                        Err(_) => {
                            warn!("Dump tool exceeded {:?}, killing it", limit);
                            if let Err(e) = child.kill().await {
                                warn!("Failed to kill dump tool: {}", e);
                            }
                            return Ok(RunOutcome::TimedOut(limit));
                        }
                    }
                }
                None => child.wait().await?,
            };

            Ok(match status.code() {
                Some(code) => RunOutcome::Exited(code),
                None => RunOutcome::Terminated,
            })
        }
    }
}

/// Search `path_var` for `tool`. Names with a directory component are checked as-is.
pub fn find_executable(tool: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let direct = Path::new(tool);
    if direct.components().count() > 1 {
        return with_extensions(direct).into_iter().find(|p| is_executable(p));
    }

    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| with_extensions(&dir.join(tool)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn with_extensions(path: &Path) -> Vec<PathBuf> {
    if path.extension().is_some() {
        return vec![path.to_path_buf()];
    }
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    exts.split(';')
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            let mut name = path.as_os_str().to_owned();
            name.push(ext);
            PathBuf::from(name)
        })
        .collect()
}

#[cfg(not(windows))]
fn with_extensions(path: &Path) -> Vec<PathBuf> {
    vec![path.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Percent-encode characters that would break the userinfo part of a MongoDB URI
fn encode_userinfo(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b':' | b'/' | b'?' | b'#' | b'[' | b']' | b'@' | b'%' => {
                out.push_str(&format!("%{:02X}", byte))
            }
            b if b.is_ascii_graphic() => out.push(b as char),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Build `mongodb://<user>:<pass>@<host>:<port>/?authSource=admin`
pub fn connection_uri(creds: &Credentials) -> String {
    format!(
        "mongodb://{}:{}@{}:{}/?authSource=admin",
        encode_userinfo(&creds.username),
        encode_userinfo(&creds.password),
        creds.host,
        creds.port
    )
}

/// Make sure the dump tool is installed before anything else happens
pub fn locate_tool<R: DumpRunner>(runner: &R, tool: &str) -> Result<PathBuf, BackupError> {
    match runner.locate() {
        Some(path) => {
            debug!("Using dump tool at {}", path.display());
            Ok(path)
        }
        None => Err(BackupError::ToolNotFound {
            tool: tool.to_string(),
        }),
    }
}

/// Run the dump tool against `destination` and interpret its exit status
pub async fn invoke<R: DumpRunner>(
    runner: &R,
    program: &Path,
    destination: &BackupDestination,
    creds: &Credentials,
    timeout: Option<Duration>,
) -> Result<ExportResult, BackupError> {
    let uri = connection_uri(creds);
    if let Err(e) = Url::parse(&uri) {
        return Err(BackupError::ExportFailed {
            code: None,
            reason: format!(
                "connection string is malformed ({}), check MONGODB_HOST and MONGODB_PORT",
                e
            ),
        });
    }

    let args = vec![
        format!("--uri={}", uri),
        format!("--out={}", destination.path.display()),
    ];

    info!(
        "Exporting {}:{} into {}",
        creds.host,
        creds.port,
        destination.path.display()
    );

    let outcome = runner
        .run(program, &args, timeout)
        .await
        .map_err(|e| BackupError::ExportFailed {
            code: None,
            reason: format!("could not launch {}: {}", program.display(), e),
        })?;

    match outcome {
        RunOutcome::Exited(0) => {
            info!("Dump tool finished successfully");
            Ok(ExportResult {
                exit_code: 0,
                destination: destination.clone(),
            })
        }
        RunOutcome::Exited(code) => Err(BackupError::ExportFailed {
            code: Some(code),
            reason: format!("{} exited with code {}", program.display(), code),
        }),
        RunOutcome::Terminated => Err(BackupError::ExportFailed {
            code: None,
            reason: format!("{} was terminated by a signal", program.display()),
        }),
        RunOutcome::TimedOut(limit) => Err(BackupError::ExportFailed {
            code: None,
            reason: format!(
                "{} timed out after {}s and was killed",
                program.display(),
                limit.as_secs()
            ),
        }),
    }
}
