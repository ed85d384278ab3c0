use std::fs;
use std::io;
use std::path::Path;

use bytesize::ByteSize;
use chrono::{DateTime, Local};
use console::style;

use crate::export::ExportResult;

/// One immediate child of the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    /// File length, or the total size of all files below a directory
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub is_dir: bool,
}

/// List the immediate children of `dir`, sorted by name
pub fn list_entries(dir: &Path) -> io::Result<Vec<EntryInfo>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let size = if meta.is_dir() {
            dir_size(&entry.path())?
        } else {
            meta.len()
        };
        entries.push(EntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            size,
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            is_dir: meta.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn dir_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        total += if meta.is_dir() {
            dir_size(&entry.path())?
        } else {
            meta.len()
        };
    }
    Ok(total)
}

/// Render the listing printed after a successful backup
pub fn render_listing(result: &ExportResult, entries: &[EntryInfo]) -> String {
    let mut out = format!(
        "{} {}\n",
        style("Backup completed:").green().bold(),
        result.destination.path.display()
    );

    if entries.is_empty() {
        out.push_str("  (directory is empty)\n");
        return out;
    }

    for entry in entries {
        let modified = entry
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".repeat(19));
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        out.push_str(&format!(
            "  {}  {:>10}  {}\n",
            modified,
            ByteSize(entry.size).to_string(),
            name
        ));
    }

    let total: u64 = entries.iter().map(|e| e.size).sum();
    out.push_str(&format!(
        "  {} item(s), {} total\n",
        entries.len(),
        ByteSize(total)
    ));
    out
}
