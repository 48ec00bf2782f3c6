//! File helpers for command outputs.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Ensure the parent directory of a file path exists.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// # use kittens_cli::io_utils::ensure_parent_dir;
///
/// let path = Path::new("output/data/games.jsonl");
/// ensure_parent_dir(path).unwrap();
/// ```
pub fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Creates (truncating) a buffered file, creating parent directories first.
pub fn create_buffered(path: &Path) -> std::io::Result<BufWriter<File>> {
    ensure_parent_dir(path).map_err(std::io::Error::other)?;
    File::create(path).map(BufWriter::new)
}
