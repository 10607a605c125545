//! All-or-nothing replacement of output files.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::trace;

/// Writes `contents` to `path`, replacing any existing file only once every byte was written.
///
/// The data is first written to a hidden sibling of `path` which is then renamed over `path`.
/// The sibling is removed if anything fails.
///
/// # Errors
///
/// Returns [`Err`] if `path` has no file name or if writing or renaming fails.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let temporary = temporary_path(path)?;
    trace!("staging {} bytes in {}", contents.len(), temporary.display());

    let result = write_and_rename(&temporary, path, contents);
    if result.is_err() {
        // Cleanup is best effort.
        let _ = fs::remove_file(&temporary);
    }

    result
}

/// Returns the path of the hidden sibling used to stage writes to `path`.
fn temporary_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("{} does not name a file", path.display()))?;

    let mut temporary_name = OsString::from(".");
    temporary_name.push(name);
    temporary_name.push(".tmp");
    Ok(path.with_file_name(temporary_name))
}

/// Writes `contents` to `temporary`, then moves `temporary` to `path`.
fn write_and_rename(temporary: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = File::create(temporary)
        .with_context(|| format!("error creating {}", temporary.display()))?;
    file.write_all(contents)
        .with_context(|| format!("error writing {}", temporary.display()))?;
    file.sync_all()
        .with_context(|| format!("error flushing {}", temporary.display()))?;
    drop(file);

    fs::rename(temporary, path).with_context(|| {
        format!(
            "error moving {} to {}",
            temporary.display(),
            path.display()
        )
    })
}
