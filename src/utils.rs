//! Utility functions for file naming and path manipulation

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum length of a sanitized filename, in characters
pub const MAX_FILENAME_CHARS: usize = 200;

/// Highest counter tried when renaming around collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Make a video title safe to use as a file name
///
/// Control characters and the characters `/ \ : * ? " < > |` are replaced with `_`, and the
/// result is truncated to [`MAX_FILENAME_CHARS`] characters.
///
/// # Examples
///
/// ```
/// use playlist_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC: Back in Black?"), "AC_DC_ Back in Black_");
/// ```
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            c if (c as u32) < 32 => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// An output path reserved for one item
///
/// Under [`FileCollisionAction::Rename`] and [`FileCollisionAction::Skip`] the path is
/// reserved by creating an empty placeholder file, so no two claims in the same directory
/// can hold the same name. The placeholder is removed when the claim is dropped without
/// [`keep`](Self::keep) being called. Overwrite claims create nothing and remove nothing.
#[derive(Debug)]
#[must_use]
pub struct OutputClaim {
    path: PathBuf,
    placeholder: bool,
}

impl OutputClaim {
    /// The reserved path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep whatever was written to the path and release the claim
    pub fn keep(mut self) -> PathBuf {
        self.placeholder = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputClaim {
    fn drop(&mut self) {
        if self.placeholder
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove output placeholder"
            );
        }
    }
}

/// Reserve `path` (or a numbered variant of it) according to the collision policy
///
/// - `Overwrite`: `path` as given, replacing any existing file later
/// - `Skip`: `path` if no file exists there, else an [`io::ErrorKind::AlreadyExists`] error
/// - `Rename`: the first of `path`, `name (1).ext`, `name (2).ext`, ... that is free
///
/// Reservation uses exclusive file creation, so concurrent callers racing for the same name
/// each end up with a different one.
///
/// # Examples
///
/// ```
/// use playlist_dl::config::FileCollisionAction;
/// use playlist_dl::utils::claim_output_path;
///
/// let dir = tempfile::tempdir()?;
/// let first = claim_output_path(&dir.path().join("song.mp3"), FileCollisionAction::Rename)?;
/// let second = claim_output_path(&dir.path().join("song.mp3"), FileCollisionAction::Rename)?;
/// assert_eq!(second.path(), dir.path().join("song (1).mp3"));
/// # drop(first);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn claim_output_path(path: &Path, action: FileCollisionAction) -> Result<OutputClaim> {
    match action {
        FileCollisionAction::Overwrite => Ok(OutputClaim {
            path: path.to_path_buf(),
            placeholder: false,
        }),
        FileCollisionAction::Skip => match create_placeholder(path) {
            Ok(claim) => Ok(claim),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists and collision action is skip", path.display()),
            ))),
            Err(e) => Err(e.into()),
        },
        FileCollisionAction::Rename => {
            let candidates = std::iter::once(path.to_path_buf())
                .chain((1..=MAX_RENAME_ATTEMPTS).map(|n| numbered(path, n)));
            for candidate in candidates {
                match create_placeholder(&candidate) {
                    Ok(claim) => return Ok(claim),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "no free name for {} after {} attempts",
                    path.display(),
                    MAX_RENAME_ATTEMPTS
                ),
            )))
        }
    }
}

fn create_placeholder(path: &Path) -> io::Result<OutputClaim> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(OutputClaim {
        path: path.to_path_buf(),
        placeholder: true,
    })
}

/// `dir/stem (n).ext`
fn numbered(path: &Path, n: u32) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!(" ({n})"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
