//! Staged multi-file commit
//!
//! Every file is first written to a temporary file in its target directory.
//! Targets are only replaced once all temporaries exist, so a failure while
//! staging leaves every target untouched.

use itemdex_core::FileError;
use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One whole-file replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWrite {
    pub target: PathBuf,
    pub contents: Vec<u8>,
}

/// A set of whole-file replacements applied together.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    writes: Vec<StagedWrite>,
}

impl Commit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, target: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> &mut Self {
        self.writes.push(StagedWrite {
            target: target.into(),
            contents: contents.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Stage every write, then move each temporary over its target.
    ///
    /// Returns the number of files written.
    pub fn apply(self) -> Result<usize, FileError> {
        let mut staged: Vec<(NamedTempFile, PathBuf)> = Vec::with_capacity(self.writes.len());
        for write in self.writes {
            let temp = stage(&write)?;
            staged.push((temp, write.target));
        }

        let count = staged.len();
        for (temp, target) in staged {
            temp.persist(&target).map_err(|e| {
                tracing::error!(path = %target.display(), error = %e.error, "failed to replace staged file");
                FileError::io(&target, &e.error)
            })?;
            tracing::debug!(path = %target.display(), "file written");
        }
        Ok(count)
    }
}

fn stage(write: &StagedWrite) -> Result<NamedTempFile, FileError> {
    let dir = match write.target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| FileError::io(&dir, &e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| FileError::io(&write.target, &e))?;
    if let Some(permissions) = target_permissions(&write.target) {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| FileError::io(&write.target, &e))?;
    }
    temp.write_all(&write.contents)
        .and_then(|_| temp.flush())
        .map_err(|e| FileError::io(&write.target, &e))?;
    Ok(temp)
}

/// Mode the replacement should carry: the existing target's, or the usual
/// mode for a new source file. Temporaries are created owner-only.
fn target_permissions(target: &Path) -> Option<Permissions> {
    match std::fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

// ============================================================================
// TESTS
// ============================================================================
