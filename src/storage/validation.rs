//! Path validation
//!
//! Maps client-supplied paths onto the filesystem and keeps every result
//! inside the server root. Client paths are virtual: a leading `/` denotes the
//! server root, never the host root.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::error::PathError;

/// The canonicalized server root and the resolution rules around it.
#[derive(Debug, Clone)]
pub struct Jail {
    root: PathBuf,
}

impl Jail {
    /// Canonicalizes `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "server root is not a directory",
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an existing path (file or directory) inside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, PathError> {
        let candidate = self.root.join(virtual_to_relative(relative));
        let canonical = candidate
            .canonicalize()
            .map_err(|source| PathError::Unresolvable {
                path: relative.to_string(),
                source,
            })?;
        self.ensure_within(canonical)
    }

    /// Resolves an existing regular file inside the root.
    pub fn resolve_file(&self, relative: &str) -> Result<PathBuf, PathError> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(PathError::NotAFile(path));
        }
        Ok(path)
    }

    /// Resolves the destination of an upload. The file itself need not exist.
    ///
    /// Containment is checked on the canonicalized parent directory. When the
    /// destination already exists it must also resolve inside the root and
    /// must not be a directory.
    pub fn resolve_for_write(&self, relative: &str) -> Result<PathBuf, PathError> {
        let relative_path = virtual_to_relative(relative);
        let file_name: OsString = match relative_path.components().next_back() {
            Some(Component::Normal(name)) => name.to_os_string(),
            _ => return Err(PathError::InvalidFileName(relative.to_string())),
        };
        let parent_relative = relative_path.parent().unwrap_or_else(|| Path::new(""));

        let parent = self
            .root
            .join(parent_relative)
            .canonicalize()
            .map_err(|source| PathError::Unresolvable {
                path: relative.to_string(),
                source,
            })?;
        let parent = self.ensure_within(parent)?;
        if !parent.is_dir() {
            return Err(PathError::NotADirectory(parent));
        }

        let target = parent.join(file_name);
        if fs::symlink_metadata(&target).is_ok() {
            let existing = target
                .canonicalize()
                .map_err(|source| PathError::Unresolvable {
                    path: relative.to_string(),
                    source,
                })?;
            let existing = self.ensure_within(existing)?;
            if existing.is_dir() {
                return Err(PathError::IsADirectory(existing));
            }
        }
        Ok(target)
    }

    fn ensure_within(&self, candidate: PathBuf) -> Result<PathBuf, PathError> {
        if is_within(&self.root, &candidate) {
            Ok(candidate)
        } else {
            Err(PathError::OutsideRoot(candidate))
        }
    }
}

/// Containment test on canonical paths.
///
/// `candidate` is inside `root` when it is equal to it, or when it starts with
/// `root` immediately followed by the path separator. A bare prefix match is
/// not enough: `/srv/ftp` does not contain `/srv/ftpx`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    let root = root.as_os_str().as_encoded_bytes();
    let candidate = candidate.as_os_str().as_encoded_bytes();
    if candidate == root {
        return true;
    }
    let Some(rest) = candidate.strip_prefix(root) else {
        return false;
    };
    let separator = MAIN_SEPARATOR_STR.as_bytes();
    root.ends_with(separator) || rest.starts_with(separator)
}

/// Strips leading separators so the client path joins under the root.
fn virtual_to_relative(path: &str) -> &Path {
    Path::new(path.trim_start_matches('/'))
}
