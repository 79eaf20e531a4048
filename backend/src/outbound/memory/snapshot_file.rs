//! JSON snapshot files accessed through `cap_std`.
//!
//! Used by the in-memory store and by the persisted snapshot archive.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};

/// Location of a JSON recovery snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Snapshot stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file or directory yields `None`.
    pub fn load(&self) -> io::Result<Option<String>> {
        let (parent, file_name) = parent_and_file_name(&self.path)?;
        let directory = match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(directory) => directory,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error),
        };
        match directory.read_to_string(Path::new(&file_name)) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Replace the snapshot, writing a sibling temp file first and renaming
    /// it into place.
    pub fn save(&self, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(&self.path)?;
        Dir::create_ambient_dir_all(parent, ambient_authority())?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        let mut temp_name = file_name.clone();
        temp_name.push(".tmp");
        directory.write(Path::new(&temp_name), contents)?;
        directory.rename(Path::new(&temp_name), &directory, Path::new(&file_name))
    }
}

fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "snapshot path must include a file name",
        )
    })?;
    Ok((parent, file_name.to_os_string()))
}
