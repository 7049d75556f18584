use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ArchiveResult;
use crate::sink::{archive_path, ArchiveSink};

/// Writes each entry as a file below a root directory.
///
/// Parent directories are created on demand (mode 0777 before umask) and
/// files are created or truncated with mode 0666. With `strip` only the last
/// segment of each name is kept, flattening the hierarchy; entries whose
/// last segments collide overwrite each other.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    strip: bool,
    written: usize,
}

impl DirectorySink {
    /// Sink rooted at `root`. The root itself is created lazily.
    pub fn create(root: impl Into<PathBuf>, strip: bool) -> Self {
        Self {
            root: root.into(),
            strip,
            written: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target path for an encoded name.
    pub fn target_path(&self, name: &str) -> ArchiveResult<PathBuf> {
        let rel = archive_path(name)?;
        let rel = if self.strip {
            rel.rsplit('/').next().unwrap_or(rel)
        } else {
            rel
        };
        Ok(self.root.join(rel))
    }
}

impl ArchiveSink for DirectorySink {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> ArchiveResult<()> {
        let path = self.target_path(name)?;
        if let Some(parent) = path.parent() {
            create_dirs(parent)?;
        }
        let mut file = open_file(&path)?;
        file.write_all(data)?;
        self.written += 1;
        tracing::debug!("wrote {:?} [{} bytes]", path, data.len());
        Ok(())
    }

    fn finish(self: Box<Self>) -> ArchiveResult<()> {
        Ok(())
    }

    fn entries_written(&self) -> usize {
        self.written
    }

    fn destination(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(unix)]
fn create_dirs(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o777).create(path)
}

#[cfg(not(unix))]
fn create_dirs(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn open_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o666)
        .open(path)
}

#[cfg(not(unix))]
fn open_file(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
