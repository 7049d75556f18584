//! Local directory walking for uploads.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ArchiveError, ArchiveResult};

/// One regular file picked up by a walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    /// Name relative to the source base, `/`-separated.
    pub name: String,
    /// Where the file was read from.
    pub path: PathBuf,
    /// File contents.
    pub data: Vec<u8>,
}

/// Yields `(name, bytes)` entries from local files.
///
/// Arguments are resolved against an optional base directory. Names are the
/// path of each file relative to that base, or the argument path as given
/// when there is no base. Directories are walked in file-name order without
/// following symlinks; only regular files are emitted, anything else is
/// skipped with a warning.
#[derive(Clone, Debug, Default)]
pub struct DirectorySource {
    base: Option<PathBuf>,
}

impl DirectorySource {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Resolve an argument to the path that will be walked.
    pub fn resolve(&self, arg: &Path) -> PathBuf {
        match &self.base {
            Some(base) => base.join(arg),
            None => arg.to_path_buf(),
        }
    }

    /// Lazily walk `arg`. Files are read one at a time as the iterator
    /// advances; the first error ends the useful part of the sequence.
    pub fn walk(&self, arg: &Path) -> ArchiveResult<impl Iterator<Item = ArchiveResult<SourceEntry>> + '_> {
        let root = self.resolve(arg);
        fs::symlink_metadata(&root).map_err(|source| ArchiveError::Read {
            path: root.clone(),
            source,
        })?;

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(walker.filter_map(move |item| {
            let dent = match item {
                Ok(d) => d,
                Err(e) => return Some(Err(ArchiveError::Walk(e))),
            };
            let ft = dent.file_type();
            if ft.is_dir() {
                return None;
            }
            if !ft.is_file() {
                tracing::warn!("skipping {:?} (not a file or a directory)", dent.path());
                return None;
            }
            Some(self.read_entry(dent.path()))
        }))
    }

    fn read_entry(&self, path: &Path) -> ArchiveResult<SourceEntry> {
        let name = self.entry_name(path)?;
        let data = fs::read(path).map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("read {:?} [{}]", path, data.len());
        Ok(SourceEntry {
            name,
            path: path.to_path_buf(),
            data,
        })
    }

    /// Name of `path` as it should appear before prefixing and key decoding.
    pub fn entry_name(&self, path: &Path) -> ArchiveResult<String> {
        let rel = match &self.base {
            Some(base) => path.strip_prefix(base).unwrap_or(path),
            None => path,
        };
        join_components(rel)
    }
}

fn join_components(path: &Path) -> ArchiveResult<String> {
    let mut out = String::new();
    let mut first = true;
    for comp in path.components() {
        let seg = match comp {
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::CurDir => continue,
            Component::ParentDir => "..",
            Component::Normal(s) => s
                .to_str()
                .ok_or_else(|| ArchiveError::NonUtf8Path(path.to_path_buf()))?,
            Component::Prefix(p) => p
                .as_os_str()
                .to_str()
                .ok_or_else(|| ArchiveError::NonUtf8Path(path.to_path_buf()))?,
        };
        if !first {
            out.push('/');
        }
        out.push_str(seg);
        first = false;
    }
    Ok(out)
}
