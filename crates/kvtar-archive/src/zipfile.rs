use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveResult;
use crate::sink::{member_name, ArchiveSink};

/// Writes entries as deflated members of a ZIP container.
///
/// The central directory is written on [`ArchiveSink::finish`], which needs a
/// seekable destination; there is no streaming-to-stdout mode.
pub struct ZipSink<W: Write + Seek> {
    writer: ZipWriter<W>,
    label: String,
    written: usize,
}

impl ZipSink<BufWriter<File>> {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> ArchiveResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), path.display().to_string()))
    }
}

impl<W: Write + Seek> ZipSink<W> {
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer: ZipWriter::new(writer),
            label: label.into(),
            written: 0,
        }
    }

    /// Write the central directory and return the underlying writer, flushed.
    pub fn into_inner(self) -> ArchiveResult<W> {
        let mut writer = self.writer.finish()?;
        writer.flush()?;
        Ok(writer)
    }

    fn options(size: usize) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o666)
            .large_file(size as u64 >= u32::MAX as u64)
    }
}

impl<W: Write + Seek> ArchiveSink for ZipSink<W> {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> ArchiveResult<()> {
        let path = member_name(name)?;
        self.writer.start_file(path, Self::options(data.len()))?;
        self.writer.write_all(data)?;
        self.written += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> ArchiveResult<()> {
        let label = self.label.clone();
        (*self).into_inner()?;
        tracing::debug!("finalized zip container {}", label);
        Ok(())
    }

    fn entries_written(&self) -> usize {
        self.written
    }

    fn destination(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn read_members<R: std::io::Read + Seek>(reader: R) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(reader).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn members_in_receipt_order() {
        let mut sink = ZipSink::new(Cursor::new(Vec::new()), "memory");
        sink.write_entry("cfg/b", b"2").unwrap();
        sink.write_entry("cfg/a", b"1").unwrap();
        sink.write_entry("cfg/sub\u{2044}", b"").unwrap();
        assert_eq!(sink.entries_written(), 3);
        let cursor = sink.into_inner().unwrap();

        let members = read_members(Cursor::new(cursor.into_inner()));
        assert_eq!(
            members,
            vec![
                ("cfg/b".to_string(), b"2".to_vec()),
                ("cfg/a".to_string(), b"1".to_vec()),
                ("cfg/sub\u{2044}".to_string(), Vec::new()),
            ]
        );
    }

    #[test]
    fn names_are_written_verbatim() {
        let mut sink = ZipSink::new(Cursor::new(Vec::new()), "memory");
        for name in ["a//b", "a/b", "c/./d", "a/../b"] {
            sink.write_entry(name, name.as_bytes()).unwrap();
        }
        let cursor = sink.into_inner().unwrap();
        let members = read_members(Cursor::new(cursor.into_inner()));
        let names: Vec<_> = members.iter().map(|m| m.0.as_str()).collect();
        assert_eq!(names, vec!["a//b", "a/b", "c/./d", "a/../b"]);
        assert!(members.iter().all(|(name, data)| name.as_bytes() == data.as_slice()));
    }

    #[test]
    fn binary_payload_roundtrip() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let mut sink = ZipSink::new(Cursor::new(Vec::new()), "memory");
        sink.write_entry("bin", &payload).unwrap();
        let cursor = sink.into_inner().unwrap();
        let members = read_members(Cursor::new(cursor.into_inner()));
        assert_eq!(members[0].1, payload);
    }

    #[test]
    fn file_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.zip");
        let mut sink: Box<dyn ArchiveSink> = Box::new(ZipSink::create(&path).unwrap());
        sink.write_entry("/registry/x", b"x").unwrap();
        sink.finish().unwrap();

        let members = read_members(File::open(&path).unwrap());
        assert_eq!(members, vec![("registry/x".to_string(), b"x".to_vec())]);
    }
}
