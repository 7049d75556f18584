use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};

use crate::error::ArchiveResult;
use crate::sink::{member_name, ArchiveSink};

/// Permission bits stamped on every member.
const ENTRY_MODE: u32 = 0o666;

/// Width of the name field in a GNU header.
const NAME_FIELD: usize = 100;

/// Member name of the record carrying an overlong path.
const LONG_LINK: &[u8] = b"././@LongLink";

/// Byte stream under the tar framing: raw, or gzip-compressed.
enum Stream<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Stream<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(w) => Ok(w),
            Self::Gzip(gz) => gz.finish(),
        }
    }
}

impl<W: Write> Write for Stream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(gz) => gz.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(gz) => gz.flush(),
        }
    }
}

/// Streams entries into a TAR archive.
///
/// Each entry gets one GNU header (name, size, mode 0666, current time as
/// mtime) followed by its payload. Works on any `Write`, so unseekable
/// destinations such as stdout are fine.
pub struct TarSink<W: Write> {
    builder: Builder<Stream<W>>,
    label: String,
    gzip: bool,
    written: usize,
}

impl TarSink<BufWriter<File>> {
    /// Create (or truncate) `path` and stream the archive into it.
    pub fn create(path: &Path, gzip: bool) -> ArchiveResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), gzip, path.display().to_string()))
    }
}

impl<W: Write> TarSink<W> {
    /// Wrap `writer`. `label` names the destination in log lines.
    pub fn new(writer: W, gzip: bool, label: impl Into<String>) -> Self {
        let stream = if gzip {
            Stream::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            Stream::Plain(writer)
        };
        Self {
            builder: Builder::new(stream),
            label: label.into(),
            gzip,
            written: 0,
        }
    }

    pub fn is_gzip(&self) -> bool {
        self.gzip
    }

    /// Write the end-of-archive blocks and the gzip trailer, then hand back
    /// the underlying writer, flushed.
    pub fn into_inner(self) -> ArchiveResult<W> {
        let stream = self.builder.into_inner()?;
        let mut writer = stream.finish()?;
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write> ArchiveSink for TarSink<W> {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> ArchiveResult<()> {
        let path = member_name(name)?.as_bytes();
        let mtime = unix_now();

        if path.len() > NAME_FIELD {
            let mut record = path.to_vec();
            record.push(0);
            let mut long = Header::new_gnu();
            set_name(&mut long, LONG_LINK);
            long.set_entry_type(EntryType::GNULongName);
            long.set_size(record.len() as u64);
            long.set_mode(ENTRY_MODE);
            long.set_mtime(mtime);
            long.set_cksum();
            self.builder.append(&long, record.as_slice())?;
        }

        let mut header = Header::new_gnu();
        set_name(&mut header, &path[..path.len().min(NAME_FIELD)]);
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(ENTRY_MODE);
        header.set_mtime(mtime);
        header.set_cksum();
        self.builder.append(&header, data)?;
        self.written += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> ArchiveResult<()> {
        let label = self.label.clone();
        (*self).into_inner()?;
        tracing::debug!("finalized tar stream {}", label);
        Ok(())
    }

    fn entries_written(&self) -> usize {
        self.written
    }

    fn destination(&self) -> String {
        self.label.clone()
    }
}

/// Copy `name` into the header verbatim. `Header::set_path` would normalize
/// it through `Path::components`, folding `a//b` into `a/b`.
fn set_name(header: &mut Header, name: &[u8]) {
    if let Some(gnu) = header.as_gnu_mut() {
        gnu.name = [0; NAME_FIELD];
        gnu.name[..name.len()].copy_from_slice(name);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
