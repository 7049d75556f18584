//! Bulk operations composed from the reader, writer, codecs and sinks.
//!
//! Every positional argument is processed to completion before the next one
//! starts. The first error ends the whole operation.

use std::path::{Path, PathBuf};

use kvtar_archive::{write_all_then_finish, ArchiveSink, DirectorySink, DirectorySource};
use kvtar_codec::{KeyPathCodec, PayloadCodec};
use kvtar_store::Entry;

use crate::confirm::{Confirm, ConfirmState, RemovalConfirmer};
use crate::error::{EngineError, EngineResult};
use crate::reader::NamespaceReader;
use crate::writer::NamespaceWriter;

/// Keys found under one selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub selector: String,
    pub entries: Vec<Entry>,
}

/// A value read back from the store, already passed through the payload codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Totals for a dump, archive or upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub entries: usize,
    pub bytes: u64,
}

impl TransferReport {
    fn record(&mut self, len: usize) {
        self.entries += 1;
        self.bytes += len as u64;
    }
}

/// Totals for a removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Arguments that made it through the gate.
    pub arguments: usize,
    /// Keys actually deleted.
    pub deleted: u64,
}

/// No selectors means the whole namespace.
pub fn default_selectors(selectors: &[String]) -> Vec<String> {
    if selectors.is_empty() {
        vec![String::new()]
    } else {
        selectors.to_vec()
    }
}

fn require<T>(args: &[T], what: &str) -> EngineResult<()> {
    if args.is_empty() {
        return Err(EngineError::InvalidArgument(format!("must specify {what}")));
    }
    Ok(())
}

/// Keys (and revision metadata) under each selector, in ascending order.
pub fn list(reader: &NamespaceReader<'_>, selectors: &[String]) -> EngineResult<Vec<Listing>> {
    let selectors = default_selectors(selectors);
    let many = selectors.len() > 1;
    let mut out = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let entries = reader.listing(selector.as_bytes())?;
        if many || entries.len() > 1 {
            if selector.is_empty() {
                tracing::info!("Found {} keys:", entries.len());
            } else {
                tracing::info!("Found {} keys in {}:", entries.len(), selector);
            }
        }
        out.push(Listing { selector, entries });
    }
    Ok(out)
}

/// Values of the named keys, or of every key below them when `recursive`.
pub fn get(
    reader: &NamespaceReader<'_>,
    keys: &[String],
    recursive: bool,
    payload: PayloadCodec,
) -> EngineResult<Vec<FetchedValue>> {
    require(keys, "which keys to get")?;
    let mut out = Vec::new();
    for key in keys {
        let entries = if recursive {
            reader.subtree(key.as_bytes())?
        } else {
            reader.exact(key.as_bytes())?.into_iter().collect()
        };
        for entry in entries {
            let value = payload.from_storage(&entry.value)?;
            tracing::info!("Got {} [{} bytes{}]...", entry.key_lossy(), value.len(), payload.label());
            out.push(FetchedValue {
                key: entry.key,
                value,
            });
        }
    }
    Ok(out)
}

/// Store `data` under the key named by `name`. The name goes through the
/// key codec, so a trailing placeholder stores a trailing-separator key.
/// Returns the stored length.
pub fn put(
    writer: &NamespaceWriter<'_>,
    name: &str,
    data: &[u8],
    payload: PayloadCodec,
) -> EngineResult<usize> {
    let key = writer.keys().decode(name)?;
    let stored = payload.to_storage(data);
    writer.put(key.as_bytes(), &stored)?;
    tracing::info!("Put {} [{}{}]...", key, stored.len(), payload.label());
    Ok(stored.len())
}

/// Delete each key, asking `confirmer` before any recursive deletion.
///
/// A declined confirmation stops the run with [`EngineError::Aborted`];
/// arguments after it are left alone.
pub fn remove<C: Confirm>(
    reader: &NamespaceReader<'_>,
    writer: &NamespaceWriter<'_>,
    confirmer: &mut RemovalConfirmer<C>,
    keys: &[String],
    recursive: bool,
    force: bool,
) -> EngineResult<RemovalReport> {
    require(keys, "which keys to remove")?;
    let mut report = RemovalReport::default();
    for key in keys {
        let effective = writer.is_recursive(key.as_bytes(), recursive);
        if confirmer.gate(reader, key, effective, force)? == ConfirmState::Aborted {
            return Err(EngineError::Aborted { key: key.clone() });
        }
        let deleted = writer.delete(key.as_bytes(), effective)?;
        tracing::info!("Deleted {} keys.", deleted);
        report.arguments += 1;
        report.deleted += deleted;
    }
    Ok(report)
}

/// Stream every entry under each selector into `sink`, in ascending key
/// order per selector and selectors in argument order.
///
/// The sink is not finished here; see [`archive`].
pub fn export(
    reader: &NamespaceReader<'_>,
    sink: &mut dyn ArchiveSink,
    keys: &KeyPathCodec,
    selectors: &[String],
    payload: PayloadCodec,
) -> EngineResult<TransferReport> {
    let mut report = TransferReport::default();
    for selector in selectors {
        tracing::debug!("Doing EXPORT({} -> {})...", selector, sink.destination());
        for entry in reader.subtree(selector.as_bytes())? {
            if keys.contains_placeholder(&entry.key) {
                tracing::warn!(
                    "key {} contains {:?} and will not survive a round trip",
                    entry.key_lossy(),
                    keys.placeholder()
                );
            }
            let name = keys.encode(&entry.key)?;
            let data = payload.from_storage(&entry.value)?;
            sink.write_entry(&name, &data)?;
            tracing::info!("Add {} [{}{}]...", entry.key_lossy(), data.len(), payload.label());
            report.record(data.len());
        }
    }
    Ok(report)
}

/// Export into `sink` and finalize it, also when the export fails.
/// No selectors means the whole namespace.
pub fn archive<'a>(
    reader: &NamespaceReader<'_>,
    sink: Box<dyn ArchiveSink + 'a>,
    keys: &KeyPathCodec,
    selectors: &[String],
    payload: PayloadCodec,
) -> EngineResult<TransferReport> {
    let selectors = default_selectors(selectors);
    let destination = sink.destination();
    let report = write_all_then_finish(sink, |sink| export(reader, sink, keys, &selectors, payload))?;
    tracing::info!("Done writing {} ({} entries)", destination, report.entries);
    Ok(report)
}

/// Write each selected subtree as files below `dir`.
pub fn dump(
    reader: &NamespaceReader<'_>,
    keys: &KeyPathCodec,
    selectors: &[String],
    dir: &Path,
    strip: bool,
    payload: PayloadCodec,
) -> EngineResult<TransferReport> {
    require(selectors, "which keys to dump")?;
    let sink = DirectorySink::create(dir, strip);
    archive(reader, Box::new(sink), keys, selectors, payload)
}

/// Put every regular file under each argument into the store.
///
/// The key is `prefix` followed by the file's name relative to the source
/// base, run through the key codec.
pub fn upload(
    source: &DirectorySource,
    writer: &NamespaceWriter<'_>,
    args: &[PathBuf],
    prefix: &str,
    payload: PayloadCodec,
) -> EngineResult<TransferReport> {
    require(args, "which directory to upload")?;
    let mut report = TransferReport::default();
    for arg in args {
        tracing::debug!("Doing UPLOAD({})...", source.resolve(arg).display());
        for item in source.walk(arg)? {
            let entry = item?;
            let key = writer.keys().decode(&format!("{prefix}{}", entry.name))?;
            let stored = payload.to_storage(&entry.data);
            writer.put(key.as_bytes(), &stored)?;
            tracing::info!("Put {} [{}{}]...", key, stored.len(), payload.label());
            report.record(stored.len());
        }
    }
    Ok(report)
}
