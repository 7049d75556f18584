use crate::error::{ArchiveError, ArchiveResult};

/// A destination for an ordered stream of named byte payloads.
///
/// Implementations must satisfy these invariants:
/// - Entries land in the destination in the order `write_entry` is called.
/// - `finish` flushes and writes trailers (tar end blocks, gzip footer, zip
///   central directory). A sink that is dropped without `finish` may leave
///   an invalid archive behind.
/// - Any error is final: callers stop writing after the first failure.
pub trait ArchiveSink {
    /// Append one entry. `name` is an encoded key (see `kvtar_codec`).
    fn write_entry(&mut self, name: &str, data: &[u8]) -> ArchiveResult<()>;

    /// Flush and finalize the destination.
    fn finish(self: Box<Self>) -> ArchiveResult<()>;

    /// Number of entries written so far.
    fn entries_written(&self) -> usize;

    /// Human-readable destination for log lines.
    fn destination(&self) -> String;
}

/// Run `body` against `sink`, then finalize it on every exit path.
///
/// The sink is finished even when `body` fails, so a broken transfer never
/// hides behind an unflushed writer. The body's error wins over a
/// finalization error.
pub fn write_all_then_finish<'a, T, E, F>(
    mut sink: Box<dyn ArchiveSink + 'a>,
    body: F,
) -> Result<T, E>
where
    F: FnOnce(&mut dyn ArchiveSink) -> Result<T, E>,
    E: From<ArchiveError>,
{
    let outcome = body(sink.as_mut());
    let destination = sink.destination();
    let finished = sink.finish();
    match (outcome, finished) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(fin)) => {
            tracing::warn!("finalizing {} after failure also failed: {}", destination, fin);
            Err(e)
        }
    }
}

/// Turn an encoded name into a relative path safe to create below a target
/// directory.
///
/// Leading separators are dropped (store keys are often absolute, paths under
/// a target directory cannot be). Names that are empty after that, or that
/// contain a `..` segment, are rejected.
pub fn archive_path(name: &str) -> ArchiveResult<&str> {
    let trimmed = strip_root(name)?;
    if trimmed.split('/').any(|seg| seg == "..") {
        return Err(ArchiveError::UnsafePath {
            name: name.to_string(),
            reason: "contains a '..' segment".into(),
        });
    }
    Ok(trimmed)
}

/// Name of the TAR/ZIP member for an encoded name.
///
/// Only leading separators are dropped; empty, `.` and `..` segments are kept
/// byte for byte so that distinct keys stay distinct members. Members with a
/// `..` segment are written with a warning.
pub fn member_name(name: &str) -> ArchiveResult<&str> {
    let trimmed = strip_root(name)?;
    if trimmed.split('/').any(|seg| seg == "..") {
        tracing::warn!("archive member {} contains a '..' segment", trimmed);
    }
    Ok(trimmed)
}

fn strip_root(name: &str) -> ArchiveResult<&str> {
    let trimmed = name.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(ArchiveError::UnsafePath {
            name: name.to_string(),
            reason: "empty after stripping leading separators".into(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        names: Vec<String>,
        fail_finish: bool,
    }

    struct RecorderSink<'a>(&'a mut Recorder);

    impl ArchiveSink for RecorderSink<'_> {
        fn write_entry(&mut self, name: &str, _data: &[u8]) -> ArchiveResult<()> {
            self.0.names.push(name.to_string());
            Ok(())
        }

        fn finish(self: Box<Self>) -> ArchiveResult<()> {
            self.0.names.push("<finished>".into());
            if self.0.fail_finish {
                return Err(std::io::Error::other("disk full").into());
            }
            Ok(())
        }

        fn entries_written(&self) -> usize {
            self.0.names.len()
        }

        fn destination(&self) -> String {
            "recorder".into()
        }
    }

    #[test]
    fn relative_names_pass_through() {
        assert_eq!(archive_path("cfg/a").unwrap(), "cfg/a");
        assert_eq!(archive_path("cfg/sub\u{2044}").unwrap(), "cfg/sub\u{2044}");
    }

    #[test]
    fn leading_separators_are_stripped() {
        assert_eq!(archive_path("/registry/x").unwrap(), "registry/x");
        assert_eq!(archive_path("//x").unwrap(), "x");
    }

    #[test]
    fn parent_segments_are_rejected() {
        assert!(matches!(archive_path("../etc/passwd"), Err(ArchiveError::UnsafePath { .. })));
        assert!(matches!(archive_path("a/../../b"), Err(ArchiveError::UnsafePath { .. })));
        assert!(archive_path("a/..b").is_ok());
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(archive_path("").is_err());
        assert!(archive_path("///").is_err());
    }

    #[test]
    fn member_names_keep_every_segment() {
        assert_eq!(member_name("/registry/x").unwrap(), "registry/x");
        assert_eq!(member_name("a//b").unwrap(), "a//b");
        assert_eq!(member_name("c/./d").unwrap(), "c/./d");
        assert_eq!(member_name("a/../b").unwrap(), "a/../b");
        assert!(member_name("/").is_err());
    }

    #[test]
    fn finish_runs_after_success() {
        let mut rec = Recorder::default();
        let n: ArchiveResult<usize> = write_all_then_finish(Box::new(RecorderSink(&mut rec)), |sink| {
            sink.write_entry("a", b"1")?;
            Ok(sink.entries_written())
        });
        assert_eq!(n.unwrap(), 1);
        assert_eq!(rec.names, vec!["a", "<finished>"]);
    }

    #[test]
    fn finish_runs_after_failure_and_body_error_wins() {
        let mut rec = Recorder {
            fail_finish: true,
            ..Recorder::default()
        };
        let res: ArchiveResult<()> = write_all_then_finish(Box::new(RecorderSink(&mut rec)), |sink| {
            sink.write_entry("a", b"1")?;
            Err(ArchiveError::UnsafePath {
                name: "..".into(),
                reason: "test".into(),
            })
        });
        assert!(matches!(res, Err(ArchiveError::UnsafePath { .. })));
        assert_eq!(rec.names.last().map(String::as_str), Some("<finished>"));
    }

    #[test]
    fn finish_error_surfaces_after_success() {
        let mut rec = Recorder {
            fail_finish: true,
            ..Recorder::default()
        };
        let res: ArchiveResult<()> = write_all_then_finish(Box::new(RecorderSink(&mut rec)), |_| Ok(()));
        assert!(matches!(res, Err(ArchiveError::Io(_))));
    }
}
