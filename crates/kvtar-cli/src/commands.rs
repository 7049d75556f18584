use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use kvtar_archive::{DirectorySource, TarSink, ZipSink};
use kvtar_codec::{KeyPathCodec, PayloadCodec};
use kvtar_engine::{self as engine, Confirm, EngineError, NamespaceReader, NamespaceWriter, RemovalConfirmer};
use kvtar_store::{ClientConfig, GatewayStore, KvStore};

use crate::cli::*;
use crate::prompt::TerminalPrompt;

const LONG_HEADER: &str = " VER  CREATE-REV  MODIF-REV  KEY-NAME...\n-----+----------+----------+-------------";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = client_config(cli.endpoints.as_deref(), cli.timeout, cli.config.as_deref())?;
    let store = GatewayStore::connect(&config).context("setting up store client")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&store, cli.command, &mut out, TerminalPrompt)?;
    out.flush()?;
    Ok(())
}

/// Build the connection settings. Flags (and the endpoint environment
/// variable, which clap folds into the flag) override the config file,
/// which overrides the defaults.
pub fn client_config(endpoints: Option<&str>, timeout: Option<u64>, file: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let mut config = match file {
        Some(path) => ClientConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(list) = endpoints {
        config = config.with_endpoint_list(list);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout_secs(secs);
    }
    Ok(config)
}

/// Process exit status for a failed command: 2 for usage errors, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>() {
        Some(e) if e.is_usage() => 2,
        _ => 1,
    }
}

pub fn execute<C: Confirm>(store: &dyn KvStore, command: Command, out: &mut dyn Write, confirm: C) -> anyhow::Result<()> {
    let keys = KeyPathCodec::default();
    let reader = NamespaceReader::new(store);
    let writer = NamespaceWriter::new(store, keys);
    match command {
        Command::List(args) => cmd_list(&reader, args, out),
        Command::Get(args) => cmd_get(&reader, args, out),
        Command::Put(args) => cmd_put(&writer, args, out),
        Command::Remove(args) => cmd_remove(&reader, &writer, args, confirm, out),
        Command::Dump(args) => cmd_dump(&reader, &keys, args, out),
        Command::Upload(args) => cmd_upload(&writer, args, out),
        Command::Tar(args) => cmd_tar(&reader, &keys, args, out),
        Command::Zip(args) => cmd_zip(&reader, &keys, args, out),
    }
}

fn cmd_list(reader: &NamespaceReader<'_>, args: ListArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let listings = engine::list(reader, &args.keys)?;
    if args.long {
        writeln!(out, "{}", LONG_HEADER.bold())?;
    }
    for entry in listings.iter().flat_map(|l| &l.entries) {
        if args.long {
            write!(out, "{:5} {:10} {:10} ", entry.version, entry.create_revision, entry.mod_revision)?;
        }
        out.write_all(&entry.key)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn cmd_get(reader: &NamespaceReader<'_>, args: GetArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let values = engine::get(reader, &args.keys, args.recursive, PayloadCodec::base64_if(args.d64))?;
    for (i, fetched) in values.iter().enumerate() {
        if i > 0 {
            out.write_all(b"\n")?;
        }
        out.write_all(&fetched.value)?;
    }
    Ok(())
}

fn cmd_put(writer: &NamespaceWriter<'_>, args: PutArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let data = read_input(&args.file)?;
    let stored = engine::put(writer, &args.key, &data, PayloadCodec::base64_if(args.e64))?;
    writeln!(out, "{} Put {} [{} bytes]", "✓".green(), args.key.bold(), stored)?;
    Ok(())
}

fn read_input(file: &str) -> anyhow::Result<Vec<u8>> {
    if file == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data).context("reading stdin")?;
        return Ok(data);
    }
    fs::read(file).with_context(|| format!("reading {file}"))
}

fn cmd_remove<C: Confirm>(
    reader: &NamespaceReader<'_>,
    writer: &NamespaceWriter<'_>,
    args: RemoveArgs,
    confirm: C,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut confirmer = RemovalConfirmer::new(confirm);
    let report = engine::remove(reader, writer, &mut confirmer, &args.keys, args.recursive, args.force)?;
    writeln!(out, "{} Deleted {} keys.", "✓".green(), report.deleted.to_string().bold())?;
    Ok(())
}

fn cmd_dump(reader: &NamespaceReader<'_>, keys: &KeyPathCodec, args: DumpArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let payload = PayloadCodec::base64_if(args.d64);
    let report = engine::dump(reader, keys, &args.keys, &args.directory, args.strip, payload)?;
    writeln!(
        out,
        "{} Dumped {} keys into {}",
        "✓".green(),
        report.entries.to_string().bold(),
        args.directory.display()
    )?;
    Ok(())
}

fn cmd_upload(writer: &NamespaceWriter<'_>, args: UploadArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let source = DirectorySource::new(args.directory);
    let report = engine::upload(&source, writer, &args.paths, &args.prefix, PayloadCodec::base64_if(args.e64))?;
    writeln!(out, "{} Uploaded {} keys", "✓".green(), report.entries.to_string().bold())?;
    Ok(())
}

fn cmd_tar(reader: &NamespaceReader<'_>, keys: &KeyPathCodec, args: TarArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let payload = PayloadCodec::base64_if(args.d64);
    match &args.file {
        Some(path) => {
            let sink = TarSink::create(path, args.gzip).with_context(|| format!("creating {}", path.display()))?;
            let report = engine::archive(reader, Box::new(sink), keys, &args.keys, payload)?;
            writeln!(
                out,
                "{} Wrote {} keys to {}",
                "✓".green(),
                report.entries.to_string().bold(),
                path.display()
            )?;
        }
        None => {
            let sink = TarSink::new(&mut *out, args.gzip, "STDOUT");
            engine::archive(reader, Box::new(sink), keys, &args.keys, payload)?;
        }
    }
    Ok(())
}

fn cmd_zip(reader: &NamespaceReader<'_>, keys: &KeyPathCodec, args: ZipArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let path = args
        .file
        .as_deref()
        .ok_or_else(|| EngineError::InvalidArgument("must specify output file (-f file)".into()))?;
    let sink = ZipSink::create(path).with_context(|| format!("creating {}", path.display()))?;
    let report = engine::archive(reader, Box::new(sink), keys, &args.keys, PayloadCodec::base64_if(args.d64))?;
    writeln!(
        out,
        "{} Wrote {} keys to {}",
        "✓".green(),
        report.entries.to_string().bold(),
        path.display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kvtar_engine::{AlwaysNo, AlwaysYes};
    use kvtar_store::InMemoryKvStore;

    fn scenario() -> InMemoryKvStore {
        InMemoryKvStore::with_entries([("cfg/a", "1"), ("cfg/b", "2"), ("cfg/sub/", "")])
    }

    fn run<C: Confirm>(store: &InMemoryKvStore, argv: &[&str], confirm: C) -> anyhow::Result<Vec<u8>> {
        colored::control::set_override(false);
        let mut args = vec!["kvtar"];
        args.extend_from_slice(argv);
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        execute(store, cli.command, &mut out, confirm)?;
        Ok(out)
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn list_prints_one_key_per_line() {
        let store = scenario();
        let out = text(run(&store, &["ls"], AlwaysNo).unwrap());
        assert_eq!(out, "cfg/a\ncfg/b\ncfg/sub/\n");
    }

    #[test]
    fn long_list_has_header_and_revisions() {
        let store = scenario();
        let out = text(run(&store, &["list", "-l", "cfg/a"], AlwaysNo).unwrap());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], " VER  CREATE-REV  MODIF-REV  KEY-NAME...");
        assert_eq!(lines[1], "-----+----------+----------+-------------");
        assert_eq!(lines[2], "    1          1          1 cfg/a");
    }

    #[test]
    fn get_separates_values_with_newlines() {
        let store = scenario();
        let out = text(run(&store, &["get", "cfg/a", "cfg/b"], AlwaysNo).unwrap());
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn get_without_keys_is_a_usage_error() {
        let store = scenario();
        let err = run(&store, &["get"], AlwaysNo).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn put_from_file_decodes_placeholder() {
        let store = InMemoryKvStore::new();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload");
        fs::write(&file, b"hello").unwrap();
        run(&store, &["put", file.to_str().unwrap(), "a/b\u{2044}"], AlwaysNo).unwrap();
        assert_eq!(store.value(b"a/b/").unwrap(), b"hello");
    }

    #[test]
    fn declined_remove_exits_non_zero_and_keeps_keys() {
        let store = scenario();
        let err = run(&store, &["rm", "-r", "cfg"], AlwaysNo).unwrap_err();
        assert_eq!(exit_code(&err), 1);
        assert!(err.downcast_ref::<EngineError>().unwrap().is_aborted());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn confirmed_remove_reports_count() {
        let store = scenario();
        let out = text(run(&store, &["remove", "-r", "cfg"], AlwaysYes).unwrap());
        assert!(out.contains("Deleted 3 keys."));
        assert!(store.is_empty());
    }

    #[test]
    fn dump_and_upload_through_the_command_surface() {
        let store = scenario();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        run(&store, &["dump", "-C", root, "cfg"], AlwaysNo).unwrap();
        assert_eq!(fs::read(dir.path().join("cfg/a")).unwrap(), b"1");

        let restored = InMemoryKvStore::new();
        let out = text(run(&restored, &["upload", "-C", root, "cfg"], AlwaysNo).unwrap());
        assert!(out.contains("Uploaded 3 keys"));
        assert_eq!(restored.keys(), store.keys());
    }

    #[test]
    fn tar_streams_to_output() {
        let store = scenario();
        let out = run(&store, &["tar", "cfg/a"], AlwaysNo).unwrap();
        let mut archive = tar::Archive::new(out.as_slice());
        let names: Vec<_> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cfg/a"]);
    }

    #[test]
    fn zip_needs_a_file() {
        let store = scenario();
        let err = run(&store, &["zip", "cfg"], AlwaysNo).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn zip_to_file() {
        let store = scenario();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.zip");
        let out = text(run(&store, &["zip", "-f", path.to_str().unwrap()], AlwaysNo).unwrap());
        assert!(out.contains("Wrote 3 keys"));
        assert!(path.exists());
    }

    #[test]
    fn config_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kvtar.toml");
        fs::write(&path, "endpoints = [\"file:1\"]\ntimeout_secs = 7\n").unwrap();

        let config = client_config(None, None, None).unwrap();
        assert_eq!(config, ClientConfig::default());

        let config = client_config(None, None, Some(&path)).unwrap();
        assert_eq!(config.endpoints, vec!["file:1"]);
        assert_eq!(config.timeout_secs, 7);

        let config = client_config(Some("flag:1,flag:2"), Some(3), Some(&path)).unwrap();
        assert_eq!(config.endpoints, vec!["flag:1", "flag:2"]);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(client_config(None, None, Some(&dir.path().join("nope.toml"))).is_err());
    }
}
