use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "kvtar",
    about = "A dump/restore tool for etcd3",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Comma-separated list of store endpoints
    #[arg(short, long, global = true, env = "ETCD_LISTEN_CLIENT_URLS", value_name = "URLS")]
    pub endpoints: Option<String>,

    /// Dial and keepalive timeout, in seconds
    #[arg(
        short = 'T',
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// TOML file with `endpoints` and `timeout_secs`
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every store operation
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List keys
    #[command(alias = "ls")]
    List(ListArgs),
    /// Get keys
    Get(GetArgs),
    /// Put one entry from a file or stdin
    Put(PutArgs),
    /// Remove keys (or directories of keys)
    #[command(alias = "rm")]
    Remove(RemoveArgs),
    /// Dump keys into a directory
    Dump(DumpArgs),
    /// Upload files and directories as keys
    #[command(alias = "up")]
    Upload(UploadArgs),
    /// Archive keys as a TAR stream
    Tar(TarArgs),
    /// Archive keys as a ZIP file
    Zip(ZipArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Show version and revisions
    #[arg(short, long)]
    pub long: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Get every key below each argument
    #[arg(short, long)]
    pub recursive: bool,
    /// Base64-decode values
    #[arg(long)]
    pub d64: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PutArgs {
    /// Base64-encode the value
    #[arg(long)]
    pub e64: bool,
    /// Input file, or `-` for stdin
    pub file: String,
    pub key: String,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Delete recursively
    #[arg(short, long)]
    pub recursive: bool,
    /// Remove without prompting
    #[arg(short, long)]
    pub force: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Target directory
    #[arg(short = 'C', long, default_value = ".")]
    pub directory: PathBuf,
    /// Base64-decode values
    #[arg(long)]
    pub d64: bool,
    /// Keep only the last segment of each key
    #[arg(long)]
    pub strip: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Resolve paths against this directory and drop it from key names
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,
    /// Base64-encode values
    #[arg(long)]
    pub e64: bool,
    /// Prepended to every key name
    #[arg(long, default_value = "")]
    pub prefix: String,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TarArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Gzip the stream
    #[arg(short = 'z', long)]
    pub gzip: bool,
    /// Base64-decode values
    #[arg(long)]
    pub d64: bool,
    pub keys: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ZipArgs {
    /// Output file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Base64-decode values
    #[arg(long)]
    pub d64: bool,
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_alias() {
        let cli = Cli::try_parse_from(["kvtar", "ls", "-l", "/registry"]).unwrap();
        if let Command::List(args) = cli.command {
            assert!(args.long);
            assert_eq!(args.keys, vec!["/registry"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_without_keys() {
        let cli = Cli::try_parse_from(["kvtar", "list"]).unwrap();
        if let Command::List(args) = cli.command {
            assert!(args.keys.is_empty());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get() {
        let cli = Cli::try_parse_from(["kvtar", "get", "-r", "--d64", "a", "b"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert!(args.recursive);
            assert!(args.d64);
            assert_eq!(args.keys, vec!["a", "b"]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_put_requires_file_and_key() {
        assert!(Cli::try_parse_from(["kvtar", "put", "-"]).is_err());
        let cli = Cli::try_parse_from(["kvtar", "put", "--e64", "-", "cfg/x"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert!(args.e64);
            assert_eq!(args.file, "-");
            assert_eq!(args.key, "cfg/x");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_remove_alias() {
        let cli = Cli::try_parse_from(["kvtar", "rm", "-rf", "cfg/"]).unwrap();
        if let Command::Remove(args) = cli.command {
            assert!(args.recursive);
            assert!(args.force);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_dump_defaults() {
        let cli = Cli::try_parse_from(["kvtar", "dump", "cfg"]).unwrap();
        if let Command::Dump(args) = cli.command {
            assert_eq!(args.directory, PathBuf::from("."));
            assert!(!args.strip);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_upload_alias() {
        let cli = Cli::try_parse_from(["kvtar", "up", "-C", "out", "--prefix", "cfg/", "."]).unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.directory, Some(PathBuf::from("out")));
            assert_eq!(args.prefix, "cfg/");
            assert_eq!(args.paths, vec![PathBuf::from(".")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_tar_and_zip() {
        let cli = Cli::try_parse_from(["kvtar", "tar", "-z", "-f", "out.tgz"]).unwrap();
        if let Command::Tar(args) = cli.command {
            assert!(args.gzip);
            assert_eq!(args.file, Some(PathBuf::from("out.tgz")));
        } else { panic!("wrong command"); }

        let cli = Cli::try_parse_from(["kvtar", "zip", "cfg"]).unwrap();
        if let Command::Zip(args) = cli.command {
            assert!(args.file.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals_after_subcommand() {
        let cli = Cli::try_parse_from(["kvtar", "ls", "-e", "a:1,b:2", "-T", "9", "--debug"]).unwrap();
        assert_eq!(cli.endpoints.as_deref(), Some("a:1,b:2"));
        assert_eq!(cli.timeout, Some(9));
        assert!(cli.debug);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Cli::try_parse_from(["kvtar", "-T", "0", "ls"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let cli = Cli::try_parse_from(["kvtar", "-T", "1", "ls"]).unwrap();
        assert_eq!(cli.timeout, Some(1));
    }

    #[test]
    fn debug_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["kvtar", "--debug", "--quiet", "ls"]).is_err());
    }
}
