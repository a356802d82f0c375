use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use propset_types::Kind;

#[derive(Parser)]
#[command(
    name = "propset",
    about = "PropSet: inspect and edit typed property stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where the store comes from.
#[derive(Args, Clone, Debug, Default)]
pub struct SourceArgs {
    /// JSON snapshot file; created on first write
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,
    /// TOML manifest declaring a graph of stores
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,
    /// Store of the manifest to open (defaults to the last one declared)
    #[arg(short, long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read one property
    Get(GetArgs),
    /// Write one property
    Set(SetArgs),
    /// List keys
    Keys(KeysArgs),
    /// Remove one property
    Remove(RemoveArgs),
    /// Remove every property
    Clear,
    /// Print every property with its kind
    Dump,
    /// List the store backends known to the registry
    Backends,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Read as this kind instead of the stored one
    #[arg(short, long)]
    pub kind: Option<Kind>,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
    /// Parse the value as this kind instead of inferring it
    #[arg(short, long)]
    pub kind: Option<Kind>,
}

#[derive(Args)]
pub struct KeysArgs {
    #[arg(short, long)]
    pub prefix: Option<String>,
    #[arg(short, long)]
    pub kind: Option<Kind>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_with_kind() {
        let cli = Cli::try_parse_from(["propset", "get", "db.port", "--kind", "INT"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.key, "db.port");
            assert_eq!(args.kind, Some(Kind::Int));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_set_with_file() {
        let cli = Cli::try_parse_from(["propset", "set", "motd", "hello", "-f", "props.json"]).unwrap();
        assert_eq!(cli.source.file, Some(PathBuf::from("props.json")));
        if let Command::Set(args) = cli.command {
            assert_eq!(args.value, "hello");
            assert!(args.kind.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_keys_filters() {
        let cli = Cli::try_parse_from(["propset", "keys", "-p", "db.", "-k", "string"]).unwrap();
        if let Command::Keys(args) = cli.command {
            assert_eq!(args.prefix.as_deref(), Some("db."));
            assert_eq!(args.kind, Some(Kind::String));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_manifest_store() {
        let cli = Cli::try_parse_from(["propset", "--manifest", "stores.toml", "--store", "app", "dump"]).unwrap();
        assert!(matches!(cli.command, Command::Dump));
        assert_eq!(cli.source.store.as_deref(), Some("app"));
    }

    #[test]
    fn reject_unknown_kind() {
        assert!(Cli::try_parse_from(["propset", "get", "k", "--kind", "float"]).is_err());
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["propset", "--format", "json", "backends"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
