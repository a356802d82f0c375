use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use propset_registry::{StoreArgs, StoreManifest, StoreRegistry};
use propset_store::{collect_entries, PropertyStore, StoreSnapshot};
use propset_types::{PropertyEntry, Value};
use tracing::{debug, warn};

use crate::cli::*;

/// An opened store plus where its changes go.
pub struct Session {
    store: Arc<dyn PropertyStore>,
    snapshot: Option<PathBuf>,
}

impl Session {
    pub fn open(source: &SourceArgs) -> anyhow::Result<Self> {
        match (&source.file, &source.manifest) {
            (Some(_), Some(_)) => bail!("--file and --manifest cannot be used together"),
            (Some(path), None) => {
                let store = if path.exists() {
                    StoreSnapshot::load(path)
                        .with_context(|| format!("failed to load {}", path.display()))?
                        .restore()?
                } else {
                    debug!(path = %path.display(), "snapshot does not exist yet");
                    propset_store::MemoryPropertyStore::serializable()
                };
                Ok(Self {
                    store: Arc::new(store),
                    snapshot: Some(path.clone()),
                })
            }
            (None, Some(path)) => {
                let manifest = StoreManifest::load(path)
                    .with_context(|| format!("failed to read manifest {}", path.display()))?;
                let graph = manifest.build(&StoreRegistry::with_defaults(), &StoreArgs::new())?;
                let store = match &source.store {
                    Some(name) => graph.require(name)?,
                    None => match graph.last() {
                        Some(store) => store,
                        None => bail!("manifest {} declares no stores", path.display()),
                    },
                };
                Ok(Self {
                    store,
                    snapshot: None,
                })
            }
            (None, None) => bail!("no store given: pass --file <snapshot.json> or --manifest <stores.toml>"),
        }
    }

    /// Save the store back to its snapshot file, if it has one.
    fn persist(&self) -> anyhow::Result<()> {
        match &self.snapshot {
            Some(path) => {
                StoreSnapshot::capture(self.store.as_ref())?
                    .save(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            None => warn!("manifest stores live in memory; change is not persisted"),
        }
        Ok(())
    }
}

/// What a command produced, rendered per [`OutputFormat`].
#[derive(Debug, PartialEq)]
pub enum Output {
    Value { key: String, value: Option<Value> },
    Keys(Vec<String>),
    Entries(Vec<PropertyEntry>),
    Done(String),
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let output = match cli.command {
        Command::Backends => Output::Keys(
            StoreRegistry::with_defaults()
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
        ),
        command => execute(&Session::open(&cli.source)?, command)?,
    };
    render(&output, &cli.format)
}

pub fn execute(session: &Session, command: Command) -> anyhow::Result<Output> {
    match command {
        Command::Get(args) => cmd_get(session, args),
        Command::Set(args) => cmd_set(session, args),
        Command::Keys(args) => cmd_keys(session, args),
        Command::Remove(args) => cmd_remove(session, args),
        Command::Clear => cmd_clear(session),
        Command::Dump => Ok(Output::Entries(collect_entries(session.store.as_ref())?)),
        Command::Backends => bail!("backends does not need a store"),
    }
}

fn cmd_get(session: &Session, args: GetArgs) -> anyhow::Result<Output> {
    let value = match args.kind {
        Some(kind) => session.store.get_typed(kind, &args.key)?,
        None => session.store.get_as_actual_kind(&args.key)?,
    };
    Ok(Output::Value {
        key: args.key,
        value,
    })
}

fn cmd_set(session: &Session, args: SetArgs) -> anyhow::Result<Output> {
    let value = match args.kind {
        Some(kind) => Value::parse_as(kind, &args.value)?,
        None => Value::infer_from_str(&args.value),
    };
    let kind = value.kind();
    session
        .store
        .set_typed(&args.key, value)
        .with_context(|| format!("failed to set {}", args.key))?;
    session.persist()?;
    Ok(Output::Done(format!("Set {} ({kind})", args.key)))
}

fn cmd_keys(session: &Session, args: KeysArgs) -> anyhow::Result<Output> {
    Ok(Output::Keys(
        session.store.keys(args.prefix.as_deref(), args.kind)?,
    ))
}

fn cmd_remove(session: &Session, args: RemoveArgs) -> anyhow::Result<Output> {
    session.store.remove(&args.key)?;
    session.persist()?;
    Ok(Output::Done(format!("Removed {}", args.key)))
}

fn cmd_clear(session: &Session) -> anyhow::Result<Output> {
    let count = session.store.all_keys()?.len();
    session.store.remove_all()?;
    session.persist()?;
    Ok(Output::Done(format!("Removed {count} properties")))
}

fn render(output: &Output, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(output)?)?),
        OutputFormat::Text => print_text(output),
    }
    Ok(())
}

fn to_json(output: &Output) -> anyhow::Result<serde_json::Value> {
    let json = match output {
        Output::Value { key, value: Some(value) } => {
            serde_json::to_value(PropertyEntry::new(key.clone(), value.clone()))?
        }
        Output::Value { key, value: None } => serde_json::json!({ "key": key, "value": null }),
        Output::Keys(keys) => serde_json::to_value(keys)?,
        Output::Entries(entries) => serde_json::to_value(entries)?,
        Output::Done(message) => serde_json::json!({ "status": "ok", "message": message }),
    };
    Ok(json)
}

fn print_text(output: &Output) {
    match output {
        Output::Value { key, value: Some(value) } => {
            println!("{} = {} {}", key.bold(), value, format!("({})", value.kind()).cyan());
        }
        Output::Value { key, value: None } => println!("{} {}", key.bold(), "(not set)".dimmed()),
        Output::Keys(keys) if keys.is_empty() => println!("{}", "No properties.".dimmed()),
        Output::Keys(keys) => {
            for key in keys {
                println!("{key}");
            }
        }
        Output::Entries(entries) if entries.is_empty() => println!("{}", "No properties.".dimmed()),
        Output::Entries(entries) => {
            for entry in entries {
                println!(
                    "{} {} = {}",
                    entry.key.bold(),
                    format!("[{}]", entry.kind()).cyan(),
                    entry.value
                );
            }
        }
        Output::Done(message) => println!("{} {}", "✓".green().bold(), message),
    }
}
