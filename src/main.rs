use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

use gitdb::{Db, DbConfig};

/// JSON document store backed by a git repository
///
/// Documents live as files in a local checkout of one branch of a remote
/// repository. Typical session:
///
///   gitdb init
///   gitdb update
///   echo '{"v":1}' | gitdb write x.json
///   gitdb add x.json
///   gitdb commit -m "first"
///   gitdb push
///
/// Settings come from gitdb.toml (see --config); --remote and --local
/// override the file.
#[derive(Parser)]
#[command(name = "gitdb")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "gitdb.toml", env = "GITDB_CONFIG")]
    config: PathBuf,

    /// Remote repository URL (overrides the config file)
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Local checkout path (overrides the config file)
    #[arg(long, global = true)]
    local: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone the remote, or bootstrap locally if it is empty
    ///
    /// Safe to run multiple times.
    Init,

    /// Reset the local branch to the remote one, discarding local work
    Update,

    /// Stage files or directories, relative to the local checkout
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Commit staged changes (no-op when nothing is staged)
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Push the local branch to the remote
    Push,

    /// List local commits not yet on the remote, newest first
    Unpushed,

    /// Print a document as JSON
    Read {
        path: PathBuf,
        /// Read an array document
        #[arg(long)]
        collection: bool,
    },

    /// Replace a document with JSON from a file or stdin
    Write {
        path: PathBuf,
        /// Write an array document (input must be a JSON array)
        #[arg(long)]
        collection: bool,
        /// Wrap the output in `<name>(...)`
        #[arg(long)]
        callback: Option<String>,
        /// Input file, `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },

    /// Delete a document
    Delete { path: PathBuf },
}

fn load_db(cli: &Cli) -> Result<Db> {
    let mut config = DbConfig::load(&cli.config)?;
    if let Some(remote) = &cli.remote {
        config.remote.clone_from(remote);
    }
    if let Some(local) = &cli.local {
        config.local.clone_from(local);
    }
    if config.local.as_os_str().is_empty() {
        bail!(
            "no local path configured; set `local` in {} or pass --local",
            cli.config.display()
        );
    }
    Ok(Db::from_config(config)?)
}

fn read_input(input: &Path) -> Result<Value> {
    let text = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn main() -> Result<()> {
    gitdb::telemetry::init();
    let cli = Cli::parse();
    let db = load_db(&cli)?;

    match cli.command {
        Commands::Init => db.init().context("init failed")?,
        Commands::Update => db.force_update().context("update failed")?,
        Commands::Add { paths } => db.add(&paths)?,
        Commands::Commit { message } => match db.commit(message.as_deref())? {
            Some(oid) => println!("{oid}"),
            None => println!("nothing to commit"),
        },
        Commands::Push => db.push().context("push failed")?,
        Commands::Unpushed => {
            for oid in db.unpushed_commits()? {
                println!("{oid}");
            }
        }
        Commands::Read { path, collection } => {
            let value = if collection {
                db.collection(&path)
                    .load::<Value>()?
                    .map(Value::Array)
                    .unwrap_or(Value::Null)
            } else {
                db.object(&path).load::<Value>()?.unwrap_or(Value::Null)
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Write {
            path,
            collection,
            callback,
            input,
        } => {
            let value = read_input(&input)?;
            let callback = callback.unwrap_or_default();
            if collection {
                let Value::Array(items) = value else {
                    bail!("--collection input must be a JSON array");
                };
                db.collection(&path)
                    .with_callback(callback)
                    .write(&items, &[])?;
            } else {
                db.object(&path).with_callback(callback).write(&value)?;
            }
        }
        Commands::Delete { path } => db.object(&path).delete()?,
    }
    Ok(())
}
