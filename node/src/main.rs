// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # tessera Node
//!
//! Entry point for the `tessera-node` binary: a command-line front end over
//! one sled-backed replica. No network; `sync` talks to another replica
//! directory on the same machine.
//!
//! - `keygen`  generate an author keypair
//! - `init`    create a replica for a workspace
//! - `set`     sign and write a document
//! - `get`     print the winning value at a path
//! - `ls`      list documents
//! - `authors` list authors
//! - `sync`    one-shot sync with another replica
//! - `version` print build version information

mod cli;
mod keyfile;
mod logging;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use std::path::Path;

use tessera_protocol::config::FORMAT_V1;
use tessera_protocol::crypto::keys::AuthorKeypair;
use tessera_protocol::document::{DocToSet, Document};
use tessera_protocol::storage::{Query, SledStorage, Storage, StorageOpts, StorageTarget};
use tessera_protocol::sync::{sync, SyncOpts};

use cli::{Commands, TesseraCli};
use keyfile::KeyFile;

fn main() -> Result<()> {
    let cli = TesseraCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Init(args) => init_replica(args),
        Commands::Set(args) => set_document(args),
        Commands::Get(args) => get_document(args),
        Commands::Ls(args) => list_documents(args),
        Commands::Authors(args) => list_authors(args),
        Commands::Sync(args) => sync_replicas(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Open an existing replica; its workspace comes from the replica itself.
fn open_replica(db: &Path) -> Result<SledStorage> {
    SledStorage::new(StorageOpts::open(db))
        .with_context(|| format!("failed to open replica at {}", db.display()))
}

fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = AuthorKeypair::generate(&args.name)
        .with_context(|| format!("cannot generate a keypair named {:?}", args.name))?;
    let keyfile = KeyFile::from_keypair(&keypair);

    match &args.out {
        Some(path) => {
            keyfile::write(path, &keyfile)?;
            tracing::info!(address = %keypair.address(), path = %path.display(), "keypair written");
            println!("{}", keypair.address());
        }
        None => println!("{}", keyfile.to_json()?),
    }
    Ok(())
}

fn init_replica(args: cli::InitArgs) -> Result<()> {
    let db = &args.db.db;
    let store = SledStorage::new(StorageOpts::create_or_open(
        args.workspace.as_str(),
        StorageTarget::Path(db.clone()),
    ))
    .with_context(|| format!("failed to initialize replica at {}", db.display()))?;
    store.flush()?;

    println!("Replica ready.");
    println!("  Directory : {}", db.display());
    println!("  Workspace : {}", store.workspace());
    println!("  Documents : {}", store.len());
    Ok(())
}

fn set_document(args: cli::SetArgs) -> Result<()> {
    let keypair = keyfile::load(&args.keyfile)?;
    let store = open_replica(&args.db.db)?;

    let mut to_set = DocToSet::new(FORMAT_V1, args.path.as_str(), args.value);
    if let Some(timestamp) = args.timestamp {
        to_set = to_set.at(timestamp);
    }

    let accepted = store.set(&keypair, to_set)?;
    store.flush()?;
    if !accepted {
        bail!(
            "document at {} was rejected (see the warning above; if there is none, this author already has a newer version there)",
            args.path
        );
    }

    let written = store
        .get_document(&args.path)?
        .context("accepted document is missing")?;
    println!("{} @ {}", written.path, written.timestamp);
    Ok(())
}

fn get_document(args: cli::GetArgs) -> Result<()> {
    let store = open_replica(&args.db.db)?;
    let Some(doc) = store.get_document(&args.path)? else {
        bail!("no document at {}", args.path);
    };

    if args.json {
        println!("{}", doc.to_json()?);
    } else {
        println!("{}", doc.value);
    }
    Ok(())
}

fn list_documents(args: cli::LsArgs) -> Result<()> {
    let store = open_replica(&args.db.db)?;
    let query = Query {
        path_prefix: args.prefix,
        versions_by_author: args.author,
        include_history: args.history,
        limit: args.limit,
        ..Query::default()
    };

    let docs = store.documents(&query)?;
    tracing::debug!(count = docs.len(), "listed documents");
    for doc in &docs {
        if args.json {
            println!("{}", doc.to_json()?);
        } else {
            println!("{}", format_row(doc));
        }
    }
    Ok(())
}

/// `path  author  time  value`, tab separated.
fn format_row(doc: &Document) -> String {
    let when = DateTime::<Utc>::from_timestamp_micros(doc.timestamp)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
        .unwrap_or_else(|| doc.timestamp.to_string());
    format!("{}\t{}\t{}\t{}", doc.path, doc.author, when, doc.value)
}

fn list_authors(args: cli::DbArgs) -> Result<()> {
    let store = open_replica(&args.db)?;
    for author in store.authors()? {
        println!("{author}");
    }
    Ok(())
}

fn sync_replicas(args: cli::SyncArgs) -> Result<()> {
    let local = open_replica(&args.db.db)?;
    let other = open_replica(&args.other)?;
    if local.workspace() != other.workspace() {
        tracing::warn!(
            local = %local.workspace(),
            other = %other.workspace(),
            "replicas hold different workspaces; nothing will be exchanged"
        );
    }

    let results = sync(&local, &other, &SyncOpts::direction(args.direction.into()))?;
    local.flush()?;
    other.flush()?;

    println!(
        "pushed {} / pulled {}",
        results.num_pushed, results.num_pulled
    );
    Ok(())
}

fn print_version() {
    println!("tessera-node {}", env!("CARGO_PKG_VERSION"));
    println!("format       {}", FORMAT_V1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_show_time_in_utc() {
        let doc = Document {
            format: FORMAT_V1.into(),
            workspace: "+gardenclub.xxxx".into(),
            path: "/wiki/gnome".into(),
            value: "by the pond".into(),
            author: "@suzy.abc".into(),
            timestamp: 1_500_000_000_000_000,
            signature: String::new(),
        };
        assert_eq!(
            format_row(&doc),
            "/wiki/gnome\t@suzy.abc\t2017-07-14T02:40:00.000000Z\tby the pond"
        );
    }

    #[test]
    fn init_set_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("replica");
        let key_path = dir.path().join("suzy.json");
        let keypair = AuthorKeypair::generate("suzy").unwrap();
        keyfile::write(&key_path, &KeyFile::from_keypair(&keypair)).unwrap();

        init_replica(cli::InitArgs {
            db: cli::DbArgs { db: db.clone() },
            workspace: "+gardenclub.xxxxxxxxxxxxxxxxxxxx".into(),
        })
        .unwrap();

        set_document(cli::SetArgs {
            db: cli::DbArgs { db: db.clone() },
            keyfile: key_path.clone(),
            path: "/wiki/gnome".into(),
            value: "by the pond".into(),
            timestamp: None,
        })
        .unwrap();

        // Somebody else's ~ path: rejected, non-zero exit.
        let rejected = set_document(cli::SetArgs {
            db: cli::DbArgs { db: db.clone() },
            keyfile: key_path,
            path: "/about/~@fred.xyz/name".into(),
            value: "nope".into(),
            timestamp: None,
        });
        let message = rejected.unwrap_err().to_string();
        assert!(message.contains("/about/~@fred.xyz/name"));
        assert!(message.contains("see the warning above"));

        let store = open_replica(&db).unwrap();
        assert_eq!(
            store.get_value("/wiki/gnome").unwrap().as_deref(),
            Some("by the pond")
        );
        assert_eq!(store.authors().unwrap(), vec![keypair.address().to_string()]);
    }

    #[test]
    fn opening_a_missing_replica_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_replica(&dir.path().join("nothing-here")).is_err());
    }
}
