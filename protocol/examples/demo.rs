//! Walkthrough of two replicas of one workspace drifting apart and coming
//! back together.
//!
//! Suzy and Fred each keep their own copy of a garden club workspace. They
//! write while offline, collide on one path, try a few things they aren't
//! allowed to, and then sync. The output uses ANSI escape codes.
//!
//! Run with:
//!   cargo run --example demo --release

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tessera_protocol::crypto::keys::AuthorKeypair;
use tessera_protocol::document::{DocToSet, Document};
use tessera_protocol::storage::{MemoryStorage, Query, SledStorage, Storage};
use tessera_protocol::sync::{sync, SyncOpts};
use tessera_protocol::validator::{Validator, ValidatorRegistry, ValidatorV1};

const WORKSPACE: &str = "+gardenclub.ptg5sb4tj2hzh5ns";
const FORMAT: &str = "tessera.1";

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";
const RED: &str = "\x1b[31m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!("{BG_BLUE}{BOLD}{WHITE}                                                              {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    TESSERA  --  Two Replicas, One Workspace                  {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    Ed25519 signatures  |  SHA-256 hashes  |  sled storage    {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}                                                              {RESET}");
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]================================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!("{CYAN}--------------------------------------------------------------{RESET}");
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn refused(text: &str) {
    println!("{RED}  [REFUSED] {text}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn author_display(name: &str, address: &str, color: &str) {
    let head = &address[..6];
    let tail = &address[address.len().saturating_sub(6)..];
    println!("  {color}{BOLD}{name:<6}{RESET}  {DIM}{head}...{tail}{RESET}  {DIM}({} chars){RESET}", address.len());
}

fn show_store(label: &str, store: &dyn Storage, color: &str) {
    println!("  {color}{BOLD}{label}{RESET}");
    for doc in store.documents(&Query::default()).expect("query") {
        println!(
            "    {WHITE}{:<28}{RESET} {YELLOW}{:<18}{RESET} {DIM}{}{RESET}",
            doc.path,
            doc.value,
            &doc.author[..5]
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let demo_start = Instant::now();
    banner();

    // -----------------------------------------------------------------------
    // Step 1: Authors
    // -----------------------------------------------------------------------

    section(1, "Author Identities");
    subsection("Generating Ed25519 keypairs and encoding author addresses...");

    let t = Instant::now();
    let suzy = AuthorKeypair::generate("suzy").expect("keypair");
    let fred = AuthorKeypair::generate("fred").expect("keypair");
    timing("keygen x2", t.elapsed());

    println!();
    author_display("suzy", suzy.address(), BLUE);
    author_display("fred", fred.address(), GREEN);
    success("Addresses carry the public key; no registry needed");

    // -----------------------------------------------------------------------
    // Step 2: Replicas
    // -----------------------------------------------------------------------

    section(2, "Two Replicas");
    subsection("Suzy keeps hers in memory, Fred keeps his in sled...");

    let suzy_store =
        MemoryStorage::new(ValidatorRegistry::with_defaults(), WORKSPACE).expect("memory store");
    let fred_store = SledStorage::open_temporary(WORKSPACE).expect("sled store");

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    let _watch = fred_store.subscribe(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    success(&format!("Both replicas hold {WORKSPACE}"));

    // -----------------------------------------------------------------------
    // Step 3: Offline writes
    // -----------------------------------------------------------------------

    section(3, "Writing While Apart");

    let t = Instant::now();
    let about_suzy = format!("/about/~{}/name", suzy.address());
    suzy_store.set(&suzy, DocToSet::new(FORMAT, about_suzy.as_str(), "Suzy Q")).expect("set");
    suzy_store.set(&suzy, DocToSet::new(FORMAT, "/wiki/gnome", "by the pond")).expect("set");
    suzy_store.set(&suzy, DocToSet::new(FORMAT, "/plants/tomato", "planted")).expect("set");

    fred_store.set(&fred, DocToSet::new(FORMAT, "/wiki/gnome", "by the shed")).expect("set");
    fred_store.set(&fred, DocToSet::new(FORMAT, "/plants/basil", "sprouting")).expect("set");
    timing("5 signed writes", t.elapsed());

    println!();
    show_store("suzy's replica", &suzy_store, BLUE);
    show_store("fred's replica", &fred_store, GREEN);

    // -----------------------------------------------------------------------
    // Step 4: Things that don't get in
    // -----------------------------------------------------------------------

    section(4, "The Gate");

    let written = fred_store
        .set(&fred, DocToSet::new(FORMAT, about_suzy.as_str(), "Fred was here"))
        .expect("set");
    if !written {
        refused("fred writing to suzy's ~ path");
    }

    let mut forged = fred_store
        .get_document("/plants/basil")
        .expect("get")
        .expect("basil");
    forged.value = "dead".into();
    if !fred_store.ingest_document(forged, None).expect("ingest") {
        refused("a value edited after signing");
    }

    let future = ValidatorV1.sign_document(
        &fred,
        Document {
            format: FORMAT.into(),
            workspace: WORKSPACE.into(),
            path: "/plants/basil".into(),
            value: "harvested".into(),
            author: fred.address().into(),
            timestamp: tessera_protocol::document::now_micros() + 3_600_000_000,
            signature: String::new(),
        },
    );
    if !fred_store.ingest_document(future, None).expect("ingest") {
        refused("a timestamp an hour in the future");
    }

    // -----------------------------------------------------------------------
    // Step 5: Sync
    // -----------------------------------------------------------------------

    section(5, "Sync");
    subsection("Pull everything Fred has, then push everything Suzy has...");

    let t = Instant::now();
    let results = sync(&suzy_store, &fred_store, &SyncOpts::default()).expect("sync");
    timing("sync", t.elapsed());
    success(&format!(
        "pushed {} / pulled {}",
        results.num_pushed, results.num_pulled
    ));

    let again = sync(&suzy_store, &fred_store, &SyncOpts::default()).expect("sync");
    success(&format!(
        "second sync: pushed {} / pulled {}",
        again.num_pushed, again.num_pulled
    ));

    println!();
    show_store("suzy's replica", &suzy_store, BLUE);
    show_store("fred's replica", &fred_store, GREEN);

    let same = suzy_store.documents(&Query::history()).expect("query")
        == fred_store.documents(&Query::history()).expect("query");
    if same {
        success("Replicas converged, history included");
    }

    let gnome = suzy_store.documents(&Query::at_path("/wiki/gnome").with_history(true)).expect("query");
    println!();
    subsection("History of /wiki/gnome, newest first:");
    for doc in &gnome {
        println!("    {YELLOW}{:<14}{RESET} {DIM}{} @ {}{RESET}", doc.value, &doc.author[..5], doc.timestamp);
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    section(6, "Summary");
    println!(
        "  {WHITE}fred's replica saw {BOLD}{}{RESET}{WHITE} accepted documents{RESET}",
        changes.load(Ordering::Relaxed)
    );
    timing("total", demo_start.elapsed());
    println!();
}
