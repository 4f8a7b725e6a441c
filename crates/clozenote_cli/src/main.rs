//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `clozenote_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use clozenote_core::db::open_db_in_memory;
use clozenote_core::logging::{default_log_level, init_logging};
use clozenote_core::{Notebook, SqliteSnapshotStore, DEFAULT_SLOT};

fn main() {
    // Activate file logging before any core call so save-failure events
    // land somewhere instead of the no-op logger.
    if let Err(err) = bootstrap_logging() {
        eprintln!("logging bootstrap failed: {err}");
    }

    println!("clozenote_core version={}", clozenote_core::core_version());

    // Exercise the full open/mutate/reload path against a throwaway
    // in-memory database.
    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("db bootstrap failed: {err}");
            std::process::exit(1);
        }
    };

    let outcome = smoke(&conn);
    match outcome {
        Ok((notes, due)) => {
            println!("smoke notes={notes} due_cards={due}");
        }
        Err(err) => {
            eprintln!("smoke failed: {err}");
            std::process::exit(1);
        }
    }
}

fn bootstrap_logging() -> Result<(), String> {
    let log_dir = std::env::temp_dir().join("clozenote-logs");
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| format!("log directory is not valid UTF-8: {}", log_dir.display()))?;
    init_logging(default_log_level(), log_dir)
}

fn smoke(conn: &rusqlite::Connection) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let store = SqliteSnapshotStore::try_new(conn, DEFAULT_SLOT)?;
    let mut notebook = Notebook::open(store)?;

    let note = notebook.create_note("new note with text", None)?;
    let span = clozenote_core::ClozeSpan::new(14, 4);
    notebook.toggle_cloze(note.id, span)?;

    let store = SqliteSnapshotStore::try_new(conn, DEFAULT_SLOT)?;
    let reloaded = Notebook::open(store)?;
    Ok((reloaded.note_count(), reloaded.due_today().len()))
}
