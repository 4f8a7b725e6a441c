use clozenote_core::db::open_db_in_memory;
use clozenote_core::{
    today, ClozeSpan, ClozeToggle, Notebook, NotebookError, RevealState, SnapshotStore,
    SqliteSnapshotStore, TreeError, DEFAULT_SLOT,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn open_notebook(conn: &Connection) -> Notebook<SqliteSnapshotStore<'_>> {
    let store = SqliteSnapshotStore::try_new(conn, DEFAULT_SLOT).unwrap();
    Notebook::open(store).unwrap()
}

#[test]
fn nest_then_delete_scenario() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let a = notebook.create_note("A", None).unwrap().id;
    let b = notebook.create_note("B", None).unwrap().id;

    notebook.move_note(b, Some(a), 0).unwrap();
    let children = notebook.get_children(a).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, b);
    assert_eq!(notebook.get_note(b).unwrap().parent_id, Some(a));

    notebook.delete_note(a).unwrap();
    assert!(matches!(
        notebook.get_note(a).unwrap_err(),
        NotebookError::Tree(TreeError::NotFound(_))
    ));
    assert!(matches!(
        notebook.get_note(b).unwrap_err(),
        NotebookError::Tree(TreeError::NotFound(_))
    ));
    assert_eq!(notebook.note_count(), 0);
}

#[test]
fn toggle_cloze_scenario() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let note = notebook.create_note("new note with text", None).unwrap();
    let span = ClozeSpan::new(14, 4);
    let outcome = notebook.toggle_cloze(note.id, span).unwrap();

    let ClozeToggle::Created(card) = outcome else {
        panic!("expected a created card");
    };
    assert_eq!(card.answer, "text");
    assert!(card.clozed_content.contains("[...]"));
    assert!(!card.clozed_content.contains("text"));
    assert_eq!(card.due_date, today());
    assert_eq!(card.reveal_state, RevealState::Hidden);
    assert_eq!(notebook.card_count(), 1);
}

#[test]
fn review_cycle_scenario() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let note = notebook.create_note("new note with text", None).unwrap();
    let outcome = notebook.toggle_cloze(note.id, ClozeSpan::new(14, 4)).unwrap();
    let ClozeToggle::Created(card) = outcome else {
        panic!("expected a created card");
    };

    let shown = notebook.reveal(note.id, card.id).unwrap();
    assert_eq!(shown.reveal_state, RevealState::Shown);

    let remembered = notebook.mark_remembered(note.id, card.id).unwrap();
    assert_eq!(remembered.reveal_state, RevealState::Hidden);
    assert!(remembered.due_date > today());
    assert!(remembered.due_date > card.due_date);
    assert!(notebook.due_today().is_empty());

    let shown_again = notebook.reveal(note.id, card.id).unwrap();
    assert_eq!(shown_again.reveal_state, RevealState::Shown);
    let forgotten = notebook.mark_forgot(note.id, card.id).unwrap();
    assert_eq!(forgotten.due_date, today());
    assert_eq!(forgotten.reveal_state, RevealState::Hidden);
    assert_eq!(notebook.due_today().len(), 1);
}

#[test]
fn due_queue_is_deterministic_preorder() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let first = notebook.create_note("alpha text", None).unwrap().id;
    let child = notebook.create_note("beta text", Some(first)).unwrap().id;
    let second = notebook.create_note("gamma text", None).unwrap().id;

    notebook.toggle_cloze(second, ClozeSpan::new(0, 5)).unwrap();
    notebook.toggle_cloze(child, ClozeSpan::new(0, 4)).unwrap();
    notebook.toggle_cloze(first, ClozeSpan::new(0, 5)).unwrap();

    let due = notebook.due_today();
    let owners: Vec<_> = due.iter().map(|card| card.note_id).collect();
    assert_eq!(owners, vec![first, child, second]);
}

#[test]
fn mutations_are_persisted_for_the_next_open() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let root = notebook.create_note("kept", None).unwrap().id;
    notebook.toggle_cloze(root, ClozeSpan::new(0, 4)).unwrap();

    let reopened = open_notebook(&conn);
    assert_eq!(reopened.note_count(), 1);
    assert_eq!(reopened.card_count(), 1);
    assert_eq!(reopened.get_note(root).unwrap().content, "kept");
}

#[test]
fn failed_mutations_change_nothing_and_write_nothing() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let a = notebook.create_note("A", None).unwrap().id;
    let b = notebook.create_note("B", Some(a)).unwrap().id;

    let err = notebook.move_note(a, Some(b), 0).unwrap_err();
    assert!(matches!(err, NotebookError::Tree(TreeError::InvalidMove { .. })));

    // In-memory state is untouched and the stored snapshot matches it.
    assert_eq!(notebook.get_note(a).unwrap().parent_id, None);
    let store = SqliteSnapshotStore::try_new(&conn, DEFAULT_SLOT).unwrap();
    let persisted = store.load().unwrap();
    assert_eq!(persisted.get_note(a).unwrap().parent_id, None);
    assert_eq!(persisted.get_note(b).unwrap().parent_id, Some(a));
}

#[test]
fn editing_content_leaves_existing_cards_as_snapshots() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let note = notebook.create_note("new note with text", None).unwrap();
    notebook.toggle_cloze(note.id, ClozeSpan::new(14, 4)).unwrap();

    notebook.edit_content(note.id, "rewritten").unwrap();

    let updated = notebook.get_note(note.id).unwrap();
    assert_eq!(updated.content, "rewritten");
    assert_eq!(updated.flashcards.len(), 1);
    assert_eq!(updated.flashcards[0].answer, "text");
    assert_eq!(updated.flashcards[0].clozed_content, "new note with [...]");
}

#[test]
fn overflowing_span_is_rejected_through_the_facade() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let note = notebook.create_note("short", None).unwrap();
    let err = notebook
        .toggle_cloze(note.id, ClozeSpan::new(usize::MAX, 2))
        .unwrap_err();

    assert!(matches!(err, NotebookError::Cloze(_)));
    assert_eq!(notebook.card_count(), 0);
}

#[test]
fn review_of_missing_card_reports_card_not_found() {
    let conn = setup();
    let mut notebook = open_notebook(&conn);

    let note = notebook.create_note("plain", None).unwrap();
    let bogus = uuid::Uuid::new_v4();

    let err = notebook.reveal(note.id, bogus).unwrap_err();
    assert!(matches!(err, NotebookError::CardNotFound { .. }));
}

#[test]
fn corrupt_snapshot_opens_as_an_empty_notebook() {
    let conn = setup();
    conn.execute(
        "INSERT INTO snapshots (slot, payload) VALUES (?1, '[broken');",
        [DEFAULT_SLOT],
    )
    .unwrap();

    let notebook = open_notebook(&conn);
    assert_eq!(notebook.note_count(), 0);
}
