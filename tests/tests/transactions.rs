//! Undo tasks, rollback and commit-fenced edit sessions.

use cellar_tests::prelude::*;
use pretty_assertions::assert_eq;

mod commit_fence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blocked_inside_session_then_saved() {
        // GIVEN a session that adds an entry
        let mut lex = Lexicon::new();
        let entry_clid = lex.clid("LexEntry");
        let entries = lex.flid("LexDb", "Entries");
        let lex_db = lex.lex_db;
        let mut session = EditSession::begin(&mut lex.handler, "Undo Add Entry", "Redo Add Entry");
        let entry = session
            .cache_mut()
            .make_new_object(entry_clid, lex_db, entries, InsertPosition::Append)
            .unwrap();

        // WHEN code inside the session tries to commit or close its task
        let commit = session.commit().unwrap_err();
        let end = session.end_undo_task().unwrap_err();

        // THEN both are blocked and nothing is lost
        assert_eq!(commit.kind(), ErrorKind::BlockedOperation);
        assert_eq!(commit.to_string(), "Commit is blocked");
        assert_eq!(end.kind(), ErrorKind::BlockedOperation);
        assert!(session.cache().is_valid_object(entry));

        // WHEN the session saves
        session.save().unwrap();

        // THEN the entry is committed
        assert!(!lex.handler.is_fence_raised());
        assert!(!lex.handler.is_task_open());
        assert_eq!(lex.handler.undo_task_count(), 0);
        StoreAssertion::new()
            .vector(lex_db, entries, &[entry])
            .assert(lex.cache());
    }

    #[test]
    fn test_commit_allowed_without_session() {
        let mut lex = Lexicon::new();
        let number = lex.flid("LexEntry", "HomographNumber");
        let entry = lex.new_entry();

        lex.handler.begin_undo_task("Undo", "Redo");
        lex.cache_mut().set_int(entry, number, 1).unwrap();
        lex.handler.commit().unwrap();

        assert!(!lex.handler.can_undo());
        assert_eq!(lex.cache().get_int(entry, number).unwrap(), 1);
    }
}

mod rollback {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dropped_session_restores_store() {
        // GIVEN a populated lexicon
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let sense = lex.new_sense(entry, InsertPosition::Append);
        let number = lex.flid("LexEntry", "HomographNumber");
        let form = lex.flid("LexEntry", "CitationForm");
        let senses = lex.flid("LexEntry", "Senses");
        lex.cache_mut().set_int(entry, number, 1).unwrap();
        let before = Snapshot::of(lex.cache());
        let count = lex.cache().object_count();

        // WHEN a session edits, creates and deletes, then is dropped
        {
            let mut session = EditSession::begin(&mut lex.handler, "Edit", "Edit");
            let cache = session.cache_mut();
            cache.set_int(entry, number, 2).unwrap();
            cache.set_multi_unicode_alt(entry, form, Ws(1), "kitab").unwrap();
            let sense_clid = cache.get_class_id(sense).unwrap();
            cache
                .make_new_object(sense_clid, entry, senses, InsertPosition::At(0))
                .unwrap();
            cache.delete_object(sense).unwrap();
        }

        // THEN the store is exactly as it was
        assert_eq!(Snapshot::of(lex.cache()), before);
        assert_eq!(lex.cache().object_count(), count);
        assert!(!lex.handler.is_fence_raised());
        StoreAssertion::new()
            .vector(entry, senses, &[sense])
            .dense(entry, senses)
            .assert(lex.cache());
    }

    #[test]
    fn test_rollback_restores_guid_index() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let guid = lex.cache().get_guid(entry, Flid::GUID).unwrap();

        lex.handler.begin_undo_task("Delete", "Delete");
        lex.cache_mut().delete_object(entry).unwrap();
        assert_eq!(lex.cache().get_obj_from_guid(&guid), None);
        lex.handler.rollback().unwrap();

        assert_eq!(lex.cache().get_obj_from_guid(&guid), Some(entry));
        assert!(!lex.handler.is_task_open());
        assert!(!lex.handler.can_undo());
    }

    #[test]
    fn test_rollback_without_task_is_noop() {
        let mut lex = Lexicon::new();
        let before = Snapshot::of(lex.cache());

        lex.handler.rollback().unwrap();

        assert_eq!(Snapshot::of(lex.cache()), before);
    }
}

mod undo_redo {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_undo_and_redo_creation() {
        // GIVEN an entry created in a completed task
        let mut lex = Lexicon::new();
        let entries = lex.flid("LexDb", "Entries");
        let lex_db = lex.lex_db;
        lex.handler.begin_undo_task("Undo Add", "Redo Add");
        let entry = lex.new_entry();
        let guid = lex.cache().get_guid(entry, Flid::GUID).unwrap();
        lex.handler.end_undo_task().unwrap();
        assert_eq!(lex.handler.undo_label(), Some("Undo Add"));

        // WHEN undone
        lex.handler.undo().unwrap();

        // THEN the entry and its guid are gone
        assert!(!lex.cache().is_valid_object(entry));
        assert_eq!(lex.cache().get_obj_from_guid(&guid), None);
        assert_eq!(lex.handler.redo_label(), Some("Redo Add"));
        StoreAssertion::new().vector(lex_db, entries, &[]).assert(lex.cache());

        // WHEN redone
        lex.handler.redo().unwrap();

        // THEN the same entry is back under the same guid
        assert_eq!(lex.cache().get_obj_from_guid(&guid), Some(entry));
        StoreAssertion::new().vector(lex_db, entries, &[entry]).assert(lex.cache());
        assert!(lex.handler.can_undo());
        assert!(!lex.handler.can_redo());
    }

    #[test]
    fn test_undo_cascade_delete() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        lex.new_sense(entry, InsertPosition::Append);
        lex.new_sense(entry, InsertPosition::Append);
        let senses = lex.flid("LexEntry", "Senses");
        let before = Snapshot::of(lex.cache());

        lex.handler.begin_undo_task("Undo Delete", "Redo Delete");
        lex.cache_mut().delete_object(entry).unwrap();
        lex.handler.end_undo_task().unwrap();
        lex.handler.undo().unwrap();

        assert_eq!(Snapshot::of(lex.cache()), before);
        StoreAssertion::new().dense(entry, senses).assert(lex.cache());
    }

    #[test]
    fn test_nested_tasks_fold_into_one() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let number = lex.flid("LexEntry", "HomographNumber");

        lex.handler.begin_undo_task("Outer", "Outer");
        lex.cache_mut().set_int(entry, number, 1).unwrap();
        lex.handler.begin_undo_task("Inner", "Inner");
        lex.cache_mut().set_int(entry, number, 2).unwrap();
        lex.handler.end_undo_task().unwrap();
        lex.handler.end_undo_task().unwrap();

        assert_eq!(lex.handler.undo_depth(), 1);
        assert_eq!(lex.handler.undo_label(), Some("Outer"));
        lex.handler.undo().unwrap();
        assert!(!lex.cache().is_property_set(entry, number, None).unwrap());
    }

    #[test]
    fn test_undo_refused_while_task_open() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let number = lex.flid("LexEntry", "HomographNumber");
        lex.handler.begin_undo_task("First", "First");
        lex.cache_mut().set_int(entry, number, 1).unwrap();
        lex.handler.end_undo_task().unwrap();

        lex.handler.begin_undo_task("Second", "Second");
        let err = lex.handler.undo().unwrap_err();

        assert!(matches!(err, UndoError::TaskOpen));
        assert_eq!(err.kind(), ErrorKind::InvalidUndoState);
    }

    #[test]
    fn test_new_task_clears_redo() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let number = lex.flid("LexEntry", "HomographNumber");
        for value in [1, 2] {
            lex.handler.begin_undo_task("Set", "Set");
            lex.cache_mut().set_int(entry, number, value).unwrap();
            lex.handler.end_undo_task().unwrap();
        }
        lex.handler.undo().unwrap();
        assert!(lex.handler.can_redo());

        lex.handler.begin_undo_task("Set", "Set");
        lex.cache_mut().set_int(entry, number, 3).unwrap();
        lex.handler.end_undo_task().unwrap();

        assert!(!lex.handler.can_redo());
        assert!(matches!(lex.handler.redo(), Err(UndoError::NothingToRedo)));
    }

    #[test]
    fn test_history_depth_limit() {
        let config = ActionHandlerConfig { max_undo_depth: 2 };
        let mut lex = Lexicon::with_config(StoreOptions::default(), config);
        let entry = lex.new_entry();
        let number = lex.flid("LexEntry", "HomographNumber");
        for value in 1..=4 {
            lex.handler.begin_undo_task(format!("Set {value}"), "Set");
            lex.cache_mut().set_int(entry, number, value).unwrap();
            lex.handler.end_undo_task().unwrap();
        }

        lex.handler.undo().unwrap();
        lex.handler.undo().unwrap();

        assert!(matches!(lex.handler.undo(), Err(UndoError::NothingToUndo)));
        assert_eq!(lex.cache().get_int(entry, number).unwrap(), 2);
    }
}
