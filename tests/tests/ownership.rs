//! Ownership tree and sequence ordinal scenarios.

use cellar_tests::prelude::*;
use pretty_assertions::assert_eq;

mod sequence_ordinals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clamped_insert_positions() {
        // GIVEN an entry with no senses
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");

        // WHEN senses are created at positions 1, 1, 1, 10, 0
        let a = lex.new_sense(entry, InsertPosition::At(1));
        let b = lex.new_sense(entry, InsertPosition::At(1));
        let c = lex.new_sense(entry, InsertPosition::At(1));
        let d = lex.new_sense(entry, InsertPosition::At(10));
        let e = lex.new_sense(entry, InsertPosition::At(0));

        // THEN out-of-range positions clamp and ordinals follow vector order
        StoreAssertion::new()
            .vector(entry, senses, &[e, a, c, b, d])
            .dense(entry, senses)
            .assert(lex.cache());
        let ords: Vec<i32> = [e, a, c, b, d]
            .iter()
            .map(|s| lex.cache().get_int(*s, Flid::OWN_ORD).unwrap())
            .collect();
        assert_eq!(ords, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reorder_within_sequence() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);
        let s3 = lex.new_sense(entry, InsertPosition::Append);

        lex.cache_mut().replace(entry, senses, 0, 3, &[s3, s1, s2]).unwrap();

        StoreAssertion::new()
            .vector(entry, senses, &[s3, s1, s2])
            .dense(entry, senses)
            .assert(lex.cache());
    }

    #[test]
    fn test_duplicate_in_sequence_rejected() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);

        let err = lex.cache_mut().replace(entry, senses, 0, 2, &[s1, s2, s1]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidOwnership);
        StoreAssertion::new()
            .vector(entry, senses, &[s1, s2])
            .dense(entry, senses)
            .assert(lex.cache());
    }

    #[test]
    fn test_insert_held_sense_moves_it() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);
        let s3 = lex.new_sense(entry, InsertPosition::Append);

        lex.handler.begin_undo_task("Move", "Move");
        lex.cache_mut().replace(entry, senses, 0, 0, &[s3]).unwrap();
        lex.handler.end_undo_task().unwrap();

        StoreAssertion::new()
            .vector(entry, senses, &[s3, s1, s2])
            .dense(entry, senses)
            .assert(lex.cache());

        lex.handler.undo().unwrap();

        StoreAssertion::new()
            .vector(entry, senses, &[s1, s2, s3])
            .dense(entry, senses)
            .assert(lex.cache());
    }

    #[test]
    fn test_remove_orphans_child() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);

        lex.cache_mut().replace(entry, senses, 0, 1, &[]).unwrap();

        StoreAssertion::new()
            .vector(entry, senses, &[s2])
            .dense(entry, senses)
            .present(s1)
            .assert(lex.cache());
        assert_eq!(lex.cache().get_owner(s1).unwrap(), Hvo::NULL);
        assert_eq!(lex.cache().get_int(s1, Flid::OWN_ORD).unwrap(), -1);
    }
}

mod moves {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_to_collection() {
        // GIVEN three senses in an entry
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");
        let unattached = lex.flid("LexDb", "UnattachedSenses");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);
        let s3 = lex.new_sense(entry, InsertPosition::Append);
        let lex_db = lex.lex_db;

        // WHEN the middle sense moves into the database's collection
        lex.cache_mut().replace(lex_db, unattached, 0, 0, &[s2]).unwrap();

        // THEN the sequence closes the gap and the moved sense has no ordinal
        StoreAssertion::new()
            .vector(entry, senses, &[s1, s3])
            .vector(lex_db, unattached, &[s2])
            .dense(entry, senses)
            .assert(lex.cache());
        let cache = lex.cache();
        assert_eq!(cache.get_owner(s2).unwrap(), lex_db);
        assert_eq!(cache.get_owning_flid(s2).unwrap(), Some(unattached));
        assert_eq!(cache.get_own_ord(s2).unwrap(), None);
    }

    #[test]
    fn test_subsense_into_other_entry() {
        let mut lex = Lexicon::new();
        let first = lex.new_entry();
        let second = lex.new_entry();
        let subsenses = lex.flid("LexSense", "Subsenses");
        let senses = lex.flid("LexEntry", "Senses");
        let sense_clid = lex.clid("LexSense");
        let parent = lex.new_sense(first, InsertPosition::Append);
        let sub = lex
            .cache_mut()
            .make_new_object(sense_clid, parent, subsenses, InsertPosition::Append)
            .unwrap();

        lex.cache_mut().replace(second, senses, 0, 0, &[sub]).unwrap();

        StoreAssertion::new()
            .vector(parent, subsenses, &[])
            .vector(second, senses, &[sub])
            .assert(lex.cache());
        assert_eq!(lex.cache().owner_chain(sub), vec![second, lex.lex_db]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let subsenses = lex.flid("LexSense", "Subsenses");
        let sense_clid = lex.clid("LexSense");
        let parent = lex.new_sense(entry, InsertPosition::Append);
        let sub = lex
            .cache_mut()
            .make_new_object(sense_clid, parent, subsenses, InsertPosition::Append)
            .unwrap();

        let err = lex.cache_mut().replace(sub, subsenses, 0, 0, &[parent]).unwrap_err();

        assert!(matches!(err, StoreError::OwnershipCycle { .. }));
        assert_eq!(lex.cache().get_owner(parent).unwrap(), entry);
    }

    #[test]
    fn test_owning_atom_replacement_orphans_previous() {
        let mut lex = Lexicon::new();
        let lists = lex.flid("LexDb", "PartsOfSpeech");
        let list_clid = lex.clid("CmPossibilityList");
        let lex_db = lex.lex_db;

        let first = lex
            .cache_mut()
            .make_new_object(list_clid, lex_db, lists, InsertPosition::Append)
            .unwrap();
        let second = lex
            .cache_mut()
            .make_new_object(list_clid, lex_db, lists, InsertPosition::Append)
            .unwrap();

        let cache = lex.cache();
        assert_eq!(cache.get_obj_prop(lex_db, lists).unwrap(), second);
        assert_eq!(cache.get_owner(first).unwrap(), Hvo::NULL);
        assert!(cache.is_valid_object(first));
        StoreAssertion::new().assert(cache);
    }
}

mod lifecycle {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cascade_delete() {
        // GIVEN an entry owning senses, a subsense and a picture
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let keeper = lex.new_entry();
        let subsenses = lex.flid("LexSense", "Subsenses");
        let pictures = lex.flid("LexSense", "Pictures");
        let entries = lex.flid("LexDb", "Entries");
        let main_entry = lex.flid("LexEntry", "MainEntry");
        let sense_clid = lex.clid("LexSense");
        let picture_clid = lex.clid("CmPicture");
        let s1 = lex.new_sense(entry, InsertPosition::Append);
        let s2 = lex.new_sense(entry, InsertPosition::Append);
        let cache = lex.cache_mut();
        let sub = cache
            .make_new_object(sense_clid, s1, subsenses, InsertPosition::Append)
            .unwrap();
        let picture = cache
            .make_new_object(picture_clid, sub, pictures, InsertPosition::Append)
            .unwrap();
        cache.set_obj_prop(keeper, main_entry, entry).unwrap();
        let guid = cache.get_guid(picture, Flid::GUID).unwrap();
        let before = cache.object_count();

        // WHEN the entry is deleted
        cache.delete_object(entry).unwrap();

        // THEN its whole subtree is gone and the owner no longer lists it
        StoreAssertion::new()
            .object_count(before - 5)
            .absent(entry)
            .absent(s1)
            .absent(s2)
            .absent(sub)
            .absent(picture)
            .vector(lex.lex_db, entries, &[keeper])
            .assert(lex.cache());
        assert_eq!(lex.cache().get_obj_from_guid(&guid), None);
        // References into the deleted tree are left alone.
        assert_eq!(lex.cache().get_obj_prop(keeper, main_entry).unwrap(), entry);
    }

    #[test]
    fn test_delete_unknown_object() {
        let mut lex = Lexicon::new();

        let err = lex.cache_mut().delete_object(Hvo::new(777)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownObject);
    }

    #[test]
    fn test_create_abstract_class_rejected() {
        let mut lex = Lexicon::new();
        let root = lex.clid("CmObject");

        let err = lex
            .cache_mut()
            .make_new_object(root, Hvo::NULL, Flid::new(0), InsertPosition::Append)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AbstractClass);
    }

    #[test]
    fn test_create_in_non_owning_field_rejected() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let variants = lex.flid("LexEntry", "Variants");
        let entry_clid = lex.clid("LexEntry");
        let count = lex.cache().object_count();

        let err = lex
            .cache_mut()
            .make_new_object(entry_clid, entry, variants, InsertPosition::Append)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidOwnership);
        assert_eq!(lex.cache().object_count(), count);
    }

    #[test]
    fn test_objects_of_class() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let sense = lex.new_sense(entry, InsertPosition::Append);
        let root = lex.clid("CmObject");
        let sense_clid = lex.clid("LexSense");
        let cache = lex.cache();

        assert_eq!(cache.objects_of_class(sense_clid, false), vec![sense]);
        assert_eq!(cache.objects_of_class(root, false), Vec::<Hvo>::new());
        assert_eq!(cache.objects_of_class(root, true).len(), 3);
        assert_eq!(cache.owned_objects(entry), vec![sense]);
    }
}
