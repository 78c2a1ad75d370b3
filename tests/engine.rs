// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scenarios against a real file on disk, exercising
//! `Datefile` the way an embedder would: open, add, search, remove,
//! defrag, reopen.

use std::collections::HashSet;

use datefile::{Datefile, OpenOptions};
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn names(events: &[datefile::Event]) -> HashSet<String> {
    events.iter().map(|e| e.name.clone()).collect()
}

#[test]
fn empty_search_returns_nothing() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    assert!(df.search(0, 1 << 62).unwrap().is_empty());
}

#[test]
fn point_event_is_found_only_at_its_instant() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    df.add(1000, 1000, "A").unwrap();

    assert_eq!(df.search(1000, 1000).unwrap().len(), 1);
    assert!(df.search(999, 999).unwrap().is_empty());
    assert!(df.search(1001, 1001).unwrap().is_empty());
}

#[test]
fn range_event_is_found_on_any_overlap() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    df.add(100, 200, "X").unwrap();

    for (lo, hi) in [(150, 150), (50, 100), (200, 300), (0, 1000)] {
        let results = df.search(lo, hi).unwrap();
        assert_eq!(results.len(), 1, "window ({lo},{hi})");
        assert_eq!(results[0].name, "X");
    }
    assert!(df.search(201, 300).unwrap().is_empty());
}

#[test]
fn multiple_events_each_appear_once_deduplicated() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    df.add(10, 20, "a").unwrap();
    df.add(15, 25, "b").unwrap();

    let results = df.search(0, 100).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(names(&results), HashSet::from(["a".to_string(), "b".to_string()]));
}

#[test]
fn remove_erases_an_event_from_every_window() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    let id = df.add(100, 200, "X").unwrap();

    df.remove(id).unwrap();

    for (lo, hi) in [(150, 150), (50, 100), (200, 300), (0, 1000)] {
        assert!(df.search(lo, hi).unwrap().is_empty(), "window ({lo},{hi})");
    }
}

#[test]
fn negative_instants_are_ordered_correctly() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default()).unwrap();
    df.add(-5, 5, "Z").unwrap();

    assert_eq!(df.search(-10, 10).unwrap().len(), 1);
    assert!(df.search(-100, -50).unwrap().is_empty());
}

#[test]
fn defrag_after_remove_shrinks_the_file_and_preserves_survivors() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.df");
    let mut df = Datefile::open(&path, OpenOptions::default()).unwrap();

    df.add(0, 10, "a").unwrap();
    df.add(5, 15, "b").unwrap();
    let middle = df.add(20, 30, "c").unwrap();
    df.remove(middle).unwrap();

    let before = std::fs::metadata(&path).unwrap().len();
    df.defrag().unwrap();
    let after = std::fs::metadata(&path).unwrap().len();
    assert!(after < before, "defrag should shrink a file with garbage in it");

    let results = df.search(0, 100).unwrap();
    assert_eq!(names(&results), HashSet::from(["a".to_string(), "b".to_string()]));
}

#[test]
fn defrag_is_idempotent_on_a_second_run() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.df");
    let mut df = Datefile::open(&path, OpenOptions::default()).unwrap();

    df.add(0, 10, "a").unwrap();
    df.add(5, 15, "b").unwrap();
    let middle = df.add(20, 30, "c").unwrap();
    df.remove(middle).unwrap();

    df.defrag().unwrap();
    let once = std::fs::read(&path).unwrap();
    df.defrag().unwrap();
    let twice = std::fs::read(&path).unwrap();
    assert_eq!(once, twice, "a second defrag on an already-compact file is a byte-identical no-op");
}

#[test]
fn reopen_preserves_every_reachable_event() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.df");

    let mut df = Datefile::open(&path, OpenOptions::default()).unwrap();
    df.add(10, 20, "a").unwrap();
    df.add(-30, -10, "b").unwrap();
    df.close().unwrap();

    let mut reopened = Datefile::open(&path, OpenOptions::default()).unwrap();
    let results = reopened.search(-1000, 1000).unwrap();
    assert_eq!(names(&results), HashSet::from(["a".to_string(), "b".to_string()]));
}

#[test]
fn defrag_rebinds_ids_reported_in_the_remap() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.df");
    let mut df = Datefile::open(&path, OpenOptions::default()).unwrap();

    let a = df.add(0, 10, "a").unwrap();
    let report = df.defrag().unwrap();

    let new_a = *report.old_to_new.get(&a).expect("surviving id must appear in the remap");
    let results = df.search(0, 10).unwrap();
    assert_eq!(results[0].id, new_a);
}
