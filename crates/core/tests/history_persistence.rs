use std::{fs, io::Write, sync::Arc, thread};

use chrono::{DateTime, Local};
use webline_core::{EditEvent, HistoryStore, LineEditor, Outcome};

fn at(secs: i64) -> DateTime<Local> {
    DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&Local)
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("history.jsonl");
    {
        let store = HistoryStore::open(&path).unwrap();
        assert!(store.is_persistent());
        assert_eq!(store.path(), Some(path.clone()));
        store.add("http://example.com", at(10)).unwrap();
        store.add("http://example.org", at(20)).unwrap();
        store.close().unwrap();
    }
    let store = HistoryStore::open(&path).unwrap();
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].index, 0);
    assert_eq!(all[0].address, "http://example.com");
    assert_eq!(all[0].visited_at, at(10));
    assert_eq!(all[1].index, 1);
}

#[test]
fn reopening_does_not_duplicate_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    HistoryStore::open(&path).unwrap().add("a.com", at(1)).unwrap();
    for _ in 0..3 {
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}

#[test]
fn deleted_indices_stay_retired_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    {
        let store = HistoryStore::open(&path).unwrap();
        store.add("a.com", at(1)).unwrap();
        store.add("b.com", at(2)).unwrap();
        store.delete(1).unwrap();
    }
    {
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get(1).is_err());
        assert_eq!(store.add("c.com", at(3)).unwrap(), 2);
        store.delete_all().unwrap();
    }
    let store = HistoryStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.add("d.com", at(4)).unwrap(), 3);
}

#[test]
fn torn_trailing_line_is_skipped_and_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    {
        let store = HistoryStore::open(&path).unwrap();
        store.add("a.com", at(1)).unwrap();
    }
    {
        let mut f = fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(br#"{"op":"visit","entry_ind"#).unwrap();
    }
    {
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.add("b.com", at(2)).unwrap(), 1);
    }
    let store = HistoryStore::open(&path).unwrap();
    let addresses: Vec<String> = store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|r| r.address)
        .collect();
    assert_eq!(addresses, vec!["a.com", "b.com"]);
}

#[test]
fn compact_drops_tombstones_but_keeps_high_water_mark() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    {
        let store = HistoryStore::open(&path).unwrap();
        for i in 0..4 {
            store.add(&format!("s{i}.com"), at(i)).unwrap();
        }
        store.delete(3).unwrap();
        store.delete(0).unwrap();
        store.compact().unwrap();
    }
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("forget"));
    assert_eq!(text.lines().count(), 3);

    let store = HistoryStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.add("again.com", at(9)).unwrap(), 4);
}

#[test]
fn reopen_compacts_when_tombstones_outnumber_live_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    {
        let store = HistoryStore::open(&path).unwrap();
        for a in ["a.com", "b.com", "c.com"] {
            store.add(a, at(1)).unwrap();
        }
        store.delete(0).unwrap();
        store.delete(2).unwrap();
    }
    assert_eq!(fs::read_to_string(&path).unwrap().matches("forget").count(), 2);

    let store = HistoryStore::open(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("forget"));
    assert!(text.lines().next().unwrap().contains("\"op\":\"seal\""));
    assert_eq!(text.lines().count(), 2);
    assert_eq!(store.get(1).unwrap().address, "b.com");
    assert_eq!(store.add("d.com", at(2)).unwrap(), 3);
}

#[test]
fn concurrent_adds_get_unique_indices() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(HistoryStore::open(dir.path().join("history.jsonl")).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store.add(&format!("t{t}-{i}.net"), Local::now()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 100);
    assert_eq!(store.count().unwrap(), 100);
    assert!(all.windows(2).all(|w| w[0].index < w[1].index));
    assert_eq!(all.last().unwrap().index, 99);
}

#[test]
fn editor_commits_through_shared_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    let store = Arc::new(HistoryStore::open(&path).unwrap());
    for addr in ["a.com", "b.com"] {
        let mut ed = LineEditor::new(Arc::clone(&store));
        for ch in addr.chars() {
            ed.handle(EditEvent::Input(ch)).unwrap();
        }
        let before = store.count().unwrap();
        let out = ed.handle(EditEvent::Commit).unwrap();
        assert!(matches!(out, Some(Outcome::Committed { warning: None, .. })));
        assert_eq!(store.count().unwrap(), before + 1);
    }

    let mut ed = LineEditor::new(Arc::clone(&store));
    ed.handle(EditEvent::RecallOlder).unwrap();
    assert_eq!(ed.buffer(), "b.com");
    drop(ed);

    let reopened = HistoryStore::open(&path).unwrap();
    assert_eq!(reopened.match_prefix("").unwrap(), vec!["a.com", "b.com"]);
}
