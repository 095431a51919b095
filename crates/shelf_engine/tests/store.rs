use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use shelf_engine::{ManifestStore, StoreConfig, StoreError};
use tempfile::TempDir;

fn store_in(temp: &TempDir) -> ManifestStore {
    let store = ManifestStore::new(StoreConfig::new(temp.path().join("data")));
    store.ensure_dirs().unwrap();
    store
}

#[test]
fn add_get_delete_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);

    let record = store
        .add_article("Foo", "https://www.bar.com/x", "bar.com", b"%PDF-1.4 fake")
        .unwrap();
    assert_eq!(record.title, "Foo");
    assert_eq!(record.url, "https://www.bar.com/x");
    assert_eq!(record.domain, "bar.com");
    assert_eq!(record.filename, format!("{}.pdf", record.id));

    let blob = store.blob_path(&record.id).unwrap().unwrap();
    assert_eq!(blob, temp.path().join("data/pdfs").join(&record.filename));
    assert_eq!(fs::read(&blob).unwrap(), b"%PDF-1.4 fake");
    assert_eq!(store.get_article(&record.id).unwrap(), Some(record.clone()));

    assert!(store.delete_article(&record.id).unwrap());
    assert_eq!(store.get_article(&record.id).unwrap(), None);
    assert!(!blob.exists());

    assert!(!store.delete_article(&record.id).unwrap());
    assert!(!blob.exists());
}

#[test]
fn empty_title_becomes_untitled() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    let record = store.add_article("  ", "https://x.org", "x.org", b"pdf").unwrap();
    assert_eq!(record.title, "Untitled");
}

#[test]
fn saved_at_is_local_iso_with_microseconds() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    let record = store.add_article("T", "https://x.org", "x.org", b"pdf").unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(&record.saved_at, "%Y-%m-%dT%H:%M:%S%.6f").is_ok());
    assert_eq!(record.saved_at.len(), "2024-01-05T10:11:12.123456".len());
}

#[test]
fn save_all_of_load_all_is_identity() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    for title in ["a", "b", "c"] {
        store.add_article(title, "https://x.org", "x.org", b"pdf").unwrap();
    }
    let before = store.load_all().unwrap();
    store.save_all(&before).unwrap();
    assert_eq!(store.load_all().unwrap(), before);
}

#[test]
fn manifest_is_pretty_json_array_with_expected_keys() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.add_article("T", "https://x.org", "x.org", b"pdf").unwrap();

    let text = fs::read_to_string(store.config().manifest_path()).unwrap();
    assert!(text.starts_with("[\n  {"));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let keys: HashSet<&str> = value[0].as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert_eq!(
        keys,
        HashSet::from(["id", "title", "url", "domain", "saved_at", "filename"])
    );
}

#[test]
fn missing_and_blank_manifests_load_empty() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    assert!(store.load_all().unwrap().is_empty());
    assert!(!store.delete_article("nope").unwrap());

    fs::write(store.config().manifest_path(), "").unwrap();
    assert!(store.load_all().unwrap().is_empty());
    fs::write(store.config().manifest_path(), "  \n").unwrap();
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn corrupt_manifest_is_reported() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    fs::write(store.config().manifest_path(), "{not json").unwrap();
    let err = store.load_all().unwrap_err();
    assert!(matches!(err, StoreError::Manifest { .. }));
}

#[test]
fn ensure_dirs_rejects_file_in_the_way() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    fs::write(&data, "not a dir").unwrap();
    let store = ManifestStore::new(StoreConfig::new(&data));
    assert!(matches!(store.ensure_dirs(), Err(StoreError::Persist(_))));
}

#[test]
fn concurrent_adds_lose_nothing() {
    const WRITERS: usize = 16;
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_in(&temp));

    let handles: Vec<_> = (0..WRITERS)
        .map(|n| {
            let store = store.clone();
            thread::spawn(move || {
                store
                    .add_article(&format!("t{n}"), "https://x.org", "x.org", b"pdf")
                    .unwrap()
            })
        })
        .collect();
    let added: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let records = store.load_all().unwrap();
    assert_eq!(records.len(), WRITERS);
    let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), WRITERS);
    for record in &added {
        assert!(ids.contains(&record.id));
        assert!(store.blob_path(&record.id).unwrap().unwrap().exists());
    }
    let blobs = fs::read_dir(store.config().blob_dir()).unwrap().count();
    assert_eq!(blobs, WRITERS);
}

#[test]
fn concurrent_adds_and_deletes_stay_consistent() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_in(&temp));
    let doomed: Vec<_> = (0..6)
        .map(|n| store.add_article(&format!("old{n}"), "https://x.org", "x.org", b"pdf").unwrap())
        .collect();

    let mut handles = Vec::new();
    for record in doomed {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            assert!(store.delete_article(&record.id).unwrap());
        }));
    }
    for n in 0..6 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            store
                .add_article(&format!("new{n}"), "https://x.org", "x.org", b"pdf")
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let titles: HashSet<String> = store.load_all().unwrap().into_iter().map(|r| r.title).collect();
    let expected: HashSet<String> = (0..6).map(|n| format!("new{n}")).collect();
    assert_eq!(titles, expected);
}

#[test]
fn list_is_newest_first() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    let first = store.add_article("first", "https://x.org/1", "x.org", b"pdf").unwrap();
    thread::sleep(Duration::from_millis(5));
    let second = store.add_article("second", "https://x.org/2", "x.org", b"pdf").unwrap();

    let ids: Vec<_> = store.list_newest_first().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn sweep_removes_only_unreferenced_old_enough_blobs() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    let kept = store.add_article("kept", "https://x.org", "x.org", b"pdf").unwrap();
    let orphan = store.config().blob_dir().join("deadbeef.pdf");
    fs::write(&orphan, b"orphan").unwrap();
    let stray_temp = store.config().data_dir.join("articles.json.abc123.tmp");
    fs::write(&stray_temp, b"[]").unwrap();

    assert!(store.orphan_blobs(Duration::from_secs(3600)).unwrap().is_empty());
    assert_eq!(store.sweep_orphans(Duration::from_secs(3600)).unwrap(), 0);
    assert!(orphan.exists());

    assert_eq!(store.orphan_blobs(Duration::ZERO).unwrap(), vec![orphan.clone()]);
    assert_eq!(store.sweep_orphans(Duration::ZERO).unwrap(), 2);
    assert!(!orphan.exists());
    assert!(!stray_temp.exists());
    assert!(store.blob_path(&kept.id).unwrap().unwrap().exists());
    assert_eq!(store.load_all().unwrap().len(), 1);
}
