//! Datastore behavior against a directory-backed store

use coffer::store::{LocalObjectStore, ObjectStore};
use coffer::{CofferResult, Coordinate, Datastore, Kind, Resolution};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Store wrapper that counts downloads and makes each one slow
struct CountingStore {
    inner: LocalObjectStore,
    gets: AtomicUsize,
    delay: Duration,
}

impl CountingStore {
    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl ObjectStore for CountingStore {
    fn exists(&self, key: &str) -> CofferResult<bool> {
        self.inner.exists(key)
    }

    fn get(&self, key: &str, dest: &mut dyn Write) -> CofferResult<u64> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.inner.get(key, dest)
    }

    fn put(&self, key: &str, source: &mut dyn Read) -> CofferResult<u64> {
        self.inner.put(key, source)
    }

    fn delete_prefix(&self, prefix: &str) -> CofferResult<()> {
        self.inner.delete_prefix(prefix)
    }

    fn describe(&self) -> String {
        format!("counting {}", self.inner.describe())
    }
}

struct Env {
    temp: TempDir,
    store: Arc<CountingStore>,
    datastore: Datastore,
}

impl Env {
    fn new(delay: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(CountingStore {
            inner: LocalObjectStore::new(temp.path().join("bucket")),
            gets: AtomicUsize::new(0),
            delay,
        });
        let datastore = Datastore::new(temp.path().join("cache"), store.clone());
        Self {
            temp,
            store,
            datastore,
        }
    }

    fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp.path().join("src").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn write_tree(&self, name: &str) -> PathBuf {
        let root = self.temp.path().join("src").join(name);
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("share/doc/empty")).unwrap();
        fs::write(root.join("README"), b"readme").unwrap();
        fs::write(root.join("bin/tool"), b"#!/bin/sh\necho hi\n").unwrap();
        fs::write(root.join("share/doc/guide.txt"), vec![b'x'; 70_000]).unwrap();
        root
    }
}

/// Relative path -> Some(contents) for files, None for directories
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let contents = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, contents)
        })
        .collect()
}

#[test]
fn file_round_trip() {
    let env = Env::new(Duration::ZERO);
    let src = env.write_file("payload.bin", &[0, 1, 2, 254, 255]);
    env.datastore.publish_file(&src, "com.example", "payload", 1).unwrap();

    let path = env.datastore.file_path("com.example", "payload", 1).unwrap();
    assert_eq!(fs::read(path).unwrap(), fs::read(&src).unwrap());
}

#[test]
fn directory_round_trip() {
    let env = Env::new(Duration::ZERO);
    let src = env.write_tree("tree");
    env.datastore.publish_directory(&src, "com.example", "tree", 2).unwrap();

    let path = env.datastore.directory_path("com.example", "tree", 2).unwrap();
    assert!(path.is_dir());
    assert_eq!(snapshot(&path), snapshot(&src));
}

#[test]
fn not_found_is_total() {
    let env = Env::new(Duration::ZERO);
    let src = env.write_file("f", b"x");
    env.datastore.publish_file(&src, "grp", "nm", 4).unwrap();

    let misses = [
        ("other", "nm", 4, Kind::File),
        ("grp", "other", 4, Kind::File),
        ("grp", "nm", 5, Kind::File),
        ("grp", "nm", 4, Kind::Directory),
        ("never", "published", 1, Kind::Directory),
    ];

    for (group, name, version, kind) in misses {
        let coordinate = Coordinate::new(group, name, version, kind).unwrap();
        let result = match kind {
            Kind::File => env.datastore.file_path(group, name, version),
            Kind::Directory => env.datastore.directory_path(group, name, version),
        };

        let err = result.unwrap_err();
        assert!(err.is_not_found(), "{}: {}", coordinate, err);
        assert_eq!(err.missing_coordinate(), Some(&coordinate));
        assert_eq!(
            env.datastore.resolve(&coordinate).unwrap(),
            Resolution::NotFound(coordinate.clone())
        );
        assert!(!env.datastore.cache_dir().entry_path(&coordinate).exists());
    }
    assert_eq!(env.store.gets(), 0);
}

#[test]
fn sequential_resolves_download_once() {
    let env = Env::new(Duration::from_millis(200));
    let src = env.write_file("f", b"contents");
    env.datastore.publish_file(&src, "g", "n", 1).unwrap();

    let started = Instant::now();
    let first = env.datastore.file_path("g", "n", 1).unwrap();
    let cold = started.elapsed();

    let started = Instant::now();
    let second = env.datastore.file_path("g", "n", 1).unwrap();
    let warm = started.elapsed();

    assert_eq!(first, second);
    assert_eq!(env.store.gets(), 1);
    assert!(warm < cold, "warm {:?} should beat cold {:?}", warm, cold);
}

#[test]
fn concurrent_resolves_download_once() {
    let env = Env::new(Duration::from_millis(300));
    let src = env.write_tree("tree");
    env.datastore.publish_directory(&src, "g", "tree", 1).unwrap();

    let datastore = Arc::new(env.datastore.clone());
    let barrier = Arc::new(Barrier::new(4));
    let started = Instant::now();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let datastore = Arc::clone(&datastore);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let path = datastore.directory_path("g", "tree", 1).unwrap();
                (path, started.elapsed())
            })
        })
        .collect();

    let results: Vec<(PathBuf, Duration)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(env.store.gets(), 1);
    for (path, elapsed) in &results {
        assert_eq!(path, &results[0].0);
        // Everyone waited for the single slow download
        assert!(*elapsed >= Duration::from_millis(300), "{:?}", elapsed);
    }
    assert_eq!(snapshot(&results[0].0), snapshot(&src));
}

#[test]
fn concurrent_resolves_across_datastores_share_the_lock() {
    let env = Env::new(Duration::from_millis(200));
    let src = env.write_file("f", b"shared");
    env.datastore.publish_file(&src, "g", "n", 1).unwrap();

    // Separate instances over the same cache root and store
    let root = env.datastore.cache_dir().root().to_path_buf();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let datastore = Datastore::new(root.clone(), env.store.clone());
            thread::spawn(move || datastore.file_path("g", "n", 1).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(fs::read(handle.join().unwrap()).unwrap(), b"shared");
    }
    assert_eq!(env.store.gets(), 1);
}

#[test]
fn republish_does_not_touch_warm_cache() {
    let env = Env::new(Duration::ZERO);
    let src = env.write_file("f", b"first");
    env.datastore.publish_file(&src, "g", "n", 1).unwrap();
    let warm = env.datastore.file_path("g", "n", 1).unwrap();

    fs::write(&src, b"second").unwrap();
    env.datastore.publish_file(&src, "g", "n", 1).unwrap();

    let again = env.datastore.file_path("g", "n", 1).unwrap();
    assert_eq!(again, warm);
    assert_eq!(fs::read(&again).unwrap(), b"first");

    env.datastore.wipe_cache().unwrap();
    let fresh = env.datastore.file_path("g", "n", 1).unwrap();
    assert_eq!(fs::read(fresh).unwrap(), b"second");
}

#[test]
fn wipe_forces_redownload() {
    let env = Env::new(Duration::ZERO);
    let src = env.write_tree("tree");
    env.datastore.publish_directory(&src, "g", "tree", 1).unwrap();

    env.datastore.directory_path("g", "tree", 1).unwrap();
    assert_eq!(env.store.gets(), 1);

    env.datastore.wipe_cache().unwrap();
    assert!(env.datastore.cached_entries().unwrap().is_empty());

    let path = env.datastore.directory_path("g", "tree", 1).unwrap();
    assert_eq!(env.store.gets(), 2);
    assert_eq!(snapshot(&path), snapshot(&src));
}

#[test]
fn cached_entries_lists_both_kinds() {
    let env = Env::new(Duration::ZERO);
    let file = env.write_file("f", b"12345");
    let tree = env.write_tree("tree");
    env.datastore.publish_file(&file, "g", "n", 1).unwrap();
    env.datastore.publish_directory(&tree, "g", "n", 1).unwrap();

    env.datastore.file_path("g", "n", 1).unwrap();
    env.datastore.directory_path("g", "n", 1).unwrap();

    let entries = env.datastore.cached_entries().unwrap();
    let kinds: Vec<Kind> = entries.iter().map(|e| e.coordinate.kind()).collect();
    assert_eq!(entries.len(), 2);
    assert!(kinds.contains(&Kind::File));
    assert!(kinds.contains(&Kind::Directory));
    assert!(entries.iter().all(|e| e.size_bytes > 0));
}
