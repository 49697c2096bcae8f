use sleuth_core::model::{Corpus, FunctionRecord, VECTOR_DIM};
use sleuth_core::store::{CorpusStore, StoreError};
use tempfile::tempdir;

fn embedded_record(binary: &str, function: &str, fill: f32) -> FunctionRecord {
    let mut record =
        FunctionRecord::new(binary, function, vec!["return 0;".to_string()]);
    record.vector = Some(vec![fill; VECTOR_DIM]);
    record
}

#[test]
fn load_of_missing_snapshot_yields_empty_corpus() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let corpus = store.load().expect("load");
    assert!(corpus.is_empty());
}

#[test]
fn appends_are_monotonic_and_survive_reload_in_order() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let mut corpus = store.load().expect("load");
    for (i, name) in ["alpha", "beta", "gamma"].iter().enumerate() {
        let record = embedded_record("bin1", name, i as f32 + 1.0);
        store.append_and_persist(&mut corpus, record).expect("append");
    }
    assert_eq!(corpus.len(), 3);

    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded.len(), 3);
    let names: Vec<&str> =
        reloaded.iter().map(|r| r.function_name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    for record in reloaded.iter() {
        let vector = record.vector.as_ref().expect("vector");
        assert_eq!(vector.len(), VECTOR_DIM);
    }
}

#[test]
fn load_is_idempotent_on_an_unchanged_snapshot() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let mut corpus = Corpus::new();
    store
        .append_and_persist(&mut corpus, embedded_record("bin1", "handler", 0.5))
        .expect("append");

    let first = store.load().expect("first load");
    let second = store.load().expect("second load");
    assert_eq!(first, second);
}

#[test]
fn duplicate_identities_are_allowed() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let mut corpus = Corpus::new();
    store
        .append_and_persist(&mut corpus, embedded_record("bin1", "init", 1.0))
        .expect("first append");
    store
        .append_and_persist(&mut corpus, embedded_record("bin1", "init", 2.0))
        .expect("second append");

    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn corrupt_snapshot_is_a_load_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("corpus.json");
    std::fs::write(&path, "this is not a corpus").expect("write garbage");

    let store = CorpusStore::new(&path);
    match store.load() {
        Err(StoreError::Load { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected load error, got {other:?}"),
    }
}

/// A failed flush is recoverable: the append must already be visible in the
/// in-memory corpus so the caller can retry the persist or abort.
#[test]
fn failed_flush_keeps_the_in_memory_append() {
    let dir = tempdir().expect("tempdir");
    // A snapshot path whose parent is a regular file cannot be written.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").expect("write blocker");
    let snapshot = blocker.join("corpus.json");

    let store = CorpusStore::new(&snapshot);
    let mut corpus = Corpus::new();
    match store.append_and_persist(&mut corpus, embedded_record("bin1", "orphan", 1.0)) {
        Err(StoreError::Persist { path, .. }) => assert_eq!(path, snapshot),
        other => panic!("expected persist error, got {other:?}"),
    }

    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.iter().next().expect("record").function_name, "orphan");
}

#[test]
fn append_rejects_record_without_vector() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let mut corpus = Corpus::new();
    let record = FunctionRecord::new("bin1", "raw", vec!["code".to_string()]);
    match store.append_and_persist(&mut corpus, record) {
        Err(StoreError::MissingVector { function, .. }) => assert_eq!(function, "raw"),
        other => panic!("expected missing-vector error, got {other:?}"),
    }
    assert!(corpus.is_empty());
}

#[test]
fn append_rejects_vector_of_wrong_length() {
    let dir = tempdir().expect("tempdir");
    let store = CorpusStore::new(dir.path().join("corpus.json"));

    let mut corpus = Corpus::new();
    let mut record = FunctionRecord::new("bin1", "short", vec!["code".to_string()]);
    record.vector = Some(vec![1.0; 7]);
    match store.append_and_persist(&mut corpus, record) {
        Err(StoreError::WrongVectorLen { found, .. }) => assert_eq!(found, 7),
        other => panic!("expected wrong-length error, got {other:?}"),
    }
}
