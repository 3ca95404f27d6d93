mod helpers;

use std::sync::Arc;

use helpers::RecordingIndex;
use longmem::memory::{EventKind, MemoryStore};
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn search_returns_at_most_k_in_relevance_order() {
    let index = Arc::new(RecordingIndex::ranked(&["best", "second", "third", "fourth"]));
    let store = MemoryStore::new(index, 1).unwrap();

    assert_eq!(store.search("anything", 3).unwrap(), vec!["best", "second", "third"]);
    assert_eq!(store.search("anything", 10).unwrap().len(), 4);
    assert!(store.search("anything", 0).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn nearest_events_come_first() {
    let index = Arc::new(helpers::keyword_index());
    let store = MemoryStore::new(index, 1).unwrap();

    store.add_event(&json!({"action": "browse", "args": {"url": "https://example.com"}}));
    store.add_event(&json!({"action": "run", "args": {"command": "python test.py"}}));
    store.add_event(&json!({"observation": "error", "content": "file not found"}));
    store.flush().await;
    assert!(store.failed_inserts().is_empty());

    let hits = store.search_hits("run python test", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].seq, 1);
    assert_eq!(hits[0].kind, EventKind::Action);
    assert_eq!(hits[0].source_id, "run");
    assert!(hits[0].distance <= hits[1].distance);

    let texts = store.search("browse url", 1).unwrap();
    assert_eq!(texts.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&texts[0]).unwrap();
    assert_eq!(body["action"], "browse");
}

#[tokio::test(flavor = "multi_thread")]
async fn ties_are_broken_by_sequence() {
    let index = Arc::new(helpers::noop_index());
    let store = MemoryStore::new(index, 1).unwrap();

    for i in 0..5 {
        store.add_event(&json!({ "observation": format!("obs-{i}") }));
    }
    store.flush().await;

    let seqs: Vec<u64> = store
        .search_hits("whatever", 10)
        .unwrap()
        .iter()
        .map(|h| h.seq)
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_store_finds_nothing() {
    let index = Arc::new(helpers::keyword_index());
    let store = MemoryStore::new(index, 1).unwrap();

    assert!(store.search("run", 10).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn search_from_async_code_goes_through_the_blocking_pool() {
    let index = Arc::new(helpers::keyword_index());
    let store = Arc::new(MemoryStore::new(index, 1).unwrap());
    store.add_event(&json!({"action": "run", "args": {"command": "ls"}}));
    store.flush().await;

    let s = Arc::clone(&store);
    let texts = tokio::task::spawn_blocking(move || s.search("ls command", 10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(texts.len(), 1);
}
