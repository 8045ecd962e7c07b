use std::sync::Arc;

use duel_sync::{
    store::{memory::MemoryStore, paths, SharedStore},
    stream::{ActionStream, ChatStream, LogEntry},
};
use serde_json::json;

#[tokio::test]
async fn chat_is_ordered_and_limited() {
    let store = MemoryStore::new();
    let yugi = ChatStream::with_limit(Arc::new(store.connect()), "g1", "Yugi", 3);
    let kaiba = ChatStream::with_limit(Arc::new(store.connect()), "g1", "Kaiba", 3);

    let mut feed = kaiba.subscribe().await.unwrap();
    assert_eq!(feed.recv().await, Some(Vec::new()));

    for (stream, text) in [
        (&yugi, "hello"),
        (&kaiba, "  "),
        (&kaiba, "you again"),
        (&yugi, "one"),
        (&yugi, "two"),
        (&kaiba, "three"),
    ] {
        stream.send(text).await.unwrap();
    }

    let history = yugi.history().await.unwrap();
    let texts: Vec<&str> = history.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(history[2].player_name, "Kaiba");

    // 공백 메시지는 전송되지 않으므로 알림은 5 번
    let mut last = Vec::new();
    for _ in 0..5 {
        last = feed.recv().await.unwrap();
    }
    assert_eq!(last, history);
    assert!(feed.try_recv().is_none());
}

#[tokio::test]
async fn blank_messages_are_not_sent() {
    let store = MemoryStore::new();
    let chat = ChatStream::new(Arc::new(store.connect()), "g1", "Yugi");
    assert_eq!(chat.send(" \n ").await.unwrap(), None);
    assert_eq!(store.peek(&paths::chat("g1")), None);

    let sent = chat.send("  good game ").await.unwrap().unwrap();
    assert_eq!(sent.message, "good game");
}

#[tokio::test]
async fn actions_skip_malformed_entries() {
    let store = MemoryStore::new();
    let conn: Arc<dyn SharedStore> = Arc::new(store.connect());
    let actions = ActionStream::new(conn.clone(), "g1");

    actions
        .record(&LogEntry::new("Yugi", "drew a card"))
        .await
        .unwrap();
    conn.push(&paths::actions("g1"), json!({ "unexpected": true }))
        .await
        .unwrap();
    actions
        .record(&LogEntry::new("Yugi", "ended turn"))
        .await
        .unwrap();

    let history = actions.history().await.unwrap();
    let texts: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(texts, vec!["drew a card", "ended turn"]);
}

#[tokio::test]
async fn failed_action_writes_are_reported() {
    let store = MemoryStore::new();
    let actions = ActionStream::new(Arc::new(store.connect()), "g1");
    store.set_offline(true);
    assert!(actions
        .record(&LogEntry::new("Yugi", "drew a card"))
        .await
        .is_err());
}
