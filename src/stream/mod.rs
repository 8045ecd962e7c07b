pub mod actions;
pub mod chat;

use std::{collections::HashSet, marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::{
    exception::SyncError,
    store::{SharedStore, Subscription},
};

pub use actions::ActionStream;
pub use chat::ChatStream;

/// 시간 순으로 정렬되는 스트림 항목
pub trait StreamEntry: Clone + Serialize + DeserializeOwned + Send + 'static {
    fn entry_id(&self) -> Uuid;
    fn timestamp(&self) -> i64;
}

/// 행동 로그 한 줄. `actions/{gameId}` 와 스냅샷의 `actionLog` 에 같은 형식으로 기록됩니다.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub action: String,
    pub player_name: String,
    pub timestamp: i64,
}

impl LogEntry {
    pub fn new(player_name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            player_name: player_name.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl StreamEntry for LogEntry {
    fn entry_id(&self) -> Uuid {
        self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub message: String,
    pub player_name: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(player_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            player_name: player_name.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl StreamEntry for ChatMessage {
    fn entry_id(&self) -> Uuid {
        self.id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// 두 목록을 id 기준으로 중복 없이 합치고 시간 순으로 정렬해 마지막 `limit` 개만 남깁니다.
pub fn merge_by_id<T: StreamEntry>(local: &[T], remote: &[T], limit: usize) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut merged: Vec<T> = local
        .iter()
        .chain(remote.iter())
        .filter(|entry| seen.insert(entry.entry_id()))
        .cloned()
        .collect();
    merged.sort_by_key(|entry| entry.timestamp());
    tail(merged, limit)
}

fn tail<T>(mut entries: Vec<T>, limit: usize) -> Vec<T> {
    if entries.len() > limit {
        entries.drain(..entries.len() - limit);
    }
    entries
}

/// push 키(삽입 순) 로 저장된 자식들을 시간 순 목록으로 읽습니다. 해석할 수 없는 항목은 건너뜁니다.
pub(crate) fn ordered_entries<T: StreamEntry>(path: &str, value: Option<Value>, limit: usize) -> Vec<T> {
    let Some(Value::Object(children)) = value else {
        return Vec::new();
    };
    let mut entries: Vec<T> = children
        .into_iter()
        .filter_map(|(key, child)| match serde_json::from_value(child) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed entry {}/{}: {}", path, key, e);
                None
            }
        })
        .collect();
    // sort_by_key 는 안정 정렬이므로 같은 시각이면 push 순서를 따릅니다.
    entries.sort_by_key(|entry| entry.timestamp());
    tail(entries, limit)
}

/// 추가 전용 기록 스트림 (`chat/{gameId}`, `actions/{gameId}`).
pub struct EntryLog<T> {
    store: Arc<dyn SharedStore>,
    path: String,
    limit: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T: StreamEntry> EntryLog<T> {
    pub fn new(store: Arc<dyn SharedStore>, path: String, limit: usize) -> Self {
        Self {
            store,
            path,
            limit,
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn append(&self, entry: &T) -> Result<String, SyncError> {
        let value = serde_json::to_value(entry).map_err(|e| SyncError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.store.push(&self.path, value).await
    }

    pub async fn history(&self) -> Result<Vec<T>, SyncError> {
        let value = self.store.get(&self.path).await?;
        Ok(ordered_entries(&self.path, value, self.limit))
    }

    pub async fn subscribe(&self) -> Result<EntryStream<T>, SyncError> {
        let inner = self.store.subscribe(&self.path).await?;
        Ok(EntryStream {
            inner,
            limit: self.limit,
            _entry: PhantomData,
        })
    }
}

/// 변경될 때마다 정렬된 최신 목록을 전달하는 구독
pub struct EntryStream<T> {
    inner: Subscription,
    limit: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T: StreamEntry> EntryStream<T> {
    pub async fn recv(&mut self) -> Option<Vec<T>> {
        let value = self.inner.recv().await?;
        Some(ordered_entries(self.inner.path(), value, self.limit))
    }

    pub fn try_recv(&mut self) -> Option<Vec<T>> {
        let value = self.inner.try_recv()?;
        Some(ordered_entries(self.inner.path(), value, self.limit))
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
