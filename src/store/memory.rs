use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::exception::SyncError;

use super::{
    paths::{self, segments},
    DisconnectOp, SharedStore, Subscription, TransactionFn, TransactionOutcome,
};

struct Watcher {
    id: u64,
    path: String,
    tx: mpsc::UnboundedSender<Option<Value>>,
}

struct StoreInner {
    root: Value,
    watchers: Vec<Watcher>,
    next_watcher: u64,
    next_push: u64,
    next_connection: u64,
    write_counts: HashMap<String, u64>,
    hooks: HashMap<u64, Vec<DisconnectOp>>,
    offline: bool,
    auth_available: bool,
}

/// 프로세스 내부 공유 저장소. 테스트와 로컬 대전에서 백엔드 역할을 합니다.
///
/// `connect` 로 얻은 연결마다 고유한 uid 와 연결 종료 훅을 가집니다.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                root: Value::Object(Map::new()),
                watchers: Vec::new(),
                next_watcher: 0,
                next_push: 0,
                next_connection: 0,
                write_counts: HashMap::new(),
                hooks: HashMap::new(),
                offline: false,
                auth_available: true,
            })),
        }
    }

    pub fn connect(&self) -> MemoryConnection {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_connection += 1;
            inner.next_connection
        };
        debug!("Memory store connection {} opened", id);
        MemoryConnection {
            store: self.clone(),
            connection_id: id,
            uid: Mutex::new(None),
        }
    }

    /// 쓰기 실패를 흉내 냅니다. 오프라인 동안 모든 쓰기는 `WriteFailed` 로 실패합니다.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    pub fn set_auth_available(&self, available: bool) {
        self.inner.lock().auth_available = available;
    }

    /// 해당 경로에 직접 커밋된 쓰기 횟수
    pub fn write_count(&self, path: &str) -> u64 {
        let key = segments(path).join("/");
        self.inner.lock().write_counts.get(&key).copied().unwrap_or(0)
    }

    /// 동기 읽기 (테스트, 디버깅용)
    pub fn peek(&self, path: &str) -> Option<Value> {
        let inner = self.inner.lock();
        read_at(&inner.root, &segments(path)).cloned()
    }

    fn ensure_online(inner: &StoreInner, path: &str) -> Result<(), SyncError> {
        if inner.offline {
            return Err(SyncError::WriteFailed {
                path: path.to_string(),
                reason: "store is offline".to_string(),
            });
        }
        Ok(())
    }

    fn commit(inner: &mut StoreInner, path: &str, value: Value) {
        let segs = segments(path);
        write_at(&mut inner.root, &segs, value);
        *inner.write_counts.entry(segs.join("/")).or_insert(0) += 1;
        Self::notify(inner, path);
    }

    fn notify(inner: &mut StoreInner, path: &str) {
        let root = &inner.root;
        inner.watchers.retain(|watcher| {
            if !paths::overlaps(&watcher.path, path) {
                return true;
            }
            let current = read_at(root, &segments(&watcher.path)).cloned();
            watcher.tx.send(current).is_ok()
        });
    }

    fn apply(inner: &mut StoreInner, op: DisconnectOp) {
        match op {
            DisconnectOp::Remove(path) => Self::commit(inner, &path, Value::Null),
            DisconnectOp::Set { path, value } => Self::commit(inner, &path, value),
            DisconnectOp::Update { path, fields } => {
                let merged = merge_fields(read_at(&inner.root, &segments(&path)).cloned(), fields);
                Self::commit(inner, &path, merged);
            }
        }
    }

    fn unwatch(&self, id: u64) {
        self.inner.lock().watchers.retain(|watcher| watcher.id != id);
    }
}

/// `MemoryStore` 에 대한 하나의 클라이언트 연결.
pub struct MemoryConnection {
    store: MemoryStore,
    connection_id: u64,
    uid: Mutex<Option<String>>,
}

impl MemoryConnection {
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// 연결 종료. 등록된 연결 종료 훅을 등록 순서대로 실행합니다.
    pub fn disconnect(&self) {
        let mut inner = self.store.inner.lock();
        let hooks = inner.hooks.remove(&self.connection_id).unwrap_or_default();
        info!(
            "Connection {} dropped, running {} disconnect hook(s)",
            self.connection_id,
            hooks.len()
        );
        for op in hooks {
            MemoryStore::apply(&mut inner, op);
        }
    }
}

#[async_trait]
impl SharedStore for MemoryConnection {
    async fn sign_in_anonymously(&self) -> Result<String, SyncError> {
        if !self.store.inner.lock().auth_available {
            warn!("Anonymous sign-in rejected: auth backend unavailable");
            return Err(SyncError::Unavailable);
        }
        let mut uid = self.uid.lock();
        let id = uid
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();
        Ok(id)
    }

    fn uid(&self) -> Option<String> {
        self.uid.lock().clone()
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, SyncError> {
        let inner = self.store.inner.lock();
        if inner.offline {
            return Err(SyncError::Unavailable);
        }
        Ok(read_at(&inner.root, &segments(path)).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError> {
        let mut inner = self.store.inner.lock();
        MemoryStore::ensure_online(&inner, path)?;
        MemoryStore::commit(&mut inner, path, value);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), SyncError> {
        let mut inner = self.store.inner.lock();
        MemoryStore::ensure_online(&inner, path)?;
        let merged = merge_fields(read_at(&inner.root, &segments(path)).cloned(), fields);
        MemoryStore::commit(&mut inner, path, merged);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), SyncError> {
        self.set(path, Value::Null).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, SyncError> {
        let mut inner = self.store.inner.lock();
        MemoryStore::ensure_online(&inner, path)?;
        inner.next_push += 1;
        // 사전순 정렬이 삽입 순서와 같도록 0 을 채운 키를 사용합니다.
        let key = format!("{:020}", inner.next_push);
        MemoryStore::commit(&mut inner, &paths::child(path, &key), value);
        Ok(key)
    }

    async fn transaction(
        &self,
        path: &str,
        update: TransactionFn<'_>,
    ) -> Result<TransactionOutcome, SyncError> {
        let mut inner = self.store.inner.lock();
        MemoryStore::ensure_online(&inner, path)?;
        let current = read_at(&inner.root, &segments(path)).cloned();
        match update(current.clone()) {
            Some(next) => {
                MemoryStore::commit(&mut inner, path, next.clone());
                Ok(TransactionOutcome::Committed(Some(next).filter(|v| !v.is_null())))
            }
            None => Ok(TransactionOutcome::Aborted(current)),
        }
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, SyncError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.store.inner.lock();
            inner.next_watcher += 1;
            let id = inner.next_watcher;
            // 구독 직후 현재 값을 한 번 전달합니다.
            let _ = tx.send(read_at(&inner.root, &segments(path)).cloned());
            inner.watchers.push(Watcher {
                id,
                path: path.to_string(),
                tx,
            });
            id
        };
        let store = self.store.clone();
        Ok(Subscription::new(
            path,
            rx,
            Box::new(move || store.unwatch(id)),
        ))
    }

    async fn on_disconnect(&self, op: DisconnectOp) -> Result<(), SyncError> {
        let mut inner = self.store.inner.lock();
        inner.hooks.entry(self.connection_id).or_default().push(op);
        Ok(())
    }

    async fn cancel_on_disconnect(&self) -> Result<(), SyncError> {
        self.store.inner.lock().hooks.remove(&self.connection_id);
        Ok(())
    }
}

// ===================================================================
// JSON 트리 조작
// ===================================================================

fn read_at<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    segs.iter()
        .try_fold(root, |node, seg| node.as_object().and_then(|map| map.get(*seg)))
}

/// 경로에 값을 씁니다. `Null` 은 삭제이며, 비게 된 부모 객체도 함께 정리합니다.
fn write_at(node: &mut Value, segs: &[&str], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Some(map) = node.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        if value.is_null() {
            map.remove(*head);
        } else {
            map.insert(head.to_string(), value);
        }
        return;
    }
    if value.is_null() && !map.contains_key(*head) {
        return;
    }
    let child = map
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    write_at(child, rest, value);
    if child.as_object().is_some_and(Map::is_empty) {
        map.remove(*head);
    }
}

fn merge_fields(current: Option<Value>, fields: Map<String, Value>) -> Value {
    let mut base = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in fields {
        if value.is_null() {
            base.remove(&key);
        } else {
            base.insert(key, value);
        }
    }
    Value::Object(base)
}
