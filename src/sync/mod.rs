pub mod heartbeat;
pub mod snapshot;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::{
    exception::SyncError,
    store::{paths, SharedStore, Subscription},
};

use snapshot::{comparable, GameStateSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Written,
    /// 직전에 발행한 스냅샷과 구조적으로 같아 쓰지 않음
    Skipped,
}

/// 내 스냅샷을 발행하고 상대 스냅샷을 구독합니다.
///
/// 쓰기는 `gameStates/{gameId}/{ownUid}` 에만, 읽기는 상대 노드에서만 합니다.
pub struct SyncEngine {
    store: Arc<dyn SharedStore>,
    game_id: String,
    uid: String,
    last_published: Option<Value>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn SharedStore>, game_id: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            store,
            game_id: game_id.into(),
            uid: uid.into(),
            last_published: None,
        }
    }

    pub fn own_path(&self) -> String {
        paths::game_state(&self.game_id, &self.uid)
    }

    /// 스냅샷을 내 노드에 병합합니다.
    ///
    /// 실패는 로그를 남기고 그대로 돌려주며 재시도하지 않습니다. 이 경우 마지막 발행값이 바뀌지 않으므로
    /// 다음 발행이 자연스럽게 다시 시도됩니다.
    pub async fn publish(&mut self, snapshot: &GameStateSnapshot) -> Result<PublishOutcome, SyncError> {
        let path = self.own_path();
        let value = snapshot.to_value()?;
        let key = comparable(&value);
        if self.last_published.as_ref() == Some(&key) {
            debug!("Snapshot for {} unchanged, skipping publish", path);
            return Ok(PublishOutcome::Skipped);
        }

        let fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        // 기존 필드(준비 상태 등)는 남기고 스냅샷 필드만 덮어씁니다.
        let mut merge = move |current: Option<Value>| {
            let mut base = match current {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            for (key, value) in fields.clone() {
                base.insert(key, value);
            }
            Some(Value::Object(base))
        };

        match self.store.transaction(&path, &mut merge).await {
            Ok(_) => {
                debug!("Published snapshot to {}", path);
                self.last_published = Some(key);
                Ok(PublishOutcome::Written)
            }
            Err(e) => {
                let err = match e {
                    SyncError::WriteFailed { .. } => e,
                    other => SyncError::WriteFailed {
                        path: path.clone(),
                        reason: other.to_string(),
                    },
                };
                error!("Failed to publish game state: {}", err);
                Err(err)
            }
        }
    }

    pub async fn subscribe_opponent(&self, opponent_uid: &str) -> Result<SnapshotStream, SyncError> {
        let inner = self
            .store
            .subscribe(&paths::game_state(&self.game_id, opponent_uid))
            .await?;
        Ok(SnapshotStream { inner })
    }
}

/// 상대 스냅샷 구독. 노드가 삭제되면 `Some(None)` 이 전달됩니다.
pub struct SnapshotStream {
    inner: Subscription,
}

impl SnapshotStream {
    fn decode(path: &str, value: Option<Value>) -> Option<Option<GameStateSnapshot>> {
        match value {
            None => Some(None),
            Some(value) => match GameStateSnapshot::from_value(path, value) {
                Ok(snapshot) => Some(Some(snapshot)),
                Err(e) => {
                    warn!("Ignoring undecodable opponent snapshot: {}", e);
                    None
                }
            },
        }
    }

    pub async fn recv(&mut self) -> Option<Option<GameStateSnapshot>> {
        loop {
            let value = self.inner.recv().await?;
            if let Some(decoded) = Self::decode(self.inner.path(), value) {
                return Some(decoded);
            }
        }
    }

    /// 대기 중인 값이 없으면 바로 `None`.
    pub fn try_recv(&mut self) -> Option<Option<GameStateSnapshot>> {
        loop {
            let value = self.inner.try_recv()?;
            if let Some(decoded) = Self::decode(self.inner.path(), value) {
                return Some(decoded);
            }
        }
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
