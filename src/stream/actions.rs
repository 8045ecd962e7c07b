use std::sync::Arc;

use tracing::warn;

use crate::{
    enums::ACTION_HISTORY_LIMIT,
    exception::SyncError,
    store::{paths, SharedStore},
};

use super::{EntryLog, EntryStream, LogEntry};

/// `actions/{gameId}` 행동 기록 스트림. 최근 200 개 항목만 읽습니다.
pub struct ActionStream {
    log: EntryLog<LogEntry>,
}

impl ActionStream {
    pub fn new(store: Arc<dyn SharedStore>, game_id: &str) -> Self {
        Self::with_limit(store, game_id, ACTION_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn SharedStore>, game_id: &str, limit: usize) -> Self {
        Self {
            log: EntryLog::new(store, paths::actions(game_id), limit),
        }
    }

    pub async fn record(&self, entry: &LogEntry) -> Result<(), SyncError> {
        self.log.append(entry).await.map(|_| ()).map_err(|e| {
            warn!("Failed to record action '{}': {}", entry.action, e);
            e
        })
    }

    pub async fn history(&self) -> Result<Vec<LogEntry>, SyncError> {
        self.log.history().await
    }

    pub async fn subscribe(&self) -> Result<EntryStream<LogEntry>, SyncError> {
        self.log.subscribe().await
    }
}
