use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    enums::CHAT_HISTORY_LIMIT,
    exception::SyncError,
    store::{paths, SharedStore},
};

use super::{ChatMessage, EntryLog, EntryStream};

/// `chat/{gameId}` 채팅 스트림. 최근 100 개 메시지만 읽습니다.
pub struct ChatStream {
    log: EntryLog<ChatMessage>,
    player_name: String,
}

impl ChatStream {
    pub fn new(store: Arc<dyn SharedStore>, game_id: &str, player_name: impl Into<String>) -> Self {
        Self::with_limit(store, game_id, player_name, CHAT_HISTORY_LIMIT)
    }

    pub fn with_limit(
        store: Arc<dyn SharedStore>,
        game_id: &str,
        player_name: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            log: EntryLog::new(store, paths::chat(game_id), limit),
            player_name: player_name.into(),
        }
    }

    /// 공백뿐인 메시지는 보내지 않습니다.
    pub async fn send(&self, message: &str) -> Result<Option<ChatMessage>, SyncError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let entry = ChatMessage::new(self.player_name.clone(), trimmed);
        match self.log.append(&entry).await {
            Ok(key) => {
                debug!("Chat message {} pushed to {}", key, self.log.path());
                Ok(Some(entry))
            }
            Err(e) => {
                warn!("Failed to send chat message: {}", e);
                Err(e)
            }
        }
    }

    pub async fn history(&self) -> Result<Vec<ChatMessage>, SyncError> {
        self.log.history().await
    }

    pub async fn subscribe(&self) -> Result<EntryStream<ChatMessage>, SyncError> {
        self.log.subscribe().await
    }
}
