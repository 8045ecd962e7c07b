use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    exception::SyncError,
    game::{battle::BattleEvent, phase::Phase, turn::TurnState, DuelState},
    stream::{ChatMessage, LogEntry},
    zone::{FieldView, Zone},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrder {
    pub host: String,
    pub guest: String,
}

/// `gameStates/{gameId}/{playerId}` 에 기록되는 플레이어별 상태.
///
/// 소유자만 쓰며, 패의 내용은 장수(`playerHandCount`)로만 공개됩니다.
/// `playerReady` 는 준비 상태 변경 시에만 기록되므로 발행 시에는 직렬화하지 않습니다.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStateSnapshot {
    pub player_field: FieldView,
    pub player_life_points: i32,
    pub player_hand_count: usize,
    pub current_phase: Phase,
    pub is_player_turn: bool,
    pub time_remaining: u32,
    pub action_log: Vec<LogEntry>,
    pub chat_messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_order: Option<TurnOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn_player_id: Option<String>,
    pub last_update: i64,
    pub player_name: String,
    pub turn_count: u32,
    pub battle_events: Vec<BattleEvent>,
    #[serde(skip_serializing)]
    pub player_ready: bool,
}

impl GameStateSnapshot {
    pub fn capture(state: &DuelState) -> Self {
        let turn = state.turn();
        let started = state.is_started();
        Self {
            player_field: state.field().to_view(),
            player_life_points: state.life_points(),
            player_hand_count: state.field().hand().len(),
            current_phase: turn.phase(),
            is_player_turn: state.is_my_turn(),
            time_remaining: turn.time_remaining(),
            action_log: state.action_log().to_vec(),
            chat_messages: state.chat_messages().to_vec(),
            turn_order: started.then(|| TurnOrder {
                host: turn.participants()[0].clone(),
                guest: turn.participants()[1].clone(),
            }),
            current_turn_player_id: started.then(|| turn.current_turn_player().to_string()),
            last_update: chrono::Utc::now().timestamp_millis(),
            player_name: state.player_name().to_string(),
            turn_count: turn.turn_count(),
            battle_events: state.battle_events().to_vec(),
            player_ready: false,
        }
    }

    /// 시작된 대전의 턴 상태. 턴 순서 정보가 없으면 `None`.
    pub fn turn_state(&self) -> Option<TurnState> {
        let order = self.turn_order.as_ref()?;
        let current = self.current_turn_player_id.clone()?;
        Some(TurnState::from_remote(
            [order.host.clone(), order.guest.clone()],
            current,
            self.current_phase,
            self.turn_count,
            self.time_remaining,
        ))
    }

    pub fn to_value(&self) -> Result<Value, SyncError> {
        serde_json::to_value(self).map_err(|e| SyncError::Decode {
            path: "snapshot".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_value(path: &str, value: Value) -> Result<Self, SyncError> {
        serde_json::from_value(value).map_err(|e| SyncError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// 발행 비교용 값. `lastUpdate` 는 매번 달라지므로 제외합니다.
pub(crate) fn comparable(value: &Value) -> Value {
    let mut value = value.clone();
    if let Some(map) = value.as_object_mut() {
        map.remove("lastUpdate");
    }
    value
}
