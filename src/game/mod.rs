pub mod battle;
pub mod movement;
pub mod phase;
pub mod turn;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    card::{cards::CardVecExt, deck::BuiltDeck},
    enums::{
        ZoneType, ACTION_HISTORY_LIMIT, CHAT_HISTORY_LIMIT, INITIAL_LIFE_POINTS,
        OPENING_HAND_SIZE, SUMMON_LIMIT_PER_TURN, TURN_TIMER_SECONDS,
    },
    exception::StateError,
    stream::{merge_by_id, ChatMessage, LogEntry},
    sync::snapshot::GameStateSnapshot,
    zone::{insert::BottomInsert, FieldView, Pile, PlayerField},
};

use battle::BattleEvent;
use phase::Phase;
use turn::{TurnEvent, TurnState};

/// 대전 규칙 값. 설정 파일의 `[rules]` 섹션과 같은 형식입니다.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub summon_limit: u32,
    pub turn_seconds: u32,
    pub initial_life_points: i32,
    pub opening_hand: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            summon_limit: SUMMON_LIMIT_PER_TURN,
            turn_seconds: TURN_TIMER_SECONDS,
            initial_life_points: INITIAL_LIFE_POINTS,
            opening_hand: OPENING_HAND_SIZE,
        }
    }
}

/// 상대 스냅샷을 그대로 비춘 읽기 전용 화면.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OpponentView {
    pub player_id: String,
    pub player_name: String,
    pub field: FieldView,
    pub life_points: i32,
    pub hand_count: usize,
    pub ready: bool,
    pub last_update: i64,
}

/// 원격 스냅샷 반영 결과
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteMerge {
    pub adopted_turn: bool,
    pub applied_battle_events: usize,
    pub opponent_ready: bool,
}

/// 한 플레이어의 권위 있는 로컬 상태.
///
/// 모든 전이는 `&self` 를 받아 새 상태를 돌려주는 순수 함수이며, 거부된 전이는 기존 상태를 건드리지 않습니다.
/// 승인된 전이마다 `version` 이 1 증가합니다.
#[derive(Clone, Debug)]
pub struct DuelState {
    version: u64,
    player_id: String,
    player_name: String,
    rules: Rules,
    field: PlayerField,
    life_points: i32,
    turn: TurnState,
    started: bool,
    action_log: Vec<LogEntry>,
    chat_messages: Vec<ChatMessage>,
    battle_events: Vec<BattleEvent>,
    applied_battle_events: HashSet<Uuid>,
    opponent: Option<OpponentView>,
}

impl DuelState {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self::with_rules(player_id, player_name, Rules::default())
    }

    pub fn with_rules(player_id: impl Into<String>, player_name: impl Into<String>, rules: Rules) -> Self {
        let player_id = player_id.into();
        Self {
            version: 0,
            turn: TurnState::new(player_id.clone(), String::new())
                .with_rules(rules.summon_limit, rules.turn_seconds),
            player_id,
            player_name: player_name.into(),
            life_points: rules.initial_life_points,
            rules,
            field: PlayerField::new(),
            started: false,
            action_log: Vec::new(),
            chat_messages: Vec::new(),
            battle_events: Vec::new(),
            applied_battle_events: HashSet::new(),
            opponent: None,
        }
    }

    // Getter 메서드들
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn field(&self) -> &PlayerField {
        &self.field
    }

    pub fn life_points(&self) -> i32 {
        self.life_points
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn action_log(&self) -> &[LogEntry] {
        &self.action_log
    }

    pub fn chat_messages(&self) -> &[ChatMessage] {
        &self.chat_messages
    }

    pub fn battle_events(&self) -> &[BattleEvent] {
        &self.battle_events
    }

    pub fn opponent(&self) -> Option<&OpponentView> {
        self.opponent.as_ref()
    }

    pub fn is_my_turn(&self) -> bool {
        self.started && self.turn.is_turn_of(&self.player_id)
    }

    /// 라이프 포인트 0 은 기록만 되고 대전을 강제로 끝내지는 않습니다.
    pub fn is_defeated(&self) -> bool {
        self.life_points <= 0
    }

    /// 행동 로그를 남기고 버전을 올립니다.
    pub(crate) fn record(&mut self, action: impl Into<String>) -> &LogEntry {
        let entry = LogEntry::new(self.player_name.clone(), action);
        debug!("[{}] {}", self.player_name, entry.action);
        self.version += 1;
        self.action_log.push(entry);
        if self.action_log.len() > ACTION_HISTORY_LIMIT {
            let overflow = self.action_log.len() - ACTION_HISTORY_LIMIT;
            self.action_log.drain(..overflow);
        }
        &self.action_log[self.action_log.len() - 1]
    }

    // ===================================================================
    // 덱, 대전 시작
    // ===================================================================

    /// 덱을 섞어 배치하고 첫 패를 나눠 줍니다.
    pub fn load_deck(&self, deck: BuiltDeck) -> DuelState {
        let mut next = self.clone();
        let mut main = deck.main;
        main.shuffle();
        let main_count = main.len();
        let extra_count = deck.extra.len();
        *next.field.deck_mut() = Pile::with_cards(ZoneType::Deck, main);
        if let Some(extra) = next.field.pile_mut(ZoneType::ExtraDeck) {
            *extra = Pile::with_cards(ZoneType::ExtraDeck, deck.extra);
        }
        let opening = next.field.deck_mut().take_top(self.rules.opening_hand);
        if let Some(hand) = next.field.pile_mut(ZoneType::Hand) {
            for card in opening {
                hand.add(card, &BottomInsert);
            }
        }
        next.record(format!(
            "loaded a deck of {} cards ({} extra)",
            main_count, extra_count
        ));
        next
    }

    /// 양쪽이 준비되면 호출됩니다. 호스트가 첫 턴을 가져갑니다.
    pub fn start(&self, host: &str, guest: &str) -> DuelState {
        let mut next = self.clone();
        next.turn = TurnState::new(host, guest)
            .with_rules(self.rules.summon_limit, self.rules.turn_seconds);
        next.started = true;
        info!("Duel started: {} vs {}", host, guest);
        next.record("duel started");
        next
    }

    // ===================================================================
    // 턴, 페이즈
    // ===================================================================

    fn ensure_started(&self) -> Result<(), StateError> {
        if self.started {
            Ok(())
        } else {
            Err(StateError::GameNotStarted)
        }
    }

    fn record_turn_event(&mut self, event: &TurnEvent) {
        match event {
            TurnEvent::PhaseChanged(phase) => {
                self.record(format!("changed phase to {}", phase));
            }
            TurnEvent::TurnEnded { .. } => {
                self.record("ended turn");
            }
            TurnEvent::TimeUp { .. } => {
                self.record("time up! Turn ended automatically");
                self.record("ended turn");
            }
        }
    }

    pub fn advance_phase(&self) -> Result<DuelState, StateError> {
        self.ensure_started()?;
        let mut next = self.clone();
        let event = next.turn.advance_phase(&self.player_id)?;
        next.record_turn_event(&event);
        Ok(next)
    }

    pub fn change_phase(&self, phase: Phase) -> Result<DuelState, StateError> {
        self.ensure_started()?;
        let mut next = self.clone();
        let event = next.turn.change_phase(&self.player_id, phase)?;
        next.record_turn_event(&event);
        Ok(next)
    }

    pub fn end_turn(&self) -> Result<DuelState, StateError> {
        self.ensure_started()?;
        let mut next = self.clone();
        let event = next.turn.request_end_turn(&self.player_id)?;
        next.record_turn_event(&event);
        Ok(next)
    }

    /// 내 턴일 때만 타이머를 진행합니다. 상태가 바뀌지 않으면 `None`.
    pub fn tick(&self, seconds: u32) -> Option<DuelState> {
        if !self.is_my_turn() || seconds == 0 {
            return None;
        }
        let mut next = self.clone();
        match next.turn.tick(seconds) {
            Some(event) => next.record_turn_event(&event),
            // 타이머 감소만으로는 로그를 남기지 않습니다.
            None => next.version += 1,
        }
        Some(next)
    }

    // ===================================================================
    // 라이프 포인트, 채팅
    // ===================================================================

    pub fn set_life_points(&self, value: i32) -> DuelState {
        let mut next = self.clone();
        next.life_points = value.max(0);
        next.record(format!("changed life points to {}", next.life_points));
        next
    }

    pub fn adjust_life_points(&self, delta: i32) -> DuelState {
        self.set_life_points(self.life_points.saturating_add(delta))
    }

    pub fn add_chat_message(&self, message: ChatMessage) -> DuelState {
        let mut next = self.clone();
        next.chat_messages = merge_by_id(&self.chat_messages, &[message], CHAT_HISTORY_LIMIT);
        next.version += 1;
        next
    }

    /// 채팅 스트림에서 받은 목록을 합칩니다. 새 메시지가 없으면 `None`.
    pub fn merge_chat(&self, messages: &[ChatMessage]) -> Option<DuelState> {
        let merged = merge_by_id(&self.chat_messages, messages, CHAT_HISTORY_LIMIT);
        if merged == self.chat_messages {
            return None;
        }
        let mut next = self.clone();
        next.chat_messages = merged;
        next.version += 1;
        Some(next)
    }

    // ===================================================================
    // 원격 상태 반영
    // ===================================================================

    /// 상대 스냅샷을 반영합니다.
    ///
    /// 상대 필드는 읽기 전용 화면으로만 복사되고, 로그/채팅은 id 기준으로 합쳐집니다.
    /// 나를 향한 전투 이벤트는 한 번씩만 적용됩니다. 턴 상태는 상대의 턴 수가 더 크거나, 같은 턴에서 상대가 턴 플레이어일 때 받아들입니다.
    pub fn merge_remote(&self, opponent_id: &str, snapshot: &GameStateSnapshot) -> (DuelState, RemoteMerge) {
        let mut next = self.clone();
        let mut outcome = RemoteMerge {
            opponent_ready: snapshot.player_ready,
            ..RemoteMerge::default()
        };

        next.opponent = Some(OpponentView {
            player_id: opponent_id.to_string(),
            player_name: snapshot.player_name.clone(),
            field: snapshot.player_field.clone().normalized(),
            life_points: snapshot.player_life_points,
            hand_count: snapshot.player_hand_count,
            ready: snapshot.player_ready,
            last_update: snapshot.last_update,
        });
        next.action_log = merge_by_id(&self.action_log, &snapshot.action_log, ACTION_HISTORY_LIMIT);
        next.chat_messages =
            merge_by_id(&self.chat_messages, &snapshot.chat_messages, CHAT_HISTORY_LIMIT);

        for event in &snapshot.battle_events {
            if let Some(applied) = next.apply_battle_event(event) {
                next = applied;
                outcome.applied_battle_events += 1;
            }
        }
        // 상대가 더 이상 보내지 않는 이벤트 id 는 다시 올 수 없습니다.
        next.applied_battle_events
            .retain(|id| snapshot.battle_events.iter().any(|event| event.id == *id));

        if self.started {
            if let Some(remote_turn) = snapshot.turn_state() {
                if next.turn.should_adopt(&remote_turn, opponent_id) {
                    next.turn.adopt(&remote_turn);
                    outcome.adopted_turn = true;
                }
            }
        }

        next.version += 1;
        (next, outcome)
    }
}
