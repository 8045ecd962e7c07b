use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    enums::{SUMMON_LIMIT_PER_TURN, TURN_TIMER_SECONDS},
    exception::StateError,
};

use super::phase::Phase;

/// 턴 진행의 결과
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    PhaseChanged(Phase),
    TurnEnded { next_player: String },
    TimeUp { next_player: String },
}

/// 호스트와 게스트가 번갈아 진행하는 턴/페이즈 상태.
///
/// 진행 권한은 현재 턴 플레이어에게만 있습니다.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    participants: [String; 2],
    current_turn_player: String,
    phase: Phase,
    turn_count: u32,
    summons_this_turn: u32,
    time_remaining: u32,
    summon_limit: u32,
    turn_seconds: u32,
}

impl TurnState {
    /// 호스트가 첫 턴을 가져갑니다.
    pub fn new(host: impl Into<String>, guest: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            current_turn_player: host.clone(),
            participants: [host, guest.into()],
            phase: Phase::Draw,
            turn_count: 1,
            summons_this_turn: 0,
            time_remaining: TURN_TIMER_SECONDS,
            summon_limit: SUMMON_LIMIT_PER_TURN,
            turn_seconds: TURN_TIMER_SECONDS,
        }
    }

    pub fn with_rules(mut self, summon_limit: u32, turn_seconds: u32) -> Self {
        self.summon_limit = summon_limit;
        self.turn_seconds = turn_seconds;
        self.time_remaining = turn_seconds;
        self
    }

    /// 상대 스냅샷에서 받은 값으로 턴 상태를 복원합니다.
    pub fn from_remote(
        participants: [String; 2],
        current_turn_player: String,
        phase: Phase,
        turn_count: u32,
        time_remaining: u32,
    ) -> Self {
        Self {
            participants,
            current_turn_player,
            phase,
            turn_count,
            summons_this_turn: 0,
            time_remaining,
            summon_limit: SUMMON_LIMIT_PER_TURN,
            turn_seconds: TURN_TIMER_SECONDS,
        }
    }

    // Getter 메서드들
    pub fn participants(&self) -> &[String; 2] {
        &self.participants
    }

    pub fn current_turn_player(&self) -> &str {
        &self.current_turn_player
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn summons_this_turn(&self) -> u32 {
        self.summons_this_turn
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn summon_limit(&self) -> u32 {
        self.summon_limit
    }

    pub fn turn_seconds(&self) -> u32 {
        self.turn_seconds
    }

    pub fn is_turn_of(&self, player: &str) -> bool {
        self.current_turn_player == player
    }

    pub fn opponent_of(&self, player: &str) -> &str {
        if self.participants[0] == player {
            &self.participants[1]
        } else {
            &self.participants[0]
        }
    }

    pub fn can_summon(&self) -> bool {
        self.summons_this_turn < self.summon_limit
    }

    pub fn record_summon(&mut self) {
        self.summons_this_turn += 1;
    }

    fn ensure_turn_of(&self, by: &str) -> Result<(), StateError> {
        if self.is_turn_of(by) {
            Ok(())
        } else {
            Err(StateError::NotYourTurn {
                player: by.to_string(),
            })
        }
    }

    /// 다음 페이즈로 진행합니다. End 에서 진행하면 턴이 넘어갑니다.
    pub fn advance_phase(&mut self, by: &str) -> Result<TurnEvent, StateError> {
        self.ensure_turn_of(by)?;
        match self.phase.next() {
            Some(next) => {
                self.phase = next;
                debug!("Phase advanced to {} by {}", next, by);
                Ok(TurnEvent::PhaseChanged(next))
            }
            None => Ok(self.end_turn()),
        }
    }

    /// 원하는 페이즈로 바로 이동합니다.
    pub fn change_phase(&mut self, by: &str, phase: Phase) -> Result<TurnEvent, StateError> {
        self.ensure_turn_of(by)?;
        self.phase = phase;
        Ok(TurnEvent::PhaseChanged(phase))
    }

    /// 턴 종료: 플레이어 교대, 드로우 페이즈, 소환 횟수와 타이머 초기화.
    pub fn end_turn(&mut self) -> TurnEvent {
        let next = self.opponent_of(&self.current_turn_player).to_string();
        self.current_turn_player = next.clone();
        self.phase = Phase::Draw;
        self.summons_this_turn = 0;
        self.time_remaining = self.turn_seconds;
        self.turn_count += 1;
        debug!("Turn {} begins for {}", self.turn_count, next);
        TurnEvent::TurnEnded { next_player: next }
    }

    pub fn request_end_turn(&mut self, by: &str) -> Result<TurnEvent, StateError> {
        self.ensure_turn_of(by)?;
        Ok(self.end_turn())
    }

    /// 타이머를 감소시킵니다. 0 이 되면 턴이 자동으로 종료됩니다.
    pub fn tick(&mut self, seconds: u32) -> Option<TurnEvent> {
        self.time_remaining = self.time_remaining.saturating_sub(seconds);
        if self.time_remaining > 0 {
            return None;
        }
        match self.end_turn() {
            TurnEvent::TurnEnded { next_player } => Some(TurnEvent::TimeUp { next_player }),
            other => Some(other),
        }
    }

    /// 상대의 턴 상태를 받아들입니다. 규칙 값(소환 제한, 턴 시간)은 유지합니다.
    pub fn adopt(&mut self, remote: &TurnState) {
        if remote.turn_count != self.turn_count {
            self.summons_this_turn = 0;
        }
        self.participants = remote.participants.clone();
        self.current_turn_player = remote.current_turn_player.clone();
        self.phase = remote.phase;
        self.turn_count = remote.turn_count;
        self.time_remaining = remote.time_remaining;
    }

    /// `author` 가 게시한 턴 상태 `remote` 를 받아들여야 하는지 판단합니다.
    ///
    /// 턴 수는 더 큰 쪽만 받아들입니다. 같은 턴 안에서는 그 턴의 플레이어가 페이즈와 타이머의 기준이므로,
    /// 되돌아간 페이즈(직접 선택)나 줄어든 타이머도 그대로 따라갑니다.
    pub fn should_adopt(&self, remote: &TurnState, author: &str) -> bool {
        if remote.turn_count != self.turn_count {
            return remote.turn_count > self.turn_count;
        }
        remote.is_turn_of(author)
            && (remote.current_turn_player != self.current_turn_player
                || remote.phase != self.phase
                || remote.time_remaining != self.time_remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_advances_hand_the_turn_over() {
        let mut turn = TurnState::new("host", "guest");
        turn.record_summon();
        for _ in 0..5 {
            assert!(matches!(
                turn.advance_phase("host").unwrap(),
                TurnEvent::PhaseChanged(_)
            ));
        }
        assert_eq!(turn.phase(), Phase::End);

        let event = turn.advance_phase("host").unwrap();
        assert_eq!(
            event,
            TurnEvent::TurnEnded {
                next_player: "guest".to_string()
            }
        );
        assert_eq!(turn.phase(), Phase::Draw);
        assert_eq!(turn.current_turn_player(), "guest");
        assert_eq!(turn.summons_this_turn(), 0);
        assert_eq!(turn.turn_count(), 2);
        assert_eq!(turn.time_remaining(), TURN_TIMER_SECONDS);
    }

    #[test]
    fn only_the_turn_player_may_advance() {
        let mut turn = TurnState::new("host", "guest");
        assert_eq!(
            turn.advance_phase("guest"),
            Err(StateError::NotYourTurn {
                player: "guest".to_string()
            })
        );
        assert_eq!(turn.phase(), Phase::Draw);
    }

    #[test]
    fn timer_expiry_ends_the_turn() {
        let mut turn = TurnState::new("host", "guest").with_rules(5, 10);
        assert_eq!(turn.tick(4), None);
        assert_eq!(turn.time_remaining(), 6);
        assert_eq!(
            turn.tick(6),
            Some(TurnEvent::TimeUp {
                next_player: "guest".to_string()
            })
        );
        assert_eq!(turn.time_remaining(), 10);
    }

    #[test]
    fn newer_turn_count_wins() {
        let mut ahead = TurnState::new("host", "guest");
        let behind = ahead.clone();
        ahead.end_turn();
        assert!(behind.should_adopt(&ahead, "host"));
        assert!(!ahead.should_adopt(&behind, "host"));
        assert!(!behind.should_adopt(&behind.clone(), "host"));
    }

    #[test]
    fn turn_player_owns_phase_and_timer() {
        let mirror = TurnState::new("host", "guest");
        let mut active = mirror.clone();
        active.change_phase("host", Phase::Battle).unwrap();
        active.change_phase("host", Phase::Main1).unwrap();
        active.tick(7);
        assert!(mirror.should_adopt(&active, "host"));

        // 턴 플레이어가 아닌 쪽의 사본은 기준이 아닙니다.
        assert!(!active.should_adopt(&mirror, "guest"));
    }
}
