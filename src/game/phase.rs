use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::exception::{GameError, StateError};

/// 한 턴을 구성하는 페이즈. 순서대로 진행되며 End 다음은 상대 턴의 Draw 입니다.
#[derive(Clone, PartialEq, Eq, Copy, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    // 턴 시작, 카드 한 장을 뽑는 페이즈
    #[default]
    Draw,

    // 메인 페이즈 진입 전
    Standby,

    // 첫 번째 메인 페이즈 (소환, 세트)
    Main1,

    // 공격 선언
    Battle,

    // 배틀 이후 메인 페이즈
    Main2,

    // 턴 종료
    End,
}

impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order().cmp(&other.order())
    }
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Draw,
        Phase::Standby,
        Phase::Main1,
        Phase::Battle,
        Phase::Main2,
        Phase::End,
    ];

    pub fn order(&self) -> u8 {
        match self {
            Phase::Draw => 0,
            Phase::Standby => 1,
            Phase::Main1 => 2,
            Phase::Battle => 3,
            Phase::Main2 => 4,
            Phase::End => 5,
        }
    }

    /// 다음 페이즈. End 에서는 `None` 을 반환하며, 이 경우 턴이 넘어갑니다.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Draw => Some(Phase::Standby),
            Phase::Standby => Some(Phase::Main1),
            Phase::Main1 => Some(Phase::Battle),
            Phase::Battle => Some(Phase::Main2),
            Phase::Main2 => Some(Phase::End),
            Phase::End => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Draw => "draw",
            Phase::Standby => "standby",
            Phase::Main1 => "main1",
            Phase::Battle => "battle",
            Phase::Main2 => "main2",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| GameError::State(StateError::InvalidPhase(s.to_string())))
    }
}
