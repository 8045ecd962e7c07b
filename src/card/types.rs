use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::ZoneType;

/// 카드 실물 한 장의 식별자.
///
/// 카드 정의(이름/코드)가 아닌 인스턴스 단위로 발급됩니다. 같은 카드 3장은 서로 다른 `CardId` 를 가집니다.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CardId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CardId> for Uuid {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 몬스터 표시 형식
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Attack,
    Defense,
}

impl Position {
    pub fn flipped(self) -> Self {
        match self {
            Position::Attack => Position::Defense,
            Position::Defense => Position::Attack,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Attack => write!(f, "attack"),
            Position::Defense => write!(f, "defense"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub atk: i32,
    pub def: i32,
    #[serde(default)]
    pub star: u8,
}

/// 카드 종류. 공격력/수비력은 몬스터형(몬스터, 토큰)에만 존재합니다.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cardType", rename_all = "lowercase")]
pub enum CardKind {
    Monster(MonsterStats),
    Spell,
    Trap,
    Token(MonsterStats),
}

impl CardKind {
    pub fn stats(&self) -> Option<&MonsterStats> {
        match self {
            CardKind::Monster(stats) | CardKind::Token(stats) => Some(stats),
            CardKind::Spell | CardKind::Trap => None,
        }
    }

    pub fn stats_mut(&mut self) -> Option<&mut MonsterStats> {
        match self {
            CardKind::Monster(stats) | CardKind::Token(stats) => Some(stats),
            CardKind::Spell | CardKind::Trap => None,
        }
    }
}

/// 슬롯 영역에 놓였을 때 기록되는 배치 정보
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub zone: ZoneType,
    pub slot_index: usize,
}
