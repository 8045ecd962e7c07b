use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::exception::{GameError, ZoneError};

pub const MONSTER_ZONE_SIZE: usize = 5;
pub const SPELL_TRAP_ZONE_SIZE: usize = 5;
pub const FIELD_SPELL_ZONE_SIZE: usize = 1;

pub const INITIAL_LIFE_POINTS: i32 = 8000;
pub const OPENING_HAND_SIZE: usize = 5;
pub const SUMMON_LIMIT_PER_TURN: u32 = 5;
pub const TURN_TIMER_SECONDS: u32 = 60;
pub const MAX_CARD_COPIES: u32 = 3;
pub const MAX_EXTRA_DECK_SIZE: usize = 15;

pub const HEARTBEAT_INTERVAL: u64 = 30;
pub const CHAT_HISTORY_LIMIT: usize = 100;
pub const ACTION_HISTORY_LIMIT: usize = 200;

pub const SESSIONS_ROOT: &str = "sessions";
pub const GAME_STATES_ROOT: &str = "gameStates";
pub const CHAT_ROOT: &str = "chat";
pub const ACTIONS_ROOT: &str = "actions";
pub const CONNECTION_TEST_ROOT: &str = "connection_test";

/// 플레이어 필드를 구성하는 영역 종류.
///
/// 직렬화 이름은 스냅샷 스키마의 키와 동일합니다. (`spellsTraps`, `deadZone` ...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneType {
    Hand,
    Deck,
    Monsters,
    SpellsTraps,
    FieldSpell,
    DeadZone,
    Banished,
    BanishedFaceDown,
    ExtraDeck,
}

impl ZoneType {
    pub const ALL: [ZoneType; 9] = [
        ZoneType::Hand,
        ZoneType::Deck,
        ZoneType::Monsters,
        ZoneType::SpellsTraps,
        ZoneType::FieldSpell,
        ZoneType::DeadZone,
        ZoneType::Banished,
        ZoneType::BanishedFaceDown,
        ZoneType::ExtraDeck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Hand => "hand",
            ZoneType::Deck => "deck",
            ZoneType::Monsters => "monsters",
            ZoneType::SpellsTraps => "spellsTraps",
            ZoneType::FieldSpell => "fieldSpell",
            ZoneType::DeadZone => "deadZone",
            ZoneType::Banished => "banished",
            ZoneType::BanishedFaceDown => "banishedFaceDown",
            ZoneType::ExtraDeck => "extraDeck",
        }
    }

    /// 고정 길이 슬롯 영역이면 슬롯 수를 반환합니다.
    pub fn slot_count(&self) -> Option<usize> {
        match self {
            ZoneType::Monsters => Some(MONSTER_ZONE_SIZE),
            ZoneType::SpellsTraps => Some(SPELL_TRAP_ZONE_SIZE),
            ZoneType::FieldSpell => Some(FIELD_SPELL_ZONE_SIZE),
            _ => None,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hand" => Ok(ZoneType::Hand),
            "deck" => Ok(ZoneType::Deck),
            "monsters" => Ok(ZoneType::Monsters),
            "spellsTraps" => Ok(ZoneType::SpellsTraps),
            "fieldSpell" => Ok(ZoneType::FieldSpell),
            // 구버전 클라이언트는 묘지를 graveyard 로 부릅니다.
            "deadZone" | "graveyard" => Ok(ZoneType::DeadZone),
            "banished" => Ok(ZoneType::Banished),
            "banishedFaceDown" => Ok(ZoneType::BanishedFaceDown),
            "extraDeck" => Ok(ZoneType::ExtraDeck),
            other => Err(GameError::Zone(ZoneError::InvalidZone(other.to_string()))),
        }
    }
}

/// 덱에 카드를 넣는 방식.
#[derive(Clone, Debug, PartialEq, Eq, Copy)]
pub enum DeckPlacement {
    Top,
    Bottom,
    Shuffle,
}

/// 이동 목적지. 덱은 삽입 방식까지 포함합니다.
#[derive(Clone, Debug, PartialEq, Eq, Copy)]
pub enum Destination {
    Zone(ZoneType),
    Deck(DeckPlacement),
}

impl Destination {
    pub fn zone(&self) -> ZoneType {
        match self {
            Destination::Zone(zone) => *zone,
            Destination::Deck(_) => ZoneType::Deck,
        }
    }
}

impl From<ZoneType> for Destination {
    fn from(zone: ZoneType) -> Self {
        match zone {
            // 단순히 "deck" 으로 보내면 맨 아래에 넣습니다.
            ZoneType::Deck => Destination::Deck(DeckPlacement::Bottom),
            other => Destination::Zone(other),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Zone(zone) => write!(f, "{}", zone),
            Destination::Deck(DeckPlacement::Top) => write!(f, "deck_top"),
            Destination::Deck(DeckPlacement::Bottom) => write!(f, "deck_bottom"),
            Destination::Deck(DeckPlacement::Shuffle) => write!(f, "deck_shuffle"),
        }
    }
}

impl FromStr for Destination {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deck_top" => Ok(Destination::Deck(DeckPlacement::Top)),
            "deck_bottom" => Ok(Destination::Deck(DeckPlacement::Bottom)),
            "deck_shuffle" => Ok(Destination::Deck(DeckPlacement::Shuffle)),
            other => other.parse::<ZoneType>().map(Destination::from),
        }
    }
}
