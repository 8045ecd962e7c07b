pub mod cards;
pub mod deck;
pub mod types;

use serde::{Deserialize, Serialize};
use types::{CardId, CardKind, MonsterStats, Placement, Position};

/// 필드 위를 오가는 카드 한 장.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    id: CardId,
    #[serde(default)]
    code: String,
    name: String,
    #[serde(flatten)]
    kind: CardKind,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    face_down: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placement: Option<Placement>,
}

impl Card {
    pub fn new(id: CardId, code: impl Into<String>, name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            kind,
            position: Position::Attack,
            face_down: false,
            placement: None,
        }
    }

    pub fn monster(name: impl Into<String>, atk: i32, def: i32, star: u8) -> Self {
        Self::new(
            CardId::new(),
            "",
            name,
            CardKind::Monster(MonsterStats { atk, def, star }),
        )
    }

    pub fn token(name: impl Into<String>, atk: i32, def: i32) -> Self {
        Self::new(
            CardId::new(),
            "",
            name,
            CardKind::Token(MonsterStats { atk, def, star: 1 }),
        )
    }

    pub fn spell(name: impl Into<String>) -> Self {
        Self::new(CardId::new(), "", name, CardKind::Spell)
    }

    pub fn trap(name: impl Into<String>) -> Self {
        Self::new(CardId::new(), "", name, CardKind::Trap)
    }

    // Getter/Setter 메서드들
    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CardKind {
        &self.kind
    }

    pub fn stats(&self) -> Option<&MonsterStats> {
        self.kind.stats()
    }

    pub fn atk(&self) -> Option<i32> {
        self.kind.stats().map(|s| s.atk)
    }

    pub fn def(&self) -> Option<i32> {
        self.kind.stats().map(|s| s.def)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_face_down(&self) -> bool {
        self.face_down
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// 소환 횟수 제한에 포함되는 카드인지 여부 (토큰 제외)
    pub fn counts_as_summon(&self) -> bool {
        matches!(self.kind, CardKind::Monster(_))
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_face_down(mut self, face_down: bool) -> Self {
        self.face_down = face_down;
        self
    }

    /// 몬스터형이 아닌 카드에는 아무 효과가 없습니다.
    pub fn with_atk(mut self, atk: i32) -> Self {
        if let Some(stats) = self.kind.stats_mut() {
            stats.atk = atk;
        }
        self
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }
}
