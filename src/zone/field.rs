use serde::{Deserialize, Serialize};

use crate::{
    card::{types::CardId, Card},
    enums::ZoneType,
};

use super::{Pile, SlotZone, Zone};

/// 한 플레이어의 아홉 개 영역 묶음. 소유자 클라이언트만 변경합니다.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerField {
    hand: Pile,
    deck: Pile,
    monsters: SlotZone,
    spells_traps: SlotZone,
    field_spell: SlotZone,
    dead_zone: Pile,
    banished: Pile,
    banished_face_down: Pile,
    extra_deck: Pile,
}

impl Default for PlayerField {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerField {
    pub fn new() -> Self {
        Self {
            hand: Pile::new(ZoneType::Hand),
            deck: Pile::new(ZoneType::Deck),
            monsters: SlotZone::new(ZoneType::Monsters),
            spells_traps: SlotZone::new(ZoneType::SpellsTraps),
            field_spell: SlotZone::new(ZoneType::FieldSpell),
            dead_zone: Pile::new(ZoneType::DeadZone),
            banished: Pile::new(ZoneType::Banished),
            banished_face_down: Pile::new(ZoneType::BanishedFaceDown),
            extra_deck: Pile::new(ZoneType::ExtraDeck),
        }
    }

    pub fn zone(&self, zone_type: ZoneType) -> &dyn Zone {
        match zone_type {
            ZoneType::Hand => &self.hand,
            ZoneType::Deck => &self.deck,
            ZoneType::Monsters => &self.monsters,
            ZoneType::SpellsTraps => &self.spells_traps,
            ZoneType::FieldSpell => &self.field_spell,
            ZoneType::DeadZone => &self.dead_zone,
            ZoneType::Banished => &self.banished,
            ZoneType::BanishedFaceDown => &self.banished_face_down,
            ZoneType::ExtraDeck => &self.extra_deck,
        }
    }

    pub fn zone_mut(&mut self, zone_type: ZoneType) -> &mut dyn Zone {
        match zone_type {
            ZoneType::Hand => &mut self.hand,
            ZoneType::Deck => &mut self.deck,
            ZoneType::Monsters => &mut self.monsters,
            ZoneType::SpellsTraps => &mut self.spells_traps,
            ZoneType::FieldSpell => &mut self.field_spell,
            ZoneType::DeadZone => &mut self.dead_zone,
            ZoneType::Banished => &mut self.banished,
            ZoneType::BanishedFaceDown => &mut self.banished_face_down,
            ZoneType::ExtraDeck => &mut self.extra_deck,
        }
    }

    pub fn slot_zone(&self, zone_type: ZoneType) -> Option<&SlotZone> {
        match zone_type {
            ZoneType::Monsters => Some(&self.monsters),
            ZoneType::SpellsTraps => Some(&self.spells_traps),
            ZoneType::FieldSpell => Some(&self.field_spell),
            _ => None,
        }
    }

    pub fn slot_zone_mut(&mut self, zone_type: ZoneType) -> Option<&mut SlotZone> {
        match zone_type {
            ZoneType::Monsters => Some(&mut self.monsters),
            ZoneType::SpellsTraps => Some(&mut self.spells_traps),
            ZoneType::FieldSpell => Some(&mut self.field_spell),
            _ => None,
        }
    }

    pub fn pile_mut(&mut self, zone_type: ZoneType) -> Option<&mut Pile> {
        match zone_type {
            ZoneType::Hand => Some(&mut self.hand),
            ZoneType::Deck => Some(&mut self.deck),
            ZoneType::DeadZone => Some(&mut self.dead_zone),
            ZoneType::Banished => Some(&mut self.banished),
            ZoneType::BanishedFaceDown => Some(&mut self.banished_face_down),
            ZoneType::ExtraDeck => Some(&mut self.extra_deck),
            _ => None,
        }
    }

    pub fn hand(&self) -> &Pile {
        &self.hand
    }

    pub fn deck(&self) -> &Pile {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Pile {
        &mut self.deck
    }

    pub fn monsters(&self) -> &SlotZone {
        &self.monsters
    }

    pub fn dead_zone(&self) -> &Pile {
        &self.dead_zone
    }

    pub fn extra_deck(&self) -> &Pile {
        &self.extra_deck
    }

    /// 모든 영역에 걸쳐 해당 id 가 몇 번 나타나는지 셉니다. 정상 상태에서는 0 또는 1 입니다.
    pub fn count_of(&self, id: CardId) -> usize {
        ZoneType::ALL
            .into_iter()
            .map(|zone| self.zone(zone).cards())
            .flatten()
            .filter(|card| card.id() == id)
            .count()
    }

    pub fn total_cards(&self) -> usize {
        ZoneType::ALL
            .into_iter()
            .map(|zone| self.zone(zone).cards().len())
            .sum()
    }

    /// 상대에게 공개되는 필드 스냅샷. 패의 내용은 포함하지 않습니다.
    pub fn to_view(&self) -> FieldView {
        FieldView {
            deck: self.deck.as_slice().to_vec(),
            monsters: self.monsters.slots().to_vec(),
            spells_traps: self.spells_traps.slots().to_vec(),
            field_spell: self.field_spell.slots().to_vec(),
            dead_zone: self.dead_zone.as_slice().to_vec(),
            banished: self.banished.as_slice().to_vec(),
            banished_face_down: self.banished_face_down.as_slice().to_vec(),
            extra_deck: self.extra_deck.as_slice().to_vec(),
        }
    }
}

/// `playerField` 의 직렬화 형식.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldView {
    pub deck: Vec<Card>,
    pub monsters: Vec<Option<Card>>,
    pub spells_traps: Vec<Option<Card>>,
    pub field_spell: Vec<Option<Card>>,
    pub dead_zone: Vec<Card>,
    pub banished: Vec<Card>,
    pub banished_face_down: Vec<Card>,
    pub extra_deck: Vec<Card>,
}

impl FieldView {
    /// 슬롯 길이를 정규화한 읽기 전용 복사본을 만듭니다.
    pub fn normalized(self) -> Self {
        let fix = |zone: ZoneType, slots: Vec<Option<Card>>| {
            SlotZone::from_slots(zone, slots).slots().to_vec()
        };
        Self {
            monsters: fix(ZoneType::Monsters, self.monsters),
            spells_traps: fix(ZoneType::SpellsTraps, self.spells_traps),
            field_spell: fix(ZoneType::FieldSpell, self.field_spell),
            ..self
        }
    }

    pub fn monster(&self, id: CardId) -> Option<&Card> {
        self.monsters.iter().flatten().find(|card| card.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::insert::BottomInsert;

    #[test]
    fn view_excludes_hand_and_keeps_slot_lengths() {
        let mut field = PlayerField::new();
        let secret = Card::spell("Monster Reborn");
        field
            .pile_mut(ZoneType::Hand)
            .unwrap()
            .add(secret.clone(), &BottomInsert);

        let view = field.to_view();
        assert_eq!(view.monsters.len(), 5);
        assert_eq!(view.spells_traps.len(), 5);
        assert_eq!(view.field_spell.len(), 1);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("Monster Reborn"));
        assert!(json.contains("spellsTraps"));
    }

    #[test]
    fn normalized_view_pads_short_slot_arrays() {
        let view = FieldView {
            monsters: vec![None],
            ..FieldView::default()
        }
        .normalized();
        assert_eq!(view.monsters.len(), 5);
        assert_eq!(view.field_spell.len(), 1);
    }
}
