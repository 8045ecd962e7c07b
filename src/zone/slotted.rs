use crate::{
    card::{types::CardId, types::Placement, Card},
    enums::ZoneType,
    exception::ZoneError,
};

use super::Zone;

/// 고정 길이 슬롯 영역 (몬스터 5, 마법/함정 5, 필드 마법 1).
///
/// 슬롯 수는 생성 이후 절대 바뀌지 않으며 슬롯 내용만 바뀝니다.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotZone {
    slots: Vec<Option<Card>>,
    zone_type: ZoneType,
}

impl SlotZone {
    pub fn new(zone_type: ZoneType) -> Self {
        let size = zone_type.slot_count().unwrap_or(0);
        Self {
            slots: vec![None; size],
            zone_type,
        }
    }

    pub fn slots(&self) -> &[Option<Card>] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// 카드를 놓을 슬롯을 고릅니다.
    ///
    /// 범위 안의 빈 슬롯이 지정되면 그 슬롯을, 아니면 첫 번째 빈 슬롯을 사용합니다.
    pub fn resolve_slot(&self, requested: Option<usize>) -> Result<usize, ZoneError> {
        if let Some(index) = requested {
            if self.check_slot(index).is_ok() {
                return Ok(index);
            }
        }
        self.first_empty()
            .ok_or_else(|| ZoneError::CapacityExceeded(self.zone_type.to_string()))
    }

    pub fn check_slot(&self, index: usize) -> Result<(), ZoneError> {
        match self.slots.get(index) {
            Some(None) => Ok(()),
            _ => Err(ZoneError::InvalidSlot {
                zone: self.zone_type.to_string(),
                index,
            }),
        }
    }

    /// 지정된 빈 슬롯에 카드를 놓고 배치 정보를 기록합니다.
    pub fn place(&mut self, index: usize, mut card: Card) -> Result<(), ZoneError> {
        self.check_slot(index)?;
        card.set_placement(Some(Placement {
            zone: self.zone_type,
            slot_index: index,
        }));
        self.slots[index] = Some(card);
        Ok(())
    }

    /// 해당 카드가 놓인 슬롯의 번호
    pub fn slot_of(&self, id: CardId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|card| card.id() == id))
    }

    /// 수신한 슬롯 배열로 영역을 복원합니다. 길이가 다르면 잘라내거나 빈 슬롯으로 채웁니다.
    pub fn from_slots(zone_type: ZoneType, mut slots: Vec<Option<Card>>) -> Self {
        let size = zone_type.slot_count().unwrap_or(0);
        slots.resize(size, None);
        Self { slots, zone_type }
    }
}

impl Zone for SlotZone {
    fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    fn contains(&self, id: CardId) -> bool {
        self.slot_of(id).is_some()
    }

    fn find(&self, id: CardId) -> Option<&Card> {
        self.slots.iter().flatten().find(|card| card.id() == id)
    }

    /// 슬롯을 비우고 카드를 돌려줍니다. 슬롯 자체는 남습니다.
    fn remove(&mut self, id: CardId) -> Option<Card> {
        let index = self.slot_of(id)?;
        let mut card = self.slots[index].take()?;
        card.set_placement(None);
        Some(card)
    }

    fn replace(&mut self, card: Card) -> Result<(), ZoneError> {
        let index = self.slot_of(card.id()).ok_or_else(|| ZoneError::CardNotInZone {
            card: card.id(),
            zone: self.zone_type.to_string(),
        })?;
        let placement = self.slots[index].as_ref().and_then(Card::placement);
        let mut card = card;
        card.set_placement(placement);
        self.slots[index] = Some(card);
        Ok(())
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn cards(&self) -> Vec<&Card> {
        self.slots.iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_fixed_per_zone_type() {
        assert_eq!(SlotZone::new(ZoneType::Monsters).len(), 5);
        assert_eq!(SlotZone::new(ZoneType::SpellsTraps).len(), 5);
        assert_eq!(SlotZone::new(ZoneType::FieldSpell).len(), 1);
    }

    #[test]
    fn occupied_explicit_slot_falls_back_to_first_empty() {
        let mut zone = SlotZone::new(ZoneType::Monsters);
        zone.place(2, Card::monster("Dark Magician", 2500, 2100, 7))
            .unwrap();

        assert_eq!(zone.resolve_slot(Some(2)).unwrap(), 0);
        assert_eq!(zone.resolve_slot(Some(9)).unwrap(), 0);
        assert_eq!(zone.resolve_slot(Some(3)).unwrap(), 3);
    }

    #[test]
    fn removing_keeps_the_slot() {
        let mut zone = SlotZone::new(ZoneType::Monsters);
        let card = Card::monster("Celtic Guardian", 1400, 1200, 4);
        zone.place(1, card.clone()).unwrap();
        assert_eq!(zone.get(1).and_then(Card::placement).map(|p| p.slot_index), Some(1));

        let removed = zone.remove(card.id()).unwrap();
        assert!(removed.placement().is_none());
        assert_eq!(zone.len(), 5);
        assert_eq!(zone.occupied(), 0);
    }

    #[test]
    fn full_zone_reports_capacity() {
        let mut zone = SlotZone::new(ZoneType::FieldSpell);
        zone.place(0, Card::spell("Yami")).unwrap();
        assert!(matches!(
            zone.resolve_slot(None),
            Err(ZoneError::CapacityExceeded(_))
        ));
    }
}
