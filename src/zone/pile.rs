use crate::{
    card::{
        cards::{CardVecExt, Cards},
        types::CardId,
        Card,
    },
    enums::ZoneType,
    exception::ZoneError,
};

use super::{insert::Insert, Zone};

/// 순서가 있는 영역 (덱, 패, 묘지, 제외, 엑스트라 덱).
///
/// 인덱스 0 이 맨 위입니다. 용량 제한은 없습니다.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pile {
    cards: Cards,
    zone_type: ZoneType,
}

impl Pile {
    pub fn new(zone_type: ZoneType) -> Self {
        Self {
            cards: Vec::new(),
            zone_type,
        }
    }

    pub fn with_cards(zone_type: ZoneType, cards: Cards) -> Self {
        Self { cards, zone_type }
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn add(&mut self, card: Card, insert: &dyn Insert) {
        insert.insert(&mut self.cards, card);
    }

    /// 맨 위에서부터 최대 `count` 장을 꺼냅니다.
    pub fn take_top(&mut self, count: usize) -> Cards {
        let count = count.min(self.cards.len());
        self.cards.drain(..count).collect()
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle();
    }
}

impl Zone for Pile {
    fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    fn contains(&self, id: CardId) -> bool {
        self.cards.contains_id(id)
    }

    fn find(&self, id: CardId) -> Option<&Card> {
        self.cards.find_by_id(id)
    }

    fn remove(&mut self, id: CardId) -> Option<Card> {
        self.cards.remove_by_id(id)
    }

    fn replace(&mut self, card: Card) -> Result<(), ZoneError> {
        let zone = self.zone_type;
        let slot = self
            .cards
            .find_by_id_mut(card.id())
            .ok_or_else(|| ZoneError::CardNotInZone {
                card: card.id(),
                zone: zone.to_string(),
            })?;
        *slot = card;
        Ok(())
    }

    fn len(&self) -> usize {
        self.cards.len()
    }

    fn cards(&self) -> Vec<&Card> {
        self.cards.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::insert::{BottomInsert, TopInsert};

    #[test]
    fn take_top_stops_at_empty() {
        let mut deck = Pile::new(ZoneType::Deck);
        deck.add(Card::spell("Pot of Greed"), &BottomInsert);
        deck.add(Card::spell("Raigeki"), &TopInsert);

        let taken = deck.take_top(5);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].name(), "Raigeki");
        assert!(deck.is_empty());
    }

    #[test]
    fn replace_keeps_order() {
        let first = Card::monster("Summoned Skull", 2500, 1200, 6);
        let second = Card::monster("Gaia", 2300, 2100, 7);
        let mut hand = Pile::with_cards(ZoneType::Hand, vec![first.clone(), second.clone()]);

        hand.replace(first.clone().with_face_down(true)).unwrap();
        assert!(hand.as_slice()[0].is_face_down());
        assert_eq!(hand.as_slice()[1].id(), second.id());
    }
}
