use crate::{
    card::{cards::CardVecExt, Card},
    enums::DeckPlacement,
};

/// 순서형 영역에 카드를 넣는 방식.
///
/// 인덱스 0 이 덱의 맨 위입니다.
pub trait Insert: Send + Sync {
    fn insert(&self, cards: &mut Vec<Card>, card: Card);
}

pub struct TopInsert;
pub struct BottomInsert;
pub struct ShuffleInsert;

// Top 구현
impl Insert for TopInsert {
    fn insert(&self, cards: &mut Vec<Card>, card: Card) {
        cards.insert(0, card);
    }
}

// Bottom 구현
impl Insert for BottomInsert {
    fn insert(&self, cards: &mut Vec<Card>, card: Card) {
        cards.push(card);
    }
}

// Shuffle 구현
impl Insert for ShuffleInsert {
    fn insert(&self, cards: &mut Vec<Card>, card: Card) {
        cards.push(card);
        cards.shuffle();
    }
}

impl From<DeckPlacement> for Box<dyn Insert> {
    fn from(placement: DeckPlacement) -> Self {
        match placement {
            DeckPlacement::Top => Box::new(TopInsert),
            DeckPlacement::Bottom => Box::new(BottomInsert),
            DeckPlacement::Shuffle => Box::new(ShuffleInsert),
        }
    }
}
