use super::{types::CardId, Card};

/// Vec<Card> 타입의 별칭
pub type Cards = Vec<Card>;

/// Vec<Card> 확장 트레이트
pub trait CardVecExt {
    fn contains_id(&self, id: CardId) -> bool;
    fn find_by_id(&self, id: CardId) -> Option<&Card>;
    fn find_by_id_mut(&mut self, id: CardId) -> Option<&mut Card>;
    fn remove_by_id(&mut self, id: CardId) -> Option<Card>;
    fn shuffle(&mut self);
    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Card) -> bool;
}

impl CardVecExt for Vec<Card> {
    fn contains_id(&self, id: CardId) -> bool {
        self.iter().any(|card| card.id() == id)
    }

    fn find_by_id(&self, id: CardId) -> Option<&Card> {
        self.iter().find(|card| card.id() == id)
    }

    fn find_by_id_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.iter_mut().find(|card| card.id() == id)
    }

    /// 해당 id 를 가진 첫 번째 카드를 벡터에서 제거하고 반환합니다.
    /// # Returns
    /// * `Some(Card)` - 카드가 발견되어 제거된 경우
    /// * `None` - 해당 id 를 가진 카드가 없는 경우
    fn remove_by_id(&mut self, id: CardId) -> Option<Card> {
        let position = self.iter().position(|card| card.id() == id)?;
        Some(self.remove(position))
    }

    /// Fisher-Yates 셔플
    fn shuffle(&mut self) {
        use rand::seq::SliceRandom;
        let mut rng = rand::thread_rng();
        self.as_mut_slice().shuffle(&mut rng);
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Card) -> bool,
    {
        self.iter().filter(|card| predicate(card)).count()
    }
}
