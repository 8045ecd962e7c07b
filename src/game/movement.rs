use std::str::FromStr;

use tracing::warn;

use crate::{
    card::Card,
    enums::{Destination, ZoneType},
    exception::{GameError, ZoneError},
    zone::{
        insert::{BottomInsert, Insert},
        Zone,
    },
};

use super::DuelState;

/// 카드 이동 요청.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    /// 이동 후의 카드 상태 (표시 형식, 앞/뒷면, ATK 변경이 반영된 값)
    pub card: Card,
    pub from: ZoneType,
    pub to: Destination,
    pub slot: Option<usize>,
    pub is_local: bool,
}

impl MoveRequest {
    pub fn new(card: Card, from: ZoneType, to: impl Into<Destination>) -> Self {
        Self {
            card,
            from,
            to: to.into(),
            slot: None,
            is_local: true,
        }
    }

    pub fn to_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// 상대 필드를 대상으로 한 요청
    pub fn remote(mut self) -> Self {
        self.is_local = false;
        self
    }
}

fn parse_zone_name<T>(name: &str) -> Result<T, ZoneError>
where
    T: FromStr<Err = GameError>,
{
    name.parse::<T>().map_err(|e| {
        warn!("Rejected zone name '{}': {}", name, e);
        ZoneError::InvalidZone(name.to_string())
    })
}

/// 제자리 갱신의 로그 문구
fn describe_update(previous: &Card, updated: &Card) -> String {
    if previous.is_face_down() != updated.is_face_down() {
        if updated.is_face_down() {
            format!("set {} face-down", updated.name())
        } else {
            format!("flipped {} face-up", updated.name())
        }
    } else if previous.atk() != updated.atk() {
        format!(
            "changed {} ATK to {}",
            updated.name(),
            updated.atk().unwrap_or_default()
        )
    } else if previous.position() != updated.position() {
        format!(
            "changed {} to {} position",
            updated.name(),
            updated.position()
        )
    } else {
        format!("updated {}", updated.name())
    }
}

impl DuelState {
    /// 카드를 한 영역에서 다른 영역으로 옮깁니다.
    ///
    /// 거부되면 `Err` 를 돌려주며 현재 상태는 그대로입니다. 승인되면 버전이 1 오르고 로그가 한 줄 추가됩니다.
    pub fn move_card(&self, request: MoveRequest) -> Result<DuelState, ZoneError> {
        let MoveRequest {
            card,
            from,
            to,
            slot,
            is_local,
        } = request;

        if !is_local {
            warn!("Refusing to move {} on the opponent's field", card.name());
            return Err(ZoneError::ReadOnlyField);
        }

        let id = card.id();
        let to_zone = to.zone();
        let not_in_source = || ZoneError::CardNotInZone {
            card: id,
            zone: from.to_string(),
        };

        // 같은 영역이면 제자리 교체 (표시 형식 변경, 앞/뒷면 전환, ATK 수정)
        if to == Destination::Zone(from) {
            let previous = self.field.zone(from).find(id).cloned().ok_or_else(not_in_source)?;
            let mut next = self.clone();
            next.field.zone_mut(from).replace(card.clone())?;
            next.record(describe_update(&previous, &card));
            return Ok(next);
        }

        if !self.field.zone(from).contains(id) {
            warn!("{} is not in {}", card.name(), from);
            return Err(not_in_source());
        }
        // 덱 -> deck_top / deck_bottom / deck_shuffle 은 덱 안에서 다시 넣는 이동입니다.
        let reorder = from == to_zone;
        if !reorder && self.field.zone(to_zone).contains(id) {
            warn!("{} is already in {}", card.name(), to_zone);
            return Err(ZoneError::DuplicateInstance {
                card: id,
                zone: to_zone.to_string(),
            });
        }

        // 제거 전에 자리부터 확인합니다.
        let target_slot = match self.field.slot_zone(to_zone) {
            Some(zone) => Some(zone.resolve_slot(slot).map_err(|e| {
                warn!("Cannot move {} to {}: {}", card.name(), to_zone, e);
                e
            })?),
            None => None,
        };

        let is_summon = to_zone == ZoneType::Monsters && card.counts_as_summon();
        if is_summon && !self.turn.can_summon() {
            warn!(
                "{} cannot be summoned: {} summons this turn",
                card.name(),
                self.turn.summons_this_turn()
            );
            return Err(ZoneError::SummonLimitReached {
                limit: self.turn.summon_limit(),
            });
        }

        let mut next = self.clone();
        next.field
            .zone_mut(from)
            .remove(id)
            .ok_or_else(not_in_source)?;

        let name = card.name().to_string();
        let mut card = card;
        card.set_placement(None);
        match (target_slot, to) {
            (Some(index), _) => {
                let zone = next.field.slot_zone_mut(to_zone).ok_or_else(|| {
                    ZoneError::CapacityExceeded(to_zone.to_string())
                })?;
                zone.place(index, card)?;
            }
            (None, Destination::Deck(placement)) => {
                let insert: Box<dyn Insert> = placement.into();
                next.field.deck_mut().add(card, insert.as_ref());
            }
            (None, Destination::Zone(zone)) => {
                let pile = next
                    .field
                    .pile_mut(zone)
                    .ok_or_else(|| ZoneError::InvalidZone(zone.to_string()))?;
                pile.add(card, &BottomInsert);
            }
        }

        if is_summon {
            next.turn.record_summon();
        }
        next.record(format!("moved {} from {} to {}", name, from, to));
        Ok(next)
    }

    /// 영역 이름 문자열로 이동합니다. (`deck_top`, `graveyard` 등의 별칭 포함)
    pub fn move_card_named(
        &self,
        card: Card,
        from: &str,
        to: &str,
        slot: Option<usize>,
        is_local: bool,
    ) -> Result<DuelState, ZoneError> {
        let same_name = from == to;
        let from = parse_zone_name::<Destination>(from)?.zone();
        let to = if same_name {
            Destination::Zone(from)
        } else {
            parse_zone_name::<Destination>(to)?
        };
        self.move_card(MoveRequest {
            card,
            from,
            to,
            slot,
            is_local,
        })
    }

    /// 덱 맨 위의 카드를 패로 가져옵니다. 덱이 비었으면 로그만 남깁니다.
    pub fn draw(&self) -> DuelState {
        let mut next = self.clone();
        let drawn = next.field.deck_mut().take_top(1);
        if drawn.is_empty() {
            next.record("deck is empty!");
            return next;
        }
        if let Some(hand) = next.field.pile_mut(ZoneType::Hand) {
            for card in drawn {
                hand.add(card, &BottomInsert);
            }
        }
        next.record("drew a card");
        next
    }

    /// 덱 위에서부터 최대 `count` 장을 묘지로 보냅니다.
    pub fn mill(&self, count: usize) -> DuelState {
        let mut next = self.clone();
        if self.field.deck().is_empty() {
            next.record("deck is empty - cannot mill cards");
            return next;
        }
        let milled = next.field.deck_mut().take_top(count);
        let milled_count = milled.len();
        if let Some(dead_zone) = next.field.pile_mut(ZoneType::DeadZone) {
            for card in milled {
                dead_zone.add(card, &BottomInsert);
            }
        }
        next.record(format!(
            "milled {} card{} from deck to graveyard",
            milled_count,
            if milled_count > 1 { "s" } else { "" }
        ));
        next
    }

    pub fn shuffle_deck(&self) -> DuelState {
        let mut next = self.clone();
        next.field.deck_mut().shuffle();
        next.record("shuffled the deck");
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{card::types::Position, enums::DeckPlacement};

    fn state_with_hand(cards: &[Card]) -> DuelState {
        let mut state = DuelState::new("p1", "Yugi");
        if let Some(hand) = state.field.pile_mut(ZoneType::Hand) {
            for card in cards {
                hand.add(card.clone(), &BottomInsert);
            }
        }
        state
    }

    #[test]
    fn move_from_hand_to_monster_slot() {
        let card = Card::monster("Dark Magician", 2500, 2100, 7);
        let state = state_with_hand(&[card.clone()]);

        let next = state
            .move_card(MoveRequest::new(card.clone(), ZoneType::Hand, ZoneType::Monsters).to_slot(2))
            .unwrap();
        let placed = next.field().monsters().get(2).unwrap();
        assert_eq!(placed.id(), card.id());
        assert_eq!(placed.placement().map(|p| p.slot_index), Some(2));
        assert_eq!(next.field().count_of(card.id()), 1);
        assert_eq!(next.version(), state.version() + 1);
        assert_eq!(next.turn().summons_this_turn(), 1);
        assert_eq!(
            next.action_log().last().map(|e| e.action.as_str()),
            Some("moved Dark Magician from hand to monsters")
        );
    }

    #[test]
    fn in_place_update_keeps_the_slot() {
        let card = Card::monster("Gaia", 2300, 2100, 7);
        let state = state_with_hand(&[card.clone()])
            .move_card(MoveRequest::new(card.clone(), ZoneType::Hand, ZoneType::Monsters).to_slot(3))
            .unwrap();

        let flipped = card.clone().with_position(Position::Defense);
        let next = state
            .move_card(MoveRequest::new(flipped, ZoneType::Monsters, ZoneType::Monsters))
            .unwrap();
        let slot = next.field().monsters().get(3).unwrap();
        assert_eq!(slot.position(), Position::Defense);
        assert_eq!(slot.placement().map(|p| p.slot_index), Some(3));
        assert_eq!(next.turn().summons_this_turn(), 1);
    }

    #[test]
    fn atk_edit_is_logged() {
        let card = Card::monster("Gaia", 2300, 2100, 7);
        let state = state_with_hand(&[card.clone()]);
        let next = state
            .move_card(MoveRequest::new(card.with_atk(2600), ZoneType::Hand, ZoneType::Hand))
            .unwrap();
        assert_eq!(
            next.action_log().last().map(|e| e.action.as_str()),
            Some("changed Gaia ATK to 2600")
        );
    }

    #[test]
    fn card_missing_from_source_is_rejected() {
        let card = Card::spell("Raigeki");
        let state = DuelState::new("p1", "Yugi");
        assert!(matches!(
            state.move_card(MoveRequest::new(card, ZoneType::Hand, ZoneType::DeadZone)),
            Err(ZoneError::CardNotInZone { .. })
        ));
    }

    #[test]
    fn opponent_field_is_read_only() {
        let card = Card::spell("Raigeki");
        let state = state_with_hand(&[card.clone()]);
        assert_eq!(
            state
                .move_card(MoveRequest::new(card, ZoneType::Hand, ZoneType::DeadZone).remote())
                .unwrap_err(),
            ZoneError::ReadOnlyField
        );
    }

    #[test]
    fn deck_top_and_bottom() {
        let top = Card::spell("Top");
        let bottom = Card::spell("Bottom");
        let state = state_with_hand(&[top.clone(), bottom.clone()]);
        let state = state
            .move_card(MoveRequest::new(top.clone(), ZoneType::Hand, Destination::Deck(DeckPlacement::Top)))
            .unwrap()
            .move_card(MoveRequest::new(bottom.clone(), ZoneType::Hand, ZoneType::Deck))
            .unwrap();
        let deck = state.field().deck().as_slice();
        assert_eq!(deck[0].id(), top.id());
        assert_eq!(deck[1].id(), bottom.id());
    }

    #[test]
    fn deck_card_can_be_put_back_on_top() {
        let cards: Vec<Card> = ["B", "C", "A"].into_iter().map(|name| Card::spell(name)).collect();
        let mut state = DuelState::new("p1", "Yugi");
        for card in &cards {
            state.field.deck_mut().add(card.clone(), &BottomInsert);
        }
        let a = cards[2].clone();

        let next = state
            .move_card(MoveRequest::new(a.clone(), ZoneType::Deck, Destination::Deck(DeckPlacement::Top)))
            .unwrap();
        let names: Vec<&str> = next.field().deck().as_slice().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(next.field().count_of(a.id()), 1);
        assert_eq!(
            next.action_log().last().map(|e| e.action.as_str()),
            Some("moved A from deck to deck_top")
        );

        // 같은 이름끼리의 이동은 제자리 갱신
        let face_down = a.clone().with_face_down(true);
        let updated = next.move_card_named(face_down, "deck", "deck", None, true).unwrap();
        assert_eq!(updated.field().deck().as_slice()[0].id(), a.id());
        assert!(updated.field().deck().as_slice()[0].is_face_down());
    }

    #[test]
    fn summon_limit_blocks_the_sixth_monster_but_not_tokens() {
        let monsters: Vec<Card> = (0..6).map(|i| Card::monster(format!("M{}", i), 100, 100, 1)).collect();
        let mut state = state_with_hand(&monsters);
        for card in &monsters[..5] {
            state = state
                .move_card(MoveRequest::new(card.clone(), ZoneType::Hand, ZoneType::Monsters))
                .unwrap();
            state = state
                .move_card(MoveRequest::new(card.clone(), ZoneType::Monsters, ZoneType::DeadZone))
                .unwrap();
        }
        assert_eq!(
            state
                .move_card(MoveRequest::new(monsters[5].clone(), ZoneType::Hand, ZoneType::Monsters))
                .unwrap_err(),
            ZoneError::SummonLimitReached { limit: 5 }
        );

        let token = Card::token("Sheep Token", 0, 0);
        let state = {
            let mut s = state;
            if let Some(hand) = s.field.pile_mut(ZoneType::Hand) {
                hand.add(token.clone(), &BottomInsert);
            }
            s
        };
        assert!(state
            .move_card(MoveRequest::new(token, ZoneType::Hand, ZoneType::Monsters))
            .is_ok());
    }

    #[test]
    fn named_moves_accept_aliases_and_reject_unknown_names() {
        let card = Card::trap("Mirror Force");
        let state = state_with_hand(&[card.clone()]);
        let next = state
            .move_card_named(card.clone(), "hand", "graveyard", None, true)
            .unwrap();
        assert!(next.field().dead_zone().contains(card.id()));

        assert_eq!(
            state
                .move_card_named(card, "hand", "magia", None, true)
                .unwrap_err(),
            ZoneError::InvalidZone("magia".to_string())
        );
    }

    #[test]
    fn draw_and_mill_on_empty_deck_only_log() {
        let state = DuelState::new("p1", "Yugi");
        let drawn = state.draw();
        assert_eq!(drawn.action_log().last().unwrap().action, "deck is empty!");
        let milled = state.mill(2);
        assert_eq!(
            milled.action_log().last().unwrap().action,
            "deck is empty - cannot mill cards"
        );
        assert_eq!(milled.field().total_cards(), 0);
    }

    #[test]
    fn mill_moves_deck_head_to_dead_zone() {
        let cards: Vec<Card> = (0..3).map(|i| Card::spell(format!("S{}", i))).collect();
        let mut state = DuelState::new("p1", "Yugi");
        for card in &cards {
            state.field.deck_mut().add(card.clone(), &BottomInsert);
        }
        let next = state.mill(2);
        assert_eq!(next.field().deck().len(), 1);
        assert_eq!(next.field().dead_zone().as_slice()[0].id(), cards[0].id());
        assert_eq!(
            next.action_log().last().unwrap().action,
            "milled 2 cards from deck to graveyard"
        );
    }
}
