use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    card::{
        types::{CardId, Position},
        Card,
    },
    enums::ZoneType,
    exception::{GameplayError, ZoneError},
    zone::Zone,
};

use super::{movement::MoveRequest, DuelState};

/// 상대에게 전달되는 전투 이벤트는 최근 것만 유지합니다.
const BATTLE_EVENT_HISTORY: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Attacker,
    Defender,
}

/// 공격 한 번의 판정 결과. 확정(`commit_battle`) 전까지는 제안일 뿐입니다.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleReport {
    pub attacker: Card,
    pub defender: Option<Card>,
    pub destroyed: Vec<(Side, CardId)>,
    pub damage: Option<(Side, u32)>,
}

impl BattleReport {
    pub fn is_direct(&self) -> bool {
        self.defender.is_none()
    }

    pub fn destroyed_on(&self, side: Side) -> impl Iterator<Item = CardId> + '_ {
        self.destroyed
            .iter()
            .filter(move |(s, _)| *s == side)
            .map(|(_, id)| *id)
    }

    pub fn damage_to(&self, side: Side) -> u32 {
        match self.damage {
            Some((s, amount)) if s == side => amount,
            _ => 0,
        }
    }
}

/// 상대 필드에 대한 전투 결과. 스냅샷에 실려 상대 클라이언트가 자기 필드에 한 번만 적용합니다.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEvent {
    pub id: Uuid,
    pub target: String,
    pub damage: u32,
    pub destroyed: Vec<CardId>,
    pub timestamp: i64,
}

fn stats_of(card: &Card) -> Result<(i32, i32), GameplayError> {
    card.stats()
        .map(|s| (s.atk, s.def))
        .ok_or(GameplayError::NotAMonster(card.id()))
}

fn diff(a: i32, b: i32) -> u32 {
    a.saturating_sub(b).max(0) as u32
}

/// ATK/DEF 비교로 공격 결과를 계산합니다.
///
/// - 직접 공격: 공격력만큼 피해
/// - 수비 표시: ATK > DEF 면 수비 몬스터 파괴 + 관통 피해, ATK < DEF 면 공격 몬스터 파괴, 같으면 변화 없음
/// - 공격 표시: 낮은 쪽 파괴 + 차이만큼 피해, 같으면 양쪽 파괴
pub fn resolve_attack(attacker: &Card, defender: Option<&Card>) -> Result<BattleReport, GameplayError> {
    let (atk, _) = stats_of(attacker)?;
    let mut report = BattleReport {
        attacker: attacker.clone(),
        defender: defender.cloned(),
        destroyed: Vec::new(),
        damage: None,
    };

    let Some(defender) = defender else {
        report.damage = Some((Side::Defender, atk.max(0) as u32));
        return Ok(report);
    };
    let (defender_atk, defender_def) = stats_of(defender)?;

    match defender.position() {
        Position::Defense => {
            if atk > defender_def {
                report.destroyed.push((Side::Defender, defender.id()));
                report.damage = Some((Side::Defender, diff(atk, defender_def)));
            } else if atk < defender_def {
                report.destroyed.push((Side::Attacker, attacker.id()));
            }
        }
        Position::Attack => {
            if atk > defender_atk {
                report.destroyed.push((Side::Defender, defender.id()));
                report.damage = Some((Side::Defender, diff(atk, defender_atk)));
            } else if atk < defender_atk {
                report.destroyed.push((Side::Attacker, attacker.id()));
                report.damage = Some((Side::Attacker, diff(defender_atk, atk)));
            } else {
                report.destroyed.push((Side::Attacker, attacker.id()));
                report.destroyed.push((Side::Defender, defender.id()));
            }
        }
    }
    debug!(
        "{} attacks {}: destroyed {:?}, damage {:?}",
        attacker.name(),
        defender.name(),
        report.destroyed,
        report.damage
    );
    Ok(report)
}

impl DuelState {
    /// 확인된 전투 결과를 적용합니다. 공격하는 쪽은 항상 로컬 플레이어입니다.
    ///
    /// 내 몬스터 파괴와 내가 받는 피해는 바로 반영하고, 상대에 대한 결과는 `BattleEvent` 로 내보냅니다.
    pub fn commit_battle(&self, report: &BattleReport) -> Result<DuelState, ZoneError> {
        let mut next = self.clone();
        let target = report
            .defender
            .as_ref()
            .map(|card| card.name().to_string())
            .unwrap_or_else(|| "directly".to_string());
        next.record(format!("{} attacks {}", report.attacker.name(), target));

        for id in report.destroyed_on(Side::Attacker) {
            next = next.send_to_dead_zone(id)?;
        }
        let own_damage = report.damage_to(Side::Attacker);
        if own_damage > 0 {
            next.life_points = (next.life_points - own_damage as i32).max(0);
            next.record(format!("dealt {} damage to self", own_damage));
        }

        let destroyed: Vec<CardId> = report.destroyed_on(Side::Defender).collect();
        let damage = report.damage_to(Side::Defender);
        if damage > 0 || !destroyed.is_empty() {
            let target = self.turn.opponent_of(&self.player_id).to_string();
            next.battle_events.push(BattleEvent {
                id: Uuid::new_v4(),
                target,
                damage,
                destroyed,
                timestamp: chrono::Utc::now().timestamp_millis(),
            });
            if next.battle_events.len() > BATTLE_EVENT_HISTORY {
                let overflow = next.battle_events.len() - BATTLE_EVENT_HISTORY;
                next.battle_events.drain(..overflow);
            }
            if damage > 0 {
                next.record(format!("dealt {} damage to opponent", damage));
            }
        }
        info!(
            "Battle committed by {}: LP {} -> {}",
            self.player_name, self.life_points, next.life_points
        );
        Ok(next)
    }

    fn send_to_dead_zone(&self, id: CardId) -> Result<DuelState, ZoneError> {
        let card = self
            .field
            .monsters()
            .find(id)
            .cloned()
            .ok_or(ZoneError::CardNotInZone {
                card: id,
                zone: ZoneType::Monsters.to_string(),
            })?;
        self.move_card(MoveRequest::new(card, ZoneType::Monsters, ZoneType::DeadZone))
    }

    /// 상대가 보낸 전투 이벤트를 적용합니다. 이미 적용했거나 나를 향한 것이 아니면 `None`.
    pub fn apply_battle_event(&self, event: &BattleEvent) -> Option<DuelState> {
        if event.target != self.player_id || self.applied_battle_events.contains(&event.id) {
            return None;
        }
        let mut next = self.clone();
        next.applied_battle_events.insert(event.id);
        for id in &event.destroyed {
            match next.send_to_dead_zone(*id) {
                Ok(moved) => next = moved,
                Err(e) => warn!("Battle event {} could not destroy {}: {}", event.id, id, e),
            }
        }
        if event.damage > 0 {
            next.life_points = (next.life_points - event.damage as i32).max(0);
            next.record(format!("took {} battle damage", event.damage));
        } else {
            next.version += 1;
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piercing_damage_against_defense_position() {
        let attacker = Card::monster("Attacker", 1800, 1000, 4);
        let defender = Card::monster("Wall", 500, 1200, 4).with_position(Position::Defense);
        let report = resolve_attack(&attacker, Some(&defender)).unwrap();
        assert_eq!(report.destroyed, vec![(Side::Defender, defender.id())]);
        assert_eq!(report.damage, Some((Side::Defender, 600)));
    }

    #[test]
    fn weaker_attacker_is_destroyed_and_takes_the_difference() {
        let attacker = Card::monster("Attacker", 1800, 1000, 4);
        let defender = Card::monster("Blue-Eyes", 2000, 2500, 8);
        let report = resolve_attack(&attacker, Some(&defender)).unwrap();
        assert_eq!(report.destroyed, vec![(Side::Attacker, attacker.id())]);
        assert_eq!(report.damage, Some((Side::Attacker, 200)));
    }

    #[test]
    fn equal_attack_destroys_both_without_damage() {
        let attacker = Card::monster("A", 1500, 1000, 4);
        let defender = Card::monster("B", 1500, 1000, 4);
        let report = resolve_attack(&attacker, Some(&defender)).unwrap();
        assert_eq!(report.destroyed.len(), 2);
        assert_eq!(report.damage, None);
    }

    #[test]
    fn stronger_defense_destroys_attacker_without_damage() {
        let attacker = Card::monster("A", 1000, 1000, 4);
        let defender = Card::monster("B", 0, 2000, 4).with_position(Position::Defense);
        let report = resolve_attack(&attacker, Some(&defender)).unwrap();
        assert_eq!(report.destroyed, vec![(Side::Attacker, attacker.id())]);
        assert_eq!(report.damage, None);

        let even = Card::monster("C", 0, 1000, 4).with_position(Position::Defense);
        let report = resolve_attack(&attacker, Some(&even)).unwrap();
        assert!(report.destroyed.is_empty());
        assert_eq!(report.damage, None);
    }

    #[test]
    fn direct_attack_deals_full_atk() {
        let attacker = Card::monster("A", 2500, 2100, 7);
        let report = resolve_attack(&attacker, None).unwrap();
        assert!(report.is_direct());
        assert_eq!(report.damage_to(Side::Defender), 2500);
    }

    #[test]
    fn spells_cannot_battle() {
        let spell = Card::spell("Dark Hole");
        assert_eq!(
            resolve_attack(&spell, None).unwrap_err(),
            GameplayError::NotAMonster(spell.id())
        );
    }
}
