use duel_sync::{
    card::{deck::BuiltDeck, types::Position, Card},
    enums::ZoneType,
    exception::StateError,
    game::{
        battle::{resolve_attack, Side},
        movement::MoveRequest,
        phase::Phase,
        DuelState, Rules,
    },
    sync::snapshot::GameStateSnapshot,
    zone::Zone,
};

fn player(uid: &str, name: &str, cards: Vec<Card>) -> DuelState {
    let rules = Rules {
        opening_hand: cards.len(),
        ..Rules::default()
    };
    DuelState::with_rules(uid, name, rules)
        .load_deck(BuiltDeck {
            main: cards,
            extra: Vec::new(),
        })
        .start("host", "guest")
}

fn summon(state: DuelState, card: &Card) -> DuelState {
    state
        .move_card(MoveRequest::new(card.clone(), ZoneType::Hand, ZoneType::Monsters))
        .unwrap()
}

#[test]
fn six_advances_pass_the_turn() {
    let card = Card::monster("Celtic Guardian", 1400, 1200, 4);
    let mut host = summon(player("host", "Yugi", vec![card.clone()]), &card);
    assert_eq!(host.turn().summons_this_turn(), 1);

    let expected = [
        Phase::Standby,
        Phase::Main1,
        Phase::Battle,
        Phase::Main2,
        Phase::End,
        Phase::Draw,
    ];
    for phase in expected {
        host = host.advance_phase().unwrap();
        assert_eq!(host.turn().phase(), phase);
    }
    assert_eq!(host.turn().current_turn_player(), "guest");
    assert_eq!(host.turn().summons_this_turn(), 0);
    assert_eq!(host.turn().turn_count(), 2);
    assert_eq!(host.turn().time_remaining(), 60);
    assert!(!host.is_my_turn());
    assert!(matches!(
        host.advance_phase(),
        Err(StateError::NotYourTurn { .. })
    ));
}

#[test]
fn guest_adopts_the_newer_turn() {
    let host = player("host", "Yugi", Vec::new()).end_turn().unwrap();
    let guest = player("guest", "Kaiba", Vec::new());
    assert!(!guest.is_my_turn());

    let (guest, merge) = guest.merge_remote("host", &GameStateSnapshot::capture(&host));
    assert!(merge.adopted_turn);
    assert!(guest.is_my_turn());
    assert_eq!(guest.turn().turn_count(), 2);

    // 오래된 상태는 받아들이지 않습니다.
    let stale = player("host", "Yugi", Vec::new());
    let (guest, merge) = guest.merge_remote("host", &GameStateSnapshot::capture(&stale));
    assert!(!merge.adopted_turn);
    assert!(guest.is_my_turn());
}

#[test]
fn piercing_damage_reaches_the_defender_once() {
    let attacker = Card::monster("Summoned Skull", 1800, 1000, 4);
    let wall = Card::monster("Wall", 500, 1200, 4).with_position(Position::Defense);
    let host = summon(player("host", "Yugi", vec![attacker.clone()]), &attacker);
    let guest = summon(player("guest", "Kaiba", vec![wall.clone()]), &wall);

    let defender = guest.field().monsters().find(wall.id()).cloned().unwrap();
    let report = resolve_attack(&attacker, Some(&defender)).unwrap();
    assert_eq!(report.damage, Some((Side::Defender, 600)));

    let host = host.commit_battle(&report).unwrap();
    assert_eq!(host.life_points(), 8000);
    assert_eq!(host.battle_events().len(), 1);
    assert_eq!(host.battle_events()[0].target, "guest");

    let snapshot = GameStateSnapshot::capture(&host);
    let (guest, merge) = guest.merge_remote("host", &snapshot);
    assert_eq!(merge.applied_battle_events, 1);
    assert_eq!(guest.life_points(), 7400);
    assert!(guest.field().dead_zone().contains(wall.id()));
    assert_eq!(guest.field().monsters().occupied(), 0);

    let (guest, merge) = guest.merge_remote("host", &snapshot);
    assert_eq!(merge.applied_battle_events, 0);
    assert_eq!(guest.life_points(), 7400);
}

#[test]
fn weaker_attacker_pays_the_difference() {
    let attacker = Card::monster("Summoned Skull", 1800, 1000, 4);
    let dragon = Card::monster("Blue-Eyes", 2000, 2500, 8);
    let host = summon(player("host", "Yugi", vec![attacker.clone()]), &attacker);

    let report = resolve_attack(&attacker, Some(&dragon)).unwrap();
    let host = host.commit_battle(&report).unwrap();
    assert_eq!(host.life_points(), 7800);
    assert!(host.field().dead_zone().contains(attacker.id()));
    assert!(host.battle_events().is_empty());
    assert!(host
        .action_log()
        .iter()
        .any(|e| e.action == "Summoned Skull attacks Blue-Eyes"));
}

#[test]
fn equal_attack_destroys_both_sides() {
    let left = Card::monster("Left", 1500, 1000, 4);
    let right = Card::monster("Right", 1500, 1000, 4);
    let host = summon(player("host", "Yugi", vec![left.clone()]), &left);
    let guest = summon(player("guest", "Kaiba", vec![right.clone()]), &right);

    let report = resolve_attack(&left, Some(&right)).unwrap();
    assert_eq!(report.damage, None);
    let host = host.commit_battle(&report).unwrap();
    assert!(host.field().dead_zone().contains(left.id()));

    let (guest, _) = guest.merge_remote("host", &GameStateSnapshot::capture(&host));
    assert!(guest.field().dead_zone().contains(right.id()));
    assert_eq!(guest.life_points(), 8000);
    assert_eq!(host.life_points(), 8000);
}

#[test]
fn direct_attack_hits_life_points() {
    let attacker = Card::monster("Dark Magician", 2500, 2100, 7);
    let host = summon(player("host", "Yugi", vec![attacker.clone()]), &attacker);
    let guest = player("guest", "Kaiba", Vec::new());

    let report = resolve_attack(&attacker, None).unwrap();
    let host = host.commit_battle(&report).unwrap();
    let (guest, _) = guest.merge_remote("host", &GameStateSnapshot::capture(&host));
    assert_eq!(guest.life_points(), 5500);
    assert!(host
        .action_log()
        .iter()
        .any(|e| e.action == "Dark Magician attacks directly"));
}

#[test]
fn guest_follows_phase_changes_backwards_and_the_timer() {
    let host = player("host", "Yugi", Vec::new());
    let guest = player("guest", "Kaiba", Vec::new());

    let host = host.change_phase(Phase::Battle).unwrap();
    let (guest, merge) = guest.merge_remote("host", &GameStateSnapshot::capture(&host));
    assert!(merge.adopted_turn);
    assert_eq!(guest.turn().phase(), Phase::Battle);
    let lagging_guest = guest.clone();

    let host = host.change_phase(Phase::Main1).unwrap();
    let host = host.tick(15).unwrap();
    let (guest, merge) = guest.merge_remote("host", &GameStateSnapshot::capture(&host));
    assert!(merge.adopted_turn);
    assert_eq!(guest.turn().phase(), Phase::Main1);
    assert_eq!(guest.turn().time_remaining(), 45);
    assert!(!guest.is_my_turn());

    // 같은 턴에서 턴 플레이어가 아닌 쪽의 사본은 반영하지 않습니다.
    let (host, merge) = host.merge_remote("guest", &GameStateSnapshot::capture(&lagging_guest));
    assert!(!merge.adopted_turn);
    assert_eq!(host.turn().phase(), Phase::Main1);
}
