use std::{sync::Arc, time::Duration};

use duel_sync::{
    card::deck::DeckList,
    client::DuelClient,
    enums::ZoneType,
    env::Settings,
    exception::SyncError,
    game::{movement::MoveRequest, DuelState},
    session::SessionManager,
    store::{memory::MemoryStore, paths, SharedStore},
    sync::{
        heartbeat::{ConnectionStatus, Heartbeat},
        snapshot::GameStateSnapshot,
        PublishOutcome, SyncEngine,
    },
    zone::Zone,
};

fn deck(name: &str, atk: i32) -> DeckList {
    DeckList::from_json(&format!(
        r#"{{ "name": "{name}", "cards": [
            {{ "code": "{name}-m", "name": "{name} Monster", "cardType": "monster", "atk": {atk}, "def": 1000, "star": 4, "count": 3 }},
            {{ "code": "{name}-s", "name": "{name} Spell", "cardType": "spell", "count": 3 }}
        ] }}"#
    ))
    .unwrap()
}

#[tokio::test]
async fn identical_snapshots_are_written_once() {
    let store = MemoryStore::new();
    let conn: Arc<dyn SharedStore> = Arc::new(store.connect());
    let mut engine = SyncEngine::new(conn, "g1", "p1");

    let snapshot = GameStateSnapshot::capture(&DuelState::new("p1", "Yugi"));
    assert_eq!(engine.publish(&snapshot).await.unwrap(), PublishOutcome::Written);
    let mut again = GameStateSnapshot::capture(&DuelState::new("p1", "Yugi"));
    again.last_update += 1000;
    assert_eq!(engine.publish(&again).await.unwrap(), PublishOutcome::Skipped);
    assert_eq!(store.write_count(&paths::game_state("g1", "p1")), 1);

    let changed = GameStateSnapshot::capture(&DuelState::new("p1", "Yugi").set_life_points(7000));
    assert_eq!(engine.publish(&changed).await.unwrap(), PublishOutcome::Written);
    assert_eq!(store.write_count(&paths::game_state("g1", "p1")), 2);
}

#[tokio::test]
async fn failed_publish_is_retried_by_the_next_one() {
    let store = MemoryStore::new();
    let conn: Arc<dyn SharedStore> = Arc::new(store.connect());
    let mut engine = SyncEngine::new(conn, "g1", "p1");
    let snapshot = GameStateSnapshot::capture(&DuelState::new("p1", "Yugi"));

    store.set_offline(true);
    assert!(matches!(
        engine.publish(&snapshot).await,
        Err(SyncError::WriteFailed { .. })
    ));
    store.set_offline(false);
    assert_eq!(engine.publish(&snapshot).await.unwrap(), PublishOutcome::Written);
}

#[tokio::test]
async fn ready_flag_survives_publishing() {
    let store = MemoryStore::new();
    let conn = Arc::new(store.connect());
    let sessions = SessionManager::new(conn.clone());
    let uid = sessions.sign_in().await.unwrap();
    sessions.create_session("g1", "Yugi").await.unwrap();
    sessions.set_ready(true).await.unwrap();

    let mut engine = SyncEngine::new(conn, "g1", uid.clone());
    let snapshot = GameStateSnapshot::capture(&DuelState::new(uid.clone(), "Yugi"));
    engine.publish(&snapshot).await.unwrap();

    let node = store.peek(&paths::game_state("g1", &uid)).unwrap();
    assert_eq!(node["playerReady"], true);
    assert_eq!(node["playerName"], "Yugi");
    assert_eq!(node["playerLifePoints"], 8000);
}

#[tokio::test]
async fn opponent_snapshots_are_streamed() {
    let store = MemoryStore::new();
    let host: Arc<dyn SharedStore> = Arc::new(store.connect());
    let guest: Arc<dyn SharedStore> = Arc::new(store.connect());
    let mut host_engine = SyncEngine::new(host, "g1", "host");
    let guest_engine = SyncEngine::new(guest, "g1", "guest");

    let mut feed = guest_engine.subscribe_opponent("host").await.unwrap();
    assert_eq!(feed.recv().await, Some(None));

    let state = DuelState::new("host", "Yugi").set_life_points(4000);
    host_engine
        .publish(&GameStateSnapshot::capture(&state))
        .await
        .unwrap();
    let received = feed.recv().await.unwrap().unwrap();
    assert_eq!(received.player_life_points, 4000);
    assert_eq!(received.player_name, "Yugi");
}

#[tokio::test]
async fn heartbeat_reports_connection_status() {
    let store = MemoryStore::new();
    let conn: Arc<dyn SharedStore> = Arc::new(store.connect());
    let heartbeat = Heartbeat::spawn(conn, "p1".to_string(), Duration::from_millis(10));
    let mut status = heartbeat.watch();

    tokio::time::timeout(Duration::from_secs(2), status.wait_for(|s| *s == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();
    let probe = store.peek(&paths::connection_test("p1")).unwrap();
    assert_eq!(probe["uid"], "p1");

    store.set_offline(true);
    tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|s| *s == ConnectionStatus::Disconnected),
    )
    .await
    .unwrap()
    .unwrap();
    heartbeat.stop();
}

async fn settle(a: &mut DuelClient, b: &mut DuelClient) {
    for _ in 0..16 {
        if a.poll().await + b.poll().await == 0 {
            return;
        }
    }
}

async fn started_duel(store: &MemoryStore) -> (DuelClient, DuelClient) {
    let mut host = DuelClient::connect(Arc::new(store.connect()), Settings::default(), "Yugi")
        .await
        .unwrap();
    let mut guest = DuelClient::connect(Arc::new(store.connect()), Settings::default(), "Kaiba")
        .await
        .unwrap();
    host.host("g1").await.unwrap();
    guest.join("g1").await.unwrap();
    host.load_deck(&deck("Yugi", 1800)).await.unwrap();
    guest.load_deck(&deck("Kaiba", 1200)).await.unwrap();
    host.set_ready(true).await.unwrap();
    guest.set_ready(true).await.unwrap();
    settle(&mut host, &mut guest).await;
    (host, guest)
}

#[tokio::test]
async fn clients_start_when_both_are_ready() {
    let store = MemoryStore::new();
    let (host, guest) = started_duel(&store).await;

    assert!(host.state().is_started());
    assert!(guest.state().is_started());
    assert!(host.state().is_my_turn());
    assert!(!guest.state().is_my_turn());
    assert_eq!(host.opponent().map(|o| o.hand_count), Some(5));
    assert_eq!(guest.opponent().map(|o| o.player_name.as_str()), Some("Yugi"));
}

#[tokio::test]
async fn moves_and_battles_reach_the_opponent() {
    let store = MemoryStore::new();
    let (mut host, mut guest) = started_duel(&store).await;

    let monster = host
        .state()
        .field()
        .hand()
        .as_slice()
        .iter()
        .find(|card| card.stats().is_some())
        .cloned()
        .unwrap();
    assert!(
        host.move_card(MoveRequest::new(monster.clone(), ZoneType::Hand, ZoneType::Monsters))
            .await
    );
    // 같은 요청의 중복 전송은 흡수됩니다.
    assert!(
        !host
            .move_card(MoveRequest::new(monster.clone(), ZoneType::Hand, ZoneType::Monsters))
            .await
    );
    settle(&mut host, &mut guest).await;
    let mirrored = guest.opponent().and_then(|o| o.field.monster(monster.id()));
    assert!(mirrored.is_some());

    let report = host.declare_attack(monster.id(), None).unwrap();
    assert!(report.is_direct());
    assert_eq!(host.state().life_points(), 8000);
    host.confirm_battle().await.unwrap();
    settle(&mut host, &mut guest).await;

    assert_eq!(guest.state().life_points(), 6200);
    assert_eq!(guest.opponent().map(|o| o.life_points), Some(8000));
    assert!(host
        .state()
        .action_log()
        .iter()
        .any(|e| e.action == "dealt 1800 damage to opponent"));
}

#[tokio::test]
async fn turn_changes_are_adopted_by_the_opponent() {
    let store = MemoryStore::new();
    let (mut host, mut guest) = started_duel(&store).await;

    assert!(guest.end_turn().await.is_err());
    host.end_turn().await.unwrap();
    settle(&mut host, &mut guest).await;
    assert!(guest.state().is_my_turn());
    assert_eq!(guest.state().turn().turn_count(), 2);

    guest.draw().await;
    assert_eq!(guest.state().field().hand().len(), 6);
}

#[tokio::test]
async fn publish_failures_keep_local_state() {
    let store = MemoryStore::new();
    let (mut host, mut guest) = started_duel(&store).await;
    let before = host.state().field().deck().len();

    store.set_offline(true);
    host.draw().await;
    assert_eq!(host.state().field().deck().len(), before - 1);

    store.set_offline(false);
    host.adjust_life_points(-500).await;
    settle(&mut host, &mut guest).await;
    assert_eq!(guest.opponent().map(|o| o.life_points), Some(7500));
    assert_eq!(guest.opponent().map(|o| o.hand_count), Some(6));
}

#[tokio::test]
async fn chat_and_cancelled_battles() {
    let store = MemoryStore::new();
    let (mut host, mut guest) = started_duel(&store).await;
    assert!(host.is_ready() && guest.is_ready());
    assert!(host.connection_status().is_some());

    let sent = host.send_chat("  good luck ").await.unwrap();
    assert_eq!(sent.message, "good luck");
    assert!(host.send_chat("   ").await.is_none());
    settle(&mut host, &mut guest).await;
    assert!(guest
        .state()
        .chat_messages()
        .iter()
        .any(|m| m.id == sent.id && m.player_name == "Yugi"));

    // 확인하지 않고 취소한 공격은 아무것도 바꾸지 않습니다.
    let monster = host
        .state()
        .field()
        .hand()
        .as_slice()
        .iter()
        .find(|card| card.stats().is_some())
        .cloned()
        .unwrap();
    assert!(
        host.move_card(MoveRequest::new(monster.clone(), ZoneType::Hand, ZoneType::Monsters))
            .await
    );
    let version = host.state().version();
    host.declare_attack(monster.id(), None).unwrap();
    assert!(host.cancel_battle().is_some());
    assert!(host.pending_battle().is_none());
    assert!(host.confirm_battle().await.is_none());
    assert_eq!(host.state().version(), version);
    settle(&mut host, &mut guest).await;
    assert_eq!(guest.state().life_points(), 8000);
}
