use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use duel_sync::{
    card::{deck::DeckList, types::CardId},
    client::DuelClient,
    enums::ZoneType,
    env::Settings,
    exception::GameError,
    game::{movement::MoveRequest, phase::Phase},
    setup_logger,
    store::memory::MemoryStore,
    zone::Zone,
    LogExt,
};
use tracing::{info, warn};

// main
#[derive(Parser)]
#[command(
    name = "duel_sync",                       // 프로그램 이름
    author = env!("CARGO_PKG_AUTHORS"),       // 작성자
    version = env!("CARGO_PKG_VERSION"),      // 버전
    about = env!("CARGO_PKG_DESCRIPTION"),    // 짧은 설명
    long_about = None,                        // 긴 설명 (None은 미사용)
)]
struct Args {
    /// 호스트 덱 리스트 (JSON)
    #[arg(long = "host_deck")]
    #[arg(required = true)]
    host_deck: PathBuf,

    /// 게스트 덱 리스트 (JSON)
    #[arg(long = "guest_deck")]
    #[arg(required = true)]
    guest_deck: PathBuf,

    #[arg(long, default_value = "local-duel")]
    game_id: String,

    #[arg(long, default_value = "Host")]
    host_name: String,

    #[arg(long, default_value = "Guest")]
    guest_name: String,

    /// 진행할 턴 수
    #[arg(long, default_value_t = 4)]
    turns: u32,
}

/// 양쪽 클라이언트가 더 이상 받을 변경이 없을 때까지 번갈아 반영합니다.
async fn settle(a: &mut DuelClient, b: &mut DuelClient) {
    for _ in 0..16 {
        if a.poll().await + b.poll().await == 0 {
            return;
        }
    }
    warn!("Clients did not settle after 16 rounds");
}

/// 메인 페이즈에 몬스터 하나를 소환하고, 배틀 페이즈에 모든 몬스터로 공격한 뒤 턴을 넘깁니다.
async fn play_turn(active: &mut DuelClient, passive: &mut DuelClient) -> Result<(), GameError> {
    active.draw().await;
    active.change_phase(Phase::Main1).await?;

    let summon = active
        .state()
        .field()
        .hand()
        .as_slice()
        .iter()
        .find(|card| card.stats().is_some())
        .cloned();
    if let Some(card) = summon {
        active
            .move_card(MoveRequest::new(card, ZoneType::Hand, ZoneType::Monsters))
            .await;
    }
    settle(active, passive).await;

    if active.state().turn().turn_count() > 1 {
        active.change_phase(Phase::Battle).await?;
        let attackers: Vec<CardId> = active
            .state()
            .field()
            .monsters()
            .slots()
            .iter()
            .flatten()
            .map(|card| card.id())
            .collect();
        for attacker in attackers {
            let target = active
                .opponent()
                .and_then(|o| o.field.monsters.iter().flatten().next())
                .map(|card| card.id());
            match active.declare_attack(attacker, target) {
                Ok(_) => {
                    active.confirm_battle().await;
                }
                Err(e) => warn!("Attack skipped: {}", e),
            }
            settle(active, passive).await;
        }
    }

    active.end_turn().await?;
    settle(active, passive).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GameError> {
    let args = Args::parse();
    let settings = Settings::new()?;
    setup_logger(&settings);

    let host_deck = DeckList::from_path(&args.host_deck)?;
    let guest_deck = DeckList::from_path(&args.guest_deck)?;

    let store = MemoryStore::new();
    let mut host =
        DuelClient::connect(Arc::new(store.connect()), settings.clone(), &args.host_name).await?;
    let mut guest =
        DuelClient::connect(Arc::new(store.connect()), settings.clone(), &args.guest_name).await?;

    host.host(&args.game_id)
        .await
        .log_ok(|| info!("Hosting {}", args.game_id))?;
    guest.join(&args.game_id).await?;
    host.load_deck(&host_deck).await?;
    guest.load_deck(&guest_deck).await?;
    host.set_ready(true).await?;
    guest.set_ready(true).await?;
    settle(&mut host, &mut guest).await;

    for _ in 0..args.turns {
        if host.state().is_my_turn() {
            play_turn(&mut host, &mut guest).await?;
        } else {
            play_turn(&mut guest, &mut host).await?;
        }
        if host.state().is_defeated() || guest.state().is_defeated() {
            break;
        }
    }

    for client in [&host, &guest] {
        let state = client.state();
        println!(
            "{}: LP {} / hand {} / deck {} / graveyard {}",
            state.player_name(),
            state.life_points(),
            state.field().hand().len(),
            state.field().deck().len(),
            state.field().dead_zone().len(),
        );
    }
    for entry in host.state().action_log() {
        println!("[{}] {}", entry.player_name, entry.action);
    }

    host.leave().await?;
    guest.leave().await?;
    Ok(())
}
