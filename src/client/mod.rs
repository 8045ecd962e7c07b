use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    card::{deck::DeckList, types::CardId, Card},
    env::Settings,
    exception::{GameError, GameplayError, StateError},
    game::{
        battle::{resolve_attack, BattleReport},
        movement::MoveRequest,
        phase::Phase,
        DuelState, OpponentView, RemoteMerge,
    },
    session::{GameSession, Role, SessionManager, SessionWatch},
    store::SharedStore,
    stream::{ActionStream, ChatMessage, ChatStream, EntryStream, LogEntry},
    sync::{
        heartbeat::{ConnectionStatus, Heartbeat},
        snapshot::GameStateSnapshot,
        PublishOutcome, SnapshotStream, SyncEngine,
    },
    zone::Zone,
    LogExt,
};

/// 세션에 참가한 뒤에만 존재하는 동기화 자원들
struct Attachment {
    game_id: String,
    role: Role,
    session: Option<GameSession>,
    sync: SyncEngine,
    chat: ChatStream,
    actions: ActionStream,
    session_watch: SessionWatch,
    chat_feed: EntryStream<ChatMessage>,
    opponent: Option<(String, SnapshotStream)>,
    heartbeat: Heartbeat,
}

/// 한 플레이어의 대전 클라이언트.
///
/// 로컬 `DuelState` 를 전이시키고, 승인된 전이마다 스냅샷을 발행합니다.
/// 영역/동기화 에러는 로그로 남기고 흡수하며, 세션/턴 에러만 호출자에게 돌려줍니다.
pub struct DuelClient {
    settings: Settings,
    sessions: SessionManager,
    state: DuelState,
    ready: bool,
    pending_battle: Option<BattleReport>,
    attachment: Option<Attachment>,
}

impl DuelClient {
    /// 익명 로그인 후 빈 대전 상태로 시작합니다.
    pub async fn connect(
        store: Arc<dyn SharedStore>,
        settings: Settings,
        player_name: &str,
    ) -> Result<Self, GameError> {
        let sessions = SessionManager::new(store);
        let uid = sessions.sign_in().await?;
        let state = DuelState::with_rules(uid, player_name, settings.rules.clone());
        Ok(Self {
            settings,
            sessions,
            state,
            ready: false,
            pending_battle: None,
            attachment: None,
        })
    }

    // Getter 메서드들
    pub fn state(&self) -> &DuelState {
        &self.state
    }

    pub fn uid(&self) -> &str {
        self.state.player_id()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn opponent(&self) -> Option<&OpponentView> {
        self.state.opponent()
    }

    pub fn pending_battle(&self) -> Option<&BattleReport> {
        self.pending_battle.as_ref()
    }

    pub fn game_id(&self) -> Option<&str> {
        self.attachment.as_ref().map(|a| a.game_id.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.attachment.as_ref().map(|a| a.role)
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.attachment.as_ref().and_then(|a| a.session.as_ref())
    }

    pub fn connection_status(&self) -> Option<ConnectionStatus> {
        self.attachment.as_ref().map(|a| a.heartbeat.status())
    }

    fn opponent_id(&self) -> Option<String> {
        self.session()
            .and_then(|s| s.opponent_of(self.state.player_id()))
            .map(str::to_string)
    }

    // ===================================================================
    // 세션
    // ===================================================================

    pub async fn host(&mut self, game_id: &str) -> Result<GameSession, GameError> {
        let session = self
            .sessions
            .create_session(game_id, self.state.player_name())
            .await?;
        self.attach(game_id, Role::Host, session.clone()).await?;
        Ok(session)
    }

    pub async fn join(&mut self, game_id: &str) -> Result<GameSession, GameError> {
        let session = self
            .sessions
            .join_session(game_id, self.state.player_name())
            .await?;
        self.attach(game_id, Role::Guest, session.clone()).await?;
        Ok(session)
    }

    async fn attach(&mut self, game_id: &str, role: Role, session: GameSession) -> Result<(), GameError> {
        let store = self.sessions.store();
        let uid = self.state.player_id().to_string();
        let chat = ChatStream::with_limit(
            store.clone(),
            game_id,
            self.state.player_name(),
            self.settings.streams.chat_limit,
        );
        let actions = ActionStream::with_limit(store.clone(), game_id, self.settings.streams.action_limit);
        let session_watch = self.sessions.watch(game_id).await?;
        let chat_feed = chat.subscribe().await?;
        let heartbeat = Heartbeat::spawn(
            store.clone(),
            uid.clone(),
            Duration::from_secs(self.settings.sync.heartbeat_interval_seconds),
        );

        self.attachment = Some(Attachment {
            game_id: game_id.to_string(),
            role,
            session: Some(session),
            sync: SyncEngine::new(store, game_id, uid),
            chat,
            actions,
            session_watch,
            chat_feed,
            opponent: None,
            heartbeat,
        });
        self.follow_opponent().await;
        self.publish().await;
        info!("{} attached to {} as {:?}", self.state.player_name(), game_id, role);
        Ok(())
    }

    /// 준비 상태를 바꾸고, 양쪽이 준비되었으면 대전을 시작합니다.
    pub async fn set_ready(&mut self, ready: bool) -> Result<(), GameError> {
        self.sessions.set_ready(ready).await?;
        self.ready = ready;
        self.try_start().await;
        Ok(())
    }

    /// 세션에서 나갑니다. 구독과 하트비트는 함께 정리됩니다.
    pub async fn leave(&mut self) -> Result<(), GameError> {
        self.attachment = None;
        self.ready = false;
        self.pending_battle = None;
        self.sessions.leave().await
    }

    /// 세션 레코드에서 상대 uid 를 알게 되면 상대 노드를 구독합니다.
    async fn follow_opponent(&mut self) {
        let opponent = self.opponent_id();
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        let current = attachment.opponent.as_ref().map(|(id, _)| id.clone());
        if current == opponent {
            return;
        }
        attachment.opponent = None;
        let Some(opponent) = opponent else {
            debug!("Opponent left {}", attachment.game_id);
            return;
        };
        match attachment.sync.subscribe_opponent(&opponent).await {
            Ok(feed) => {
                info!("Following opponent {} in {}", opponent, attachment.game_id);
                attachment.opponent = Some((opponent, feed));
            }
            Err(e) => warn!("Could not subscribe to opponent {}: {}", opponent, e),
        }
    }

    async fn try_start(&mut self) {
        if self.state.is_started() || !self.ready {
            return;
        }
        let Some(session) = self.session() else {
            return;
        };
        let opponent_ready = self.state.opponent().is_some_and(|o| o.ready);
        if !(session.both_ready() || opponent_ready) {
            return;
        }
        let Some(guest) = session.guest_id.clone() else {
            return;
        };
        let host = session.host_id.clone();
        let next = self.state.start(&host, &guest);
        self.commit(next, &[]).await;
    }

    // ===================================================================
    // 덱, 카드 이동
    // ===================================================================

    pub async fn load_deck(&mut self, deck: &DeckList) -> Result<(), GameError> {
        let built = deck
            .build()
            .log_err(|e| warn!("Deck '{}' rejected: {}", deck.name, e))?;
        let next = self.state.load_deck(built);
        self.commit(next, &[]).await;
        Ok(())
    }

    /// 이동이 승인되었는지 여부를 돌려줍니다. 거부 사유는 로그로만 남습니다.
    pub async fn move_card(&mut self, request: MoveRequest) -> bool {
        match self.state.move_card(request) {
            Ok(next) => {
                self.commit(next, &[]).await;
                true
            }
            Err(e) => {
                warn!("Move rejected: {}", e);
                false
            }
        }
    }

    pub async fn move_card_named(
        &mut self,
        card: Card,
        from: &str,
        to: &str,
        slot: Option<usize>,
        is_local: bool,
    ) -> bool {
        match self.state.move_card_named(card, from, to, slot, is_local) {
            Ok(next) => {
                self.commit(next, &[]).await;
                true
            }
            Err(e) => {
                warn!("Move from '{}' to '{}' rejected: {}", from, to, e);
                false
            }
        }
    }

    pub async fn draw(&mut self) {
        let next = self.state.draw();
        self.commit(next, &[]).await;
    }

    pub async fn mill(&mut self, count: usize) {
        let next = self.state.mill(count);
        self.commit(next, &[]).await;
    }

    pub async fn shuffle_deck(&mut self) {
        let next = self.state.shuffle_deck();
        self.commit(next, &[]).await;
    }

    pub async fn set_life_points(&mut self, value: i32) {
        let next = self.state.set_life_points(value);
        self.commit(next, &[]).await;
    }

    pub async fn adjust_life_points(&mut self, delta: i32) {
        let next = self.state.adjust_life_points(delta);
        self.commit(next, &[]).await;
    }

    // ===================================================================
    // 턴, 페이즈
    // ===================================================================

    pub async fn advance_phase(&mut self) -> Result<(), GameError> {
        let next = self
            .state
            .advance_phase()
            .log_err(|e| warn!("Phase advance rejected: {}", e))?;
        self.commit(next, &[]).await;
        Ok(())
    }

    pub async fn change_phase(&mut self, phase: Phase) -> Result<(), GameError> {
        let next = self
            .state
            .change_phase(phase)
            .log_err(|e| warn!("Change to {} rejected: {}", phase, e))?;
        self.commit(next, &[]).await;
        Ok(())
    }

    pub async fn end_turn(&mut self) -> Result<(), GameError> {
        let next = self
            .state
            .end_turn()
            .log_err(|e| warn!("End turn rejected: {}", e))?;
        self.commit(next, &[]).await;
        Ok(())
    }

    /// 턴 타이머를 진행합니다. 시간이 다 되면 턴이 자동으로 넘어갑니다.
    pub async fn tick(&mut self, seconds: u32) {
        if let Some(next) = self.state.tick(seconds) {
            self.commit(next, &[]).await;
        }
    }

    // ===================================================================
    // 전투
    // ===================================================================

    /// 공격을 선언하고 예상 결과를 돌려줍니다. `confirm_battle` 전까지 상태는 그대로입니다.
    ///
    /// `target` 이 `None` 이면 직접 공격입니다.
    pub fn declare_attack(
        &mut self,
        attacker: CardId,
        target: Option<CardId>,
    ) -> Result<BattleReport, GameError> {
        if !self.state.is_my_turn() {
            return Err(StateError::NotYourTurn {
                player: self.state.player_id().to_string(),
            }
            .into());
        }
        let attacker = self
            .state
            .field()
            .monsters()
            .find(attacker)
            .cloned()
            .ok_or(GameplayError::CardNotFound(attacker))?;
        let defender = match target {
            Some(id) => Some(
                self.state
                    .opponent()
                    .and_then(|o| o.field.monster(id))
                    .cloned()
                    .ok_or(GameplayError::CardNotFound(id))?,
            ),
            None => None,
        };
        let report = resolve_attack(&attacker, defender.as_ref())?;
        self.pending_battle = Some(report.clone());
        Ok(report)
    }

    /// 대기 중인 전투 결과를 확정합니다. 대기 중인 전투가 없거나 적용에 실패하면 `None`.
    pub async fn confirm_battle(&mut self) -> Option<BattleReport> {
        let report = self.pending_battle.take()?;
        match self.state.commit_battle(&report) {
            Ok(next) => {
                self.commit(next, &[]).await;
                Some(report)
            }
            Err(e) => {
                warn!("Battle could not be applied: {}", e);
                None
            }
        }
    }

    pub fn cancel_battle(&mut self) -> Option<BattleReport> {
        self.pending_battle.take()
    }

    // ===================================================================
    // 채팅
    // ===================================================================

    pub async fn send_chat(&mut self, message: &str) -> Option<ChatMessage> {
        let sent = self.attachment.as_ref()?.chat.send(message).await.ok().flatten()?;
        let next = self.state.add_chat_message(sent.clone());
        self.commit(next, &[]).await;
        Some(sent)
    }

    // ===================================================================
    // 원격 반영
    // ===================================================================

    /// 상대 스냅샷 하나를 반영합니다.
    pub async fn apply_remote(&mut self, opponent_id: &str, snapshot: &GameStateSnapshot) -> RemoteMerge {
        let (next, merge) = self.state.merge_remote(opponent_id, snapshot);
        if merge.applied_battle_events > 0 {
            info!(
                "Applied {} battle event(s) from {}",
                merge.applied_battle_events, opponent_id
            );
        }
        self.commit(next, &snapshot.action_log).await;
        self.try_start().await;
        merge
    }

    /// 도착해 있는 원격 변경(세션, 상대 스냅샷, 채팅)을 모두 반영하고 반영한 변경 수를 돌려줍니다.
    pub async fn poll(&mut self) -> usize {
        let mut applied = 0;

        if let Some(attachment) = self.attachment.as_mut() {
            while let Some(update) = attachment.session_watch.try_recv() {
                if update.is_none() {
                    warn!("Session {} was removed", attachment.game_id);
                }
                attachment.session = update;
                applied += 1;
            }
        }
        self.follow_opponent().await;

        // 스냅샷은 누적 상태이므로 마지막 것만 반영합니다.
        let mut latest = None;
        if let Some((id, feed)) = self.attachment.as_mut().and_then(|a| a.opponent.as_mut()) {
            while let Some(update) = feed.try_recv() {
                latest = Some((id.clone(), update));
            }
        }
        match latest {
            Some((id, Some(snapshot))) => {
                self.apply_remote(&id, &snapshot).await;
                applied += 1;
            }
            Some((id, None)) => debug!("Opponent {} has no game state yet", id),
            None => {}
        }

        let mut incoming = Vec::new();
        if let Some(attachment) = self.attachment.as_mut() {
            while let Some(messages) = attachment.chat_feed.try_recv() {
                incoming = messages;
            }
        }
        if let Some(next) = self.state.merge_chat(&incoming) {
            self.commit(next, &[]).await;
            applied += 1;
        }

        self.try_start().await;
        applied
    }

    // ===================================================================
    // 발행
    // ===================================================================

    /// 전이를 확정합니다. 새 로그 항목은 행동 스트림에 추가하고 스냅샷을 발행합니다.
    ///
    /// `foreign` 은 상대에게서 받은 항목이라 다시 올리지 않습니다.
    async fn commit(&mut self, next: DuelState, foreign: &[LogEntry]) {
        let known: HashSet<Uuid> = self
            .state
            .action_log()
            .iter()
            .chain(foreign)
            .map(|entry| entry.id)
            .collect();
        let fresh: Vec<LogEntry> = next
            .action_log()
            .iter()
            .filter(|entry| !known.contains(&entry.id))
            .cloned()
            .collect();
        self.state = next;

        if let Some(attachment) = self.attachment.as_ref() {
            join_all(fresh.iter().map(|entry| attachment.actions.record(entry))).await;
        }
        self.publish().await;
    }

    async fn publish(&mut self) -> Option<PublishOutcome> {
        let attachment = self.attachment.as_mut()?;
        let snapshot = GameStateSnapshot::capture(&self.state);
        attachment.sync.publish(&snapshot).await.ok()
    }
}
