use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    exception::{GameError, SessionError, SyncError},
    store::{paths, DisconnectOp, SharedStore, Subscription, TransactionOutcome},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Waiting,
    Active,
    Finished,
}

/// `sessions/{gameId}` 레코드
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    #[serde(default)]
    pub game_id: String,
    pub host_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub host_ready: bool,
    #[serde(default)]
    pub guest_ready: bool,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub created_at: i64,
}

impl GameSession {
    pub fn new(game_id: &str, host_id: &str, host_name: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            host_id: host_id.to_string(),
            guest_id: None,
            host_name: host_name.to_string(),
            guest_name: None,
            host_ready: false,
            guest_ready: false,
            status: SessionStatus::Waiting,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn both_ready(&self) -> bool {
        self.guest_id.is_some() && self.host_ready && self.guest_ready
    }

    /// 해당 uid 의 상대 uid
    pub fn opponent_of(&self, uid: &str) -> Option<&str> {
        if self.host_id == uid {
            self.guest_id.as_deref()
        } else if self.guest_id.as_deref() == Some(uid) {
            Some(&self.host_id)
        } else {
            None
        }
    }

    fn decode(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    fn ready_field(&self) -> &'static str {
        match self {
            Role::Host => "hostReady",
            Role::Guest => "guestReady",
        }
    }
}

/// 현재 참가 중인 세션
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub game_id: String,
    pub uid: String,
    pub role: Role,
}

struct SessionManagerInner {
    store: Arc<dyn SharedStore>,
    membership: RwLock<Option<Membership>>,
}

/// 세션 생성/참가/준비 상태와 연결 종료 정리를 담당합니다.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

fn sync_err(e: SyncError) -> GameError {
    GameError::Sync(e)
}

impl SessionManager {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                store,
                membership: RwLock::new(None),
            }),
        }
    }

    pub fn store(&self) -> Arc<dyn SharedStore> {
        self.inner.store.clone()
    }

    /// 익명 로그인. 이미 로그인했다면 같은 uid 를 돌려줍니다.
    pub async fn sign_in(&self) -> Result<String, SessionError> {
        match self.inner.store.sign_in_anonymously().await {
            Ok(uid) => {
                info!("Signed in anonymously as {}", uid);
                Ok(uid)
            }
            Err(e) => {
                warn!("Anonymous sign-in failed: {}", e);
                Err(SessionError::AuthenticationFailure)
            }
        }
    }

    fn uid(&self) -> Result<String, SessionError> {
        self.inner
            .store
            .uid()
            .ok_or(SessionError::AuthenticationFailure)
    }

    pub async fn membership(&self) -> Option<Membership> {
        self.inner.membership.read().await.clone()
    }

    pub async fn get_session(&self, game_id: &str) -> Result<Option<GameSession>, GameError> {
        let value = self
            .inner
            .store
            .get(&paths::session(game_id))
            .await
            .map_err(sync_err)?;
        Ok(value.and_then(GameSession::decode))
    }

    /// 새 세션을 만들고 호스트로 참가합니다. 같은 id 의 세션이 이미 있으면 실패합니다.
    pub async fn create_session(&self, game_id: &str, host_name: &str) -> Result<GameSession, GameError> {
        let uid = self.uid()?;
        let session = GameSession::new(game_id, &uid, host_name);
        let record = serde_json::to_value(&session)?;
        let path = paths::session(game_id);

        let mut create = move |current: Option<Value>| match current {
            Some(_) => None,
            None => Some(record.clone()),
        };
        let outcome = self
            .inner
            .store
            .transaction(&path, &mut create)
            .await
            .map_err(sync_err)?;
        if !outcome.is_committed() {
            warn!("Session {} already exists", game_id);
            return Err(SessionError::SessionAlreadyExists(game_id.to_string()).into());
        }

        let membership = Membership {
            game_id: game_id.to_string(),
            uid,
            role: Role::Host,
        };
        self.register_disconnect_hooks(&membership).await?;
        *self.inner.membership.write().await = Some(membership);
        info!("Session {} created by {}", game_id, host_name);
        Ok(session)
    }

    /// 게스트로 참가합니다.
    ///
    /// # Errors
    /// * `SessionNotFound` - 세션이 없음
    /// * `SelfJoinRejected` - 내가 만든 세션
    /// * `SessionFull` - 다른 게스트가 이미 참가함 (같은 게스트의 재참가는 허용)
    pub async fn join_session(&self, game_id: &str, guest_name: &str) -> Result<GameSession, GameError> {
        let uid = self.uid()?;
        let path = paths::session(game_id);
        let mut rejection: Option<SessionError> = None;

        let joined = {
            let uid = uid.clone();
            let game_id = game_id.to_string();
            let guest_name = guest_name.to_string();
            let rejection = &mut rejection;
            let mut join = move |current: Option<Value>| {
                let Some(mut session) = current.and_then(GameSession::decode) else {
                    *rejection = Some(SessionError::SessionNotFound(game_id.clone()));
                    return None;
                };
                if session.host_id == uid {
                    *rejection = Some(SessionError::SelfJoinRejected(game_id.clone()));
                    return None;
                }
                if session.guest_id.as_deref().is_some_and(|guest| guest != uid) {
                    *rejection = Some(SessionError::SessionFull(game_id.clone()));
                    return None;
                }
                *rejection = None;
                session.game_id = game_id.clone();
                session.guest_id = Some(uid.clone());
                session.guest_name = Some(guest_name.clone());
                session.guest_ready = false;
                session.status = SessionStatus::Active;
                serde_json::to_value(&session).ok()
            };
            self.inner
                .store
                .transaction(&path, &mut join)
                .await
                .map_err(sync_err)?
        };

        if let Some(reason) = rejection {
            warn!("Join of {} rejected: {}", game_id, reason);
            return Err(reason.into());
        }
        let session = match joined {
            TransactionOutcome::Committed(Some(value)) => GameSession::decode(value),
            _ => None,
        }
        .ok_or_else(|| SessionError::SessionNotFound(game_id.to_string()))?;

        let membership = Membership {
            game_id: game_id.to_string(),
            uid,
            role: Role::Guest,
        };
        self.register_disconnect_hooks(&membership).await?;
        *self.inner.membership.write().await = Some(membership);
        info!("{} joined session {}", guest_name, game_id);
        Ok(session)
    }

    /// 내 준비 상태만 변경합니다. 상대의 준비 상태는 건드리지 않습니다.
    pub async fn set_ready(&self, ready: bool) -> Result<(), GameError> {
        let membership = self.membership().await.ok_or(SessionError::NotInSession)?;
        let path = paths::session(&membership.game_id);
        let field = membership.role.ready_field();

        let mut flag = move |current: Option<Value>| match current {
            Some(Value::Object(mut map)) => {
                map.insert(field.to_string(), Value::Bool(ready));
                Some(Value::Object(map))
            }
            _ => None,
        };
        let outcome = self
            .inner
            .store
            .transaction(&path, &mut flag)
            .await
            .map_err(sync_err)?;
        if !outcome.is_committed() {
            return Err(SessionError::SessionNotFound(membership.game_id.clone()).into());
        }

        let mut player_ready = Map::new();
        player_ready.insert("playerReady".to_string(), Value::Bool(ready));
        self.inner
            .store
            .update(
                &paths::game_state(&membership.game_id, &membership.uid),
                player_ready,
            )
            .await
            .map_err(sync_err)?;
        debug!("{} set {} = {}", membership.uid, field, ready);
        Ok(())
    }

    pub async fn watch(&self, game_id: &str) -> Result<SessionWatch, GameError> {
        let inner = self
            .inner
            .store
            .subscribe(&paths::session(game_id))
            .await
            .map_err(sync_err)?;
        Ok(SessionWatch { inner })
    }

    /// 연결 종료 훅과 같은 정리를 지금 수행하고 세션에서 나갑니다.
    pub async fn leave(&self) -> Result<(), GameError> {
        let Some(membership) = self.inner.membership.write().await.take() else {
            return Err(SessionError::NotInSession.into());
        };
        for op in cleanup_ops(&membership) {
            let result = match op {
                DisconnectOp::Remove(path) => self.inner.store.remove(&path).await,
                DisconnectOp::Set { path, value } => self.inner.store.set(&path, value).await,
                DisconnectOp::Update { path, fields } => {
                    self.inner.store.update(&path, fields).await
                }
            };
            result.map_err(sync_err)?;
        }
        self.inner
            .store
            .cancel_on_disconnect()
            .await
            .map_err(sync_err)?;
        info!("{} left session {}", membership.uid, membership.game_id);
        Ok(())
    }

    async fn register_disconnect_hooks(&self, membership: &Membership) -> Result<(), GameError> {
        self.inner
            .store
            .cancel_on_disconnect()
            .await
            .map_err(sync_err)?;
        for op in cleanup_ops(membership) {
            self.inner.store.on_disconnect(op).await.map_err(sync_err)?;
        }
        Ok(())
    }
}

/// 연결이 끊겼을 때의 정리 작업.
///
/// 내 게임 상태 노드를 지우고 준비 상태를 내립니다. 게스트는 자리까지 비우고 세션을 대기 상태로 돌립니다.
fn cleanup_ops(membership: &Membership) -> Vec<DisconnectOp> {
    let mut fields = Map::new();
    fields.insert(membership.role.ready_field().to_string(), json!(false));
    if membership.role == Role::Guest {
        fields.insert("guestId".to_string(), Value::Null);
        fields.insert("guestName".to_string(), Value::Null);
        fields.insert("status".to_string(), json!(SessionStatus::Waiting));
    }
    vec![
        DisconnectOp::Remove(paths::game_state(&membership.game_id, &membership.uid)),
        DisconnectOp::Update {
            path: paths::session(&membership.game_id),
            fields,
        },
    ]
}

/// 세션 레코드 구독. 레코드가 삭제되면 `Some(None)`.
pub struct SessionWatch {
    inner: Subscription,
}

impl SessionWatch {
    pub async fn recv(&mut self) -> Option<Option<GameSession>> {
        let value = self.inner.recv().await?;
        Some(value.and_then(GameSession::decode))
    }

    pub fn try_recv(&mut self) -> Option<Option<GameSession>> {
        let value = self.inner.try_recv()?;
        Some(value.and_then(GameSession::decode))
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}
