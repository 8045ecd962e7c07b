pub mod memory;
pub mod paths;

pub use memory::{MemoryConnection, MemoryStore};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::exception::SyncError;

/// 트랜잭션 갱신 함수. 현재 값을 받아 새 값을 돌려주며, `None` 이면 트랜잭션을 중단합니다.
pub type TransactionFn<'a> = &'a mut (dyn FnMut(Option<Value>) -> Option<Value> + Send);

#[derive(Clone, Debug, PartialEq)]
pub enum TransactionOutcome {
    Committed(Option<Value>),
    Aborted(Option<Value>),
}

impl TransactionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactionOutcome::Committed(_))
    }
}

/// 연결이 끊어졌을 때 저장소가 대신 수행할 쓰기.
#[derive(Clone, Debug, PartialEq)]
pub enum DisconnectOp {
    Remove(String),
    Set { path: String, value: Value },
    Update { path: String, fields: Map<String, Value> },
}

/// 경로 구독. 값이 바뀔 때마다 해당 경로의 현재 값이 순서대로 전달됩니다.
///
/// drop 하거나 `unsubscribe` 를 호출하면 구독이 해제됩니다.
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<Option<Value>>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        path: impl Into<String>,
        rx: mpsc::UnboundedReceiver<Option<Value>>,
        cancel: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Self {
            path: path.into(),
            rx,
            cancel: Some(cancel),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 다음 값을 기다립니다. 구독이 해제되면 `None`.
    pub async fn recv(&mut self) -> Option<Option<Value>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Option<Value>> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

/// 실시간 공유 저장소 추상화.
///
/// 경로 기반 JSON 트리이며, `Value::Null` 쓰기는 삭제와 같습니다.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// 익명 로그인. 성공하면 이 연결의 uid 를 돌려줍니다.
    async fn sign_in_anonymously(&self) -> Result<String, SyncError>;

    fn uid(&self) -> Option<String>;

    async fn get(&self, path: &str) -> Result<Option<Value>, SyncError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError>;

    /// 객체 필드 단위 병합. 나머지 필드는 유지됩니다.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), SyncError>;

    async fn remove(&self, path: &str) -> Result<(), SyncError>;

    /// 시간 순서가 보장되는 키로 자식을 추가하고 그 키를 돌려줍니다.
    async fn push(&self, path: &str, value: Value) -> Result<String, SyncError>;

    async fn transaction(
        &self,
        path: &str,
        update: TransactionFn<'_>,
    ) -> Result<TransactionOutcome, SyncError>;

    async fn subscribe(&self, path: &str) -> Result<Subscription, SyncError>;

    async fn on_disconnect(&self, op: DisconnectOp) -> Result<(), SyncError>;

    async fn cancel_on_disconnect(&self) -> Result<(), SyncError>;
}
