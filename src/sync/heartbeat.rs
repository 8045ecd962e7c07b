use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::store::{paths, SharedStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// 주기적으로 `connection_test/{uid}` 에 기록해 연결 상태를 확인합니다.
///
/// 게임 진행에는 관여하지 않으며, 핸들을 drop 하면 작업이 중단됩니다.
pub struct Heartbeat {
    handle: JoinHandle<()>,
    status: watch::Receiver<ConnectionStatus>,
}

impl Heartbeat {
    pub fn spawn(store: Arc<dyn SharedStore>, uid: String, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ConnectionStatus::Connecting);
        let handle = tokio::spawn(async move {
            let path = paths::connection_test(&uid);
            let mut ticker = tokio::time::interval(interval);
            info!("Heartbeat started for {} every {:?}", uid, interval);
            loop {
                ticker.tick().await;
                let probe = json!({
                    "ts": chrono::Utc::now().timestamp_millis(),
                    "uid": uid,
                });
                let status = match store.set(&path, probe).await {
                    Ok(()) => {
                        debug!("Heartbeat probe written for {}", uid);
                        ConnectionStatus::Connected
                    }
                    Err(e) => {
                        warn!("Heartbeat probe failed for {}: {}", uid, e);
                        ConnectionStatus::Disconnected
                    }
                };
                tx.send_if_modified(|current| {
                    if *current != status {
                        *current = status;
                        true
                    } else {
                        false
                    }
                });
            }
        });
        Self { handle, status: rx }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
