use thiserror::Error;

use crate::card::types::CardId;

// ===================================================================
// 세분화된 에러 타입
// ===================================================================

/// 세션 생성/참가/준비 상태와 관련된 에러. 호출자에게 그대로 전달되어 사용자에게 표시됩니다.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SessionError {
    #[error("No identity established; sign in before using sessions")]
    AuthenticationFailure,
    #[error("Game session '{0}' not found")]
    SessionNotFound(String),
    #[error("Game session '{0}' is full")]
    SessionFull(String),
    #[error("Cannot join game session '{0}' hosted by yourself")]
    SelfJoinRejected(String),
    #[error("Game session '{0}' already exists")]
    SessionAlreadyExists(String),
    #[error("Not participating in any game session")]
    NotInSession,
}

/// 카드 영역 이동 에러. 모두 치명적이지 않으며, 로컬 상태는 변경되지 않습니다.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ZoneError {
    #[error("Zone '{0}' has no free slot")]
    CapacityExceeded(String),
    #[error("Unrecognized zone name '{0}'")]
    InvalidZone(String),
    #[error("Card {card} is not in zone '{zone}'")]
    CardNotInZone { card: CardId, zone: String },
    #[error("Card {card} is already in zone '{zone}'")]
    DuplicateInstance { card: CardId, zone: String },
    #[error("The opponent's field is read-only")]
    ReadOnlyField,
    #[error("Summon limit of {limit} per turn reached")]
    SummonLimitReached { limit: u32 },
    #[error("Slot {index} of zone '{zone}' is out of range or occupied")]
    InvalidSlot { zone: String, index: usize },
}

/// 공유 저장소 쓰기/읽기 에러. 로그로 남기고 재시도하지 않습니다.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SyncError {
    #[error("Write to '{path}' failed: {reason}")]
    WriteFailed { path: String, reason: String },
    #[error("Shared store is unavailable")]
    Unavailable,
    #[error("Failed to decode value at '{path}': {reason}")]
    Decode { path: String, reason: String },
}

/// 턴/페이즈 진행 에러
#[derive(Error, Debug, PartialEq, Clone)]
pub enum StateError {
    #[error("Player {player} tried to act during the opponent's turn")]
    NotYourTurn { player: String },
    #[error("The duel has not started yet")]
    GameNotStarted,
    #[error("Unrecognized phase '{0}'")]
    InvalidPhase(String),
}

/// 게임 규칙(전투, 덱 구성) 에러
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GameplayError {
    #[error("Card {0} has no monster stats")]
    NotAMonster(CardId),
    #[error("Card {0} not found")]
    CardNotFound(CardId),
    #[error("Deck list rejected: {0}")]
    DeckParse(String),
}

/// 시스템 레벨 에러 (I/O, JSON, 설정)
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("System I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// ===================================================================
// 최상위 GameError
// ===================================================================

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Zone(#[from] ZoneError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Gameplay(#[from] GameplayError),
    #[error(transparent)]
    System(#[from] SystemError),
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        GameError::System(SystemError::Json(e))
    }
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        GameError::System(SystemError::Io(e))
    }
}

impl From<config::ConfigError> for GameError {
    fn from(e: config::ConfigError) -> Self {
        GameError::System(SystemError::Config(e))
    }
}
