use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::{
    enums::{ACTION_HISTORY_LIMIT, CHAT_HISTORY_LIMIT, HEARTBEAT_INTERVAL},
    game::Rules,
};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: String,
    pub filename: String,
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub heartbeat_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub chat_limit: usize,
    pub action_limit: usize,
}

/// 실행 설정.
///
/// 우선순위: 기본값 < `config/{RUN_MODE}.toml` < `DUEL__섹션__키` 환경 변수
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub rules: Rules,
    pub sync: SyncSettings,
    pub streams: StreamSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load(&format!("config/{}", run_mode))
    }

    /// 지정한 설정 파일(확장자 제외)을 읽습니다. 파일이 없으면 기본값만 사용합니다.
    pub fn load(file: &str) -> Result<Self, ConfigError> {
        let rules = Rules::default();
        let s = Config::builder()
            .set_default("logging.directory", "logs")?
            .set_default("logging.filename", "duel.log")?
            .set_default("logging.level", "info")?
            .set_default("rules.summon_limit", rules.summon_limit)?
            .set_default("rules.turn_seconds", rules.turn_seconds)?
            .set_default("rules.initial_life_points", rules.initial_life_points)?
            .set_default("rules.opening_hand", rules.opening_hand as u64)?
            .set_default("sync.heartbeat_interval_seconds", HEARTBEAT_INTERVAL)?
            .set_default("streams.chat_limit", CHAT_HISTORY_LIMIT as u64)?
            .set_default("streams.action_limit", ACTION_HISTORY_LIMIT as u64)?
            .add_source(
                File::with_name(file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("DUEL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                directory: "logs".to_string(),
                filename: "duel.log".to_string(),
                level: "info".to_string(),
            },
            rules: Rules::default(),
            sync: SyncSettings {
                heartbeat_interval_seconds: HEARTBEAT_INTERVAL,
            },
            streams: StreamSettings {
                chat_limit: CHAT_HISTORY_LIMIT,
                action_limit: ACTION_HISTORY_LIMIT,
            },
        }
    }
}
