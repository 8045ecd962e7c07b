pub mod card;
pub mod client;
pub mod enums;
pub mod env;
pub mod exception;
pub mod game;
pub mod session;
pub mod store;
pub mod stream;
pub mod sync;
pub mod zone;

use env::Settings;
use once_cell::sync::OnceCell;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// 파일(일 단위 롤링, non-blocking) 로거를 초기화합니다. 여러 번 호출해도 한 번만 설치됩니다.
///
/// `RUST_LOG` 가 있으면 설정 파일의 레벨보다 우선합니다.
pub fn setup_logger(settings: &Settings) {
    GUARD.get_or_init(|| {
        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            &settings.logging.directory,
            &settings.logging.filename,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .pretty();

        // 테스트에서 이미 다른 subscriber 가 설치된 경우는 무시합니다.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .try_init();

        tracing::info!(
            "Logger initialized: {}/{}",
            settings.logging.directory,
            settings.logging.filename
        );
        guard
    });
}

pub trait LogExt<T, E> {
    fn log_ok(self, f: impl FnOnce()) -> Self;
    fn log_err(self, f: impl FnOnce(&E)) -> Self;
}

impl<T, E> LogExt<T, E> for Result<T, E> {
    fn log_ok(self, f: impl FnOnce()) -> Self {
        if self.is_ok() {
            f()
        }
        self
    }

    fn log_err(self, f: impl FnOnce(&E)) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}
