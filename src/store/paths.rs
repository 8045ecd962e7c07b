//! 공유 저장소 경로 규칙.

use crate::enums::{ACTIONS_ROOT, CHAT_ROOT, CONNECTION_TEST_ROOT, GAME_STATES_ROOT, SESSIONS_ROOT};

pub fn session(game_id: &str) -> String {
    format!("{}/{}", SESSIONS_ROOT, game_id)
}

pub fn game_state(game_id: &str, uid: &str) -> String {
    format!("{}/{}/{}", GAME_STATES_ROOT, game_id, uid)
}

pub fn chat(game_id: &str) -> String {
    format!("{}/{}", CHAT_ROOT, game_id)
}

pub fn actions(game_id: &str) -> String {
    format!("{}/{}", ACTIONS_ROOT, game_id)
}

pub fn connection_test(uid: &str) -> String {
    format!("{}/{}", CONNECTION_TEST_ROOT, uid)
}

pub fn child(path: &str, key: &str) -> String {
    format!("{}/{}", path.trim_end_matches('/'), key)
}

/// 빈 세그먼트를 제거한 경로 조각
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// 두 경로 중 하나가 다른 하나의 조상(또는 동일)인지 여부
pub fn overlaps(a: &str, b: &str) -> bool {
    let a = segments(a);
    let b = segments(b);
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}
