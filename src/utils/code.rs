// src/utils/code.rs

use rand::{Rng, distributions::Alphanumeric};

/// Length of the public session handle.
pub const SESSION_CODE_LEN: usize = 8;

/// Draws a random alphanumeric session code.
///
/// The code space (62^8) makes collisions negligible, but callers must still
/// treat the unique constraint on `live_sessions.session_code` as the source
/// of truth and redraw on an insert conflict.
pub fn session_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_CODE_LEN)
        .map(char::from)
        .collect()
}
