//! Time and money accounting.
//!
//! Focus time is tracked in whole seconds; money is whole currency units,
//! always rounded down.

use crate::model::CurrentSession;

const SECS_PER_HOUR: f64 = 3600.0;

/// Whole seconds between two epoch-millisecond instants, floored.
///
/// A clock that moved backwards yields zero rather than negative time.
pub fn elapsed_seconds(start_ms: i64, now_ms: i64) -> u64 {
    if now_ms <= start_ms {
        return 0;
    }
    (now_ms.saturating_sub(start_ms) / 1000) as u64
}

/// Money for `seconds` at `hourly_rate`: `floor(seconds / 3600 * rate)`.
pub fn money_for_seconds(seconds: u64, hourly_rate: f64) -> u64 {
    let amount = seconds as f64 / SECS_PER_HOUR * hourly_rate;
    if amount.is_finite() && amount > 0.0 {
        amount.floor() as u64
    } else {
        0
    }
}

/// Banked session seconds plus the currently running interval.
pub fn live_session_seconds(session: &CurrentSession, now_ms: i64) -> u64 {
    let running = session
        .running_since()
        .map(|start| elapsed_seconds(start, now_ms))
        .unwrap_or(0);
    session.accumulated_time + running
}

/// `H:MM:SS` when at least an hour, otherwise `M:SS`.
pub fn format_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Whole currency units with a `$` prefix.
pub fn format_money(amount: u64) -> String {
    format!("${amount}")
}
