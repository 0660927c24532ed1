use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tokio::time::Instant;

/// Current UTC time truncated to whole milliseconds, the precision the store keeps.
pub fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(now)
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}
