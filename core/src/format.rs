//! Display helpers computed purely from timestamps.
//!
//! Story expiry here is advisory. The server filters expired stories out of
//! the active lists; nothing on the client relies on this for access control.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::types::Story;

/// How much longer a story stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryExpiry {
    Expired,
    LessThanHour,
    Remaining { hours: i64 },
}

impl StoryExpiry {
    pub fn at(expire_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let left = expire_at - now;
        if left <= Duration::zero() {
            StoryExpiry::Expired
        } else if left < Duration::hours(1) {
            StoryExpiry::LessThanHour
        } else {
            StoryExpiry::Remaining {
                hours: left.num_hours(),
            }
        }
    }

    pub fn is_expired(self) -> bool {
        self == StoryExpiry::Expired
    }
}

impl fmt::Display for StoryExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryExpiry::Expired => f.write_str("Expired"),
            StoryExpiry::LessThanHour => f.write_str("Less than 1h"),
            StoryExpiry::Remaining { hours } => write!(f, "{hours}h remaining"),
        }
    }
}

impl Story {
    pub fn expiry(&self, now: DateTime<Utc>) -> StoryExpiry {
        StoryExpiry::at(self.expire_at, now)
    }
}

/// "Just now", "5h ago", "3d ago", or the calendar date after a week.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - at).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if hours < 24 * 7 {
        format!("{}d ago", hours / 24)
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn story(expire_at: DateTime<Utc>) -> Story {
        Story {
            id: 1,
            content_url: "/uploads/images/a.png".into(),
            created_at: expire_at - Duration::hours(24),
            expire_at,
            is_active: true,
            user: None,
        }
    }

    #[test]
    fn story_two_hours_past_is_expired() {
        let s = story(now() - Duration::hours(2));
        assert_eq!(s.expiry(now()).to_string(), "Expired");
        assert!(s.expiry(now()).is_expired());
    }

    #[test]
    fn story_expiring_now_is_expired() {
        assert_eq!(story(now()).expiry(now()), StoryExpiry::Expired);
    }

    #[test]
    fn story_under_an_hour_left() {
        let s = story(now() + Duration::minutes(30));
        assert_eq!(s.expiry(now()).to_string(), "Less than 1h");
    }

    #[test]
    fn story_hours_remaining_round_down() {
        let s = story(now() + Duration::minutes(5 * 60 + 59));
        assert_eq!(s.expiry(now()).to_string(), "5h remaining");
    }

    #[test]
    fn relative_time_buckets() {
        assert_eq!(relative_time(now() - Duration::minutes(59), now()), "Just now");
        assert_eq!(relative_time(now() - Duration::hours(5), now()), "5h ago");
        assert_eq!(relative_time(now() - Duration::hours(50), now()), "2d ago");
        assert_eq!(relative_time(now() - Duration::days(10), now()), "2024-05-22");
    }
}
