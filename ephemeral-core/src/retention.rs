//! Retention policy and per-post decisions
//!
//! A post is judged by two rules, in order:
//!
//! 1. Posts created before the epoch are never deleted.
//! 2. Posts older than `max_age` are deleted; everything else is kept.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EphemeralError, Result};
use crate::post::Post;

/// Number of characters of a kept post shown in logs
pub const KEEP_PREVIEW_CHARS: usize = 45;

/// Date layout accepted for the epoch
pub const EPOCH_FORMAT: &str = "%Y-%m-%d";

/// Temporal boundaries for a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Posts created before this instant are never deleted
    pub epoch: DateTime<Utc>,

    /// Posts older than this are deleted
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

/// Outcome of evaluating a single post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Created before the epoch
    SkipPreEpoch,

    /// Older than `max_age`
    Delete {
        /// Age of the post at evaluation time
        #[serde(with = "humantime_serde")]
        age: Duration,
    },

    /// Still inside the retention window
    Keep,
}

impl Decision {
    /// Whether the post should be handed to the delete capability
    pub fn is_delete(&self) -> bool {
        matches!(self, Decision::Delete { .. })
    }
}

impl RetentionPolicy {
    /// Create a new policy
    pub fn new(epoch: DateTime<Utc>, max_age: Duration) -> Self {
        Self { epoch, max_age }
    }

    /// Decide what to do with `post` at instant `now`.
    ///
    /// A post dated after `now` has no age and is kept.
    pub fn decide(&self, post: &Post, now: DateTime<Utc>) -> Decision {
        if post.created_at < self.epoch {
            return Decision::SkipPreEpoch;
        }

        match now.signed_duration_since(post.created_at).to_std() {
            Ok(age) if age > self.max_age => Decision::Delete { age },
            _ => Decision::Keep,
        }
    }
}

/// Parse a `YYYY-MM-DD` epoch as midnight UTC.
///
/// # Errors
///
/// Returns [`EphemeralError::Configuration`] for anything that is not a valid
/// calendar date.
pub fn parse_epoch(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), EPOCH_FORMAT).map_err(|e| {
        EphemeralError::Configuration(format!(
            "Error parsing epoch date {:?} (expected YYYY-MM-DD): {}",
            value, e
        ))
    })?;

    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| EphemeralError::Configuration(format!("Invalid epoch date: {}", value)))
}

/// Return at most `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Round to the nearest minute, halves rounding up.
pub fn round_to_minute(duration: Duration) -> Duration {
    const MINUTE_NANOS: u128 = 60_000_000_000;
    let minutes = (duration.as_nanos() + MINUTE_NANOS / 2) / MINUTE_NANOS;
    Duration::from_secs(u64::try_from(minutes * 60).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn policy() -> RetentionPolicy {
        RetentionPolicy::new(parse_epoch("2020-01-01").unwrap(), DAY)
    }

    #[test]
    fn test_reference_scenario() {
        let now = at(2024, 1, 10, 12);
        let policy = policy();

        let a = Post::new(1, "first post", at(2019, 6, 1, 0));
        let b = Post::new(2, "two days old", at(2024, 1, 8, 12));
        let c = Post::new(3, "six hours old", at(2024, 1, 10, 6));

        assert_eq!(policy.decide(&a, now), Decision::SkipPreEpoch);
        assert_eq!(
            policy.decide(&b, now),
            Decision::Delete {
                age: Duration::from_secs(48 * 60 * 60)
            }
        );
        assert_eq!(policy.decide(&c, now), Decision::Keep);
    }

    #[test]
    fn test_pre_epoch_wins_over_age() {
        let policy = RetentionPolicy::new(parse_epoch("2020-01-01").unwrap(), Duration::ZERO);
        let ancient = Post::new(1, "hello world", at(2010, 3, 21, 20));
        assert_eq!(policy.decide(&ancient, at(2024, 1, 1, 0)), Decision::SkipPreEpoch);
    }

    #[test]
    fn test_epoch_boundary_is_inclusive() {
        let policy = policy();
        let on_epoch = Post::new(1, "midnight", policy.epoch);
        assert!(policy.decide(&on_epoch, at(2024, 1, 1, 0)).is_delete());
    }

    #[test]
    fn test_exact_max_age_is_kept() {
        let policy = policy();
        let now = at(2024, 1, 10, 12);
        let post = Post::new(1, "exactly a day", at(2024, 1, 9, 12));
        assert_eq!(policy.decide(&post, now), Decision::Keep);
    }

    #[test]
    fn test_zero_max_age_deletes_everything_after_epoch() {
        let policy = RetentionPolicy::new(parse_epoch("2020-01-01").unwrap(), Duration::ZERO);
        let now = at(2024, 1, 10, 12);
        let recent = Post::new(1, "just now", at(2024, 1, 10, 11));
        assert!(policy.decide(&recent, now).is_delete());
    }

    #[test]
    fn test_future_post_is_kept() {
        let policy = policy();
        let now = at(2024, 1, 10, 12);
        let future = Post::new(1, "clock skew", at(2024, 1, 11, 12));
        assert_eq!(policy.decide(&future, now), Decision::Keep);
    }

    #[test]
    fn test_parse_epoch() {
        assert_eq!(parse_epoch("2020-01-01").unwrap(), at(2020, 1, 1, 0));
        assert!(matches!(
            parse_epoch("2020-13-01"),
            Err(EphemeralError::Configuration(_))
        ));
        assert!(parse_epoch("01/01/2020").is_err());
        assert!(parse_epoch("").is_err());
    }

    #[test]
    fn test_truncate_chars_clamps_short_text() {
        assert_eq!(truncate_chars("short", KEEP_PREVIEW_CHARS), "short");
        assert_eq!(truncate_chars("", KEEP_PREVIEW_CHARS), "");

        let long = "a".repeat(60);
        assert_eq!(truncate_chars(&long, KEEP_PREVIEW_CHARS).len(), 45);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "é".repeat(50);
        let preview = truncate_chars(&text, KEEP_PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), 45);
    }

    #[test]
    fn test_round_to_minute() {
        assert_eq!(round_to_minute(Duration::from_secs(89)), Duration::from_secs(60));
        assert_eq!(round_to_minute(Duration::from_secs(90)), Duration::from_secs(120));
        assert_eq!(round_to_minute(Duration::from_secs(29)), Duration::ZERO);
        assert_eq!(round_to_minute(Duration::from_secs(30)), Duration::from_secs(60));
    }

    #[test]
    fn test_round_to_minute_keeps_subsecond_precision() {
        assert_eq!(round_to_minute(Duration::from_millis(29_600)), Duration::ZERO);
        assert_eq!(
            round_to_minute(Duration::from_millis(89_600)),
            Duration::from_secs(60)
        );
        assert_eq!(
            round_to_minute(Duration::from_millis(29_999)),
            Duration::ZERO
        );
        assert_eq!(
            round_to_minute(Duration::from_secs(48 * 3600 + 29)),
            Duration::from_secs(48 * 3600)
        );
    }
}
