//! Reset countdowns and pacing for limit windows.
//!
//! Everything takes `now` explicitly so rendering is deterministic in tests.

use crate::account_usage::types::{LimitMetric, WindowKind};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Nominal length of a window kind, when it has one.
///
/// Sessions follow the five-hour rolling window used by subscription plans.
pub fn window_length(window: WindowKind) -> Option<Duration> {
    match window {
        WindowKind::Session => Some(Duration::from_secs(5 * 3600)),
        WindowKind::Daily | WindowKind::RequestsPerDay => Some(Duration::from_secs(86_400)),
        WindowKind::Weekly => Some(Duration::from_secs(7 * 86_400)),
        WindowKind::RequestsPerMinute | WindowKind::TokensPerMinute => {
            Some(Duration::from_secs(60))
        }
        WindowKind::Custom => None,
    }
}

/// Time left until `reset_at`, or None if it is unset or already past.
pub fn time_until(reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
    let diff = (reset_at? - now).num_seconds();
    if diff > 0 {
        Some(Duration::from_secs(diff as u64))
    } else {
        None
    }
}

/// Consumption compared with time elapsed in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsagePace {
    /// Used more than the elapsed share of the window
    Ahead,
    /// Within +/- 10 percentage points
    OnTrack,
    Behind,
    /// Missing limit, usage, reset or window length
    Unknown,
}

impl UsagePace {
    pub fn label(self) -> Option<&'static str> {
        match self {
            UsagePace::Ahead => Some("ahead of pace"),
            UsagePace::OnTrack => Some("on pace"),
            UsagePace::Behind => Some("under pace"),
            UsagePace::Unknown => None,
        }
    }
}

const PACE_THRESHOLD_PCT: f64 = 10.0;

/// Pace of a metric. Only windows of an hour or more are paced; per-minute
/// rate limits refill too fast for it to mean anything.
pub fn pace(metric: &LimitMetric, now: DateTime<Utc>) -> UsagePace {
    let Some(used_pct) = metric.utilization().map(|r| r * 100.0) else {
        return UsagePace::Unknown;
    };
    let Some(length) = window_length(metric.window).filter(|d| d.as_secs() >= 3600) else {
        return UsagePace::Unknown;
    };
    let Some(remaining) = time_until(metric.reset_at, now) else {
        return UsagePace::Unknown;
    };

    let total = length.as_secs_f64();
    let elapsed = (total - remaining.as_secs_f64()).max(0.0);
    let elapsed_pct = (elapsed / total * 100.0).clamp(0.0, 100.0);

    if used_pct > elapsed_pct + PACE_THRESHOLD_PCT {
        UsagePace::Ahead
    } else if used_pct < elapsed_pct - PACE_THRESHOLD_PCT {
        UsagePace::Behind
    } else {
        UsagePace::OnTrack
    }
}

/// Formats a duration as a countdown such as `2d 3h 05m`, `4h 07m` or `12m`.
///
/// Sub-minute durations show as seconds so per-minute limits stay readable.
/// `None` and zero render as `0m`.
pub fn format_countdown(duration: Option<Duration>) -> String {
    let Some(d) = duration else {
        return "0m".to_string();
    };

    let total_secs = d.as_secs();
    if total_secs == 0 {
        return "0m".to_string();
    }
    if total_secs < 60 {
        return format!("{}s", total_secs);
    }

    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;

    if days > 0 {
        if minutes > 0 {
            format!("{}d {}h {:02}m", days, hours, minutes)
        } else if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    } else if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap()
    }

    fn weekly(used: f64, resets_in_hours: i64) -> LimitMetric {
        LimitMetric::against_used("Weekly", WindowKind::Weekly, "percent", Some(100.0), Some(used))
            .with_reset(Some(now() + chrono::Duration::hours(resets_in_hours)))
    }

    #[test]
    fn test_time_until_past_and_future() {
        assert_eq!(time_until(None, now()), None);
        assert_eq!(
            time_until(Some(now() - chrono::Duration::seconds(5)), now()),
            None
        );
        assert_eq!(
            time_until(Some(now() + chrono::Duration::seconds(90)), now()),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn test_format_countdown_none_and_zero() {
        assert_eq!(format_countdown(None), "0m");
        assert_eq!(format_countdown(Some(Duration::ZERO)), "0m");
    }

    #[test]
    fn test_format_countdown_seconds_and_minutes() {
        assert_eq!(format_countdown(Some(Duration::from_secs(45))), "45s");
        assert_eq!(format_countdown(Some(Duration::from_secs(59 * 60))), "59m");
    }

    #[test]
    fn test_format_countdown_hours_and_days() {
        assert_eq!(format_countdown(Some(Duration::from_secs(3600 + 7 * 60))), "1h 07m");
        assert_eq!(format_countdown(Some(Duration::from_secs(2 * 86400 + 3 * 3600))), "2d 3h");
        assert_eq!(
            format_countdown(Some(Duration::from_secs(86400 + 3600 + 5 * 60))),
            "1d 1h 05m"
        );
        assert_eq!(format_countdown(Some(Duration::from_secs(3 * 86400))), "3d");
    }

    #[test]
    fn test_pace() {
        // Half the week elapsed.
        assert_eq!(pace(&weekly(90.0, 84), now()), UsagePace::Ahead);
        assert_eq!(pace(&weekly(50.0, 84), now()), UsagePace::OnTrack);
        assert_eq!(pace(&weekly(10.0, 84), now()), UsagePace::Behind);
    }

    #[test]
    fn test_pace_unknown_for_rate_limits_and_missing_reset() {
        let rpm = LimitMetric::against_remaining(
            "Requests",
            WindowKind::RequestsPerMinute,
            "requests/min",
            Some(100.0),
            Some(10.0),
        )
        .with_reset(Some(now() + chrono::Duration::seconds(30)));
        assert_eq!(pace(&rpm, now()), UsagePace::Unknown);

        let no_reset = weekly(50.0, 1).with_reset(None);
        assert_eq!(pace(&no_reset, now()), UsagePace::Unknown);
    }
}
