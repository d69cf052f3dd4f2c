//! Usage/quota tracking: the daily free-tier gate and usage statistics.
//!
//! Whether a user may run an analysis is a pure function of today's count
//! and whether an active, unexpired subscription exists - nothing else. The
//! gate read and the subsequent increment are separate round trips; two
//! requests racing through the gate in the same instant can both pass. That
//! race is accepted for a soft daily counter and documented here rather
//! than hidden behind a transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::constants::FREE_DAILY_LIMIT;
use crate::domain::{subscriptions, usage};

/// Either a numeric limit or the literal string "unlimited", matching the
/// wire format subscribers see.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QuotaValue {
    Count(i32),
    Text(&'static str),
}

impl QuotaValue {
    pub fn unlimited() -> Self {
        QuotaValue::Text("unlimited")
    }
}

/// Outcome of the quota gate for one user.
#[derive(Debug, Clone)]
pub struct UsageCheck {
    pub can_analyze: bool,
    pub is_subscribed: bool,
    pub usage_count: i32,
    pub limit: QuotaValue,
    pub remaining: Option<i32>,
    pub message: Option<String>,
}

/// The quota decision itself, separated from I/O so it can be tested
/// exhaustively.
pub fn evaluate(usage_count: i32, is_subscribed: bool) -> UsageCheck {
    if is_subscribed {
        return UsageCheck {
            can_analyze: true,
            is_subscribed: true,
            usage_count,
            limit: QuotaValue::unlimited(),
            remaining: None,
            message: None,
        };
    }

    if usage_count >= FREE_DAILY_LIMIT {
        return UsageCheck {
            can_analyze: false,
            is_subscribed: false,
            usage_count,
            limit: QuotaValue::Count(FREE_DAILY_LIMIT),
            remaining: None,
            message: Some(format!(
                "You have reached your daily limit of {} free analyses. Subscribe for unlimited access!",
                FREE_DAILY_LIMIT
            )),
        };
    }

    UsageCheck {
        can_analyze: true,
        is_subscribed: false,
        usage_count,
        limit: QuotaValue::Count(FREE_DAILY_LIMIT),
        remaining: Some(FREE_DAILY_LIMIT - usage_count),
        message: None,
    }
}

/// Gate a new analysis for `user_id`.
pub async fn check_usage_limit(db: &PgPool, user_id: i64) -> Result<UsageCheck, sqlx::Error> {
    let now = Utc::now();
    let count = usage::count_for_day(db, user_id, now.date_naive()).await?;
    let active = subscriptions::find_active(db, user_id, now).await?;
    Ok(evaluate(count, active.is_some()))
}

/// Record one started analysis. Called exactly once per permitted request.
pub async fn increment_usage(db: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    usage::increment(db, user_id, Utc::now().date_naive()).await?;
    Ok(())
}

/// Payload for `GET /usage/stats`.
#[derive(Debug, Serialize)]
pub struct UsageStats {
    pub user_id: i64,
    pub is_subscribed: bool,
    pub usage_today: i32,
    pub limit: QuotaValue,
    pub remaining: QuotaValue,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

pub async fn get_usage_stats(db: &PgPool, user_id: i64) -> Result<UsageStats, sqlx::Error> {
    let now = Utc::now();
    let usage_today = usage::count_for_day(db, user_id, now.date_naive()).await?;
    let active = subscriptions::find_active(db, user_id, now).await?;

    Ok(match active {
        Some(subscription) => UsageStats {
            user_id,
            is_subscribed: true,
            usage_today,
            limit: QuotaValue::unlimited(),
            remaining: QuotaValue::unlimited(),
            subscription_end_date: Some(subscription.end_date),
        },
        None => UsageStats {
            user_id,
            is_subscribed: false,
            usage_today,
            limit: QuotaValue::Count(FREE_DAILY_LIMIT),
            remaining: QuotaValue::Count((FREE_DAILY_LIMIT - usage_today).max(0)),
            subscription_end_date: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_user_allowed_until_limit() {
        for count in 0..FREE_DAILY_LIMIT {
            let check = evaluate(count, false);
            assert!(check.can_analyze, "count {} should be allowed", count);
            assert_eq!(check.remaining, Some(FREE_DAILY_LIMIT - count));
            assert_eq!(check.limit, QuotaValue::Count(7));
        }
    }

    #[test]
    fn test_free_user_blocked_at_limit() {
        let check = evaluate(FREE_DAILY_LIMIT, false);
        assert!(!check.can_analyze);
        assert!(check.message.as_deref().unwrap().contains("daily limit"));
        assert_eq!(check.remaining, None);
    }

    #[test]
    fn test_subscriber_never_blocked() {
        for count in [0, 7, 500] {
            let check = evaluate(count, true);
            assert!(check.can_analyze);
            assert_eq!(check.limit, QuotaValue::unlimited());
        }
    }

    #[test]
    fn test_quota_value_wire_format() {
        assert_eq!(
            serde_json::to_value(QuotaValue::Count(7)).unwrap(),
            serde_json::json!(7)
        );
        assert_eq!(
            serde_json::to_value(QuotaValue::unlimited()).unwrap(),
            serde_json::json!("unlimited")
        );
    }
}
