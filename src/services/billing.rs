//! Subscription purchases.
//!
//! One transaction covers the subscription row and the mirrored window on
//! the user record; any failure rolls both back. A replayed payment
//! reference returns the subscription it originally created instead of
//! stacking a second active one.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::constants::{MONTHLY_PRICE, SUBSCRIPTION_DAYS};
use crate::domain::{subscriptions, users};

#[derive(Debug, Clone)]
pub struct SubscriptionReceipt {
    pub subscription_id: i64,
    pub end_date: DateTime<Utc>,
    pub message: String,
}

/// The fixed 30-day window for a purchase made at `start`.
pub fn subscription_window(start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (start, start + Duration::days(SUBSCRIPTION_DAYS))
}

/// Activate a monthly subscription for `user_id`.
pub async fn create_subscription(
    db: &PgPool,
    user_id: i64,
    payment_method: &str,
    payment_id: &str,
) -> Result<SubscriptionReceipt, sqlx::Error> {
    let (start, end) = subscription_window(Utc::now());

    let mut tx = db.begin().await?;

    let inserted = subscriptions::insert(
        &mut *tx,
        user_id,
        "monthly",
        MONTHLY_PRICE,
        payment_method,
        payment_id,
        start,
        end,
    )
    .await?;

    let receipt = match inserted {
        Some(subscription) => {
            users::set_subscribed(&mut *tx, user_id, start, end).await?;
            SubscriptionReceipt {
                subscription_id: subscription.id,
                end_date: subscription.end_date,
                message: "Subscription activated successfully!".to_string(),
            }
        }
        None => {
            // Replayed payment callback: hand back the original subscription
            let existing = subscriptions::find_by_payment_id(&mut *tx, payment_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            SubscriptionReceipt {
                subscription_id: existing.id,
                end_date: existing.end_date,
                message: "Payment already processed; subscription unchanged".to_string(),
            }
        }
    };

    tx.commit().await?;
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_is_exactly_thirty_days() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let (s, e) = subscription_window(start);
        assert_eq!(s, start);
        assert_eq!(e - s, Duration::days(30));
        assert_eq!(e, Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap());
    }
}
