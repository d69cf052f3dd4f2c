//! Application constants

/// Free-tier daily analysis limit
pub const FREE_DAILY_LIMIT: i32 = 7;

/// Monthly subscription price in USD
pub const MONTHLY_PRICE: f64 = 7.00;

/// Monthly subscription length in days
pub const SUBSCRIPTION_DAYS: i64 = 30;

/// Maximum upload size for analysis images (25 MB)
pub const MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Canny hysteresis thresholds for edge-density extraction
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Confidence caps for the heuristic scorers
pub const FORGERY_CONFIDENCE_CAP: f64 = 0.9;
pub const DEEPFAKE_CONFIDENCE_CAP: f64 = 0.85;
