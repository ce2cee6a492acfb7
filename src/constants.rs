use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Upper bound on an uploaded original, inclusive.
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

pub const MAX_LISTED_IMAGES: i64 = 1000;

pub const REMOVEBG_PROVIDER: &str = "REMOVEBG";

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
