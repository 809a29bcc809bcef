//! Utility functions for the arena

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique item ID
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two skill means
pub fn mu_distance(mu1: f64, mu2: f64) -> f64 {
    (mu1 - mu2).abs()
}
