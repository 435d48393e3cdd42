//! Rating delta calculation.
//!
//! The delta is the signed difference between the user's own rating,
//! rescaled from 0–5 to 0–100, and the Rotten Tomatoes percentage:
//!
//! ```text
//! my_rating_delta = trunc(rating * 20 - rotten_tomatoes)
//! ```
//!
//! Every malformed input yields `None` rather than an error, so a single
//! odd note never aborts a batch run.

use serde_yaml::Value;

/// Multiplier from the 0–5 rating scale to a percentage.
pub const RATING_SCALE: f64 = 20.0;

/// Compute the delta from a numeric rating and a `"<digits>%"` score.
///
/// Returns `None` when the score is not of that exact shape or the rating
/// is not a finite number.
///
/// ```
/// use movie_notes::delta::rating_delta;
/// assert_eq!(rating_delta(4.0, "75%"), Some(5));
/// assert_eq!(rating_delta(3.5, "90%"), Some(-20));
/// assert_eq!(rating_delta(3.5, "90"), None);
/// ```
pub fn rating_delta(rating: f64, score: &str) -> Option<i64> {
    if !rating.is_finite() {
        return None;
    }
    let score = parse_percentage(score)?;
    let delta = (rating * RATING_SCALE - score as f64).trunc();
    if delta.is_finite() && delta.abs() < i64::MAX as f64 {
        Some(delta as i64)
    } else {
        None
    }
}

/// Compute the delta from raw frontmatter values.
///
/// Either value being absent or null yields `None`. The rating may be a
/// YAML number or a numeric string; the score must be a string.
pub fn compute_delta(rating: Option<&Value>, score: Option<&Value>) -> Option<i64> {
    let rating = rating_value(rating?)?;
    let score = score?.as_str()?;
    rating_delta(rating, score)
}

fn rating_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse `"<digits>%"` into its integer percentage.
fn parse_percentage(score: &str) -> Option<u32> {
    let digits = score.strip_suffix('%')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
