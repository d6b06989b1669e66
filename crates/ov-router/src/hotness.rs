//! Hotness re-ranking: recently and frequently touched contexts float up.

use chrono::{DateTime, Utc};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `σ(log1p(active_count)) · exp(-ln2·age_days/half_life)`. `updated_at =
/// None` means the context has never been touched, so it carries no
/// recency signal at all: hotness is `0.0` regardless of `active_count`.
pub fn hotness(active_count: u64, updated_at: Option<DateTime<Utc>>, half_life_days: f32, now: DateTime<Utc>) -> f32 {
    let Some(t) = updated_at else { return 0.0 };

    let recency = (active_count as f64 + 1.0).ln();
    let activity = sigmoid(recency);

    let age_days = (now - t).num_seconds().max(0) as f64 / 86_400.0;
    let half_life = half_life_days.max(0.001) as f64;
    let decay = (-std::f64::consts::LN_2 * age_days / half_life).exp();

    (activity * decay) as f32
}

/// `(1-α)·semantic + α·hotness`.
pub fn final_score(semantic: f32, hotness: f32, alpha: f32) -> f32 {
    let alpha = alpha.clamp(0.0, 1.0);
    (1.0 - alpha) * semantic + alpha * hotness
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn higher_active_count_strictly_increases_hotness() {
        let now = Utc::now();
        let low = hotness(1, Some(now), 14.0, now);
        let high = hotness(100, Some(now), 14.0, now);
        assert!(high > low);
    }

    #[test]
    fn more_recent_updated_at_strictly_increases_hotness() {
        let now = Utc::now();
        let stale = hotness(10, Some(now - Duration::days(30)), 14.0, now);
        let fresh = hotness(10, Some(now - Duration::days(1)), 14.0, now);
        assert!(fresh > stale);
    }

    #[test]
    fn missing_updated_at_is_zero_hotness() {
        let now = Utc::now();
        assert_eq!(hotness(5, None, 14.0, now), 0.0);
    }

    #[test]
    fn final_score_is_a_convex_combination() {
        let s = final_score(0.8, 0.2, 0.2);
        assert!((s - (0.8 * 0.8 + 0.2 * 0.2)).abs() < 1e-6);
    }

    #[test]
    fn alpha_zero_ignores_hotness_entirely() {
        assert_eq!(final_score(0.5, 0.9, 0.0), 0.5);
    }

    #[test]
    fn alpha_one_ignores_semantic_entirely() {
        assert_eq!(final_score(0.5, 0.9, 1.0), 0.9);
    }
}
