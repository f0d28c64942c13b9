//! End-of-cloud-provisioning (EOCP) arithmetic.
//!
//! The overview encodes EOCP as a fiscal quarter string such as `Q1/2026`.
//! A quarter spans three calendar months starting January, April, July or
//! October; the quarter "ends" at UTC midnight of its last calendar day.
//!
//! Placeholders like `To Be Determined` are common for lines that have no
//! schedule yet. They produce an *undetermined* fact whose flags are all
//! false, never an error.
//!
//! ## Caching
//!
//! Facts are memoized per quarter string in a [`LifecycleCache`]. The first
//! computation for a key wins: later lookups with a different `now` reuse
//! the stored fact. A cache therefore represents one point in time and
//! callers that need fresh facts must [`LifecycleCache::reset`] it (the
//! check orchestrator does so at the start of every run).

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

fn quarter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Q([1-4])/(\d{4})").expect("quarter pattern is valid"))
}

/// Lifecycle facts derived from one EOCP quarter string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleFact {
    /// Raw quarter string as published (e.g. `Q1/2026`).
    pub quarter_key: String,

    /// `now` is after the end of the quarter.
    pub has_reached_eocp: bool,

    /// `now` lies strictly inside the quarter.
    pub is_in_final_quarter: bool,

    /// Whole days left until the quarter ends; `None` when `now` is outside
    /// the quarter or the quarter is undetermined.
    pub days_remaining: Option<i64>,

    /// Last calendar day of the quarter.
    pub quarter_end: Option<NaiveDate>,
}

impl LifecycleFact {
    /// Fact for a quarter string that does not name a real quarter.
    pub fn undetermined(quarter_key: &str) -> Self {
        Self {
            quarter_key: quarter_key.to_string(),
            has_reached_eocp: false,
            is_in_final_quarter: false,
            days_remaining: None,
            quarter_end: None,
        }
    }

    /// Whether the quarter string could be parsed.
    pub fn is_determined(&self) -> bool {
        self.quarter_end.is_some()
    }
}

/// First and last calendar day of `Qn/YYYY`.
pub fn quarter_bounds(quarter: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let start_month = (quarter - 1) * 3 + 1;
    let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
    let next_start = if quarter == 4 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, start_month + 3, 1)?
    };
    Some((start, next_start.pred_opt()?))
}

fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Compute lifecycle facts for `quarter_key` as seen at `now`.
///
/// Pure function; see [`LifecycleCache`] for memoization.
pub fn compute_lifecycle(quarter_key: &str, now: DateTime<Utc>) -> LifecycleFact {
    let Some(caps) = quarter_pattern().captures(quarter_key) else {
        return LifecycleFact::undetermined(quarter_key);
    };
    let (Ok(quarter), Ok(year)) = (caps[1].parse::<u32>(), caps[2].parse::<i32>()) else {
        return LifecycleFact::undetermined(quarter_key);
    };
    let Some((start, end)) = quarter_bounds(quarter, year) else {
        return LifecycleFact::undetermined(quarter_key);
    };

    let start_at = utc_midnight(start);
    let end_at = utc_midnight(end);

    let days_remaining = if now < start_at || now > end_at {
        None
    } else {
        Some((end_at - now).num_days().abs())
    };

    LifecycleFact {
        quarter_key: quarter_key.to_string(),
        has_reached_eocp: now > end_at,
        is_in_final_quarter: start_at < now && now < end_at,
        days_remaining,
        quarter_end: Some(end),
    }
}

/// Thread-safe memo of lifecycle facts keyed by quarter string.
///
/// Concurrent callers may compute the same fact twice; the first insert is
/// kept and every reader sees it afterwards.
#[derive(Debug, Default)]
pub struct LifecycleCache {
    facts: RwLock<HashMap<String, LifecycleFact>>,
}

impl LifecycleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached fact for `quarter_key`, computing it at `now` on first use.
    pub fn get_or_compute(&self, quarter_key: &str, now: DateTime<Utc>) -> LifecycleFact {
        if let Some(fact) = self
            .facts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(quarter_key)
        {
            return fact.clone();
        }

        let fact = compute_lifecycle(quarter_key, now);
        self.facts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(quarter_key.to_string())
            .or_insert(fact)
            .clone()
    }

    /// Number of distinct quarter strings cached.
    pub fn len(&self) -> usize {
        self.facts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached facts.
    pub fn reset(&self) {
        self.facts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// A lifecycle cache bound to a reference time.
#[derive(Debug, Clone)]
pub struct LifecycleCalculator {
    cache: Arc<LifecycleCache>,
    now: DateTime<Utc>,
}

impl LifecycleCalculator {
    pub fn new(cache: Arc<LifecycleCache>, now: DateTime<Utc>) -> Self {
        Self { cache, now }
    }

    /// Calculator with a private, empty cache.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::new(Arc::new(LifecycleCache::new()), now)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn cache(&self) -> &Arc<LifecycleCache> {
        &self.cache
    }

    /// Lifecycle fact for `quarter_key`.
    pub fn fact(&self, quarter_key: &str) -> LifecycleFact {
        self.cache.get_or_compute(quarter_key, self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{date}T00:00:00Z"))
            .expect("parse RFC3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_quarter_bounds() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(
            quarter_bounds(1, 2026),
            Some((ymd(2026, 1, 1), ymd(2026, 3, 31)))
        );
        assert_eq!(
            quarter_bounds(2, 2025),
            Some((ymd(2025, 4, 1), ymd(2025, 6, 30)))
        );
        assert_eq!(
            quarter_bounds(3, 2025),
            Some((ymd(2025, 7, 1), ymd(2025, 9, 30)))
        );
        assert_eq!(
            quarter_bounds(4, 2024),
            Some((ymd(2024, 10, 1), ymd(2024, 12, 31)))
        );
        assert_eq!(quarter_bounds(5, 2024), None);
    }

    #[test]
    fn test_placeholder_is_undetermined() {
        for key in ["To Be Determined", "", "Q5/2026", "Q0/2026", "2026/Q1", "Qx/2026"] {
            let fact = compute_lifecycle(key, at("2026-02-15"));
            assert!(!fact.has_reached_eocp, "{key}");
            assert!(!fact.is_in_final_quarter, "{key}");
            assert_eq!(fact.days_remaining, None, "{key}");
            assert!(!fact.is_determined(), "{key}");
        }
    }

    #[test]
    fn test_quarter_not_started() {
        let fact = compute_lifecycle("Q1/2026", at("2025-06-01"));
        assert_eq!(fact.quarter_end, NaiveDate::from_ymd_opt(2026, 3, 31));
        assert!(!fact.has_reached_eocp);
        assert!(!fact.is_in_final_quarter);
        assert_eq!(fact.days_remaining, None);
    }

    #[test]
    fn test_inside_final_quarter() {
        let fact = compute_lifecycle("Q1/2026", at("2026-02-15"));
        assert!(fact.is_in_final_quarter);
        assert!(!fact.has_reached_eocp);
        // Feb 15 -> Mar 31: 13 days left in February plus 31 in March
        assert_eq!(fact.days_remaining, Some(44));
    }

    #[test]
    fn test_partial_day_is_floored() {
        let now = DateTime::parse_from_rfc3339("2026-03-29T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fact = compute_lifecycle("Q1/2026", now);
        assert_eq!(fact.days_remaining, Some(1));
    }

    #[test]
    fn test_quarter_passed() {
        let fact = compute_lifecycle("Q4/2024", at("2025-03-15"));
        assert!(fact.has_reached_eocp);
        assert!(!fact.is_in_final_quarter);
        assert_eq!(fact.days_remaining, None);
    }

    #[test]
    fn test_last_day_of_quarter_counts_as_reached() {
        let now = DateTime::parse_from_rfc3339("2026-03-31T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fact = compute_lifecycle("Q1/2026", now);
        assert!(fact.has_reached_eocp);
        assert!(!fact.is_in_final_quarter);
    }

    #[test]
    fn test_exact_quarter_end_is_zero_days() {
        let fact = compute_lifecycle("Q1/2026", at("2026-03-31"));
        assert!(!fact.has_reached_eocp);
        assert!(!fact.is_in_final_quarter);
        assert_eq!(fact.days_remaining, Some(0));
    }

    #[test]
    fn test_cache_returns_identical_fact() {
        let cache = LifecycleCache::new();
        let first = cache.get_or_compute("Q1/2026", at("2026-02-15"));
        let second = cache.get_or_compute("Q1/2026", at("2026-02-15"));
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_reuses_stale_fact_for_other_now() {
        let cache = LifecycleCache::new();
        let first = cache.get_or_compute("Q1/2026", at("2026-02-15"));
        let later = cache.get_or_compute("Q1/2026", at("2027-01-01"));
        assert_eq!(first, later);
        assert!(!later.has_reached_eocp);
    }

    #[test]
    fn test_cache_reset_recomputes() {
        let cache = LifecycleCache::new();
        cache.get_or_compute("Q1/2026", at("2026-02-15"));
        cache.reset();
        assert!(cache.is_empty());
        let fresh = cache.get_or_compute("Q1/2026", at("2027-01-01"));
        assert!(fresh.has_reached_eocp);
    }

    #[test]
    fn test_calculator_shares_cache() {
        let cache = Arc::new(LifecycleCache::new());
        let calc = LifecycleCalculator::new(cache.clone(), at("2026-02-15"));
        calc.fact("Q1/2026");
        calc.fact("To Be Determined");
        assert_eq!(cache.len(), 2);
        assert_eq!(calc.now(), at("2026-02-15"));
    }

    #[test]
    fn test_cache_is_shareable_across_threads() {
        let cache = Arc::new(LifecycleCache::new());
        let now = at("2026-02-15");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get_or_compute("Q1/2026", now))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().days_remaining, Some(44));
        }
        assert_eq!(cache.len(), 1);
    }
}
