//! Schedule-time generation.
//!
//! Produces future publish timestamps for a batch of tasks:
//! - Biased toward configured optimal hours, falling back to uniform random
//!   instants when optimal-hour placement is exhausted.
//! - Multi-day distribution honoring a per-day cap (soft: overflow spills
//!   past the window with a warning).
//! - Blackout-hour adjustment shifting candidates to the next permitted hour.
//! - Minimum-interval spacing between consecutive slots.
//!
//! All randomness is injected so tests can seed a deterministic RNG.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use log::warn;
use rand::Rng;

/// Generate exactly `count` sorted timestamps inside `[window_start, window_end)`.
///
/// Each slot first tries a uniform pick from `optimal_hours` with a random
/// minute and second, anchored to `window_start`'s date; candidates that land
/// outside the window are discarded rather than retried. Any shortfall is
/// filled with uniform random instants across the whole window, rejecting
/// exact duplicates. Returns empty when `count` is zero or the window is
/// inverted.
pub fn generate(
    count: usize,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    optimal_hours: &[u32],
    rng: &mut impl Rng,
) -> Vec<DateTime<Utc>> {
    if count == 0 || window_end <= window_start {
        return Vec::new();
    }

    let mut slots: Vec<DateTime<Utc>> = Vec::with_capacity(count);
    let anchor = window_start.date_naive();

    // Optimal-hour pass: one attempt per slot, discard misses.
    if !optimal_hours.is_empty() {
        for _ in 0..count {
            let hour = optimal_hours[rng.random_range(0..optimal_hours.len())];
            let minute = rng.random_range(0..60u32);
            let second = rng.random_range(0..60u32);
            let Some(naive) = anchor.and_hms_opt(hour.min(23), minute, second) else {
                continue;
            };
            let candidate = Utc.from_utc_datetime(&naive);
            if candidate >= window_start && candidate < window_end {
                slots.push(candidate);
            }
        }
        slots.truncate(count);
    }

    // Fill pass: uniform random instants across the window.
    let span_ms = (window_end - window_start).num_milliseconds().max(1);
    let mut attempts = 0;
    while slots.len() < count && attempts < count * 20 {
        attempts += 1;
        let offset = rng.random_range(0..span_ms);
        let candidate = window_start + Duration::milliseconds(offset);
        if !slots.contains(&candidate) {
            slots.push(candidate);
        }
    }

    // Degenerate windows (span smaller than count): pad by stepping from the
    // start so the count contract still holds.
    let mut step = 0;
    while slots.len() < count {
        slots.push(window_start + Duration::milliseconds(step % span_ms));
        step += 1;
    }

    slots.sort();
    slots.truncate(count);
    slots
}

/// Spread `count` timestamps across up to `days_ahead` calendar days with at
/// most `daily_max` per day, filling days greedily in chronological order.
///
/// The per-day cap is a soft constraint: when capacity across `days_ahead`
/// runs out, the remainder is forced onto later days and a warning is
/// logged.
pub fn generate_multi_day(
    count: usize,
    days_ahead: u32,
    daily_max: usize,
    start: DateTime<Utc>,
    optimal_hours: &[u32],
    rng: &mut impl Rng,
) -> Vec<DateTime<Utc>> {
    if count == 0 || daily_max == 0 {
        return Vec::new();
    }
    tracing::debug!(count, days_ahead, daily_max, "distributing publish slots");

    let capacity = days_ahead as usize * daily_max;
    if count > capacity {
        warn!(
            "requested {} slots exceeds capacity {} across {} days; spilling past the window",
            count, capacity, days_ahead
        );
    }

    let mut slots = Vec::with_capacity(count);
    let mut remaining = count;
    let mut day = 0u32;

    while remaining > 0 {
        let take = remaining.min(daily_max);

        let day_start = if day == 0 {
            start
        } else {
            let date = start.date_naive() + Duration::days(day as i64);
            Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
        };
        let next_date = start.date_naive() + Duration::days(day as i64 + 1);
        let day_end = Utc.from_utc_datetime(&next_date.and_hms_opt(0, 0, 0).unwrap_or_default());

        slots.extend(generate(take, day_start, day_end, optimal_hours, rng));
        remaining -= take;
        day += 1;
    }

    slots.sort();
    slots
}

/// Shift a timestamp whose hour falls in `blackout_hours` forward to the
/// next permitted hour, preserving minute and second and rolling into the
/// next calendar day when needed.
///
/// Returns the input unchanged when every hour is blacked out.
pub fn adjust_for_blackout(ts: DateTime<Utc>, blackout_hours: &[u32]) -> DateTime<Utc> {
    if blackout_hours.is_empty() {
        return ts;
    }
    // All 24 hours blocked: nothing sensible to shift to.
    if (0..24).all(|h| blackout_hours.contains(&h)) {
        return ts;
    }

    let mut adjusted = ts;
    while blackout_hours.contains(&adjusted.hour()) {
        adjusted += Duration::hours(1);
    }
    adjusted
}

/// Push successors of a sorted slot list forward so consecutive entries are
/// at least `min_gap` apart. A pushed slot lands a random gap in
/// `[min_gap, max_gap]` after its predecessor. May push the tail past the
/// original window; callers accept that over violating the interval
/// constraint.
pub fn space_out(slots: &mut [DateTime<Utc>], min_gap: Duration, max_gap: Duration, rng: &mut impl Rng) {
    let max_gap = max_gap.max(min_gap);
    for i in 1..slots.len() {
        let floor = slots[i - 1] + min_gap;
        if slots[i] < floor {
            let gap_ms = rng.random_range(min_gap.num_milliseconds()..=max_gap.num_milliseconds());
            slots[i] = slots[i - 1] + Duration::milliseconds(gap_ms);
        }
    }
}
