use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::domain::subscriber::Subscriber;

pub const FALLBACK_SIGNUP_SOURCE: &str = "direct";
pub const FALLBACK_DEVICE_TYPE: &str = "desktop";

const TOP_SOURCES: usize = 5;
const GROWTH_FALLBACK_FACTOR: i64 = 15;
const GROWTH_FALLBACK_CAP: i64 = 100;

/// How many calendar days the daily series covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsWindow {
    Week,
    Month,
    Quarter,
}

impl StatsWindow {
    pub fn parse(value: &str) -> Result<StatsWindow, String> {
        match value {
            "7" => Ok(StatsWindow::Week),
            "30" => Ok(StatsWindow::Month),
            "90" => Ok(StatsWindow::Quarter),
            _ => Err(format!(
                "{} is not a supported stats window. Use 7, 30 or 90.",
                value
            )),
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            StatsWindow::Week => 7,
            StatsWindow::Month => 30,
            StatsWindow::Quarter => 90,
        }
    }
}

impl Default for StatsWindow {
    fn default() -> Self {
        StatsWindow::Month
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CategoryShare {
    pub value: String,
    pub count: u64,
    pub percentage: u32,
}

#[derive(Debug, Serialize)]
pub struct WaitlistStats {
    pub total: u64,
    pub today: u64,
    pub week: u64,
    pub month: u64,
    pub daily_series: Vec<DailyCount>,
    pub by_source: Vec<CategoryShare>,
    pub by_device: Vec<CategoryShare>,
    pub by_hour: BTreeMap<u32, u64>,
    pub growth: i64,
}

/// Computes the dashboard summary over the full subscriber list.
///
/// Pure function of its inputs. All calendar bucketing ("today", the daily
/// series, the hour histogram) uses the UTC calendar, so one aggregation call
/// never mixes timezone references.
pub fn compute_stats(
    subscribers: &[Subscriber],
    now: DateTime<Utc>,
    window: StatsWindow,
) -> WaitlistStats {
    let total = subscribers.len() as u64;
    let week_start = now - Duration::days(7);

    let today = count_since(subscribers, start_of_day(now));
    let week = count_since(subscribers, week_start);
    let month = count_since(subscribers, now - Duration::days(30));

    let mut by_hour: BTreeMap<u32, u64> = BTreeMap::new();
    for subscriber in subscribers {
        *by_hour.entry(subscriber.subscribed_at.hour()).or_insert(0) += 1;
    }

    WaitlistStats {
        total,
        today,
        week,
        month,
        daily_series: daily_series(subscribers, now, window),
        by_source: breakdown(
            subscribers,
            total,
            |subscriber| {
                subscriber
                    .signup_source
                    .as_deref()
                    .unwrap_or(FALLBACK_SIGNUP_SOURCE)
            },
            Some(TOP_SOURCES),
        ),
        by_device: breakdown(
            subscribers,
            total,
            |subscriber| {
                subscriber
                    .device_type
                    .as_deref()
                    .unwrap_or(FALLBACK_DEVICE_TYPE)
            },
            None,
        ),
        by_hour,
        growth: growth_estimate(subscribers, now, today, week),
    }
}

fn count_since(subscribers: &[Subscriber], since: DateTime<Utc>) -> u64 {
    subscribers
        .iter()
        .filter(|subscriber| subscriber.subscribed_at >= since)
        .count() as u64
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = at
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time of day");

    Utc.from_utc_datetime(&midnight)
}

/// One entry per calendar day, oldest first. Days without signups are emitted
/// with a zero count, so the series always has exactly `window.days()` entries.
fn daily_series(
    subscribers: &[Subscriber],
    now: DateTime<Utc>,
    window: StatsWindow,
) -> Vec<DailyCount> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for subscriber in subscribers {
        *per_day
            .entry(subscriber.subscribed_at.date_naive())
            .or_insert(0) += 1;
    }

    let today = now.date_naive();

    (0..window.days())
        .map(|offset| {
            let date = today - Duration::days(window.days() - 1 - offset);

            DailyCount {
                date,
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn breakdown<'a>(
    subscribers: &'a [Subscriber],
    total: u64,
    category: impl Fn(&'a Subscriber) -> &'a str,
    keep_top: Option<usize>,
) -> Vec<CategoryShare> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for subscriber in subscribers {
        *counts.entry(category(subscriber)).or_insert(0) += 1;
    }

    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(value, count)| CategoryShare {
            value: value.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    // Value as tiebreak keeps the ordering deterministic across calls
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    if let Some(keep_top) = keep_top {
        shares.truncate(keep_top);
    }

    shares
}

fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }

    (count as f64 * 100.0 / total as f64).round() as u32
}

/// Week-over-week change when a prior week exists; otherwise a rough
/// heuristic derived from today's count. An estimate for the dashboard, not
/// a statistically rigorous rate.
fn growth_estimate(subscribers: &[Subscriber], now: DateTime<Utc>, today: u64, week: u64) -> i64 {
    let week_start = now - Duration::days(7);
    let prior_start = now - Duration::days(14);
    let prior_week = subscribers
        .iter()
        .filter(|subscriber| {
            subscriber.subscribed_at >= prior_start && subscriber.subscribed_at < week_start
        })
        .count() as u64;

    if prior_week > 0 {
        ((week as f64 - prior_week as f64) * 100.0 / prior_week as f64).round() as i64
    } else if today > 0 {
        (today as i64 * GROWTH_FALLBACK_FACTOR).min(GROWTH_FALLBACK_CAP)
    } else {
        0
    }
}
