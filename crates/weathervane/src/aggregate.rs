//! Adaptive bucketing for the chart.
//!
//! Short ranges stay daily. Longer ranges fold into ISO weeks or calendar
//! months, each with mean values and one representative condition code.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::openmeteo::DailyRecord;
use crate::wmo;

/// Longest range drawn one bar per day.
pub const DAILY_LIMIT: usize = 60;

/// Longest range drawn one bar per week.
pub const WEEKLY_LIMIT: usize = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Daily,
    Weekly,
    Monthly,
}

impl Resolution {
    /// Pick a resolution from the number of days returned.
    pub fn for_days(days: usize) -> Self {
        if days <= DAILY_LIMIT {
            Resolution::Daily
        } else if days <= WEEKLY_LIMIT {
            Resolution::Weekly
        } else {
            Resolution::Monthly
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Resolution::Daily => "Daily View",
            Resolution::Weekly => "Weekly Averages",
            Resolution::Monthly => "Monthly Averages",
        }
    }

    /// Label for a bucket starting on `date`.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Resolution::Daily | Resolution::Weekly => date.format("%d %b").to_string(),
            Resolution::Monthly => date.format("%b %Y").to_string(),
        }
    }

    /// First day of the bucket holding `date`.
    fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Resolution::Daily => date,
            Resolution::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Resolution::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

/// One bar on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub start: NaiveDate,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub code: Option<i64>,
}

/// Fold daily records into buckets at the resolution their count implies.
pub fn aggregate(records: &[DailyRecord]) -> (Resolution, Vec<Bucket>) {
    let resolution = Resolution::for_days(records.len());
    (resolution, aggregate_at(records, resolution))
}

/// Fold daily records into buckets at a fixed resolution, oldest first.
pub fn aggregate_at(records: &[DailyRecord], resolution: Resolution) -> Vec<Bucket> {
    if resolution == Resolution::Daily {
        return records
            .iter()
            .map(|r| Bucket {
                start: r.date,
                temperature: r.temperature,
                humidity: r.humidity,
                code: r.code,
            })
            .collect();
    }

    let mut groups: BTreeMap<NaiveDate, Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(resolution.bucket_start(record.date))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(start, days)| {
            let codes: Vec<i64> = days.iter().filter_map(|d| d.code).collect();
            Bucket {
                start,
                temperature: mean(days.iter().filter_map(|d| d.temperature)),
                humidity: mean(days.iter().filter_map(|d| d.humidity)),
                code: (!codes.is_empty()).then(|| resolve_condition(&codes)),
            }
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Pick one condition code for a run of days by weighted severity.
///
/// Rare but notable weather wins at low shares: storms or snow on 10% of
/// days, rain or showers on 15%. Drizzle alone needs half the days, as does
/// drizzle and rain together. Otherwise sunny days beat cloudy ones on ties.
pub fn resolve_condition(codes: &[i64]) -> i64 {
    if codes.is_empty() {
        return 0;
    }

    let total = codes.len() as f64;
    let share = |pred: fn(i64) -> bool| codes.iter().filter(|&&c| pred(c)).count() as f64 / total;
    let count = |pred: fn(i64) -> bool| codes.iter().filter(|&&c| pred(c)).count();

    let heavy_rain = share(wmo::is_heavy_rain);
    let drizzle = share(wmo::is_drizzle);

    if share(wmo::is_storm) >= 0.10 {
        96
    } else if share(wmo::is_snow) >= 0.10 {
        71
    } else if heavy_rain >= 0.15 {
        63
    } else if drizzle >= 0.50 {
        53
    } else if heavy_rain + drizzle >= 0.50 {
        61
    } else if count(wmo::is_sunny) >= count(wmo::is_cloudy) {
        0
    } else {
        3
    }
}
