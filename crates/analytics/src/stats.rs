//! Activity statistics over a standardized dataset: counts per day, hour and
//! weekday, average amount per week, and the running volume.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use monnaie_core::table::columns;
use monnaie_core::{CellValue, EnrichedTable};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Weekly averages are reported to the cent.
const AVERAGE_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    /// Transactions per calendar day.
    pub daily_counts: BTreeMap<NaiveDate, usize>,
    /// Mean amount per week, keyed by the Monday that starts it.
    pub weekly_average: BTreeMap<NaiveDate, Decimal>,
    pub hourly_counts: [usize; 24],
    /// Monday first.
    pub weekday_counts: [usize; 7],
    /// Running sum of amounts in date order, one point per transaction.
    pub cumulative_volume: Vec<CumulativePoint>,
}

impl Default for DatasetStats {
    fn default() -> Self {
        Self {
            daily_counts: BTreeMap::new(),
            weekly_average: BTreeMap::new(),
            hourly_counts: [0; 24],
            weekday_counts: [0; 7],
            cumulative_volume: Vec::new(),
        }
    }
}

impl DatasetStats {
    pub fn dated_transactions(&self) -> usize {
        self.daily_counts.values().sum()
    }
}

/// Parses a date cell. Date-only values are taken at midnight.
pub fn parse_datetime(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => parse_datetime_str(s),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn compute(table: &EnrichedTable) -> DatasetStats {
    let mut stats = DatasetStats::default();
    let Some(date_idx) = table.column_index(columns::DATE) else {
        if !table.is_empty() {
            warn!(column = columns::DATE, "column absent, no statistics computed");
        }
        return stats;
    };
    let amount_idx = table.column_index(columns::AMOUNT);

    let mut weekly: BTreeMap<NaiveDate, (Decimal, u32)> = BTreeMap::new();
    let mut dated_amounts: Vec<(NaiveDateTime, Decimal)> = Vec::new();
    let mut undated = 0usize;

    for row in &table.rows {
        let Some(dt) = row.cells.get(date_idx).and_then(parse_datetime) else {
            undated += 1;
            continue;
        };
        let date = dt.date();

        *stats.daily_counts.entry(date).or_insert(0) += 1;
        stats.hourly_counts[dt.hour() as usize] += 1;
        stats.weekday_counts[date.weekday().num_days_from_monday() as usize] += 1;

        // Only numeric amounts feed the amount-based series.
        if let Some(amount) = amount_idx
            .and_then(|i| row.cells.get(i))
            .and_then(CellValue::to_decimal)
        {
            let entry = weekly.entry(week_start(date)).or_insert((Decimal::ZERO, 0));
            entry.0 = entry.0.saturating_add(amount);
            entry.1 += 1;
            dated_amounts.push((dt, amount));
        }
    }

    stats.weekly_average = weekly
        .into_iter()
        .map(|(week, (sum, count))| (week, (sum / Decimal::from(count)).round_dp(AVERAGE_SCALE)))
        .collect();

    dated_amounts.sort_by_key(|(dt, _)| *dt);
    let mut running = Decimal::ZERO;
    stats.cumulative_volume = dated_amounts
        .into_iter()
        .map(|(dt, amount)| {
            running = running.saturating_add(amount);
            CumulativePoint {
                date: dt.date(),
                total: running,
            }
        })
        .collect();

    debug!(
        dated = stats.dated_transactions(),
        undated,
        weeks = stats.weekly_average.len(),
        "statistics computed"
    );
    stats
}
