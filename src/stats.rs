//! Derives income-vs-expense series from stored transactions for
//! charting.

use time::{Date, Duration, Month, OffsetDateTime};

use crate::{
    Error,
    models::{Transaction, TransactionKind, UserId},
    stores::{SortOrder, TransactionQuery, TransactionStore},
};

/// The time scale that [compute_series] buckets transactions into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per day for the last seven days, today included.
    Weekly,
    /// One bucket per calendar month for the last twelve months, the
    /// current month included.
    Monthly,
    /// One bucket per calendar year from the first recorded transaction
    /// through this year.
    Yearly,
}

/// The income and expense sums for one period of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotals {
    /// Human readable period label, e.g. "Mon", "Jan 25" or "2024".
    pub label: String,
    /// Sum of income amounts dated within the period.
    pub income: f64,
    /// Sum of expense amounts dated within the period.
    pub expense: f64,
}

/// A per-period income/expense series plus the transactions it was
/// computed from, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingReport {
    /// The per-period sums, oldest period first. Periods with no
    /// transactions are present with zero sums.
    pub periods: Vec<PeriodTotals>,
    /// The transactions behind the sums, sorted by date descending.
    pub transactions: Vec<Transaction>,
}

/// Compute the income-vs-expense series for `user_id` at `granularity`,
/// anchored on today's date (UTC).
pub fn compute_series(
    store: &impl TransactionStore,
    user_id: UserId,
    granularity: Granularity,
) -> Result<SpendingReport, Error> {
    compute_series_at(store, user_id, granularity, OffsetDateTime::now_utc().date())
}

/// Compute the income-vs-expense series for `user_id` at `granularity`,
/// anchored on `today`.
///
/// The bucket list is derived from `today` alone, so a window with no
/// transactions still yields the full run of zeroed periods.
pub fn compute_series_at(
    store: &impl TransactionStore,
    user_id: UserId,
    granularity: Granularity,
    today: Date,
) -> Result<SpendingReport, Error> {
    let date_range = match granularity {
        Granularity::Weekly => Some(today - Duration::days(6)..=today),
        Granularity::Monthly => {
            let (start_year, start_month) = last_12_months(today)[0];
            // The first of a month is always a valid date.
            let start = Date::from_calendar_date(start_year, start_month, 1).unwrap();
            Some(start..=today)
        }
        // Yearly looks back to the first transaction ever recorded.
        Granularity::Yearly => None,
    };

    let transactions = store.get_query(TransactionQuery {
        user_id: Some(user_id),
        date_range,
        sort_date: Some(SortOrder::Descending),
        ..Default::default()
    })?;

    let buckets: Vec<BucketKey> = match granularity {
        Granularity::Weekly => last_7_days(today).into_iter().map(BucketKey::Day).collect(),
        Granularity::Monthly => last_12_months(today)
            .into_iter()
            .map(|(year, month)| BucketKey::Month(year, month))
            .collect(),
        Granularity::Yearly => {
            let first_year = transactions
                .iter()
                .map(|transaction| transaction.date.year())
                .min()
                .unwrap_or_else(|| today.year());
            years_range(first_year, today.year())
                .into_iter()
                .map(BucketKey::Year)
                .collect()
        }
    };

    let periods = buckets
        .into_iter()
        .map(|bucket| {
            let mut totals = PeriodTotals {
                label: bucket.label(),
                income: 0.0,
                expense: 0.0,
            };

            for transaction in transactions
                .iter()
                .filter(|transaction| bucket.matches(transaction.date))
            {
                match transaction.kind {
                    TransactionKind::Income => totals.income += transaction.amount,
                    TransactionKind::Expense => totals.expense += transaction.amount,
                }
            }

            totals
        })
        .collect();

    Ok(SpendingReport {
        periods,
        transactions,
    })
}

/// Identifies one period of a series and which dates fall inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketKey {
    Day(Date),
    Month(i32, Month),
    Year(i32),
}

impl BucketKey {
    fn matches(&self, date: Date) -> bool {
        match *self {
            BucketKey::Day(day) => date == day,
            BucketKey::Month(year, month) => date.year() == year && date.month() == month,
            BucketKey::Year(year) => date.year() == year,
        }
    }

    fn label(&self) -> String {
        match *self {
            BucketKey::Day(day) => weekday_abbreviation(day).to_string(),
            BucketKey::Month(year, month) => {
                format!("{} {:02}", month_abbreviation(month), year % 100)
            }
            BucketKey::Year(year) => year.to_string(),
        }
    }
}

fn weekday_abbreviation(date: Date) -> &'static str {
    match date.weekday() {
        time::Weekday::Monday => "Mon",
        time::Weekday::Tuesday => "Tue",
        time::Weekday::Wednesday => "Wed",
        time::Weekday::Thursday => "Thu",
        time::Weekday::Friday => "Fri",
        time::Weekday::Saturday => "Sat",
        time::Weekday::Sunday => "Sun",
    }
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// The seven days ending on `today`, oldest first.
fn last_7_days(today: Date) -> Vec<Date> {
    (0..7)
        .rev()
        .map(|days_back| today - Duration::days(days_back))
        .collect()
}

/// The twelve calendar months ending on `today`'s month, oldest first.
fn last_12_months(today: Date) -> Vec<(i32, Month)> {
    let mut months = Vec::with_capacity(12);
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..12 {
        months.push((year, month));
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    months.reverse();
    months
}

/// Every year from `first` through `last` inclusive.
fn years_range(first: i32, last: i32) -> Vec<i32> {
    (first..=last).collect()
}
