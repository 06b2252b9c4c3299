use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use log::debug;

use crate::error::TwError;
use crate::time_entry::TimeEntry;

/// 1日分の集計結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySeries {
    pub date: NaiveDate,
    pub billable: Duration,
    pub non_billable: Duration,
}

impl DaySeries {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            billable: Duration::zero(),
            non_billable: Duration::zero(),
        }
    }
}

/// 1ヶ月分の集計結果。
///
/// `days`は月の全ての日を日付の昇順で含む。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyReport {
    pub month_start: DateTime<Utc>,
    pub days: Vec<DaySeries>,
    pub total_billable: Duration,
    pub total_non_billable: Duration,
}

/// どちらの時間として集計するか。
#[derive(Clone, Copy, Debug)]
enum Category {
    Billable,
    NonBillable,
}

/// 日付をキーにした集計表。
///
/// 作成時に月の全ての日を用意し、以降はキーの追加や削除を行わない。
struct DayGrid {
    days: BTreeMap<NaiveDate, DaySeries>,
}

impl DayGrid {
    /// `[start, end)`に含まれる全ての日について空の集計を用意する。
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let mut days = BTreeMap::new();
        let mut current = start;
        while current < end {
            let date = current.date_naive();
            days.insert(date, DaySeries::empty(date));
            current += Duration::days(1);
        }

        Self { days }
    }

    /// エントリーの値を該当する日に設定する。
    ///
    /// 同じ日に複数のエントリーがある場合は後のものが優先される。
    fn set(&mut self, category: Category, entry: &TimeEntry) -> Result<(), TwError> {
        let date = entry.epoch.date_naive();
        let day = self
            .days
            .get_mut(&date)
            .ok_or(TwError::DateOutOfRange(date))?;
        let duration = i64::try_from(entry.minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| TwError::UnexpectedResponse {
                message: format!("minutes out of range: {}", entry.minutes),
            })?;
        debug!("{:?} {}: {:.2}h", category, date, entry.hours);

        match category {
            Category::Billable => day.billable = duration,
            Category::NonBillable => day.non_billable = duration,
        }

        Ok(())
    }

    fn into_days(self) -> Vec<DaySeries> {
        self.days.into_values().collect()
    }
}

/// 月初と日毎の記録時間から1ヶ月分の集計を作成する。
///
/// 集計期間は`[month_start, month_start + 1ヶ月)`で、記録のない日も0として含める。
/// 期間外の日付のエントリーが含まれる場合は`TwError::DateOutOfRange`を返す。
///
/// # Arguments
///
/// * `month_start` - 集計期間の開始日時
/// * `billable` - 請求対象の日毎の記録時間
/// * `non_billable` - 請求対象外の日毎の記録時間
pub fn build_report(
    month_start: DateTime<Utc>,
    billable: &[TimeEntry],
    non_billable: &[TimeEntry],
) -> Result<MonthlyReport, TwError> {
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| TwError::invalid_input(format!("month out of range: {}", month_start)))?;

    let mut grid = DayGrid::new(month_start, month_end);
    billable
        .iter()
        .try_for_each(|entry| grid.set(Category::Billable, entry))?;
    non_billable
        .iter()
        .try_for_each(|entry| grid.set(Category::NonBillable, entry))?;

    let days = grid.into_days();
    let total_billable = sum_durations(days.iter().map(|day| day.billable))?;
    let total_non_billable = sum_durations(days.iter().map(|day| day.non_billable))?;

    Ok(MonthlyReport {
        month_start,
        days,
        total_billable,
        total_non_billable,
    })
}

/// 合計時間を求める。桁あふれした場合はエラーにする。
fn sum_durations(mut durations: impl Iterator<Item = Duration>) -> Result<Duration, TwError> {
    durations.try_fold(Duration::zero(), |acc, d| {
        acc.checked_add(&d)
            .ok_or_else(|| TwError::UnexpectedResponse {
                message: "total logged time out of range".to_string(),
            })
    })
}
