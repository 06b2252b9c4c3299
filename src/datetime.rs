use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// UTCでの今日の日付を返す。
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// 指定された年月の1日00:00:00(UTC)を返す。
///
/// 存在しない年月の場合は`None`を返す。
pub fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

/// 現在の年と月を返す。
pub fn current_year_month() -> (i32, u32) {
    let now = now();
    (now.year(), now.month())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, SecondsFormat, TimeZone, Utc};
    use rstest::rstest;

    use super::{current_year_month, mock_datetime, month_start, today};

    /// 何も設定しない場合は、現在時間が取得できることを確認する。
    ///
    ///  - ミリ秒単位まで比較するとテストが失敗する可能性があるため、秒単位で比較している。
    #[test]
    fn test_now() {
        mock_datetime::clear_mock_time();
        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    #[test]
    fn test_today_and_current_month_with_mock() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap());

        assert_eq!(today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(current_year_month(), (2024, 2));

        mock_datetime::clear_mock_time();
    }

    #[rstest]
    #[case(2024, 2, Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()))]
    #[case(2024, 13, None)]
    #[case(2024, 0, None)]
    fn test_month_start(
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected: Option<chrono::DateTime<Utc>>,
    ) {
        assert_eq!(month_start(year, month), expected);
    }
}
