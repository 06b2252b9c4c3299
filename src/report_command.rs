use anyhow::{Context, Result};
use log::info;

use crate::auth_store::{require_auth, AuthStore};
use crate::datetime;
use crate::error::TwError;
use crate::report::{build_report, MonthlyReport};
use crate::teamwork::TeamworkRepository;

/// `report`サブコマンドの引数を表す構造体。
#[derive(Debug, Default, clap::Args)]
pub struct ReportArgs {
    #[clap(short = 'y', long = "year", help = "Year to report (defaults to the current year)")]
    year: Option<i32>,

    #[clap(short = 'm', long = "month", help = "Month to report (defaults to the current month)")]
    month: Option<u32>,
}

/// 月毎の記録時間を集計するためのサブコマンド。
pub struct ReportCommand<'a, T: TeamworkRepository, S: AuthStore> {
    client: &'a T,
    store: &'a S,
}

impl<'a, T: TeamworkRepository, S: AuthStore> ReportCommand<'a, T, S> {
    /// 新しい`ReportCommand`を返す。
    ///
    /// # Arguments
    /// * `client` - Teamwork APIと通信するためのリポジトリ
    /// * `store` - 認証情報の保存先
    pub fn new(client: &'a T, store: &'a S) -> Self {
        Self { client, store }
    }

    /// `report`サブコマンドの処理を行う。
    ///
    /// UTCで指定された月の1日から1ヶ月分の記録時間を取得し、日毎に集計する。
    /// 年や月が指定されていない場合は、UTCで現在の年月を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `report`サブコマンドの引数
    pub async fn run(&self, args: ReportArgs) -> Result<MonthlyReport> {
        let (current_year, current_month) = datetime::current_year_month();
        let year = args.year.unwrap_or(current_year);
        if !(2000..=2100).contains(&year) {
            return Err(TwError::invalid_input(format!("invalid year: {}", year)).into());
        }
        let month = args.month.unwrap_or(current_month);
        if !(1..=12).contains(&month) {
            return Err(TwError::invalid_input(format!("invalid month: {}", month)).into());
        }
        let month_start = datetime::month_start(year, month)
            .with_context(|| format!("Failed to build the first day of {}-{}", year, month))?;
        info!("Month start: {}", month_start);

        let auth = require_auth(self.store).context("Failed to load credentials")?;
        let chart = self
            .client
            .get_monthly_time_chart(&auth, month_start)
            .await
            .context("Failed to retrieve logged time")?;
        info!(
            "Chart range: {} - {}",
            chart.user.start_epoch, chart.user.end_epoch
        );
        info!(
            "length of billable entries: {}, non-billable entries: {}",
            chart.user.billable.len(),
            chart.user.non_billable.len()
        );

        let report = build_report(month_start, &chart.user.billable, &chart.user.non_billable)
            .context("Failed to aggregate logged time")?;

        Ok(report)
    }
}
