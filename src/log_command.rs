use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use log::info;

use crate::auth_store::{require_auth, AuthStore};
use crate::datetime;
use crate::error::TwError;
use crate::models::{LogTimeRequest, Timelog, TimelogOptions};
use crate::prompt::Prompter;
use crate::selector::{
    ask_date, ask_duration, ask_start_time, group_projects_and_tasks, parse_date,
    parse_duration_hours, parse_start_time, select_target, TimelogTarget,
};
use crate::teamwork::TeamworkRepository;

/// `log`サブコマンドの引数を表す構造体。
///
/// 指定されなかった値は対話的に入力させる。
#[derive(Debug, Default, clap::Args)]
pub struct LogArgs {
    #[clap(short = 'n', long = "dry-run", help = "Don't actually log time")]
    dry_run: bool,

    #[clap(short = 'B', long = "non-billable", help = "Log time as non-billable")]
    non_billable: bool,

    #[clap(short = 'p', long = "project-id", help = "Project ID")]
    project_id: Option<u64>,

    #[clap(short = 't', long = "task-id", help = "Task ID")]
    task_id: Option<u64>,

    #[clap(
        short = 'd',
        long = "date",
        help = "Date (e.g. 2020-01-31)",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(
        short = 's',
        long = "time",
        alias = "start-time",
        help = "Start time (e.g. 09:00)",
        parse(try_from_str = parse_start_time),
    )]
    start_time: Option<NaiveTime>,

    #[clap(
        short = 'u',
        long = "duration",
        alias = "duration-hours",
        help = "Number of logged hours (e.g. 8.5)",
        parse(try_from_str = parse_duration_hours),
    )]
    duration: Option<Duration>,

    #[clap(short = 'D', long = "description", default_value = "", help = "Description")]
    description: String,
}

/// 記録した(またはdry runで記録しなかった)時間の内容。
#[derive(Clone, Debug, PartialEq)]
pub struct LogOutcome {
    pub target: TimelogTarget,
    pub duration: Duration,
    pub start_time: NaiveTime,
    pub date: NaiveDate,
    pub description: String,
    pub billable: bool,
    pub dry_run: bool,
}

impl LogOutcome {
    /// APIに送るリクエストを作成する。
    fn to_request(&self, user_id: u64) -> LogTimeRequest {
        let minutes = self.duration.num_minutes().max(0) as u64;

        LogTimeRequest {
            timelog: Timelog {
                task_id: self.target.task_id(),
                hours: minutes / 60,
                minutes: minutes % 60,
                date: self.date.format("%Y-%m-%d").to_string(),
                time: self.start_time.format("%H:%M:%S").to_string(),
                description: self.description.clone(),
                is_billable: self.billable,
                user_id,
                tag_ids: vec![],
            },
            timelog_options: TimelogOptions {
                mark_task_complete: false,
            },
        }
    }
}

/// 時間を記録するためのサブコマンド。
pub struct LogCommand<'a, T: TeamworkRepository, S: AuthStore, P: Prompter + ?Sized> {
    client: &'a T,
    store: &'a S,
    prompter: &'a mut P,
}

impl<'a, T: TeamworkRepository, S: AuthStore, P: Prompter + ?Sized> LogCommand<'a, T, S, P> {
    pub fn new(client: &'a T, store: &'a S, prompter: &'a mut P) -> Self {
        Self {
            client,
            store,
            prompter,
        }
    }

    /// `log`サブコマンドの処理を行う。
    ///
    /// プロジェクトとタスクのどちらのIDも指定されていない場合は、一覧から記録対象を選択させる。
    /// dry runの場合は記録対象と内容を決めるところまでを行い、APIには送信しない。
    pub async fn run(&mut self, args: LogArgs) -> Result<LogOutcome> {
        let auth = require_auth(self.store).context("Failed to load credentials")?;
        let profile = self
            .client
            .get_profile(&auth)
            .await
            .context("Failed to retrieve profile")?;
        let user_id: u64 = profile
            .person
            .id
            .parse()
            .map_err(|e| TwError::UnexpectedResponse {
                message: format!("invalid user id '{}': {}", profile.person.id, e),
            })?;

        let target = match (args.project_id, args.task_id) {
            (None, None) => {
                let projects = self
                    .client
                    .get_projects(&auth)
                    .await
                    .context("Failed to retrieve projects")?;
                let tasks = self
                    .client
                    .get_tasks(&auth)
                    .await
                    .context("Failed to retrieve tasks")?;
                let groups = group_projects_and_tasks(&projects, &tasks)?;
                select_target(&mut *self.prompter, &groups)?
            }
            (project_id, task_id) => TimelogTarget::from_ids(project_id, task_id),
        };

        let duration = match args.duration {
            Some(duration) => duration,
            None => ask_duration(&mut *self.prompter)?,
        };
        let start_time = match args.start_time {
            Some(start_time) => start_time,
            None => ask_start_time(&mut *self.prompter)?,
        };
        let date = match args.date {
            Some(date) => date,
            None => ask_date(&mut *self.prompter, datetime::today())?,
        };

        let outcome = LogOutcome {
            target,
            duration,
            start_time,
            date,
            description: args.description,
            billable: !args.non_billable,
            dry_run: args.dry_run,
        };
        if outcome.dry_run {
            info!("Dry run, skipped logging time.");
            return Ok(outcome);
        }

        self.client
            .log_time(&auth, outcome.target.project.id, &outcome.to_request(user_id))
            .await
            .context("Failed to log time")?;
        info!("Time logged successfully.");

        Ok(outcome)
    }
}
