use std::fmt;

use chrono::{Duration, NaiveDate, NaiveTime};
use log::debug;

use crate::error::TwError;
use crate::models::{Account, ProjectsResponse, Task, TaskProject, TasksGroup, TasksResponse};
use crate::prompt::Prompter;

/// 対話的な入力で、不正な値を何回まで受け付けるか。
const MAX_ATTEMPTS: usize = 3;

/// 開始時刻が入力されなかった場合の値。
const DEFAULT_START_TIME: &str = "09:00";

/// 時間を記録する対象。
///
/// タスクがない場合はプロジェクトそのものに記録する。
#[derive(Clone, Debug, PartialEq)]
pub struct TimelogTarget {
    pub project: TaskProject,
    pub task: Option<Task>,
}

impl TimelogTarget {
    /// IDで指定された記録対象を返す。名前は分からないので空にする。
    pub fn from_ids(project_id: Option<u64>, task_id: Option<u64>) -> Self {
        let project_id = project_id.unwrap_or(0);
        Self {
            project: TaskProject {
                id: project_id,
                name: String::new(),
            },
            task: task_id.map(|id| Task {
                id,
                content: String::new(),
                project_id,
                project_name: String::new(),
            }),
        }
    }

    pub fn task_id(&self) -> u64 {
        self.task.as_ref().map(|task| task.id).unwrap_or(0)
    }

    /// 選択肢として表示する文字列。
    pub fn menu_label(&self) -> String {
        match &self.task {
            Some(task) => format!("{} / {}", self.project.name, task.content),
            None => self.project.name.clone(),
        }
    }
}

impl fmt::Display for TimelogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.project.id, self.task_id())?;
        if !self.project.name.is_empty() {
            write!(f, " {}", self.project.name)?;
        }
        if let Some(task) = self.task.as_ref().filter(|task| !task.content.is_empty()) {
            write!(f, ": {}", task.content)?;
        }

        Ok(())
    }
}

/// タスクをプロジェクトごとにまとめ、タスクのないプロジェクトも空のグループとして追加する。
pub fn group_projects_and_tasks(
    projects: &ProjectsResponse,
    tasks: &TasksResponse,
) -> Result<Vec<TasksGroup>, TwError> {
    let mut groups = tasks.group_by_project();

    for project in &projects.projects {
        let id: u64 = project
            .id
            .parse()
            .map_err(|e| TwError::UnexpectedResponse {
                message: format!("invalid project id '{}': {}", project.id, e),
            })?;
        if groups.iter().any(|group| group.project.id == id) {
            continue;
        }
        groups.push(TasksGroup {
            project: TaskProject {
                id,
                name: project.name.clone(),
            },
            tasks: vec![],
        });
    }

    Ok(groups)
}

/// プロジェクトとタスクの組み合わせを1列の選択肢に展開する。
///
/// 各プロジェクトはプロジェクト自体の選択肢と、その後に続くタスクごとの選択肢になる。
pub fn flatten_targets(groups: &[TasksGroup]) -> Vec<TimelogTarget> {
    groups
        .iter()
        .flat_map(|group| {
            std::iter::once(TimelogTarget {
                project: group.project.clone(),
                task: None,
            })
            .chain(group.tasks.iter().map(|task| TimelogTarget {
                project: group.project.clone(),
                task: Some(task.clone()),
            }))
        })
        .collect()
}

/// 記録対象を選択させる。
pub fn select_target<P: Prompter + ?Sized>(
    prompter: &mut P,
    groups: &[TasksGroup],
) -> Result<TimelogTarget, TwError> {
    let targets = flatten_targets(groups);
    let labels: Vec<String> = targets.iter().map(TimelogTarget::menu_label).collect();

    let index = prompter.select("Select timelog target", &labels)?;
    let target = targets
        .into_iter()
        .nth(index)
        .ok_or_else(|| TwError::invalid_input(format!("no such target: {}", index)))?;
    debug!("Selected target: {}", target);

    Ok(target)
}

/// ログインするアカウントを選択させる。アカウントが1つだけの場合はそれを返す。
pub fn select_account<P: Prompter + ?Sized>(
    prompter: &mut P,
    accounts: &[Account],
) -> Result<Account, TwError> {
    match accounts {
        [] => Err(TwError::UnexpectedResponse {
            message: "no account is available for these credentials".to_string(),
        }),
        [account] => Ok(account.clone()),
        _ => {
            let labels: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
            let index = prompter.select("Select account", &labels)?;
            accounts
                .get(index)
                .cloned()
                .ok_or_else(|| TwError::invalid_input(format!("no such account: {}", index)))
        }
    }
}

/// 時間単位の小数(例: `8.5`)をパースする。0より大きく24以下でなければならない。
///
/// 分単位に丸めて0になる値は受け付けない。
pub fn parse_duration_hours(s: &str) -> Result<Duration, TwError> {
    let hours: f64 = s
        .trim()
        .parse()
        .map_err(|_| TwError::invalid_input(format!("not a number of hours: {}", s)))?;
    if !(hours > 0.0 && hours <= 24.0) {
        return Err(TwError::invalid_input("hours must be between 0 and 24"));
    }

    let minutes = (hours * 60.0).round() as i64;
    if minutes == 0 {
        return Err(TwError::invalid_input(format!(
            "duration is shorter than a minute: {}",
            s
        )));
    }

    Ok(Duration::minutes(minutes))
}

/// `HH:MM`形式の時刻をパースする。
pub fn parse_start_time(s: &str) -> Result<NaiveTime, TwError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| TwError::invalid_input(format!("not a time in HH:MM: {}", s)))
}

/// `YYYY-MM-DD`形式の日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate, TwError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TwError::invalid_input(format!("not a date in YYYY-MM-DD: {}", s)))
}

/// 正しい値が入力されるまで聞き直す。
///
/// `MAX_ATTEMPTS`回続けて不正な値が入力された場合は最後のエラーを返す。
fn ask_until_valid<P, T, F>(
    prompter: &mut P,
    label: &str,
    default: Option<String>,
    parse: F,
) -> Result<T, TwError>
where
    P: Prompter + ?Sized,
    F: Fn(&str) -> Result<T, TwError>,
{
    let mut attempt = 0;
    loop {
        let answer = prompter.input(label, default.clone())?;
        match parse(&answer) {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(err);
                }
                prompter.notify(&err.to_string())?;
            }
        }
    }
}

pub fn ask_duration<P: Prompter + ?Sized>(prompter: &mut P) -> Result<Duration, TwError> {
    ask_until_valid(prompter, "Duration (in hours)", None, parse_duration_hours)
}

pub fn ask_start_time<P: Prompter + ?Sized>(prompter: &mut P) -> Result<NaiveTime, TwError> {
    ask_until_valid(
        prompter,
        "Start time (HH:MM)",
        Some(DEFAULT_START_TIME.to_string()),
        parse_start_time,
    )
}

/// 日付を入力させる。何も入力されなければ`today`を返す。
pub fn ask_date<P: Prompter + ?Sized>(
    prompter: &mut P,
    today: NaiveDate,
) -> Result<NaiveDate, TwError> {
    ask_until_valid(
        prompter,
        "Date (YYYY-MM-DD)",
        Some(today.format("%Y-%m-%d").to_string()),
        parse_date,
    )
}
