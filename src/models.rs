use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_entry::{deserialize_epoch_millis, TimeEntry};

/// 保存される認証情報。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub api_end_point: String,
    pub token: String,
}

/// ログイン可能なアカウント一覧のレスポンス。
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Account {
    pub installation: Installation,
    pub user: User,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {}",
            self.user.first_name, self.user.last_name, self.installation.company.name
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub api_end_point: String,
    pub company: Company,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Company {
    pub name: String,
}

/// `me.json`のレスポンス。
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileResponse {
    pub person: ProfilePerson,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfilePerson {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub company_name: String,
}

/// `projects.json`のレスポンス。
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// `tasks.json`のレスポンス。
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TasksResponse {
    #[serde(default, rename = "todo-items")]
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Task {
    pub id: u64,
    pub content: String,
    pub project_id: u64,
    pub project_name: String,
}

/// タスク一覧をグルーピングする際のプロジェクト情報。
#[derive(Clone, Debug, PartialEq)]
pub struct TaskProject {
    pub id: u64,
    pub name: String,
}

/// プロジェクトごとにまとめたタスク。
#[derive(Clone, Debug, PartialEq)]
pub struct TasksGroup {
    pub project: TaskProject,
    pub tasks: Vec<Task>,
}

impl TasksResponse {
    /// タスクをプロジェクトごとにまとめる。
    ///
    /// プロジェクトの並びはタスク一覧で最初に現れた順とする。
    pub fn group_by_project(&self) -> Vec<TasksGroup> {
        let mut groups: Vec<TasksGroup> = Vec::new();
        for task in &self.tasks {
            match groups.iter_mut().find(|g| g.project.id == task.project_id) {
                Some(group) => group.tasks.push(task.clone()),
                None => groups.push(TasksGroup {
                    project: TaskProject {
                        id: task.project_id,
                        name: task.project_name.clone(),
                    },
                    tasks: vec![task.clone()],
                }),
            }
        }
        groups
    }
}

/// 月毎の記録時間チャートのレスポンス。
#[derive(Clone, Debug, Deserialize)]
pub struct TimeChartResponse {
    pub user: TimeChart,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TimeChart {
    #[serde(default)]
    pub billable: Vec<TimeEntry>,
    #[serde(default, rename = "nonbillable")]
    pub non_billable: Vec<TimeEntry>,
    #[serde(rename = "startepoch", deserialize_with = "deserialize_epoch_millis")]
    pub start_epoch: DateTime<Utc>,
    #[serde(rename = "endepoch", deserialize_with = "deserialize_epoch_millis")]
    pub end_epoch: DateTime<Utc>,
}

/// 時間記録の作成リクエスト。
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTimeRequest {
    pub timelog: Timelog,
    pub timelog_options: TimelogOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timelog {
    pub task_id: u64,
    pub hours: u64,
    pub minutes: u64,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM:SS
    pub time: String,
    pub description: String,
    pub is_billable: bool,
    pub user_id: u64,
    pub tag_ids: Vec<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelogOptions {
    pub mark_task_complete: bool,
}
