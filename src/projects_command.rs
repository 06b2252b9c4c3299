use anyhow::{Context, Result};
use log::info;

use crate::auth_store::{require_auth, AuthStore};
use crate::models::{Project, TasksGroup};
use crate::teamwork::TeamworkRepository;

/// プロジェクト一覧を表示するためのサブコマンド。
pub struct ProjectsCommand<'a, T: TeamworkRepository, S: AuthStore> {
    client: &'a T,
    store: &'a S,
}

impl<'a, T: TeamworkRepository, S: AuthStore> ProjectsCommand<'a, T, S> {
    pub fn new(client: &'a T, store: &'a S) -> Self {
        Self { client, store }
    }

    /// `projects`サブコマンドの処理を行う。
    pub async fn run(&self) -> Result<Vec<Project>> {
        let auth = require_auth(self.store).context("Failed to load credentials")?;
        let projects = self
            .client
            .get_projects(&auth)
            .await
            .context("Failed to retrieve projects")?;
        info!("length of projects: {}", projects.projects.len());

        Ok(projects.projects)
    }
}

/// プロジェクトごとのタスク一覧を表示するためのサブコマンド。
pub struct TasksCommand<'a, T: TeamworkRepository, S: AuthStore> {
    client: &'a T,
    store: &'a S,
}

impl<'a, T: TeamworkRepository, S: AuthStore> TasksCommand<'a, T, S> {
    pub fn new(client: &'a T, store: &'a S) -> Self {
        Self { client, store }
    }

    /// `tasks`サブコマンドの処理を行う。
    ///
    /// タスクはプロジェクトごとにまとめて返す。タスクのないプロジェクトは含まない。
    pub async fn run(&self) -> Result<Vec<TasksGroup>> {
        let auth = require_auth(self.store).context("Failed to load credentials")?;
        let tasks = self
            .client
            .get_tasks(&auth)
            .await
            .context("Failed to retrieve tasks")?;
        info!("length of tasks: {}", tasks.tasks.len());

        Ok(tasks.group_by_project())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ProjectsCommand, TasksCommand};
    use crate::auth_store::MockAuthStore;
    use crate::error::TwError;
    use crate::models::AuthData;
    use crate::teamwork::MockTeamworkRepository;

    fn logged_in_store() -> MockAuthStore {
        let mut store = MockAuthStore::new();
        store.expect_exists().return_const(true);
        store.expect_load().returning(|| {
            Ok(AuthData {
                api_end_point: "https://example.teamwork.com/".to_string(),
                token: "t".to_string(),
            })
        });
        store
    }

    #[tokio::test]
    async fn test_projects() {
        let store = logged_in_store();
        let mut client = MockTeamworkRepository::new();
        client.expect_get_projects().times(1).returning(|_| {
            Ok(serde_json::from_value(json!({
                "projects": [{"id": "1", "name": "Alpha"}, {"id": "2", "name": "Beta"}]
            }))
            .unwrap())
        });

        let projects = ProjectsCommand::new(&client, &store).run().await.unwrap();

        assert_eq!(
            projects.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Alpha", "Beta"]
        );
    }

    #[tokio::test]
    async fn test_projects_http_error() {
        let store = logged_in_store();
        let mut client = MockTeamworkRepository::new();
        client
            .expect_get_projects()
            .returning(|_| Err(TwError::HttpStatus { code: 403 }));

        let err = ProjectsCommand::new(&client, &store).run().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TwError>(),
            Some(TwError::HttpStatus { code: 403 })
        ));
    }

    #[tokio::test]
    async fn test_tasks_grouped() {
        let store = logged_in_store();
        let mut client = MockTeamworkRepository::new();
        client.expect_get_tasks().times(1).returning(|_| {
            Ok(serde_json::from_value(json!({
                "todo-items": [
                    {"id": 1, "content": "a", "project-id": 1, "project-name": "Alpha"},
                    {"id": 2, "content": "b", "project-id": 1, "project-name": "Alpha"}
                ]
            }))
            .unwrap())
        });

        let groups = TasksCommand::new(&client, &store).run().await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tasks.len(), 2);
    }
}
