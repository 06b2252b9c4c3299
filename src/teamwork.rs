use std::env;

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{
    header::{CONTENT_TYPE, COOKIE},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::TwError;
use crate::models::{
    AccountsResponse, AuthData, LogTimeRequest, ProfileResponse, ProjectsResponse,
    TasksResponse, TimeChartResponse,
};

/// アカウント検索に利用するURLの既定値。
const DEFAULT_LAUNCHPAD_URL: &str = "https://www.teamwork.com";

/// アカウント検索に利用するURLを上書きする環境変数。
const LAUNCHPAD_URL_ENV: &str = "TEAMLOG_LAUNCHPAD_URL";

/// セッションCookieの名前。
pub const AUTH_COOKIE: &str = "tw-auth";

/// 記録時間チャートの1ページあたりの件数。
const TIME_CHART_PAGE_SIZE: u32 = 50;

/// Teamwork APIへのアクセスを抽象化したtrait。
#[cfg_attr(test, automock)]
pub trait TeamworkRepository {
    /// メールアドレスとパスワードでログイン可能なアカウントを取得する。
    async fn discover_accounts(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountsResponse, TwError>;

    /// 指定されたエンドポイントにログインし、セッションCookieを認証情報として返す。
    async fn login(
        &self,
        api_end_point: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthData, TwError>;

    /// ログイン中のユーザー情報を取得する。
    async fn get_profile(&self, auth: &AuthData) -> Result<ProfileResponse, TwError>;

    async fn get_projects(&self, auth: &AuthData) -> Result<ProjectsResponse, TwError>;

    async fn get_tasks(&self, auth: &AuthData) -> Result<TasksResponse, TwError>;

    /// 時間を記録する。
    ///
    /// タスクが指定されていればタスクに、そうでなければプロジェクトに記録する。
    async fn log_time(
        &self,
        auth: &AuthData,
        project_id: u64,
        request: &LogTimeRequest,
    ) -> Result<(), TwError>;

    /// 指定された月の日毎の記録時間を取得する。
    async fn get_monthly_time_chart(
        &self,
        auth: &AuthData,
        month_start: DateTime<Utc>,
    ) -> Result<TimeChartResponse, TwError>;
}

/// Teamwork APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = TeamworkClient::new();
/// let profile = client.get_profile(&auth).await.unwrap();
/// ```
pub struct TeamworkClient {
    client: Client,
    launchpad_url: String,
}

impl TeamworkClient {
    /// 新しい`TeamworkClient`を返す。
    ///
    /// 環境変数`TEAMLOG_LAUNCHPAD_URL`が設定されていれば、アカウント検索にそのURLを利用する。
    pub fn new() -> Self {
        let launchpad_url =
            env::var(LAUNCHPAD_URL_ENV).unwrap_or_else(|_| DEFAULT_LAUNCHPAD_URL.to_string());

        Self::with_launchpad_url(launchpad_url)
    }

    /// アカウント検索のURLを指定して`TeamworkClient`を返す。
    pub fn with_launchpad_url(launchpad_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            launchpad_url: launchpad_url.into(),
        }
    }

    /// 認証Cookieを付与したリクエストを作成する。
    fn authenticated(&self, request: RequestBuilder, auth: &AuthData) -> RequestBuilder {
        request
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, format!("{}={}", AUTH_COOKIE, auth.token))
    }

    async fn get_json<T: DeserializeOwned>(&self, auth: &AuthData, path: &str) -> Result<T, TwError> {
        let url = endpoint_url(&auth.api_end_point, path);
        let response = send(self.authenticated(self.client.get(&url), auth)).await?;

        read_json(response).await
    }
}

impl Default for TeamworkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamworkRepository for TeamworkClient {
    async fn discover_accounts(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountsResponse, TwError> {
        let url = endpoint_url(&self.launchpad_url, "launchpad/v1/accounts.json");
        let response = send(
            self.client
                .post(&url)
                .query(&[("generic", "true")])
                .json(&json!({
                    "email": email,
                    "password": password,
                    "rememberMe": true,
                })),
        )
        .await?;

        let accounts: AccountsResponse = read_json(response).await?;
        info!("Found {} account(s)", accounts.accounts.len());

        Ok(accounts)
    }

    async fn login(
        &self,
        api_end_point: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthData, TwError> {
        let url = endpoint_url(api_end_point, "launchpad/v1/login.json");
        let response = send(self.client.post(&url).json(&json!({
            "email": email,
            "password": password,
            "rememberMe": true,
        })))
        .await?;

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| TwError::CookieMissing {
                name: AUTH_COOKIE.to_string(),
            })?;

        Ok(AuthData {
            api_end_point: api_end_point.to_string(),
            token,
        })
    }

    async fn get_profile(&self, auth: &AuthData) -> Result<ProfileResponse, TwError> {
        self.get_json(auth, "me.json").await
    }

    async fn get_projects(&self, auth: &AuthData) -> Result<ProjectsResponse, TwError> {
        self.get_json(auth, "projects.json").await
    }

    async fn get_tasks(&self, auth: &AuthData) -> Result<TasksResponse, TwError> {
        self.get_json(auth, "tasks.json").await
    }

    async fn log_time(
        &self,
        auth: &AuthData,
        project_id: u64,
        request: &LogTimeRequest,
    ) -> Result<(), TwError> {
        let path = match request.timelog.task_id {
            0 => format!("projects/api/v3/projects/{}/time.json", project_id),
            task_id => format!("projects/api/v3/tasks/{}/time.json", task_id),
        };
        let url = endpoint_url(&auth.api_end_point, &path);

        send(self.authenticated(self.client.post(&url), auth).json(request)).await?;
        info!("Logged time to {}", path);

        Ok(())
    }

    async fn get_monthly_time_chart(
        &self,
        auth: &AuthData,
        month_start: DateTime<Utc>,
    ) -> Result<TimeChartResponse, TwError> {
        let profile = self.get_profile(auth).await?;
        let path = format!("people/{}/loggedtime.json", profile.person.id);
        let url = endpoint_url(&auth.api_end_point, &path);

        let response = send(self.authenticated(self.client.get(&url), auth).query(&[
            ("m", month_start.month().to_string()),
            ("y", month_start.year().to_string()),
            ("projectId", "0".to_string()),
            ("page", "1".to_string()),
            ("pageSize", TIME_CHART_PAGE_SIZE.to_string()),
        ]))
        .await?;

        read_json(response).await
    }
}

/// ベースURLとパスを結合する。
fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// リクエストを送信し、2xx/3xx以外のステータスはエラーにする。
async fn send(request: RequestBuilder) -> Result<Response, TwError> {
    let response = request.send().await?;
    let status = response.status();
    debug!("{} -> {}", response.url(), status);

    if status.is_success() || status.is_redirection() {
        Ok(response)
    } else {
        Err(TwError::HttpStatus {
            code: status.as_u16(),
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TwError> {
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| TwError::UnexpectedResponse {
        message: format!("failed to deserialize response: {}", e),
    })
}
