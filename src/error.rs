use chrono::NaiveDate;
use thiserror::Error;

/// teamlogの各処理で発生するエラー。
///
/// コマンド層では`anyhow::Context`で文脈を付けて伝播させるが、
/// エラーチェーンを辿ればこの型で判別できる。
#[derive(Debug, Error)]
pub enum TwError {
    /// 認証情報ファイルが存在しない
    #[error("not logged in")]
    NotLoggedIn,

    /// 通信そのものに失敗した
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx/3xx以外のステータスが返された
    #[error("status code: {code}")]
    HttpStatus { code: u16 },

    /// ログインは成功したがセッションCookieが含まれていなかった
    #[error("cookie '{name}' not found")]
    CookieMissing { name: String },

    /// 集計対象の月に含まれない日付のエントリーが渡された
    #[error("date {0} out of range")]
    DateOutOfRange(NaiveDate),

    /// 入力された値が不正
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// 対話的な選択がキャンセルされた
    #[error("aborted by user")]
    UserAbort,

    #[error("{feature} is not implemented")]
    NotImplemented { feature: String },

    /// レスポンスの内容が想定と異なる
    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TwError {
    /// `InvalidInput`を作成する。
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
