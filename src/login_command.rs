use anyhow::{Context, Result};
use log::info;

use crate::auth_store::AuthStore;
use crate::error::TwError;
use crate::models::Account;
use crate::prompt::Prompter;
use crate::selector::select_account;
use crate::teamwork::TeamworkRepository;

/// ログインを行うためのサブコマンド。
pub struct LoginCommand<'a, T: TeamworkRepository, S: AuthStore, P: Prompter + ?Sized> {
    client: &'a T,
    store: &'a S,
    prompter: &'a mut P,
}

impl<'a, T: TeamworkRepository, S: AuthStore, P: Prompter + ?Sized> LoginCommand<'a, T, S, P> {
    pub fn new(client: &'a T, store: &'a S, prompter: &'a mut P) -> Self {
        Self {
            client,
            store,
            prompter,
        }
    }

    /// `login`サブコマンドの処理を行う。
    ///
    /// メールアドレスとパスワードを入力させ、ログインできたアカウントの認証情報を保存する。
    /// 複数のアカウントが見つかった場合はどれにログインするかを選択させる。
    pub async fn run(&mut self) -> Result<Account> {
        let email = self.prompter.input("Email", None)?;
        if email.is_empty() {
            return Err(TwError::invalid_input("email must not be empty").into());
        }
        let password = self.prompter.password("Password")?;

        let accounts = self
            .client
            .discover_accounts(&email, &password)
            .await
            .context("Failed to retrieve accounts")?;
        let account = select_account(&mut *self.prompter, &accounts.accounts)?;
        info!("Logging in to {}", account.installation.api_end_point);

        let auth = self
            .client
            .login(&account.installation.api_end_point, &email, &password)
            .await
            .context("Failed to log in")?;
        self.store
            .save(&auth)
            .context("Failed to save credentials")?;

        Ok(account)
    }
}

/// ログアウトを行うためのサブコマンド。
///
/// 保存した認証情報の破棄はまだ実装されていない。
pub struct LogoutCommand;

impl LogoutCommand {
    pub fn run(&self) -> Result<()> {
        Err(TwError::NotImplemented {
            feature: "logout".to_string(),
        }
        .into())
    }
}
