use anyhow::{Context, Result};
use log::info;

use crate::auth_store::{require_auth, AuthStore};
use crate::models::ProfilePerson;
use crate::teamwork::TeamworkRepository;

/// ログイン中のユーザーを表示するためのサブコマンド。
pub struct WhoAmICommand<'a, T: TeamworkRepository, S: AuthStore> {
    client: &'a T,
    store: &'a S,
}

impl<'a, T: TeamworkRepository, S: AuthStore> WhoAmICommand<'a, T, S> {
    pub fn new(client: &'a T, store: &'a S) -> Self {
        Self { client, store }
    }

    /// `whoami`サブコマンドの処理を行う。
    pub async fn run(&self) -> Result<ProfilePerson> {
        let auth = require_auth(self.store).context("Failed to load credentials")?;
        let profile = self
            .client
            .get_profile(&auth)
            .await
            .context("Failed to retrieve profile")?;
        info!("Profile retrieved successfully.");

        Ok(profile.person)
    }
}
