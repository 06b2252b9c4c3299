use std::{
    env, fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
#[cfg(test)]
use mockall::automock;

use crate::error::TwError;
use crate::models::AuthData;

/// 認証情報ファイルのパスを上書きする環境変数。
const AUTH_FILE_ENV: &str = "TEAMLOG_AUTH_FILE";

/// 認証情報を永続化するためのtrait。
#[cfg_attr(test, automock)]
pub trait AuthStore {
    /// 認証情報が保存されているかを返す。
    fn exists(&self) -> bool;

    /// 保存されている認証情報を読み込む。
    fn load(&self) -> Result<AuthData, TwError>;

    /// 認証情報を保存する。既存の内容は上書きされる。
    fn save(&self, auth: &AuthData) -> Result<(), TwError>;
}

/// ログイン済みであれば認証情報を返し、そうでなければ`TwError::NotLoggedIn`を返す。
pub fn require_auth<S: AuthStore + ?Sized>(store: &S) -> Result<AuthData, TwError> {
    if !store.exists() {
        return Err(TwError::NotLoggedIn);
    }

    store.load()
}

/// 認証情報を1つのJSONファイルに保存する。
///
/// 複数プロセスからの同時書き込みは考慮しない。
pub struct JsonAuthStore {
    path: PathBuf,
}

impl JsonAuthStore {
    /// 指定されたパスを利用する`JsonAuthStore`を返す。
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 既定のパスを利用する`JsonAuthStore`を返す。
    ///
    /// 環境変数`TEAMLOG_AUTH_FILE`が設定されていればそのパスを、
    /// 設定されていなければ`~/.teamlog/auth.json`を利用する。
    pub fn from_env() -> Result<Self, TwError> {
        let path = match env::var_os(AUTH_FILE_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .ok_or_else(|| TwError::Config {
                    message: "home directory could not be determined".to_string(),
                })?
                .join(".teamlog")
                .join("auth.json"),
        };
        debug!("Auth file: {}", path.display());

        Ok(Self::new(path))
    }
}

impl AuthStore for JsonAuthStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<AuthData, TwError> {
        let content = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TwError::NotLoggedIn,
            _ => TwError::Io(e),
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, auth: &AuthData) -> Result<(), TwError> {
        let content = serde_json::to_vec(auth)?;

        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }
        let mut file = open_private_file(&self.path)?;
        file.write_all(&content)?;
        info!("Saved credentials to {}", self.path.display());

        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// 所有者のみが読み書きできるファイルを開く。
#[cfg(unix)]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // modeは新規作成時にしか効かないので既存ファイルにも設定し直す
    file.set_permissions(fs::Permissions::from_mode(0o600))?;

    Ok(file)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{require_auth, AuthStore, JsonAuthStore, MockAuthStore};
    use crate::error::TwError;
    use crate::models::AuthData;

    fn dummy_auth(token: &str) -> AuthData {
        AuthData {
            api_end_point: "https://example.eu.teamwork.com/".to_string(),
            token: token.to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonAuthStore::new(dir.path().join("nested").join("auth.json"));

        assert!(!store.exists());
        store.save(&dummy_auth("token1")).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap(), dummy_auth("token1"));
    }

    /// 再ログイン時は全体が上書きされることを確認する。
    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = JsonAuthStore::new(dir.path().join("auth.json"));

        store.save(&dummy_auth("a-much-longer-token-value")).unwrap();
        store.save(&dummy_auth("short")).unwrap();

        assert_eq!(store.load().unwrap(), dummy_auth("short"));
    }

    #[test]
    fn test_load_not_found() {
        let dir = tempdir().unwrap();
        let store = JsonAuthStore::new(dir.path().join("auth.json"));

        assert!(matches!(store.load(), Err(TwError::NotLoggedIn)));
    }

    #[test]
    fn test_require_auth_not_logged_in() {
        let mut store = MockAuthStore::new();
        store.expect_exists().return_const(false);
        store.expect_load().times(0);

        assert!(matches!(require_auth(&store), Err(TwError::NotLoggedIn)));
    }

    #[test]
    fn test_require_auth_logged_in() {
        let mut store = MockAuthStore::new();
        store.expect_exists().return_const(true);
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(dummy_auth("t")));

        assert_eq!(require_auth(&store).unwrap(), dummy_auth("t"));
    }

    #[test]
    fn test_load_broken_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonAuthStore::new(path);

        assert!(matches!(store.load(), Err(TwError::Json(_))));
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        JsonAuthStore::new(path.clone())
            .save(&dummy_auth("t"))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["apiEndPoint"], "https://example.eu.teamwork.com/");
        assert_eq!(value["token"], "t");
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("private").join("auth.json");
        JsonAuthStore::new(path.clone())
            .save(&dummy_auth("t"))
            .unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode();
        let dir_mode = std::fs::metadata(dir.path().join("private"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }
}
