// 設定管理
//
// 移行元・移行先サーバーの接続設定、外部ツールのパス、作業ディレクトリを
// ひとつの設定構造体にまとめます。設定ファイル（YAML形式）の読み込みと
// コマンドライン引数による上書きもここで扱います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// PostgreSQLの既定ポート
pub const DEFAULT_PORT: u16 = 5432;

/// 既定のユーザー名
pub const DEFAULT_USER: &str = "postgres";

/// 既定の管理用データベース名
pub const DEFAULT_ADMIN_DATABASE: &str = "postgres";

/// 既定の接続タイムアウト（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// サーバーの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    Source,
    Destination,
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerRole::Source => write!(f, "Source"),
            ServerRole::Destination => write!(f, "Destination"),
        }
    }
}

/// サーバー接続先
///
/// 1台のサーバーへの接続に必要な情報を保持します。構築後は変更しません。
#[derive(Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// ユーザー名
    pub username: String,
    /// パスワード
    pub password: String,
    /// 接続確認やCREATE/DROP DATABASEに使う管理用データベース
    pub admin_database: String,
}

impl ServerEndpoint {
    /// 既定値（ポート5432、ユーザーpostgres、管理DB postgres）で作成
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: DEFAULT_USER.to_string(),
            password: password.into(),
            admin_database: DEFAULT_ADMIN_DATABASE.to_string(),
        }
    }

    /// 接続先の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("Host is not specified"));
        }
        if self.port == 0 {
            return Err(anyhow!("Port must be between 1 and 65535"));
        }
        if self.username.trim().is_empty() {
            return Err(anyhow!("User is not specified"));
        }
        if self.admin_database.trim().is_empty() {
            return Err(anyhow!("Administrative database name is not specified"));
        }
        Ok(())
    }

    /// パスワードを含まない表示用の接続先
    pub fn display_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.admin_database
        )
    }
}

// パスワードがログに出ないようにする
impl fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("admin_database", &self.admin_database)
            .finish()
    }
}

/// 外部ツールのパス（未指定なら自動検出）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub pg_dump: Option<PathBuf>,
    pub psql: Option<PathBuf>,
}

/// 移行設定
///
/// 1回の実行で使うすべての設定。各サービスには構築時に明示的に渡します。
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// 移行元サーバー
    pub source: ServerEndpoint,
    /// 移行先サーバー
    pub destination: ServerEndpoint,
    /// 外部ツールのパス
    pub tools: ToolPaths,
    /// 一時ダンプファイルの作業ディレクトリ
    pub work_dir: PathBuf,
    /// 接続タイムアウト（秒）
    pub connect_timeout: u64,
}

impl MigrationConfig {
    /// 接続先から設定を作成
    pub fn new(source: ServerEndpoint, destination: ServerEndpoint) -> Self {
        Self {
            source,
            destination,
            tools: ToolPaths::default(),
            work_dir: PathBuf::from(crate::core::naming::WORK_DIR),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// 役割に応じた接続先を取得
    pub fn endpoint(&self, role: ServerRole) -> &ServerEndpoint {
        match role {
            ServerRole::Source => &self.source,
            ServerRole::Destination => &self.destination,
        }
    }

    /// 接続タイムアウト
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .with_context(|| "Invalid source server settings")?;
        self.destination
            .validate()
            .with_context(|| "Invalid destination server settings")?;
        if self.connect_timeout == 0 {
            return Err(anyhow!("connect_timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// 設定ファイル内のサーバー設定（すべて任意）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub admin_database: Option<String>,
}

impl EndpointSection {
    /// `other` に値があるフィールドで上書きした設定を返す
    pub fn overridden_by(&self, other: &EndpointSection) -> EndpointSection {
        EndpointSection {
            host: other.host.clone().or_else(|| self.host.clone()),
            port: other.port.or(self.port),
            user: other.user.clone().or_else(|| self.user.clone()),
            password: other.password.clone().or_else(|| self.password.clone()),
            admin_database: other
                .admin_database
                .clone()
                .or_else(|| self.admin_database.clone()),
        }
    }

    /// 既定値を補って接続先を構築
    pub fn to_endpoint(&self, role: ServerRole) -> Result<ServerEndpoint> {
        let host = self
            .host
            .clone()
            .ok_or_else(|| anyhow!("{} host is not specified", role))?;

        let endpoint = ServerEndpoint {
            host,
            port: self.port.unwrap_or(DEFAULT_PORT),
            username: self
                .user
                .clone()
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: self.password.clone().unwrap_or_default(),
            admin_database: self
                .admin_database
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_DATABASE.to_string()),
        };

        endpoint
            .validate()
            .with_context(|| format!("Invalid {} server settings", role))?;
        Ok(endpoint)
    }
}

/// 設定ファイル
///
/// ```yaml
/// source:
///   host: old-db.internal
///   password: secret
/// destination:
///   host: new-db.internal
///   port: 6432
/// tools:
///   pg_dump: /usr/lib/postgresql/16/bin/pg_dump
/// work_dir: /var/tmp/dbferry
/// connect_timeout: 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub source: EndpointSection,
    #[serde(default)]
    pub destination: EndpointSection,
    #[serde(default)]
    pub tools: ToolPaths,
    pub work_dir: Option<PathBuf>,
    pub connect_timeout: Option<u64>,
}

/// std::str::FromStrトレイトの実装
impl FromStr for ConfigFile {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_role_display() {
        assert_eq!(ServerRole::Source.to_string(), "Source");
        assert_eq!(ServerRole::Destination.to_string(), "Destination");
    }

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = ServerEndpoint::new("db1", "secret");
        assert_eq!(endpoint.port, 5432);
        assert_eq!(endpoint.username, "postgres");
        assert_eq!(endpoint.admin_database, "postgres");
        assert!(endpoint.validate().is_ok());
    }

    #[test]
    fn test_endpoint_debug_hides_password() {
        let endpoint = ServerEndpoint::new("db1", "topsecret");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("db1"));
        assert!(!endpoint.display_target().contains("topsecret"));
    }

    #[test]
    fn test_endpoint_validation() {
        let mut endpoint = ServerEndpoint::new("", "x");
        assert!(endpoint.validate().is_err());

        endpoint.host = "db1".to_string();
        endpoint.port = 0;
        assert!(endpoint.validate().is_err());

        endpoint.port = 5432;
        endpoint.admin_database = " ".to_string();
        assert!(endpoint.validate().is_err());
    }

    #[test]
    fn test_parse_config_file() {
        let yaml = r#"
source:
  host: old-db
  password: s3cret
destination:
  host: new-db
  port: 6432
  user: admin
tools:
  pg_dump: /opt/pg/bin/pg_dump
work_dir: /tmp/ferry
connect_timeout: 5
"#;
        let config: ConfigFile = yaml.parse().unwrap();
        assert_eq!(config.source.host.as_deref(), Some("old-db"));
        assert_eq!(config.destination.port, Some(6432));
        assert_eq!(
            config.tools.pg_dump,
            Some(PathBuf::from("/opt/pg/bin/pg_dump"))
        );
        assert!(config.tools.psql.is_none());
        assert_eq!(config.connect_timeout, Some(5));
    }

    #[test]
    fn test_section_override_and_defaults() {
        let file = EndpointSection {
            host: Some("file-host".to_string()),
            port: Some(6543),
            password: Some("file-pass".to_string()),
            ..Default::default()
        };
        let cli = EndpointSection {
            host: Some("cli-host".to_string()),
            ..Default::default()
        };

        let endpoint = file
            .overridden_by(&cli)
            .to_endpoint(ServerRole::Source)
            .unwrap();
        assert_eq!(endpoint.host, "cli-host");
        assert_eq!(endpoint.port, 6543);
        assert_eq!(endpoint.password, "file-pass");
        assert_eq!(endpoint.username, "postgres");
    }

    #[test]
    fn test_section_without_host_is_rejected() {
        let err = EndpointSection::default()
            .to_endpoint(ServerRole::Destination)
            .unwrap_err();
        assert!(err.to_string().contains("Destination host"));
    }

    #[test]
    fn test_migration_config_validate() {
        let mut config = MigrationConfig::new(
            ServerEndpoint::new("a", "x"),
            ServerEndpoint::new("b", "y"),
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(ServerRole::Destination).host, "b");

        config.connect_timeout = 0;
        assert!(config.validate().is_err());
    }
}
