// コマンド共通コンテキスト
//
// 設定ファイルの読み込み、コマンドライン引数による上書き、
// サーバーとツールチェーンの構築をCLI層で集約する。

use crate::adapters::database::PostgresServer;
use crate::adapters::toolchain::{locate_tools, PgToolchain, ResolvedTools};
use crate::cli::ConnectionArgs;
use crate::core::config::{ConfigFile, EndpointSection, MigrationConfig, ServerRole};
use crate::core::error::MigrationError;
use crate::core::naming::CONFIG_FILE;
use crate::services::migration_orchestrator::MigrationOrchestrator;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// 実際に読み込んだ設定ファイル（無い場合はNone）
    pub config_path: Option<PathBuf>,
    pub config: MigrationConfig,
}

impl CommandContext {
    /// 設定ファイルとコマンドライン引数からコンテキストを作成
    ///
    /// # Arguments
    ///
    /// * `project_path` - 既定の設定ファイルを探すディレクトリ
    /// * `config_path` - `--config` で指定された設定ファイル
    /// * `args` - 接続オプション（設定ファイルより優先）
    /// * `work_dir` - `--work-dir` で指定された作業ディレクトリ
    pub fn load(
        project_path: &Path,
        config_path: Option<PathBuf>,
        args: &ConnectionArgs,
        work_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {:?}", path));
                }
                Some(path)
            }
            None => {
                let default_path = project_path.join(CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };

        let file = match &config_path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                content.parse::<ConfigFile>()?
            }
            None => ConfigFile::default(),
        };

        let config = resolve_config(&file, args, work_dir)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// 移行元・移行先サーバーを構築
    pub fn servers(&self) -> (PostgresServer, PostgresServer) {
        let timeout = self.config.connect_timeout();
        (
            PostgresServer::new(ServerRole::Source, self.config.source.clone(), timeout),
            PostgresServer::new(
                ServerRole::Destination,
                self.config.destination.clone(),
                timeout,
            ),
        )
    }

    /// 接続確認・比較用のオーケストレーター（ツールチェーンなし）
    pub fn orchestrator(&self) -> MigrationOrchestrator {
        let (source, destination) = self.servers();
        MigrationOrchestrator::new(Box::new(source), Box::new(destination))
    }

    /// pg_dump / psql を検出
    pub async fn locate_tools(&self) -> Result<ResolvedTools, MigrationError> {
        locate_tools(&self.config.tools).await
    }

    /// 移行用のオーケストレーター
    ///
    /// pg_dump / psql が見つからない場合はエラー
    pub async fn migration_orchestrator(&self) -> Result<MigrationOrchestrator> {
        let tools = self.locate_tools().await?;
        info!(
            pg_dump = %tools.pg_dump.display(),
            psql = %tools.psql.display(),
            "Located PostgreSQL client tools"
        );

        let toolchain = PgToolchain::new(
            tools,
            self.config.source.clone(),
            self.config.destination.clone(),
            self.config.work_dir.clone(),
        );
        Ok(self.orchestrator().with_toolchain(Box::new(toolchain)))
    }
}

/// コマンドライン引数から役割ごとの接続設定を作る
///
/// `--port` と `--admin-db` は両サーバー共通で、役割別の指定が優先されます。
pub fn cli_section(args: &ConnectionArgs, role: ServerRole) -> EndpointSection {
    let (host, port, user, password) = match role {
        ServerRole::Source => (
            &args.source_host,
            args.source_port,
            &args.source_user,
            &args.source_password,
        ),
        ServerRole::Destination => (
            &args.dest_host,
            args.dest_port,
            &args.dest_user,
            &args.dest_password,
        ),
    };

    EndpointSection {
        host: host.clone(),
        port: port.or(args.port),
        user: user.clone(),
        password: password.clone(),
        admin_database: args.admin_db.clone(),
    }
}

/// 設定ファイルの値にコマンドライン引数を重ねて最終的な設定を作る
pub fn resolve_config(
    file: &ConfigFile,
    args: &ConnectionArgs,
    work_dir: Option<PathBuf>,
) -> Result<MigrationConfig> {
    let source = file
        .source
        .overridden_by(&cli_section(args, ServerRole::Source))
        .to_endpoint(ServerRole::Source)?;
    let destination = file
        .destination
        .overridden_by(&cli_section(args, ServerRole::Destination))
        .to_endpoint(ServerRole::Destination)?;

    let mut config = MigrationConfig::new(source, destination);
    config.tools = file.tools.clone();
    if let Some(dir) = work_dir.or_else(|| file.work_dir.clone()) {
        config.work_dir = dir;
    }
    if let Some(timeout) = file.connect_timeout {
        config.connect_timeout = timeout;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn args(source_host: &str, dest_host: &str) -> ConnectionArgs {
        ConnectionArgs {
            source_host: Some(source_host.to_string()),
            dest_host: Some(dest_host.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_from_args_only() {
        let config = resolve_config(&ConfigFile::default(), &args("old", "new"), None).unwrap();

        assert_eq!(config.source.host, "old");
        assert_eq!(config.destination.host, "new");
        assert_eq!(config.source.port, 5432);
        assert_eq!(config.destination.username, "postgres");
        assert_eq!(config.work_dir, PathBuf::from("migration_temp"));
    }

    #[test]
    fn test_shared_port_is_overridden_by_role_port() {
        let mut connection = args("old", "new");
        connection.port = Some(6432);
        connection.dest_port = Some(7000);

        let config = resolve_config(&ConfigFile::default(), &connection, None).unwrap();

        assert_eq!(config.source.port, 6432);
        assert_eq!(config.destination.port, 7000);
    }

    #[test]
    fn test_args_override_config_file() {
        let file: ConfigFile = r#"
source:
  host: file-source
  user: admin
  password: from-file
destination:
  host: file-dest
work_dir: /var/tmp/dumps
connect_timeout: 5
"#
        .parse()
        .unwrap();

        let mut connection = ConnectionArgs::default();
        connection.source_password = Some("from-cli".to_string());

        let config = resolve_config(&file, &connection, None).unwrap();

        assert_eq!(config.source.host, "file-source");
        assert_eq!(config.source.username, "admin");
        assert_eq!(config.source.password, "from-cli");
        assert_eq!(config.destination.host, "file-dest");
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/dumps"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_host_is_error() {
        let connection = ConnectionArgs {
            source_host: Some("old".to_string()),
            ..Default::default()
        };

        let err = resolve_config(&ConfigFile::default(), &connection, None).unwrap_err();
        assert!(format!("{:#}", err).contains("Destination host is not specified"));
    }

    #[test]
    fn test_load_reads_default_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "source:\n  host: a\ndestination:\n  host: b\n",
        )
        .unwrap();

        let context =
            CommandContext::load(dir.path(), None, &ConnectionArgs::default(), None).unwrap();

        assert_eq!(context.config.source.host, "a");
        assert_eq!(context.config.destination.host, "b");
        assert!(context.config_path.is_some());
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();

        let context = CommandContext::load(
            dir.path(),
            None,
            &args("old", "new"),
            Some(PathBuf::from("dumps")),
        )
        .unwrap();

        assert!(context.config_path.is_none());
        assert_eq!(context.config.work_dir, PathBuf::from("dumps"));
    }

    #[test]
    fn test_load_explicit_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = CommandContext::load(
            dir.path(),
            Some(dir.path().join("nope.yaml")),
            &args("old", "new"),
            None,
        );
        assert!(result.is_err());
    }
}
