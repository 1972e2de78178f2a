// ダンプ/リストアツールチェーン
//
// pg_dump と psql を子プロセスとして実行し、データベース1件分のエクスポートと
// インポートを行います。ツールの標準エラー出力は加工せずに診断情報として保持します。

use crate::core::config::{ServerEndpoint, ToolPaths};
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use crate::core::transfer::{DumpFormat, TransferStage};
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

/// ツールを探す既定のインストール先（`*` はバージョンディレクトリ）
const COMMON_TOOL_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/usr/lib/postgresql/*/bin",
    "/usr/pgsql-*/bin",
    "/opt/postgresql/*/bin",
    "/opt/homebrew/bin",
    r"C:\Program Files\PostgreSQL\*\bin",
    r"C:\Program Files (x86)\PostgreSQL\*\bin",
    r"C:\PostgreSQL\*\bin",
];

/// エクスポート結果のダンプファイル
///
/// 転送が終わるとドロップされ、ファイルも削除されます。
#[derive(Debug)]
pub struct DumpArtifact {
    path: PathBuf,
    size_bytes: u64,
}

impl DumpArtifact {
    pub fn new(path: PathBuf, size_bytes: u64) -> Self {
        Self { path, size_bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for DumpArtifact {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove dump file");
            }
        }
    }
}

/// ダンプ/リストアのインターフェース
#[async_trait]
pub trait DumpRestore: Send + Sync {
    /// 移行元からデータベースをエクスポート
    async fn export(
        &self,
        name: &DatabaseName,
        format: DumpFormat,
    ) -> Result<DumpArtifact, MigrationError>;

    /// 移行先の（作成済みの）データベースへインポート
    async fn import(
        &self,
        name: &DatabaseName,
        artifact: &DumpArtifact,
    ) -> Result<(), MigrationError>;
}

/// 検出済みのツールパス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTools {
    pub pg_dump: PathBuf,
    pub psql: PathBuf,
}

/// pg_dump / psql を探す
///
/// 1. 設定ファイルで明示されたパス
/// 2. PATH 上のコマンド
/// 3. 既定のインストール先（新しいバージョンを優先）
pub async fn locate_tools(configured: &ToolPaths) -> Result<ResolvedTools, MigrationError> {
    // 明示されたパスは片方だけでも必ず検証する
    for path in [&configured.pg_dump, &configured.psql].into_iter().flatten() {
        if !responds_to_version(path).await {
            return Err(MigrationError::Toolchain {
                message: format!("Configured tool not found or not runnable: {}", path.display()),
            });
        }
    }

    if let (Some(pg_dump), Some(psql)) = (&configured.pg_dump, &configured.psql) {
        return Ok(ResolvedTools {
            pg_dump: pg_dump.clone(),
            psql: psql.clone(),
        });
    }

    let pg_dump = configured
        .pg_dump
        .clone()
        .unwrap_or_else(|| PathBuf::from("pg_dump"));
    let psql = configured.psql.clone().unwrap_or_else(|| PathBuf::from("psql"));
    if responds_to_version(&pg_dump).await && responds_to_version(&psql).await {
        debug!("Found PostgreSQL tools in PATH");
        return Ok(ResolvedTools { pg_dump, psql });
    }

    for dir in candidate_dirs(COMMON_TOOL_DIRS) {
        let pg_dump = dir.join(executable_name("pg_dump"));
        let psql = dir.join(executable_name("psql"));
        if pg_dump.exists() && psql.exists() {
            debug!(dir = %dir.display(), "Found PostgreSQL tools");
            return Ok(ResolvedTools {
                pg_dump: configured.pg_dump.clone().unwrap_or(pg_dump),
                psql: configured.psql.clone().unwrap_or(psql),
            });
        }
    }

    Err(MigrationError::Toolchain {
        message: "pg_dump/psql not found. Install the PostgreSQL client tools and make sure they are in PATH, or set tools.pg_dump and tools.psql in the config file".to_string(),
    })
}

async fn responds_to_version(program: &Path) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn executable_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}

/// `*` を1つ含むパターンを実在するディレクトリに展開
fn candidate_dirs(patterns: &[&str]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    for pattern in patterns {
        let Some(star) = pattern.find('*') else {
            dirs.push(PathBuf::from(pattern));
            continue;
        };

        let (head, tail) = (&pattern[..star], &pattern[star + 1..]);
        let (parent, prefix) = match head.rfind(['/', '\\']) {
            Some(pos) => (&head[..=pos], &head[pos + 1..]),
            None => (".", head),
        };
        let suffix = tail.trim_start_matches(['/', '\\']);

        let Ok(entries) = std::fs::read_dir(parent) else {
            continue;
        };
        let mut matched: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
            .map(|entry| entry.path().join(suffix))
            .filter(|path| path.is_dir())
            .collect();
        // 新しいバージョンを優先
        matched.sort();
        matched.reverse();
        dirs.extend(matched);
    }

    dirs
}

/// ファイル名に使えない文字を置き換える
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `-d` に渡す接続文字列を作る
///
/// libpq は `=` を含む `-d` の値を接続文字列として解釈し、`-h` などを上書きする。
/// 名前をそのまま渡さず、常に `dbname='...'` の形で引用する。
pub fn dbname_conninfo(name: &DatabaseName) -> String {
    let escaped = name.as_str().replace('\\', "\\\\").replace('\'', "\\'");
    format!("dbname='{}'", escaped)
}

/// pg_dump の引数を組み立てる
pub fn build_dump_args(
    endpoint: &ServerEndpoint,
    name: &DatabaseName,
    output: &Path,
    format: DumpFormat,
) -> Vec<String> {
    let mut args = vec![
        "-h".to_string(),
        endpoint.host.clone(),
        "-p".to_string(),
        endpoint.port.to_string(),
        "-U".to_string(),
        endpoint.username.clone(),
        "-d".to_string(),
        dbname_conninfo(name),
        "-f".to_string(),
        output.display().to_string(),
        "--no-password".to_string(),
    ];

    if format.is_portable() {
        args.push("--inserts".to_string());
    }

    args
}

/// psql の引数を組み立てる
///
/// ON_ERROR_STOP を付けないと psql はSQLエラーでも終了コード0を返す。
pub fn build_restore_args(endpoint: &ServerEndpoint, name: &DatabaseName, input: &Path) -> Vec<String> {
    vec![
        "-h".to_string(),
        endpoint.host.clone(),
        "-p".to_string(),
        endpoint.port.to_string(),
        "-U".to_string(),
        endpoint.username.clone(),
        "-d".to_string(),
        dbname_conninfo(name),
        "-f".to_string(),
        input.display().to_string(),
        "--no-password".to_string(),
        "--quiet".to_string(),
        "-v".to_string(),
        "ON_ERROR_STOP=1".to_string(),
    ]
}

/// 失敗したプロセスの出力から診断テキストを取り出す
fn diagnostics_from(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.into_owned();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.into_owned();
    }
    format!("process exited with {}", output.status)
}

/// pg_dump / psql によるツールチェーン
#[derive(Debug, Clone)]
pub struct PgToolchain {
    tools: ResolvedTools,
    source: ServerEndpoint,
    destination: ServerEndpoint,
    work_dir: PathBuf,
}

impl PgToolchain {
    /// 新しいPgToolchainを作成
    pub fn new(
        tools: ResolvedTools,
        source: ServerEndpoint,
        destination: ServerEndpoint,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            tools,
            source,
            destination,
            work_dir,
        }
    }

    pub fn tools(&self) -> &ResolvedTools {
        &self.tools
    }

    /// ダンプファイルのパスを生成（{database}_{YYYYmmdd_HHMMSS}.sql）
    pub fn dump_path(&self, name: &DatabaseName) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        self.work_dir.join(format!(
            "{}_{}.sql",
            sanitize_file_stem(name.as_str()),
            timestamp
        ))
    }

    async fn run(
        &self,
        program: &Path,
        args: &[String],
        password: &str,
        name: &DatabaseName,
        stage: TransferStage,
    ) -> Result<(), MigrationError> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);
        // パスワードはコマンドラインに載せない
        if !password.is_empty() {
            command.env("PGPASSWORD", password);
        }

        debug!(program = %program.display(), database = %name, %stage, "Running external tool");
        let output = command
            .output()
            .await
            .map_err(|e| MigrationError::Transfer {
                database: name.to_string(),
                stage,
                diagnostics: format!("Failed to run {}: {}", program.display(), e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MigrationError::Transfer {
                database: name.to_string(),
                stage,
                diagnostics: diagnostics_from(&output),
            })
        }
    }
}

#[async_trait]
impl DumpRestore for PgToolchain {
    async fn export(
        &self,
        name: &DatabaseName,
        format: DumpFormat,
    ) -> Result<DumpArtifact, MigrationError> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| MigrationError::Transfer {
                database: name.to_string(),
                stage: TransferStage::Export,
                diagnostics: format!(
                    "Failed to create work directory {}: {}",
                    self.work_dir.display(),
                    e
                ),
            })?;

        // 失敗時も途中まで書かれたファイルが消えるよう、先に所有者を作る
        let mut artifact = DumpArtifact::new(self.dump_path(name), 0);
        let args = build_dump_args(&self.source, name, artifact.path(), format);
        self.run(
            &self.tools.pg_dump,
            &args,
            &self.source.password,
            name,
            TransferStage::Export,
        )
        .await?;

        artifact.size_bytes = tokio::fs::metadata(artifact.path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(artifact)
    }

    async fn import(
        &self,
        name: &DatabaseName,
        artifact: &DumpArtifact,
    ) -> Result<(), MigrationError> {
        let args = build_restore_args(&self.destination, name, artifact.path());
        self.run(
            &self.tools.psql,
            &args,
            &self.destination.password,
            name,
            TransferStage::Import,
        )
        .await
    }
}
