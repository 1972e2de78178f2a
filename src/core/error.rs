// エラー型定義
//
// 移行処理全体で使用されるエラー型を提供します。
// thiserrorを使用して、接続・クエリ・未検出・転送・前提条件の各エラーを
// 構造化されたフィールドを持つ閉じた列挙型として定義します。

use crate::core::config::ServerRole;
use crate::core::transfer::TransferStage;
use thiserror::Error;

/// 移行エラー
///
/// 接続確認、カタログ取得、データベース転送で発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum MigrationError {
    /// Connection error (unreachable host, authentication failure)
    #[error("{role} connection error ({endpoint}): {cause}")]
    Connection {
        /// 対象サーバー
        role: ServerRole,
        /// 接続先（パスワードを含まない表示用文字列）
        endpoint: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error after a successful connection
    #[error("{role} query error: {message}")]
    Query {
        /// 対象サーバー
        role: ServerRole,
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Named database is absent from the source server
    #[error("Database '{name}' not found on source server")]
    NotFound {
        /// データベース名
        name: String,
    },

    /// Export or import failure for one database
    #[error("Transfer of '{database}' failed during {stage}: {diagnostics}")]
    Transfer {
        /// データベース名
        database: String,
        /// 失敗した工程
        stage: TransferStage,
        /// 外部ツールの出力（そのまま保持）
        diagnostics: String,
    },

    /// Invalid database name
    #[error("Invalid database name '{name}': {reason}")]
    InvalidDatabaseName {
        /// データベース名
        name: String,
        /// 不正な理由
        reason: String,
    },

    /// Preflight connection check failed
    #[error("Preflight check failed ({})", format_preflight(.source_cause, .destination_cause))]
    Preflight {
        /// 移行元の失敗原因
        source_cause: Option<String>,
        /// 移行先の失敗原因
        destination_cause: Option<String>,
    },

    /// pg_dump / psql not available
    #[error("PostgreSQL toolchain error: {message}")]
    Toolchain {
        /// エラーメッセージ
        message: String,
    },
}

impl MigrationError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, MigrationError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, MigrationError::Query { .. })
    }

    /// 未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrationError::NotFound { .. })
    }

    /// 転送エラーかどうか
    pub fn is_transfer(&self) -> bool {
        matches!(self, MigrationError::Transfer { .. })
    }

    /// データベース名不正エラーかどうか
    pub fn is_invalid_database_name(&self) -> bool {
        matches!(self, MigrationError::InvalidDatabaseName { .. })
    }

    /// 前提条件エラーかどうか
    pub fn is_preflight(&self) -> bool {
        matches!(self, MigrationError::Preflight { .. })
    }

    /// ツールチェーンエラーかどうか
    pub fn is_toolchain(&self) -> bool {
        matches!(self, MigrationError::Toolchain { .. })
    }

    /// 外部ツールや接続層から得た診断テキスト
    pub fn diagnostics(&self) -> String {
        match self {
            MigrationError::Transfer { diagnostics, .. } => diagnostics.clone(),
            MigrationError::Connection { cause, .. } => cause.clone(),
            other => other.to_string(),
        }
    }
}

fn format_preflight(source: &Option<String>, destination: &Option<String>) -> String {
    let mut parts = Vec::new();
    if let Some(cause) = source {
        parts.push(format!("source: {}", cause));
    }
    if let Some(cause) = destination {
        parts.push(format!("destination: {}", cause));
    }
    if parts.is_empty() {
        "no failing endpoint recorded".to_string()
    } else {
        parts.join("; ")
    }
}
