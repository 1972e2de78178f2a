// データベース接続アダプター
//
// SQLxを使用したサーバー管理操作（接続確認、データベース一覧、CREATE/DROP DATABASE）を
// 提供します。接続は操作ごとに取得し、成功・失敗にかかわらず操作の終了時に閉じます。

use crate::adapters::connection_string::{build_connect_options, build_redacted_connection_string};
use crate::core::config::{ServerEndpoint, ServerRole};
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};
use std::time::Duration;
use tracing::debug;

/// データベース一覧取得クエリ
pub const LIST_DATABASES_SQL: &str =
    "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname";

/// サーバー管理インターフェース
///
/// 移行元・移行先それぞれに1インスタンス。テスト時はモックに差し替えます。
#[async_trait]
pub trait ServerAdmin: Send + Sync {
    /// サーバーの役割
    fn role(&self) -> ServerRole;

    /// 接続先
    fn endpoint(&self) -> &ServerEndpoint;

    /// 管理用データベースへの接続確認
    async fn probe(&self) -> Result<(), MigrationError>;

    /// テンプレート以外のデータベース名一覧を取得
    async fn list_database_names(&self) -> Result<Vec<String>, MigrationError>;

    /// データベースを削除
    async fn drop_database(&self, name: &DatabaseName) -> Result<(), MigrationError>;

    /// 空のデータベースを作成
    async fn create_database(&self, name: &DatabaseName) -> Result<(), MigrationError>;
}

/// PostgreSQLサーバー
#[derive(Debug, Clone)]
pub struct PostgresServer {
    role: ServerRole,
    endpoint: ServerEndpoint,
    connect_timeout: Duration,
}

impl PostgresServer {
    /// 新しいPostgresServerを作成
    pub fn new(role: ServerRole, endpoint: ServerEndpoint, connect_timeout: Duration) -> Self {
        Self {
            role,
            endpoint,
            connect_timeout,
        }
    }

    /// 管理用データベースに接続
    async fn connect(&self) -> Result<PgConnection, MigrationError> {
        let database = &self.endpoint.admin_database;
        let options = build_connect_options(&self.endpoint, database);
        debug!(
            role = %self.role,
            target = %build_redacted_connection_string(&self.endpoint, database),
            "Connecting"
        );

        let connect = PgConnection::connect_with(&options);
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(self.connection_error(e.to_string())),
            Err(_) => Err(self.connection_error(format!(
                "timed out after {}s",
                self.connect_timeout.as_secs()
            ))),
        }
    }

    fn connection_error(&self, cause: String) -> MigrationError {
        MigrationError::Connection {
            role: self.role,
            endpoint: self.endpoint.display_target(),
            cause,
        }
    }

    fn query_error(&self, message: String, sql: &str) -> MigrationError {
        MigrationError::Query {
            role: self.role,
            message,
            sql: Some(sql.to_string()),
        }
    }

    /// 接続を閉じる（失敗しても結果には影響させない）
    async fn close(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            debug!(role = %self.role, error = %e, "Failed to close connection cleanly");
        }
    }

    /// 単純クエリプロトコルでDDLを実行
    ///
    /// CREATE/DROP DATABASE はトランザクションブロック内で実行できないため、
    /// プリペアドステートメントを使わない。
    async fn execute_ddl(&self, sql: &str) -> Result<(), MigrationError> {
        let mut conn = self.connect().await?;
        let result = conn.execute(sql).await;
        self.close(conn).await;

        result
            .map(|_| ())
            .map_err(|e| self.query_error(e.to_string(), sql))
    }
}

#[async_trait]
impl ServerAdmin for PostgresServer {
    fn role(&self) -> ServerRole {
        self.role
    }

    fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), MigrationError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("SELECT 1").execute(&mut conn).await;
        self.close(conn).await;

        result
            .map(|_| ())
            .map_err(|e| self.connection_error(e.to_string()))
    }

    async fn list_database_names(&self) -> Result<Vec<String>, MigrationError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_scalar::<_, String>(LIST_DATABASES_SQL)
            .fetch_all(&mut conn)
            .await;
        self.close(conn).await;

        result.map_err(|e| self.query_error(e.to_string(), LIST_DATABASES_SQL))
    }

    async fn drop_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.execute_ddl(&drop_database_sql(name)).await
    }

    async fn create_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.execute_ddl(&create_database_sql(name)).await
    }
}

/// DROP DATABASE文を生成
pub fn drop_database_sql(name: &DatabaseName) -> String {
    format!("DROP DATABASE {}", name.quoted())
}

/// CREATE DATABASE文を生成
pub fn create_database_sql(name: &DatabaseName) -> String {
    format!("CREATE DATABASE {}", name.quoted())
}
