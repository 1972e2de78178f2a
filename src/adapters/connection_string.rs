// 接続オプションビルダー
//
// ServerEndpoint と接続先データベース名から sqlx の接続オプションを生成する。
// パスワードはURLに埋め込まず、オプションとして直接渡す。

use crate::core::config::ServerEndpoint;
use crate::core::naming::APP_NAME;
use sqlx::postgres::PgConnectOptions;

/// 接続オプションを生成
pub fn build_connect_options(endpoint: &ServerEndpoint, database: &str) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&endpoint.host)
        .port(endpoint.port)
        .username(&endpoint.username)
        .database(database)
        .application_name(APP_NAME);

    // 空のパスワードは未指定扱いにして .pgpass / PGPASSWORD に任せる
    if endpoint.password.is_empty() {
        options
    } else {
        options.password(&endpoint.password)
    }
}

/// ログ表示用の接続文字列（パスワードは伏せ字）
pub fn build_redacted_connection_string(endpoint: &ServerEndpoint, database: &str) -> String {
    let auth = if endpoint.password.is_empty() {
        endpoint.username.clone()
    } else {
        format!("{}:********", endpoint.username)
    };
    format!(
        "postgresql://{}@{}:{}/{}",
        auth, endpoint.host, endpoint.port, database
    )
}
