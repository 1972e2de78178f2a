// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "dbferry";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".dbferry.yaml";

/// 既定の作業ディレクトリ（一時ダンプファイルの置き場所）
pub const WORK_DIR: &str = "migration_temp";

/// サーバー内部のデータベース名
///
/// テンプレートと管理用データベースは移行対象にも比較対象にもならない。
pub const SYSTEM_DATABASES: [&str; 3] = ["postgres", "template0", "template1"];

/// サーバー内部のデータベースかどうか
pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name)
}
