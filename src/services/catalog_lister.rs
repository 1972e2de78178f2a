// カタログ取得サービス
//
// サーバーからデータベース名の一覧を取得し、カタログに変換します。
// テンプレートと管理用データベースは利用者の除外指定とは無関係に常に取り除きます。

use crate::adapters::database::ServerAdmin;
use crate::core::catalog::Catalog;
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use crate::core::naming::is_system_database;
use tracing::{debug, warn};

/// カタログ取得サービス
#[derive(Debug, Clone, Default)]
pub struct CatalogLister {}

impl CatalogLister {
    /// 新しいCatalogListerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// サーバーのカタログを取得
    ///
    /// # Arguments
    ///
    /// * `server` - 取得対象のサーバー
    ///
    /// # Returns
    ///
    /// 移行候補となるデータベースのカタログ、または接続・クエリエラー
    pub async fn list_databases(&self, server: &dyn ServerAdmin) -> Result<Catalog, MigrationError> {
        let role = server.role();
        let admin_database = server.endpoint().admin_database.as_str();
        let names = server.list_database_names().await?;

        let mut catalog = Catalog::new(role);
        for raw in names {
            if is_system_database(&raw) || raw == admin_database {
                continue;
            }
            match DatabaseName::new(raw) {
                Ok(name) => {
                    catalog.insert(name);
                }
                // サーバーが返した名前は通常必ず妥当
                Err(e) => warn!(%role, error = %e, "Skipping database with unusable name"),
            }
        }

        debug!(%role, count = catalog.len(), "Listed databases");
        Ok(catalog)
    }
}
