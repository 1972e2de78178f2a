// 転送パイプライン
//
// データベース1件分のエクスポート→（上書き時は削除）→作成→インポートを実行します。
// 上書き時も移行元のエクスポートが成功するまで移行先のデータベースには触れません。
// どの工程で失敗しても残りの工程は実行せず、外部ツールの出力をそのまま結果に残します。

use crate::adapters::database::ServerAdmin;
use crate::adapters::toolchain::DumpRestore;
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use crate::core::transfer::{TransferOptions, TransferOutcome, TransferStage, ALREADY_EXISTS_REASON};
use std::time::Instant;
use tracing::{info, warn};

/// 転送パイプライン
pub struct TransferPipeline<'a> {
    destination: &'a dyn ServerAdmin,
    toolchain: &'a dyn DumpRestore,
}

impl<'a> TransferPipeline<'a> {
    /// 新しいTransferPipelineを作成
    pub fn new(destination: &'a dyn ServerAdmin, toolchain: &'a dyn DumpRestore) -> Self {
        Self {
            destination,
            toolchain,
        }
    }

    /// データベースを1件転送
    ///
    /// # Arguments
    ///
    /// * `name` - 転送するデータベース
    /// * `exists_at_destination` - 移行先カタログに既に存在するか
    /// * `options` - ダンプ形式と上書き指定
    ///
    /// # Returns
    ///
    /// 転送結果（エラーは結果の中に閉じ込め、呼び出し元へは伝播しない）
    pub async fn transfer(
        &self,
        name: &DatabaseName,
        exists_at_destination: bool,
        options: &TransferOptions,
    ) -> TransferOutcome {
        if exists_at_destination && !options.overwrite_existing {
            info!(database = %name, "Database exists on destination, skipping (use --overwrite to replace)");
            return TransferOutcome::skipped(name.clone(), ALREADY_EXISTS_REASON);
        }

        let started = Instant::now();
        let result = self
            .run_stages(name, exists_at_destination, options)
            .await;
        let duration_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(()) => {
                info!(database = %name, duration_ms, "Migrated database");
                TransferOutcome::succeeded(name.clone(), duration_ms)
            }
            Err((stage, error)) => {
                warn!(database = %name, %stage, error = %error, "Migration failed");
                TransferOutcome::failed(name.clone(), stage, error.diagnostics(), duration_ms)
            }
        }
    }

    async fn run_stages(
        &self,
        name: &DatabaseName,
        exists_at_destination: bool,
        options: &TransferOptions,
    ) -> Result<(), (TransferStage, MigrationError)> {
        info!(database = %name, format = options.format.describe(), "Backing up from source");
        // artifact はこの関数を抜けるときに削除される
        let artifact = self
            .toolchain
            .export(name, options.format)
            .await
            .map_err(|e| (TransferStage::Export, e))?;
        info!(database = %name, bytes = artifact.size_bytes(), "Backup created");

        if exists_at_destination {
            warn!(database = %name, "Overwriting existing database on destination");
            self.destination
                .drop_database(name)
                .await
                .map_err(|e| (TransferStage::Drop, e))?;
        }

        self.destination
            .create_database(name)
            .await
            .map_err(|e| (TransferStage::Create, e))?;

        info!(database = %name, "Restoring to destination");
        self.toolchain
            .import(name, &artifact)
            .await
            .map_err(|e| (TransferStage::Import, e))?;

        Ok(())
    }
}
