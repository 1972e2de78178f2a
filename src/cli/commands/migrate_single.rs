// migrate-singleコマンドハンドラー
//
// 指定した1データベースを移行します。
// 移行元に存在しない名前はエラーとし、転送は一切行いません。

use crate::cli::commands::migrate_all::MigrationOutput;
use crate::cli::commands::{render_output, CommandReport};
use crate::cli::OutputFormat;
use crate::core::transfer::TransferOptions;
use crate::services::migration_orchestrator::MigrationOrchestrator;
use anyhow::Result;

/// migrate-singleコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct MigrateSingleCommand {
    /// 移行するデータベース名
    pub database: String,
    /// ダンプ形式と上書き指定
    pub options: TransferOptions,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// migrate-singleコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct MigrateSingleCommandHandler {}

impl MigrateSingleCommandHandler {
    /// 新しいMigrateSingleCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// migrate-singleコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - ツールチェーン付きのオーケストレーター
    /// * `command` - migrate-singleコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 移行結果（失敗時はsuccessがfalse）。名前が不正・存在しない場合はエラー
    pub async fn execute(
        &self,
        orchestrator: &MigrationOrchestrator,
        command: &MigrateSingleCommand,
    ) -> Result<CommandReport> {
        let plan = orchestrator
            .plan_single(&command.database, command.options)
            .await?;
        let report = orchestrator.execute(&plan).await?;

        let output = MigrationOutput::completed(plan, report);
        let success = output.is_success();
        Ok(CommandReport::new(render_output(&output, command.format)?, success))
    }
}
