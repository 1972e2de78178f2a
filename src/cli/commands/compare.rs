// compareコマンドハンドラー
//
// 両サーバーのデータベース一覧を取得し、差分を表示します。

use crate::cli::commands::report_formatter::format_comparison;
use crate::cli::commands::{render_output, CommandOutput, CommandReport};
use crate::cli::OutputFormat;
use crate::services::migration_orchestrator::{Comparison, MigrationOrchestrator};
use anyhow::Result;

impl CommandOutput for Comparison {
    fn to_text(&self) -> String {
        format_comparison(self)
    }
}

/// compareコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CompareCommand {
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// compareコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct CompareCommandHandler {}

impl CompareCommandHandler {
    /// 新しいCompareCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// compareコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - 両サーバーを保持するオーケストレーター
    /// * `command` - compareコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 比較結果。接続やカタログ取得に失敗した場合はエラー
    pub async fn execute(
        &self,
        orchestrator: &MigrationOrchestrator,
        command: &CompareCommand,
    ) -> Result<CommandReport> {
        let comparison = orchestrator.compare().await?;
        let output = render_output(&comparison, command.format)?;
        Ok(CommandReport::new(output, true))
    }
}
