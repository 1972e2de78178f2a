// migrate-allコマンドハンドラー
//
// 移行元の全データベース（除外指定分を除く）を移行先へ移行します。
// 実行前に対象一覧を示して確認を求め、--yes 指定時は確認を省略します。
// 個々のデータベースの失敗で処理を止めず、失敗が1件でもあれば非ゼロで終了します。

use crate::cli::commands::report_formatter::{format_plan, format_report};
use crate::cli::commands::{render_output, CommandOutput, CommandReport, ConfirmPrompt};
use crate::cli::OutputFormat;
use crate::core::transfer::{MigrationReport, ReportSummary, TransferOptions};
use crate::services::migration_orchestrator::{MigrationOrchestrator, MigrationPlan};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

/// 移行コマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutput {
    /// 実行した（または中止した）計画
    pub plan: MigrationPlan,
    /// 移行レポート（中止時はNone）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MigrationReport>,
    /// 集計値（中止時はNone）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    /// ユーザーが確認で中止したか
    pub cancelled: bool,
}

impl MigrationOutput {
    /// 実行済みの出力
    pub fn completed(plan: MigrationPlan, report: MigrationReport) -> Self {
        Self {
            plan,
            summary: Some(report.summary()),
            report: Some(report),
            cancelled: false,
        }
    }

    /// 中止した場合の出力
    pub fn cancelled(plan: MigrationPlan) -> Self {
        Self {
            plan,
            report: None,
            summary: None,
            cancelled: true,
        }
    }

    /// 失敗が1件もないか（中止は失敗ではない）
    pub fn is_success(&self) -> bool {
        self.report.as_ref().is_none_or(|r| r.is_success())
    }
}

impl CommandOutput for MigrationOutput {
    fn to_text(&self) -> String {
        match &self.report {
            Some(report) => format_report(report),
            None => format!("{}\n{}", format_plan(&self.plan), "Migration cancelled.".yellow()),
        }
    }
}

/// migrate-allコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct MigrateAllCommand {
    /// 除外するデータベース
    pub exclude: Vec<String>,
    /// ダンプ形式と上書き指定
    pub options: TransferOptions,
    /// 確認を省略する
    pub assume_yes: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// migrate-allコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct MigrateAllCommandHandler {}

impl MigrateAllCommandHandler {
    /// 新しいMigrateAllCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// migrate-allコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - ツールチェーン付きのオーケストレーター
    /// * `command` - migrate-allコマンドのパラメータ
    /// * `prompt` - 実行前の確認
    ///
    /// # Returns
    ///
    /// 移行結果。接続確認・カタログ取得に失敗した場合はエラー
    pub async fn execute(
        &self,
        orchestrator: &MigrationOrchestrator,
        command: &MigrateAllCommand,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<CommandReport> {
        let plan = orchestrator
            .plan_all(&command.exclude, command.options)
            .await?;

        if !command.assume_yes && !plan.is_empty() {
            let message = format!("{}\nContinue?", format_plan(&plan));
            if !prompt.confirm(&message)? {
                info!("Migration cancelled by user");
                let output = MigrationOutput::cancelled(plan);
                return Ok(CommandReport::new(render_output(&output, command.format)?, true));
            }
        }

        let report = orchestrator.execute(&plan).await?;
        let output = MigrationOutput::completed(plan, report);
        let success = output.is_success();
        Ok(CommandReport::new(render_output(&output, command.format)?, success))
    }
}
