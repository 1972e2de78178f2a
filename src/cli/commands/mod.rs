// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod compare;
pub mod migrate_all;
pub mod migrate_single;
pub mod report_formatter;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, BufRead, Write};

/// コマンド出力（テキストとJSONの両方に対応）
pub trait CommandOutput: Serialize {
    /// 人間向けテキスト
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて文字列化
pub fn render_output<T: CommandOutput>(output: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// コマンドの実行結果
///
/// `success` が false の場合、プロセスは非ゼロで終了します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub output: String,
    pub success: bool,
}

impl CommandReport {
    pub fn new(output: String, success: bool) -> Self {
        Self { output, success }
    }
}

/// 実行前の確認
pub trait ConfirmPrompt {
    /// ユーザーが続行を選んだ場合にtrue
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// 標準入力で確認する（y/N、既定はN）
#[derive(Debug, Default)]
pub struct StdinPrompt {}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {}
    }
}

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{} (y/N): ", message)?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .with_context(|| "Failed to read confirmation")?;
        Ok(is_affirmative(&answer))
    }
}

/// y / yes のみ続行とみなす
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
