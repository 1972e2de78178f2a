// 転送結果モデル
//
// 1データベース分の転送オプション・転送結果と、
// 一括移行全体の結果レポートを定義します。

use crate::core::database_name::DatabaseName;
use serde::Serialize;
use std::fmt;

/// ダンプ形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// COPY文（高速、既定）
    #[default]
    Copy,
    /// INSERT文（低速だがバージョン間の互換性が高い）
    Inserts,
}

impl DumpFormat {
    /// `--use-inserts` フラグから形式を決定
    pub fn from_use_inserts(use_inserts: bool) -> Self {
        if use_inserts {
            DumpFormat::Inserts
        } else {
            DumpFormat::Copy
        }
    }

    pub fn is_portable(&self) -> bool {
        matches!(self, DumpFormat::Inserts)
    }

    /// 利用者向けの説明
    pub fn describe(&self) -> &'static str {
        match self {
            DumpFormat::Copy => "COPY statements",
            DumpFormat::Inserts => "INSERT statements",
        }
    }
}

/// 転送オプション
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferOptions {
    /// ダンプ形式
    pub format: DumpFormat,
    /// 移行先に既存のデータベースがあれば削除して作り直す
    pub overwrite_existing: bool,
}

impl TransferOptions {
    pub fn new(format: DumpFormat, overwrite_existing: bool) -> Self {
        Self {
            format,
            overwrite_existing,
        }
    }
}

/// 転送工程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStage {
    Export,
    Drop,
    Create,
    Import,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStage::Export => write!(f, "export"),
            TransferStage::Drop => write!(f, "drop"),
            TransferStage::Create => write!(f, "create"),
            TransferStage::Import => write!(f, "import"),
        }
    }
}

/// 転送ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::Succeeded => write!(f, "Succeeded"),
            TransferStatus::Skipped => write!(f, "Skipped"),
            TransferStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// 既存データベースをスキップしたときの理由
pub const ALREADY_EXISTS_REASON: &str = "already exists";

/// 1データベース分の転送結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// データベース名
    pub database: DatabaseName,
    /// ステータス
    pub status: TransferStatus,
    /// 失敗した工程（Failedのみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<TransferStage>,
    /// スキップ・失敗の理由
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 外部ツールの出力（そのまま保持）
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diagnostics: String,
    /// 所要時間（ミリ秒）
    pub duration_ms: i64,
}

impl TransferOutcome {
    /// 成功結果を作成
    pub fn succeeded(database: DatabaseName, duration_ms: i64) -> Self {
        Self {
            database,
            status: TransferStatus::Succeeded,
            stage: None,
            reason: None,
            diagnostics: String::new(),
            duration_ms,
        }
    }

    /// スキップ結果を作成
    pub fn skipped(database: DatabaseName, reason: impl Into<String>) -> Self {
        Self {
            database,
            status: TransferStatus::Skipped,
            stage: None,
            reason: Some(reason.into()),
            diagnostics: String::new(),
            duration_ms: 0,
        }
    }

    /// 失敗結果を作成
    pub fn failed(
        database: DatabaseName,
        stage: TransferStage,
        diagnostics: impl Into<String>,
        duration_ms: i64,
    ) -> Self {
        Self {
            database,
            status: TransferStatus::Failed,
            stage: Some(stage),
            reason: Some(format!("{} failed", stage)),
            diagnostics: diagnostics.into(),
            duration_ms,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == TransferStatus::Succeeded
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TransferStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransferStatus::Failed
    }
}

/// レポートの集計値
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

/// 移行レポート
///
/// 実行中は追記のみ行い、実行後は読み取り専用として扱います。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    outcomes: Vec<TransferOutcome>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 転送結果を追記
    pub(crate) fn push(&mut self, outcome: TransferOutcome) {
        self.outcomes.push(outcome);
    }

    /// 処理順の転送結果
    pub fn outcomes(&self) -> &[TransferOutcome] {
        &self.outcomes
    }

    /// 失敗した転送結果
    pub fn failures(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// データベース名で転送結果を検索
    pub fn outcome_for(&self, database: &str) -> Option<&TransferOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.database.as_str() == database)
    }

    /// 集計値を計算
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                TransferStatus::Succeeded => summary.succeeded += 1,
                TransferStatus::Skipped => summary.skipped += 1,
                TransferStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// 失敗が1件もなければ成功（スキップは失敗に数えない）
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|o| o.is_failed())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
