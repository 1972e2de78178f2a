// 移行オーケストレーター
//
// 一括移行の実行全体を制御するサービス。
// 実行は Resolving → Probing → Cataloging → Transferring → Reporting → Done の順に進み、
// 前提条件（接続確認・カタログ取得・対象解決）の失敗は実行全体を中断します。
// 一方、個々のデータベースの転送失敗はそのデータベースの結果に閉じ込め、
// 残りの対象の処理は必ず続行します。

use crate::adapters::database::ServerAdmin;
use crate::adapters::toolchain::DumpRestore;
use crate::core::catalog::{Catalog, DiffResult};
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use crate::core::transfer::{MigrationReport, TransferOptions};
use crate::services::catalog_lister::CatalogLister;
use crate::services::connection_probe::{ConnectionProbe, ProbeReport};
use crate::services::database_differ::DatabaseDiffer;
use crate::services::transfer_pipeline::TransferPipeline;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// 実行フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Resolving,
    Probing,
    Cataloging,
    Transferring,
    Reporting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Resolving => "resolving",
            RunPhase::Probing => "probing",
            RunPhase::Cataloging => "cataloging",
            RunPhase::Transferring => "transferring",
            RunPhase::Reporting => "reporting",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// 移行対象の選び方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// 移行元の全データベースから除外指定を引いたもの
    All { exclude: BTreeSet<String> },
    /// 指定した1データベース
    Single(DatabaseName),
}

/// 移行対象1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTransfer {
    pub database: DatabaseName,
    /// 移行先に既に存在するか（カタログ取得時点）
    pub exists_at_destination: bool,
}

/// 移行計画
///
/// 対象は辞書順に並び、同じ入力に対して毎回同じ順序になります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// 移行対象
    pub targets: Vec<PlannedTransfer>,
    /// 除外指定により外したデータベース
    pub excluded: Vec<DatabaseName>,
    /// 移行元に存在しなかった除外指定（無視）
    pub ignored_excludes: Vec<String>,
    /// 転送オプション
    pub options: TransferOptions,
}

impl MigrationPlan {
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.database.as_str()).collect()
    }

    /// 上書き指定がないためスキップされる対象
    pub fn conflicts(&self) -> impl Iterator<Item = &PlannedTransfer> {
        self.targets.iter().filter(|t| t.exists_at_destination)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// サーバー比較結果
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub source: Catalog,
    pub destination: Catalog,
    pub diff: DiffResult,
}

/// 移行オーケストレーター
pub struct MigrationOrchestrator {
    source: Box<dyn ServerAdmin>,
    destination: Box<dyn ServerAdmin>,
    toolchain: Option<Box<dyn DumpRestore>>,
    probe: ConnectionProbe,
    lister: CatalogLister,
    differ: DatabaseDiffer,
}

impl MigrationOrchestrator {
    /// 新しいMigrationOrchestratorを作成
    ///
    /// 接続確認と比較だけならツールチェーンは不要です。
    /// 移行を行う場合は `with_toolchain` で設定してください。
    pub fn new(source: Box<dyn ServerAdmin>, destination: Box<dyn ServerAdmin>) -> Self {
        Self {
            source,
            destination,
            toolchain: None,
            probe: ConnectionProbe::new(),
            lister: CatalogLister::new(),
            differ: DatabaseDiffer::new(),
        }
    }

    /// ダンプ・リストアに使うツールチェーンを設定
    pub fn with_toolchain(mut self, toolchain: Box<dyn DumpRestore>) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    pub fn source(&self) -> &dyn ServerAdmin {
        self.source.as_ref()
    }

    pub fn destination(&self) -> &dyn ServerAdmin {
        self.destination.as_ref()
    }

    fn enter(&self, phase: RunPhase) {
        debug!(%phase, "Entering phase");
    }

    fn require_toolchain(&self) -> Result<&dyn DumpRestore, MigrationError> {
        self.toolchain
            .as_deref()
            .ok_or_else(|| MigrationError::Toolchain {
                message: "pg_dump and psql are required for migration".to_string(),
            })
    }

    /// 両サーバーの接続確認（失敗しても打ち切らない）
    pub async fn test_connections(&self) -> ProbeReport {
        self.enter(RunPhase::Probing);
        self.probe
            .probe_both(self.source.as_ref(), self.destination.as_ref())
            .await
    }

    /// 接続確認を行い、失敗があれば前提条件エラーを返す
    async fn preflight(&self) -> Result<(), MigrationError> {
        match self.test_connections().await.into_preflight_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// 両サーバーのカタログを取得して比較
    pub async fn compare(&self) -> Result<Comparison, MigrationError> {
        self.preflight().await?;

        self.enter(RunPhase::Cataloging);
        let source = self.lister.list_databases(self.source.as_ref()).await?;
        let destination = self.lister.list_databases(self.destination.as_ref()).await?;
        let diff = self.differ.diff(&source, &destination);

        self.enter(RunPhase::Done);
        Ok(Comparison {
            source,
            destination,
            diff,
        })
    }

    /// 全データベースの移行計画を作成
    pub async fn plan_all(
        &self,
        exclude: &[String],
        options: TransferOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        self.enter(RunPhase::Resolving);
        let selection = TargetSelection::All {
            exclude: exclude.iter().cloned().collect(),
        };
        self.plan(selection, options).await
    }

    /// 1データベースの移行計画を作成
    pub async fn plan_single(
        &self,
        database: &str,
        options: TransferOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        self.enter(RunPhase::Resolving);
        let name = DatabaseName::new(database)?;
        self.plan(TargetSelection::Single(name), options).await
    }

    /// 計画を作成（接続確認とカタログ取得を含む）
    pub async fn plan(
        &self,
        selection: TargetSelection,
        options: TransferOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        self.require_toolchain()?;
        self.preflight().await?;

        self.enter(RunPhase::Cataloging);
        let source = self.lister.list_databases(self.source.as_ref()).await?;
        // 移行先カタログは実行ごとに1回だけ取得する
        let mut destination = self.lister.list_databases(self.destination.as_ref()).await?;
        // 移行先の管理用データベースはカタログに載らないが、存在するものとして衝突を判定する
        if let Ok(admin) = DatabaseName::new(self.destination.endpoint().admin_database.as_str()) {
            destination.insert(admin);
        }

        let plan = resolve_targets(&selection, &source, &destination, options)?;
        info!(
            targets = plan.targets.len(),
            excluded = plan.excluded.len(),
            ignored_excludes = plan.ignored_excludes.len(),
            "Resolved migration targets"
        );
        Ok(plan)
    }

    /// 計画を実行
    ///
    /// 失敗があっても全対象を順番に処理し、対象数と同数の結果を持つレポートを返します。
    /// エラーになるのはツールチェーン未設定の場合のみです。
    pub async fn execute(&self, plan: &MigrationPlan) -> Result<MigrationReport, MigrationError> {
        let toolchain = self.require_toolchain()?;
        self.enter(RunPhase::Transferring);
        let pipeline = TransferPipeline::new(self.destination.as_ref(), toolchain);

        let mut report = MigrationReport::new();
        for (index, target) in plan.targets.iter().enumerate() {
            info!(
                database = %target.database,
                position = index + 1,
                total = plan.targets.len(),
                "Migrating database"
            );
            let outcome = pipeline
                .transfer(&target.database, target.exists_at_destination, &plan.options)
                .await;
            report.push(outcome);
        }

        self.enter(RunPhase::Reporting);
        let summary = report.summary();
        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            total = summary.total,
            "Migration finished"
        );
        self.enter(RunPhase::Done);
        Ok(report)
    }

    /// 全データベースを移行（計画作成と実行）
    pub async fn migrate_all(
        &self,
        exclude: &[String],
        options: TransferOptions,
    ) -> Result<MigrationReport, MigrationError> {
        let plan = self.plan_all(exclude, options).await?;
        self.execute(&plan).await
    }

    /// 1データベースを移行（計画作成と実行）
    pub async fn migrate_single(
        &self,
        database: &str,
        options: TransferOptions,
    ) -> Result<MigrationReport, MigrationError> {
        let plan = self.plan_single(database, options).await?;
        self.execute(&plan).await
    }
}

/// カタログから移行対象を決定
///
/// 除外指定に移行元に存在しない名前が含まれていてもエラーにはしません。
pub fn resolve_targets(
    selection: &TargetSelection,
    source: &Catalog,
    destination: &Catalog,
    options: TransferOptions,
) -> Result<MigrationPlan, MigrationError> {
    let mut excluded = Vec::new();
    let mut ignored_excludes = Vec::new();

    let names: Vec<DatabaseName> = match selection {
        TargetSelection::All { exclude } => {
            let mut names = Vec::new();
            for name in source.iter() {
                if exclude.contains(name.as_str()) {
                    excluded.push(name.clone());
                } else {
                    names.push(name.clone());
                }
            }
            ignored_excludes = exclude
                .iter()
                .filter(|e| !source.iter().any(|n| n.as_str() == e.as_str()))
                .cloned()
                .collect();
            names
        }
        TargetSelection::Single(name) => {
            if !source.contains(name) {
                return Err(MigrationError::NotFound {
                    name: name.to_string(),
                });
            }
            vec![name.clone()]
        }
    };

    let targets = names
        .into_iter()
        .map(|database| PlannedTransfer {
            exists_at_destination: destination.contains(&database),
            database,
        })
        .collect();

    Ok(MigrationPlan {
        targets,
        excluded,
        ignored_excludes,
        options,
    })
}
