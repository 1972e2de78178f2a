// 統合テスト共通ヘルパー
//
// 実サーバーや pg_dump / psql を使わずにコマンドハンドラーを動かすための
// インメモリのサーバーとツールチェーン。

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use dbferry::adapters::database::ServerAdmin;
use dbferry::adapters::toolchain::{DumpArtifact, DumpRestore};
use dbferry::cli::commands::ConfirmPrompt;
use dbferry::core::config::{ServerEndpoint, ServerRole};
use dbferry::core::database_name::DatabaseName;
use dbferry::core::error::MigrationError;
use dbferry::core::transfer::{DumpFormat, TransferStage};
use dbferry::services::migration_orchestrator::MigrationOrchestrator;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 操作ログ（"destination:drop app" のような文字列）
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log_entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// インメモリのPostgreSQLサーバー
pub struct InMemoryServer {
    role: ServerRole,
    endpoint: ServerEndpoint,
    databases: Mutex<BTreeSet<String>>,
    unreachable: Option<String>,
    log: Log,
}

impl InMemoryServer {
    pub fn new(role: ServerRole, databases: &[&str], log: &Log) -> Self {
        Self {
            role,
            endpoint: ServerEndpoint::new(format!("{}.internal", role).to_lowercase(), "secret"),
            databases: Mutex::new(databases.iter().map(|s| s.to_string()).collect()),
            unreachable: None,
            log: log.clone(),
        }
    }

    pub fn unreachable(mut self, cause: &str) -> Self {
        self.unreachable = Some(cause.to_string());
        self
    }

    fn record(&self, action: String) {
        let role = match self.role {
            ServerRole::Source => "source",
            ServerRole::Destination => "destination",
        };
        self.log.lock().unwrap().push(format!("{}:{}", role, action));
    }

    fn check_reachable(&self) -> Result<(), MigrationError> {
        match &self.unreachable {
            Some(cause) => Err(MigrationError::Connection {
                role: self.role,
                endpoint: self.endpoint.display_target(),
                cause: cause.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ServerAdmin for InMemoryServer {
    fn role(&self) -> ServerRole {
        self.role
    }

    fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), MigrationError> {
        self.record("probe".to_string());
        self.check_reachable()
    }

    async fn list_database_names(&self) -> Result<Vec<String>, MigrationError> {
        self.check_reachable()?;
        let mut names: Vec<String> = self.databases.lock().unwrap().iter().cloned().collect();
        names.extend(["postgres".to_string(), "template1".to_string()]);
        Ok(names)
    }

    async fn drop_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.record(format!("drop {}", name));
        self.databases.lock().unwrap().remove(name.as_str());
        Ok(())
    }

    async fn create_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.record(format!("create {}", name));
        self.databases.lock().unwrap().insert(name.to_string());
        Ok(())
    }
}

/// 指定したデータベースのエクスポートだけ失敗するツールチェーン
pub struct ScriptedToolchain {
    failing_exports: BTreeSet<String>,
    log: Log,
}

impl ScriptedToolchain {
    pub fn new(log: &Log) -> Self {
        Self {
            failing_exports: BTreeSet::new(),
            log: log.clone(),
        }
    }

    pub fn failing_export(mut self, name: &str) -> Self {
        self.failing_exports.insert(name.to_string());
        self
    }
}

#[async_trait]
impl DumpRestore for ScriptedToolchain {
    async fn export(
        &self,
        name: &DatabaseName,
        format: DumpFormat,
    ) -> Result<DumpArtifact, MigrationError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("export {} ({})", name, format.describe()));
        if self.failing_exports.contains(name.as_str()) {
            return Err(MigrationError::Transfer {
                database: name.to_string(),
                stage: TransferStage::Export,
                diagnostics: format!(
                    "pg_dump: error: query failed: ERROR:  permission denied for schema {}",
                    name
                ),
            });
        }
        Ok(DumpArtifact::new(PathBuf::from(format!("/nonexistent/{}.sql", name)), 0))
    }

    async fn import(
        &self,
        name: &DatabaseName,
        _artifact: &DumpArtifact,
    ) -> Result<(), MigrationError> {
        self.log.lock().unwrap().push(format!("import {}", name));
        Ok(())
    }
}

/// テスト用オーケストレーター
pub fn orchestrator(
    source: InMemoryServer,
    destination: InMemoryServer,
    toolchain: ScriptedToolchain,
) -> MigrationOrchestrator {
    MigrationOrchestrator::new(Box::new(source), Box::new(destination))
        .with_toolchain(Box::new(toolchain))
}

/// 決まった答えを返す確認プロンプト
pub struct FixedAnswer {
    answer: bool,
    pub asked: RefCell<Vec<String>>,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn was_asked(&self) -> bool {
        !self.asked.borrow().is_empty()
    }
}

impl ConfirmPrompt for FixedAnswer {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(self.answer)
    }
}
