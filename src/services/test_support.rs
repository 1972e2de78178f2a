// サービス層テスト用のモック
//
// 呼び出し順を共有ジャーナルに記録するサーバー・ツールチェーンのモック。

use crate::adapters::database::ServerAdmin;
use crate::adapters::toolchain::{DumpArtifact, DumpRestore};
use crate::core::config::{ServerEndpoint, ServerRole};
use crate::core::database_name::DatabaseName;
use crate::core::error::MigrationError;
use crate::core::transfer::{DumpFormat, TransferStage};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 呼び出し記録
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }
}

fn prefix(role: ServerRole) -> &'static str {
    match role {
        ServerRole::Source => "source",
        ServerRole::Destination => "destination",
    }
}

pub struct MockServer {
    role: ServerRole,
    endpoint: ServerEndpoint,
    databases: Mutex<BTreeSet<String>>,
    probe_error: Option<String>,
    list_error: Option<String>,
    fail_drop: bool,
    fail_create: bool,
    journal: Journal,
}

impl MockServer {
    pub fn new(role: ServerRole, journal: &Journal, databases: &[&str]) -> Self {
        Self {
            role,
            endpoint: ServerEndpoint::new(format!("{}-host", prefix(role)), "pw"),
            databases: Mutex::new(databases.iter().map(|s| s.to_string()).collect()),
            probe_error: None,
            list_error: None,
            fail_drop: false,
            fail_create: false,
            journal: journal.clone(),
        }
    }

    pub fn source(journal: &Journal, databases: &[&str]) -> Self {
        Self::new(ServerRole::Source, journal, databases)
    }

    pub fn destination(journal: &Journal, databases: &[&str]) -> Self {
        Self::new(ServerRole::Destination, journal, databases)
    }

    pub fn with_probe_error(mut self, cause: &str) -> Self {
        self.probe_error = Some(cause.to_string());
        self
    }

    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn with_admin_database(mut self, name: &str) -> Self {
        self.endpoint.admin_database = name.to_string();
        self
    }

    pub fn with_failing_drop(mut self) -> Self {
        self.fail_drop = true;
        self
    }

    pub fn with_failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.lock().unwrap().contains(name)
    }

    fn record(&self, action: &str) {
        self.journal
            .record(format!("{}:{}", prefix(self.role), action));
    }
}

#[async_trait]
impl ServerAdmin for MockServer {
    fn role(&self) -> ServerRole {
        self.role
    }

    fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), MigrationError> {
        self.record("probe");
        match &self.probe_error {
            Some(cause) => Err(MigrationError::Connection {
                role: self.role,
                endpoint: self.endpoint.display_target(),
                cause: cause.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn list_database_names(&self) -> Result<Vec<String>, MigrationError> {
        self.record("list");
        if let Some(message) = &self.list_error {
            return Err(MigrationError::Query {
                role: self.role,
                message: message.clone(),
                sql: None,
            });
        }
        // 管理用データベースとテンプレートも実サーバー同様に返す
        let mut names: Vec<String> = self.databases.lock().unwrap().iter().cloned().collect();
        names.push("postgres".to_string());
        names.sort();
        Ok(names)
    }

    async fn drop_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.record(&format!("drop {}", name));
        if self.fail_drop {
            return Err(MigrationError::Query {
                role: self.role,
                message: format!("database \"{}\" is being accessed by other users", name),
                sql: None,
            });
        }
        self.databases.lock().unwrap().remove(name.as_str());
        Ok(())
    }

    async fn create_database(&self, name: &DatabaseName) -> Result<(), MigrationError> {
        self.record(&format!("create {}", name));
        if self.fail_create {
            return Err(MigrationError::Query {
                role: self.role,
                message: "permission denied to create database".to_string(),
                sql: None,
            });
        }
        self.databases.lock().unwrap().insert(name.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockToolchain {
    fail_export: BTreeSet<String>,
    fail_import: BTreeSet<String>,
    journal: Journal,
}

impl MockToolchain {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }

    pub fn failing_export(mut self, name: &str) -> Self {
        self.fail_export.insert(name.to_string());
        self
    }

    pub fn failing_import(mut self, name: &str) -> Self {
        self.fail_import.insert(name.to_string());
        self
    }
}

#[async_trait]
impl DumpRestore for MockToolchain {
    async fn export(
        &self,
        name: &DatabaseName,
        format: DumpFormat,
    ) -> Result<DumpArtifact, MigrationError> {
        let suffix = if format.is_portable() { " --inserts" } else { "" };
        self.journal.record(format!("export {}{}", name, suffix));
        if self.fail_export.contains(name.as_str()) {
            return Err(MigrationError::Transfer {
                database: name.to_string(),
                stage: TransferStage::Export,
                diagnostics: format!("pg_dump: error: permission denied for table in {}", name),
            });
        }
        Ok(DumpArtifact::new(
            PathBuf::from(format!("/nonexistent/{}.sql", name)),
            0,
        ))
    }

    async fn import(
        &self,
        name: &DatabaseName,
        _artifact: &DumpArtifact,
    ) -> Result<(), MigrationError> {
        self.journal.record(format!("import {}", name));
        if self.fail_import.contains(name.as_str()) {
            return Err(MigrationError::Transfer {
                database: name.to_string(),
                stage: TransferStage::Import,
                diagnostics: "psql:/tmp/x.sql:42: ERROR:  type \"geometry\" does not exist"
                    .to_string(),
            });
        }
        Ok(())
    }
}
