// 接続確認サービス
//
// 移行元・移行先サーバーへの接続と認証が通るかを確認します。
// 両サーバーを個別に確認し、片方の失敗で打ち切らずに両方の結果を返します。

use crate::adapters::database::ServerAdmin;
use crate::core::config::ServerRole;
use crate::core::error::MigrationError;
use serde::Serialize;
use tracing::{info, warn};

/// 1サーバー分の接続確認結果
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// サーバーの役割
    pub role: ServerRole,
    /// 接続先（パスワードを含まない）
    pub target: String,
    /// 失敗原因（成功時はNone）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    cause: Option<MigrationError>,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        self.cause.is_none()
    }

    /// 失敗時のエラー
    pub fn cause(&self) -> Option<&MigrationError> {
        self.cause.as_ref()
    }
}

/// 両サーバーの接続確認結果
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub source: ProbeResult,
    pub destination: ProbeResult,
}

impl ProbeReport {
    /// 両方とも接続できたかどうか
    pub fn is_success(&self) -> bool {
        self.source.is_success() && self.destination.is_success()
    }

    /// 失敗があれば前提条件エラーに変換
    pub fn into_preflight_error(self) -> Option<MigrationError> {
        if self.is_success() {
            return None;
        }
        Some(MigrationError::Preflight {
            source_cause: self.source.cause.map(|e| e.diagnostics()),
            destination_cause: self.destination.cause.map(|e| e.diagnostics()),
        })
    }
}

/// 接続確認サービス
#[derive(Debug, Clone, Default)]
pub struct ConnectionProbe {}

impl ConnectionProbe {
    /// 新しいConnectionProbeを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 1サーバーの接続確認
    pub async fn probe(&self, server: &dyn ServerAdmin) -> ProbeResult {
        let role = server.role();
        let target = server.endpoint().display_target();

        let cause = match server.probe().await {
            Ok(()) => {
                info!(%role, %target, "Connection successful");
                None
            }
            Err(e) => {
                warn!(%role, %target, error = %e, "Connection failed");
                Some(e)
            }
        };

        ProbeResult {
            role,
            target,
            error: cause.as_ref().map(|e| e.to_string()),
            cause,
        }
    }

    /// 両サーバーの接続確認（片方が失敗しても両方確認する）
    pub async fn probe_both(
        &self,
        source: &dyn ServerAdmin,
        destination: &dyn ServerAdmin,
    ) -> ProbeReport {
        let source = self.probe(source).await;
        let destination = self.probe(destination).await;
        ProbeReport {
            source,
            destination,
        }
    }
}
