// Services Layer
// 接続確認・カタログ取得・差分検出・転送を組み合わせるサービス層

pub mod catalog_lister;
pub mod connection_probe;
pub mod database_differ;
pub mod migration_orchestrator;
pub mod transfer_pipeline;

#[cfg(test)]
pub(crate) mod test_support;
